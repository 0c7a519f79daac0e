//! Delimited-file output
//!
//! The first row holds the schema's column names, every following row one
//! record. Null cells are left empty. Cells containing the delimiter, a
//! quote or a line break are quoted, with inner quotes doubled.

use crate::model::{FieldSchema, PostRecord};
use crate::output::{OutputError, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes `records` to `path`, creating or truncating the file
///
/// Records extracted with a different schema are still projected onto
/// `schema`, column by column.
pub fn write_delimited(
    path: &Path,
    schema: &FieldSchema,
    records: &[PostRecord],
    delimiter: char,
) -> OutputResult<()> {
    let content = format_delimited(schema, records, delimiter)?;

    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(content.as_bytes())?;
    file.flush()?;

    tracing::info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Formats records as delimited text, header first
pub fn format_delimited(
    schema: &FieldSchema,
    records: &[PostRecord],
    delimiter: char,
) -> OutputResult<String> {
    if matches!(delimiter, '"' | '\n' | '\r') {
        return Err(OutputError::Delimiter(delimiter));
    }

    let mut out = String::new();
    push_row(&mut out, schema.columns().iter().map(String::as_str), delimiter);

    for record in records {
        let cells: Vec<String> = if record.schema() == schema {
            record.to_row().iter().map(ToString::to_string).collect()
        } else {
            schema
                .columns()
                .iter()
                .map(|column| record.value(column).to_string())
                .collect()
        };
        push_row(&mut out, cells.iter().map(String::as_str), delimiter);
    }

    Ok(out)
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, delimiter: char) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(delimiter);
        }
        push_cell(out, cell, delimiter);
    }
    out.push('\n');
}

fn push_cell(out: &mut String, cell: &str, delimiter: char) {
    let needs_quotes = cell.contains(delimiter) || cell.contains(['"', '\n', '\r']);
    if !needs_quotes {
        out.push_str(cell);
        return;
    }

    out.push('"');
    out.push_str(&cell.replace('"', "\"\""));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{page_with_payload, Extractor};
    use chrono::{FixedOffset, TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn record(schema: &Arc<FieldSchema>, caption: &str) -> PostRecord {
        let page = page_with_payload(&json!({"entry_data": {"PostPage": [{"graphql": {"shortcode_media": {
            "shortcode": "BfX1",
            "edge_media_preview_like": {"count": 5},
            "edge_media_to_comment": {"count": 0},
            "owner": {"username": "someone"},
            "display_url": "https://cdn.example.com/pic.jpg",
            "taken_at_timestamp": 1520000000,
            "is_ad": false,
            "is_video": false,
            "edge_media_to_caption": {"edges": [{"node": {"text": caption}}]},
            "location": null
        }}}]}}));
        let extractor = Extractor::with_crawl_time(
            FixedOffset::east_opt(0).unwrap(),
            Utc.with_ymd_and_hms(2018, 3, 12, 0, 0, 0).unwrap(),
        );
        extractor
            .extract(&page, "https://www.instagram.com/p/BfX1/", schema)
            .unwrap()
    }

    #[test]
    fn test_header_and_rows() {
        let schema = Arc::new(FieldSchema::new(["post_id", "likes", "caption", "location"]).unwrap());
        let text = format_delimited(&schema, &[record(&schema, "hi")], ',').unwrap();

        assert_eq!(text, "post_id,likes,caption,location\nBfX1,5,hi,\n");
    }

    #[test]
    fn test_quotes_cells_with_special_characters() {
        let schema = Arc::new(FieldSchema::new(["caption"]).unwrap());
        let text = format_delimited(&schema, &[record(&schema, "a, \"b\"\nc")], ',').unwrap();

        assert_eq!(text, "caption\n\"a, \"\"b\"\"\nc\"\n");
    }

    #[test]
    fn test_other_delimiter() {
        let schema = Arc::new(FieldSchema::new(["post_id", "caption"]).unwrap());
        let text = format_delimited(&schema, &[record(&schema, "x,y")], '\t').unwrap();

        assert_eq!(text, "post_id\tcaption\nBfX1\tx,y\n");
    }

    #[test]
    fn test_records_projected_onto_other_schema() {
        let extracted_with = Arc::new(FieldSchema::default());
        let written_as = FieldSchema::new(["channel", "post_id", "sentiment"]).unwrap();
        let text = format_delimited(&written_as, &[record(&extracted_with, "hi")], ',').unwrap();

        assert_eq!(text, "channel,post_id,sentiment\ninstagram,BfX1,\n");
    }

    #[test]
    fn test_rejects_quote_delimiter() {
        let schema = FieldSchema::default();
        assert!(matches!(
            format_delimited(&schema, &[], '"'),
            Err(OutputError::Delimiter('"'))
        ));
    }

    #[test]
    fn test_write_delimited_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.csv");
        let schema = Arc::new(FieldSchema::new(["post_id"]).unwrap());

        write_delimited(&path, &schema, &[record(&schema, "hi")], ',').unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "post_id\nBfX1\n");
    }
}
