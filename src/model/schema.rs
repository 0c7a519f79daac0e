use crate::ConfigError;
use std::collections::HashSet;

/// Every column a post record can fill, in the default output order
pub const DEFAULT_COLUMNS: &[&str] = &[
    "channel",
    "post_id",
    "username",
    "likes",
    "comments",
    "image",
    "url",
    "publish_date",
    "is_ad",
    "is_video",
    "post_lifetime",
    "user_tags",
    "caption",
    "location",
    "video_views",
];

/// Ordered set of output column names
///
/// Columns the extractor does not know about are allowed; they are always
/// projected as null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    columns: Vec<String>,
}

impl FieldSchema {
    /// Builds a schema, rejecting empty or repeated column names
    pub fn new<I, S>(columns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(ConfigError::Validation("schema has no columns".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.is_empty() || !seen.insert(column.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "invalid or repeated column '{}'",
                    column
                )));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_lists_all_fields() {
        let schema = FieldSchema::default();
        assert_eq!(schema.len(), 15);
        assert_eq!(schema.columns()[0], "channel");
    }

    #[test]
    fn test_rejects_duplicates() {
        assert!(FieldSchema::new(["likes", "comments", "likes"]).is_err());
        assert!(FieldSchema::new(Vec::<String>::new()).is_err());
        assert!(FieldSchema::new(["likes", ""]).is_err());
    }

    #[test]
    fn test_keeps_order() {
        let schema = FieldSchema::new(["url", "likes"]).unwrap();
        assert_eq!(schema.columns(), &["url".to_string(), "likes".to_string()]);
    }
}
