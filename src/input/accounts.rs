use crate::input::{InputError, InputResult};
use std::collections::HashSet;
use std::path::Path;

/// Reads usernames from the column named `column` of a delimited file
///
/// # Arguments
///
/// * `path` - Path to the accounts file
/// * `column` - Header name of the column holding usernames
/// * `delimiter` - Cell separator
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Usernames in file order, trimmed, without blanks or
///   repeats
/// * `Err(InputError)` - The file is unreadable, malformed or lacks the column
pub fn read_accounts(path: &Path, column: &str, delimiter: char) -> InputResult<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows = parse_delimited(&text, delimiter)?.into_iter();

    let header = rows.next().ok_or(InputError::Empty)?;
    let index = header
        .iter()
        .position(|name| name.trim() == column)
        .ok_or_else(|| InputError::MissingColumn(column.to_string()))?;

    let mut seen = HashSet::new();
    let accounts: Vec<String> = rows
        .filter_map(|row| row.get(index).map(|cell| cell.trim().to_string()))
        .filter(|name| !name.is_empty() && seen.insert(name.clone()))
        .collect();

    tracing::info!(
        "Loaded {} accounts from {} (column {})",
        accounts.len(),
        path.display(),
        column
    );
    Ok(accounts)
}

/// Splits delimited text into rows of cells
///
/// Quoted cells may contain the delimiter, line breaks and doubled quotes.
/// Blank lines are skipped.
pub fn parse_delimited(text: &str, delimiter: char) -> InputResult<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut quote_line = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    cell.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    cell.push(c);
                }
                _ => cell.push(c),
            }
            continue;
        }

        match c {
            '"' if cell.is_empty() => {
                in_quotes = true;
                quote_line = line;
            }
            '\r' => {}
            '\n' => {
                line += 1;
                end_row(&mut rows, &mut row, &mut cell);
            }
            c if c == delimiter => row.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }

    if in_quotes {
        return Err(InputError::UnterminatedQuote(quote_line));
    }
    end_row(&mut rows, &mut row, &mut cell);
    Ok(rows)
}

fn end_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, cell: &mut String) {
    if row.is_empty() && cell.is_empty() {
        return;
    }
    row.push(std::mem::take(cell));
    rows.push(std::mem::take(row));
}
