//! Input module for reading the accounts to crawl
//!
//! Accounts can come from a delimited file instead of the command line. The
//! file follows the same conventions as the output writer: a header row,
//! one row per account, cells optionally quoted with doubled inner quotes.

mod accounts;

pub use accounts::{parse_delimited, read_accounts};

use thiserror::Error;

/// Errors that can occur while reading input files
#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Accounts file has no header row")]
    Empty,

    #[error("Accounts file has no column named {0:?}")]
    MissingColumn(String),

    #[error("Unterminated quoted cell on line {0}")]
    UnterminatedQuote(usize),
}

/// Result type for input operations
pub type InputResult<T> = Result<T, InputError>;
