//! Output module for writing harvested posts and run summaries
//!
//! This module handles:
//! - Writing records as a delimited file, one column per schema field
//! - Printing the per-profile summary of a run

mod delimited;
pub mod stats;

pub use delimited::{format_delimited, write_delimited};
pub use stats::{format_report, print_report};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delimiter {0:?} cannot separate cells")]
    Delimiter(char),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
