//! Data model shared by every crawl stage
//!
//! - [`PostIdentifier`]: handle of a post's detail page, in feed order
//! - [`ProfileSnapshot`]: what the profile page says about the feed
//! - [`DateRange`]: the inclusive window of publish dates to keep
//! - [`PostRecord`] and [`FieldSchema`]: extracted posts and the columns they
//!   are projected onto

mod range;
mod record;
mod schema;

pub use range::DateRange;
pub use record::{FieldValue, PostRecord, CHANNEL};
pub use schema::{FieldSchema, DEFAULT_COLUMNS};

use std::fmt;

/// Opaque identifier of a post's detail page
///
/// Identifiers compare by exact value; two URLs that differ only by a
/// trailing slash are different identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostIdentifier(String);

impl PostIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PostIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PostIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for PostIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Profile-level facts read once before paginating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSnapshot {
    /// Total number of posts on the profile, as reported by the platform
    pub post_count: usize,

    /// Private profiles cannot be crawled
    pub is_private: bool,
}
