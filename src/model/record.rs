use crate::model::FieldSchema;
use chrono::{DateTime, FixedOffset};
use std::fmt;
use std::sync::Arc;

/// Constant identifier of the source platform
pub const CHANNEL: &str = "instagram";

/// A single cell of a projected record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl FieldValue {
    /// Builds a text cell, mapping the empty string to null
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Null
        } else {
            Self::Text(value)
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Metadata of one post, as extracted from its detail page
///
/// Records are built once by the extractor and never changed afterwards.
/// [`PostRecord::to_row`] projects a record onto the schema it was extracted
/// with: unknown columns and unset optional fields become [`FieldValue::Null`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub post_id: String,
    pub username: String,
    pub likes: u64,
    pub comments: u64,
    /// Display image URL with its signature segment removed
    pub image: String,
    pub url: String,
    pub publish_date: DateTime<FixedOffset>,
    pub is_ad: bool,
    pub is_video: bool,
    /// Whole days between the crawl date and the publish date
    pub post_lifetime: i64,
    pub user_tags: Option<Vec<String>>,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub video_views: Option<u64>,
    pub(crate) schema: Arc<FieldSchema>,
}

impl PostRecord {
    pub fn channel(&self) -> &'static str {
        CHANNEL
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Returns the value of a single column; unknown columns are null
    pub fn value(&self, column: &str) -> FieldValue {
        match column {
            "channel" => FieldValue::text(self.channel()),
            "post_id" => FieldValue::text(self.post_id.as_str()),
            "username" => FieldValue::text(self.username.as_str()),
            "likes" => count(self.likes),
            "comments" => count(self.comments),
            "image" => FieldValue::text(self.image.as_str()),
            "url" => FieldValue::text(self.url.as_str()),
            "publish_date" => {
                FieldValue::Text(self.publish_date.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            "is_ad" => FieldValue::Bool(self.is_ad),
            "is_video" => FieldValue::Bool(self.is_video),
            "post_lifetime" => FieldValue::Integer(self.post_lifetime),
            "user_tags" => match &self.user_tags {
                Some(tags) => FieldValue::text(tags.join(", ")),
                None => FieldValue::Null,
            },
            "caption" => self.caption.as_deref().map_or(FieldValue::Null, FieldValue::text),
            "location" => self
                .location
                .as_deref()
                .map_or(FieldValue::Null, FieldValue::text),
            "video_views" => self.video_views.map_or(FieldValue::Null, count),
            _ => FieldValue::Null,
        }
    }

    /// Projects the record onto its schema, one cell per column
    pub fn to_row(&self) -> Vec<FieldValue> {
        self.schema
            .columns()
            .iter()
            .map(|column| self.value(column))
            .collect()
    }
}

fn count(n: u64) -> FieldValue {
    FieldValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}
