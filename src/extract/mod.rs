//! Post extraction
//!
//! Turns the raw HTML of a post detail page into a [`PostRecord`]:
//! 1. Locate the embedded state payload ([`locate_payload`])
//! 2. Detect the payload layout ([`PayloadShape::probe`])
//! 3. Decode the post object and normalize it into a record
//!
//! Extraction never touches the network; fetching and retrying are done by
//! the crawler before a page reaches the extractor.

mod payload;
mod profile;
mod shape;

pub use payload::{locate_payload, PAYLOAD_MARKER};
pub use profile::{parse_profile_page, ProfilePage};
pub use shape::{PayloadShape, RawPost};

#[cfg(test)]
pub(crate) use payload::page_with_payload;

use crate::model::{FieldSchema, PostRecord};
use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Signature and tracking segment of CDN image URLs
static IMAGE_SIGNATURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vp.*/.{32}/.{8}/").expect("valid regex"));

/// Errors during extraction
///
/// Both variants are permanent: retrying the same page cannot fix them.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("malformed page: {reason}")]
    MalformedPage { reason: String },

    #[error("schema mismatch ({}): {reason}", shape_name(.shape))]
    SchemaMismatch {
        shape: Option<PayloadShape>,
        reason: String,
    },
}

fn shape_name(shape: &Option<PayloadShape>) -> String {
    shape.map_or_else(|| "unknown layout".to_string(), |s| s.to_string())
}

/// Removes the signature segment from an image URL
pub fn strip_image_signature(url: &str) -> String {
    IMAGE_SIGNATURE_RE.replace(url, "").into_owned()
}

/// Builds post records from detail pages
///
/// The crawl timestamp is fixed when the extractor is created, so extracting
/// the same page twice yields identical records.
#[derive(Debug, Clone)]
pub struct Extractor {
    offset: FixedOffset,
    crawled_at: DateTime<FixedOffset>,
}

impl Extractor {
    /// Creates an extractor reporting dates in `offset`, crawling now
    pub fn new(offset: FixedOffset) -> Self {
        Self::with_crawl_time(offset, Utc::now())
    }

    /// Creates an extractor with an explicit crawl time
    pub fn with_crawl_time(offset: FixedOffset, crawled_at: DateTime<Utc>) -> Self {
        Self {
            offset,
            crawled_at: crawled_at.with_timezone(&offset),
        }
    }

    /// Extracts a post record from a detail page
    ///
    /// # Arguments
    ///
    /// * `raw_page` - HTML of the detail page
    /// * `url` - URL the page was fetched from
    /// * `schema` - Columns the record will be projected onto
    ///
    /// # Errors
    ///
    /// * `ExtractError::MalformedPage` - No parseable embedded payload
    /// * `ExtractError::SchemaMismatch` - Payload lacks a required post field
    pub fn extract(
        &self,
        raw_page: &str,
        url: &str,
        schema: &Arc<FieldSchema>,
    ) -> Result<PostRecord, ExtractError> {
        let raw = self.raw_post(raw_page)?;
        let publish_date = self.publish_date_of(&raw)?;
        let post_lifetime = (self.crawled_at.date_naive() - publish_date.date_naive()).num_days();

        let caption = raw
            .caption
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let user_tags = raw
            .user_tags
            .map(|tags| tags.into_iter().filter(|t| !t.is_empty()).collect::<Vec<_>>())
            .filter(|tags| !tags.is_empty());
        let location = raw.location.filter(|l| !l.is_empty());
        let video_views = if raw.is_video { raw.video_views } else { None };

        Ok(PostRecord {
            post_id: raw.post_id,
            username: raw.username,
            likes: raw.likes,
            comments: raw.comments,
            image: strip_image_signature(&raw.display_url),
            url: url.to_string(),
            publish_date,
            is_ad: raw.is_ad,
            is_video: raw.is_video,
            post_lifetime,
            user_tags,
            caption,
            location,
            video_views,
            schema: Arc::clone(schema),
        })
    }

    /// Reads only the publish date of a detail page
    pub fn publish_date(&self, raw_page: &str) -> Result<DateTime<FixedOffset>, ExtractError> {
        let raw = self.raw_post(raw_page)?;
        self.publish_date_of(&raw)
    }

    fn raw_post(&self, raw_page: &str) -> Result<RawPost, ExtractError> {
        let payload = locate_payload(raw_page)?;
        let (shape, media) = PayloadShape::probe(&payload)?;
        tracing::trace!("Post payload uses the {} layout", shape);
        shape.decode(media)
    }

    fn publish_date_of(&self, raw: &RawPost) -> Result<DateTime<FixedOffset>, ExtractError> {
        DateTime::from_timestamp(raw.taken_at, 0)
            .map(|dt| dt.with_timezone(&self.offset))
            .ok_or_else(|| ExtractError::SchemaMismatch {
                shape: None,
                reason: format!("timestamp {} is out of range", raw.taken_at),
            })
    }
}
