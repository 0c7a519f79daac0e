//! Payload shapes of a post detail page
//!
//! The platform has changed the layout of the embedded post object over
//! time. Each layout is one [`PayloadShape`] variant with its own serde
//! model; all of them normalize into a [`RawPost`].

use crate::extract::ExtractError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Known layouts of the post object, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `PostPage[0].media` with `code`, `date` and `display_src`
    LegacyV1,
    /// `PostPage[0].graphql.shortcode_media` counting likes in `edge_liked_by`
    LegacyV2,
    /// `PostPage[0].graphql.shortcode_media` counting likes in `edge_media_preview_like`
    Current,
}

impl fmt::Display for PayloadShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LegacyV1 => "legacy-v1",
            Self::LegacyV2 => "legacy-v2",
            Self::Current => "current",
        };
        f.write_str(name)
    }
}

impl PayloadShape {
    /// Detects which layout `payload` uses and returns the post object
    pub fn probe(payload: &Value) -> Result<(Self, &Value), ExtractError> {
        let page = payload
            .pointer("/entry_data/PostPage/0")
            .ok_or_else(|| ExtractError::SchemaMismatch {
                shape: None,
                reason: "payload has no entry_data.PostPage[0]".to_string(),
            })?;

        if let Some(media) = page.pointer("/graphql/shortcode_media") {
            if media.get("edge_media_preview_like").is_some() {
                return Ok((Self::Current, media));
            }
            if media.get("edge_liked_by").is_some() {
                return Ok((Self::LegacyV2, media));
            }
        }

        if let Some(media) = page.get("media") {
            return Ok((Self::LegacyV1, media));
        }

        Err(ExtractError::SchemaMismatch {
            shape: None,
            reason: "post object matches no known layout".to_string(),
        })
    }

    /// Decodes the post object with this shape's model
    pub fn decode(self, media: &Value) -> Result<RawPost, ExtractError> {
        match self {
            Self::LegacyV1 => decode_as::<LegacyV1Media>(self, media).map(RawPost::from),
            Self::LegacyV2 => decode_as::<LegacyV2Media>(self, media).map(RawPost::from),
            Self::Current => decode_as::<CurrentMedia>(self, media).map(RawPost::from),
        }
    }
}

fn decode_as<T: DeserializeOwned>(shape: PayloadShape, media: &Value) -> Result<T, ExtractError> {
    T::deserialize(media).map_err(|e| ExtractError::SchemaMismatch {
        shape: Some(shape),
        reason: e.to_string(),
    })
}

/// Post fields common to every layout, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct RawPost {
    pub post_id: String,
    pub likes: u64,
    pub comments: u64,
    pub username: String,
    pub display_url: String,
    pub taken_at: i64,
    pub is_ad: bool,
    pub is_video: bool,
    pub user_tags: Option<Vec<String>>,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub video_views: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Count {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct Owner {
    username: String,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edges<T> {
    #[serde(default = "Vec::new")]
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct TaggedUser {
    user: Owner,
}

#[derive(Debug, Deserialize)]
struct CaptionText {
    text: String,
}

fn tag_names(tags: Option<Edges<TaggedUser>>) -> Option<Vec<String>> {
    tags.map(|t| t.edges.into_iter().map(|e| e.node.user.username).collect())
}

fn first_caption(captions: Option<Edges<CaptionText>>) -> Option<String> {
    captions.and_then(|c| c.edges.into_iter().next().map(|e| e.node.text))
}

#[derive(Debug, Deserialize)]
struct CurrentMedia {
    shortcode: String,
    edge_media_preview_like: Count,
    edge_media_to_comment: Count,
    owner: Owner,
    display_url: String,
    taken_at_timestamp: i64,
    is_ad: bool,
    is_video: bool,
    edge_media_to_tagged_user: Option<Edges<TaggedUser>>,
    edge_media_to_caption: Option<Edges<CaptionText>>,
    location: Option<Location>,
    video_view_count: Option<u64>,
}

impl From<CurrentMedia> for RawPost {
    fn from(m: CurrentMedia) -> Self {
        Self {
            post_id: m.shortcode,
            likes: m.edge_media_preview_like.count,
            comments: m.edge_media_to_comment.count,
            username: m.owner.username,
            display_url: m.display_url,
            taken_at: m.taken_at_timestamp,
            is_ad: m.is_ad,
            is_video: m.is_video,
            user_tags: tag_names(m.edge_media_to_tagged_user),
            caption: first_caption(m.edge_media_to_caption),
            location: m.location.and_then(|l| l.name),
            video_views: m.video_view_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyV2Media {
    shortcode: String,
    edge_liked_by: Count,
    edge_media_to_comment: Count,
    owner: Owner,
    display_url: String,
    taken_at_timestamp: i64,
    is_ad: bool,
    is_video: bool,
    edge_media_to_tagged_user: Option<Edges<TaggedUser>>,
    edge_media_to_caption: Option<Edges<CaptionText>>,
    location: Option<Location>,
    video_view_count: Option<u64>,
}

impl From<LegacyV2Media> for RawPost {
    fn from(m: LegacyV2Media) -> Self {
        Self {
            post_id: m.shortcode,
            likes: m.edge_liked_by.count,
            comments: m.edge_media_to_comment.count,
            username: m.owner.username,
            display_url: m.display_url,
            taken_at: m.taken_at_timestamp,
            is_ad: m.is_ad,
            is_video: m.is_video,
            user_tags: tag_names(m.edge_media_to_tagged_user),
            caption: first_caption(m.edge_media_to_caption),
            location: m.location.and_then(|l| l.name),
            video_views: m.video_view_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserTagNodes {
    #[serde(default = "Vec::new")]
    nodes: Vec<TaggedUser>,
}

#[derive(Debug, Deserialize)]
struct LegacyV1Media {
    code: String,
    likes: Count,
    comments: Count,
    owner: Owner,
    display_src: String,
    date: i64,
    is_ad: bool,
    is_video: bool,
    usertags: Option<UserTagNodes>,
    caption: Option<String>,
    location: Option<Location>,
    video_views: Option<u64>,
}

impl From<LegacyV1Media> for RawPost {
    fn from(m: LegacyV1Media) -> Self {
        Self {
            post_id: m.code,
            likes: m.likes.count,
            comments: m.comments.count,
            username: m.owner.username,
            display_url: m.display_src,
            taken_at: m.date,
            is_ad: m.is_ad,
            is_video: m.is_video,
            user_tags: m
                .usertags
                .map(|t| t.nodes.into_iter().map(|n| n.user.username).collect()),
            caption: m.caption,
            location: m.location.and_then(|l| l.name),
            video_views: m.video_views,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap_graphql(media: Value) -> Value {
        json!({"entry_data": {"PostPage": [{"graphql": {"shortcode_media": media}}]}})
    }

    #[test]
    fn test_probe_current() {
        let payload = wrap_graphql(json!({"edge_media_preview_like": {"count": 1}}));
        let (shape, _) = PayloadShape::probe(&payload).unwrap();
        assert_eq!(shape, PayloadShape::Current);
    }

    #[test]
    fn test_probe_legacy_v2() {
        let payload = wrap_graphql(json!({"edge_liked_by": {"count": 1}}));
        let (shape, _) = PayloadShape::probe(&payload).unwrap();
        assert_eq!(shape, PayloadShape::LegacyV2);
    }

    #[test]
    fn test_probe_legacy_v1() {
        let payload = json!({"entry_data": {"PostPage": [{"media": {"code": "x"}}]}});
        let (shape, media) = PayloadShape::probe(&payload).unwrap();
        assert_eq!(shape, PayloadShape::LegacyV1);
        assert_eq!(media["code"], "x");
    }

    #[test]
    fn test_probe_unknown_layout() {
        let payload = json!({"entry_data": {"ProfilePage": [{}]}});
        assert!(matches!(
            PayloadShape::probe(&payload),
            Err(ExtractError::SchemaMismatch { shape: None, .. })
        ));
    }

    #[test]
    fn test_decode_legacy_v1() {
        let media = json!({
            "code": "BAbc",
            "likes": {"count": 7},
            "comments": {"count": 2},
            "owner": {"username": "old_account"},
            "display_src": "https://cdn.example.com/old.jpg",
            "date": 1467331200,
            "is_ad": false,
            "is_video": true,
            "usertags": {"nodes": [{"user": {"username": "friend"}}]},
            "caption": "summer",
            "location": null,
            "video_views": 99
        });

        let raw = PayloadShape::LegacyV1.decode(&media).unwrap();
        assert_eq!(raw.post_id, "BAbc");
        assert_eq!(raw.likes, 7);
        assert_eq!(raw.user_tags, Some(vec!["friend".to_string()]));
        assert_eq!(raw.caption.as_deref(), Some("summer"));
        assert_eq!(raw.location, None);
        assert_eq!(raw.video_views, Some(99));
    }

    #[test]
    fn test_decode_missing_required_field() {
        let media = json!({
            "shortcode": "BfX1",
            "edge_media_preview_like": {"count": 1},
            "owner": {"username": "someone"}
        });

        let err = PayloadShape::Current.decode(&media).unwrap_err();
        match err {
            ExtractError::SchemaMismatch { shape, reason } => {
                assert_eq!(shape, Some(PayloadShape::Current));
                assert!(reason.contains("missing field"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
