//! Reading the profile page payload

use crate::extract::ExtractError;
use crate::model::ProfileSnapshot;
use serde_json::Value;

/// What a profile page payload says about the profile and its first feed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePage {
    pub snapshot: ProfileSnapshot,

    /// Shortcodes of the posts embedded in this page, in feed order
    pub shortcodes: Vec<String>,

    /// Cursor of the next feed page, if the platform reports one
    pub end_cursor: Option<String>,
}

/// Parses a profile page payload
///
/// Both the legacy `ProfilePage[0].user.media` layout and the graphql
/// `ProfilePage[0].graphql.user.edge_owner_to_timeline_media` layout are
/// understood.
pub fn parse_profile_page(payload: &Value) -> Result<ProfilePage, ExtractError> {
    let page = payload
        .pointer("/entry_data/ProfilePage/0")
        .ok_or_else(|| mismatch("payload has no entry_data.ProfilePage[0]"))?;

    let (user, timeline, code_key) = if let Some(user) = page.pointer("/graphql/user") {
        (user, user.get("edge_owner_to_timeline_media"), "shortcode")
    } else if let Some(user) = page.get("user") {
        (user, user.get("media"), "code")
    } else {
        return Err(mismatch("profile page has no user object"));
    };

    let timeline = timeline.ok_or_else(|| mismatch("profile has no timeline object"))?;
    let is_private = user
        .get("is_private")
        .and_then(Value::as_bool)
        .ok_or_else(|| mismatch("profile has no is_private flag"))?;
    let post_count = timeline
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| mismatch("timeline has no post count"))?;

    let shortcodes = timeline_nodes(timeline)
        .filter_map(|node| node.get(code_key).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    let end_cursor = timeline
        .pointer("/page_info/end_cursor")
        .and_then(Value::as_str)
        .filter(|_| {
            timeline
                .pointer("/page_info/has_next_page")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .map(str::to_string);

    Ok(ProfilePage {
        snapshot: ProfileSnapshot {
            post_count: usize::try_from(post_count).unwrap_or(usize::MAX),
            is_private,
        },
        shortcodes,
        end_cursor,
    })
}

/// Iterates the post nodes of either timeline layout
fn timeline_nodes(timeline: &Value) -> impl Iterator<Item = &Value> {
    let edges = timeline
        .get("edges")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|edge| edge.get("node"));
    let nodes = timeline
        .get("nodes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten();
    edges.chain(nodes)
}

fn mismatch(reason: &str) -> ExtractError {
    ExtractError::SchemaMismatch {
        shape: None,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_graphql_profile() {
        let payload = json!({"entry_data": {"ProfilePage": [{"graphql": {"user": {
            "is_private": false,
            "edge_owner_to_timeline_media": {
                "count": 40,
                "page_info": {"has_next_page": true, "end_cursor": "QVFD"},
                "edges": [{"node": {"shortcode": "A1"}}, {"node": {"shortcode": "A2"}}]
            }
        }}}]}});

        let page = parse_profile_page(&payload).unwrap();
        assert_eq!(page.snapshot.post_count, 40);
        assert!(!page.snapshot.is_private);
        assert_eq!(page.shortcodes, vec!["A1", "A2"]);
        assert_eq!(page.end_cursor.as_deref(), Some("QVFD"));
    }

    #[test]
    fn test_legacy_profile() {
        let payload = json!({"entry_data": {"ProfilePage": [{"user": {
            "is_private": true,
            "media": {
                "count": 3,
                "page_info": {"has_next_page": false, "end_cursor": "123"},
                "nodes": [{"code": "old1"}]
            }
        }}]}});

        let page = parse_profile_page(&payload).unwrap();
        assert_eq!(page.snapshot.post_count, 3);
        assert!(page.snapshot.is_private);
        assert_eq!(page.shortcodes, vec!["old1"]);
        assert_eq!(page.end_cursor, None);
    }

    #[test]
    fn test_missing_profile_page() {
        let payload = json!({"entry_data": {"PostPage": [{}]}});
        assert!(matches!(
            parse_profile_page(&payload),
            Err(ExtractError::SchemaMismatch { .. })
        ));
    }
}
