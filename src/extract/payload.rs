//! Locating the embedded state object in a rendered page

use crate::extract::ExtractError;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;

/// Marker of the script element carrying the page state
pub const PAYLOAD_MARKER: &str = "window._sharedData";

static OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Finds the embedded state object of a page and parses it
///
/// The payload lives in a `<script>` element assigning an object literal to
/// `window._sharedData`. The outermost `{...}` of that script is parsed as
/// JSON.
///
/// # Errors
///
/// * `ExtractError::MalformedPage` - no such script, or its object is not JSON
pub fn locate_payload(html: &str) -> Result<Value, ExtractError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").map_err(|e| ExtractError::MalformedPage {
        reason: format!("bad script selector: {}", e),
    })?;

    let script = document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .find(|text| text.contains(PAYLOAD_MARKER))
        .ok_or_else(|| ExtractError::MalformedPage {
            reason: format!("no script assigning {}", PAYLOAD_MARKER),
        })?;

    let object = OBJECT_RE
        .find(&script)
        .ok_or_else(|| ExtractError::MalformedPage {
            reason: "payload script holds no object literal".to_string(),
        })?;

    serde_json::from_str(object.as_str()).map_err(|e| ExtractError::MalformedPage {
        reason: format!("payload is not valid JSON: {}", e),
    })
}

/// Wraps a payload object into a minimal page, the way the platform embeds it
#[cfg(test)]
pub(crate) fn page_with_payload(payload: &Value) -> String {
    format!(
        "<html><head><title>post</title></head><body>\
         <script type=\"text/javascript\">window._sharedData = {};</script>\
         </body></html>",
        payload
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_locates_payload() {
        let payload = json!({"entry_data": {"PostPage": [{"a": 1}]}});
        let html = page_with_payload(&payload);
        assert_eq!(locate_payload(&html).unwrap(), payload);
    }

    #[test]
    fn test_ignores_other_scripts() {
        let html = r#"<html><body>
            <script>var config = {"x": 1};</script>
            <script>window._sharedData = {"entry_data": {}};</script>
            </body></html>"#;
        let payload = locate_payload(html).unwrap();
        assert!(payload.get("entry_data").is_some());
        assert!(payload.get("x").is_none());
    }

    #[test]
    fn test_missing_script_is_malformed() {
        let html = "<html><body><p>Sorry, this page isn't available.</p></body></html>";
        assert!(matches!(
            locate_payload(html),
            Err(ExtractError::MalformedPage { .. })
        ));
    }

    #[test]
    fn test_broken_json_is_malformed() {
        let html = "<html><body><script>window._sharedData = {\"entry_data\": [};</script></body></html>";
        assert!(matches!(
            locate_payload(html),
            Err(ExtractError::MalformedPage { .. })
        ));
    }
}
