//! The rendering/browsing seam
//!
//! The paginator never talks to a page directly; it drives a [`Browser`]
//! that can load a URL, ask the feed for more items and report what is
//! currently rendered. [`HttpFeedBrowser`] implements it over plain HTTP for
//! server-rendered profile pages.

use crate::crawler::fetcher::fetch_body;
use crate::extract::{locate_payload, parse_profile_page};
use crate::model::PostIdentifier;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashSet;
use url::Url;

/// Something that renders a feed and lets the crawler page through it
#[async_trait]
pub trait Browser: Send {
    /// Loads `url`, replacing whatever was rendered before
    async fn load(&mut self, url: &str) -> Result<(), HarvestError>;

    /// Asks the feed to render more items (scroll to the bottom)
    async fn trigger_more(&mut self) -> Result<(), HarvestError>;

    /// Clicks the "Load more" control if the page has one
    ///
    /// Returns false when there is no such control; that is not an error.
    async fn click_load_more(&mut self) -> Result<bool, HarvestError>;

    /// Post identifiers currently rendered, in display order
    async fn read_visible_items(&mut self) -> Result<Vec<PostIdentifier>, HarvestError>;

    /// The embedded state object of the loaded page
    async fn read_embedded_payload(&mut self) -> Result<Value, HarvestError>;
}

/// Items and state read from one fetched feed page
#[derive(Debug, Default)]
struct FeedPage {
    items: Vec<PostIdentifier>,
    payload: Option<Value>,
    end_cursor: Option<String>,
    load_more_url: Option<Url>,
}

/// [`Browser`] over server-rendered profile pages
///
/// "Scrolling" fetches the next feed page with the `max_id` cursor of the
/// previous one and appends its posts to the rendered set, the way an
/// infinite-scroll feed grows. Clicking "Load more" follows the link's own
/// href.
pub struct HttpFeedBrowser {
    client: Client,
    page_url: Option<Url>,
    items: Vec<PostIdentifier>,
    seen: HashSet<PostIdentifier>,
    payload: Option<Value>,
    end_cursor: Option<String>,
    load_more_url: Option<Url>,
}

impl HttpFeedBrowser {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            page_url: None,
            items: Vec::new(),
            seen: HashSet::new(),
            payload: None,
            end_cursor: None,
            load_more_url: None,
        }
    }

    async fn fetch_page(&self, url: &Url) -> Result<FeedPage, HarvestError> {
        let body = fetch_body(&self.client, url.as_str())
            .await
            .map_err(|e| HarvestError::Browser {
                stage: "load",
                message: e.to_string(),
            })?;
        Ok(parse_feed_page(&body, url))
    }

    /// Fetches a follow-up feed page and appends its posts
    async fn follow(&mut self, url: &Url) -> Result<(), HarvestError> {
        let page = self.fetch_page(url).await?;
        self.append(page.items);
        self.end_cursor = page.end_cursor;
        self.load_more_url = page.load_more_url;
        Ok(())
    }

    fn append(&mut self, items: Vec<PostIdentifier>) {
        for item in items {
            if self.seen.insert(item.clone()) {
                self.items.push(item);
            }
        }
    }
}

#[async_trait]
impl Browser for HttpFeedBrowser {
    async fn load(&mut self, url: &str) -> Result<(), HarvestError> {
        let url = Url::parse(url).map_err(|e| HarvestError::Browser {
            stage: "load",
            message: format!("invalid URL {}: {}", url, e),
        })?;
        let page = self.fetch_page(&url).await?;

        self.items.clear();
        self.seen.clear();
        self.append(page.items);
        self.payload = page.payload;
        self.end_cursor = page.end_cursor;
        self.load_more_url = page.load_more_url;
        self.page_url = Some(url);
        Ok(())
    }

    async fn trigger_more(&mut self) -> Result<(), HarvestError> {
        let next = match (self.page_url.as_ref(), self.end_cursor.as_ref()) {
            (Some(base), Some(cursor)) => {
                let mut next = base.clone();
                next.query_pairs_mut().clear().append_pair("max_id", cursor);
                next
            }
            // Pages without a cursor may still link their next page
            _ => match self.load_more_url.clone() {
                Some(link) => link,
                None => {
                    tracing::debug!("Feed reports no further pages");
                    return Ok(());
                }
            },
        };

        tracing::debug!("Loading next feed page: {}", next);
        self.follow(&next).await
    }

    async fn click_load_more(&mut self) -> Result<bool, HarvestError> {
        let Some(link) = self.load_more_url.clone() else {
            return Ok(false);
        };

        tracing::debug!("Clicking load more: {}", link);
        self.follow(&link).await?;
        Ok(true)
    }

    async fn read_visible_items(&mut self) -> Result<Vec<PostIdentifier>, HarvestError> {
        Ok(self.items.clone())
    }

    async fn read_embedded_payload(&mut self) -> Result<Value, HarvestError> {
        self.payload.clone().ok_or_else(|| HarvestError::Browser {
            stage: "read payload",
            message: "loaded page has no embedded payload".to_string(),
        })
    }
}

/// Reads post links, payload and paging state from a feed page
fn parse_feed_page(html: &str, page_url: &Url) -> FeedPage {
    let mut page = FeedPage::default();
    let mut seen = HashSet::new();

    {
        let document = Html::parse_document(html);
        if let Ok(selector) = Selector::parse("a[href]") {
            for element in document.select(&selector) {
                let text = element.text().collect::<String>();
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if text.trim().eq_ignore_ascii_case("load more") {
                    page.load_more_url = page_url.join(href.trim()).ok();
                    continue;
                }

                if let Some(post) = resolve_post_link(href, page_url) {
                    if seen.insert(post.clone()) {
                        page.items.push(post);
                    }
                }
            }
        }
    }

    if let Ok(payload) = locate_payload(html) {
        if let Ok(profile) = parse_profile_page(&payload) {
            for code in &profile.shortcodes {
                if let Ok(url) = page_url.join(&format!("/p/{}/", code)) {
                    let post = PostIdentifier::new(url.as_str());
                    if seen.insert(post.clone()) {
                        page.items.push(post);
                    }
                }
            }
            page.end_cursor = profile.end_cursor;
        }
        page.payload = Some(payload);
    }

    page
}

/// Resolves an href to an absolute post URL, or None if it is not a post link
fn resolve_post_link(href: &str, base_url: &Url) -> Option<PostIdentifier> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if !url.path().starts_with("/p/") {
        return None;
    }

    url.set_query(None);
    url.set_fragment(None);
    Some(PostIdentifier::new(url.as_str()))
}
