//! Integration tests for the harvester
//!
//! These tests use wiremock to serve profile and post pages and run whole
//! crawls over plain HTTP.

use chrono::{NaiveDate, TimeZone, Utc};
use profile_harvester::config::Config;
use profile_harvester::crawler::{build_http_client, crawl, Browser, HttpFeedBrowser, ProfileOutcome};
use profile_harvester::output::write_delimited;
use profile_harvester::{DateRange, FieldSchema, HarvestError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.client.base_url = base_url.to_string();
    config.crawler.more_items_timeout_secs = 1;
    config.crawler.poll_interval_ms = 20;
    config.crawler.max_fetch_attempts = 2;
    config.crawler.backoff_min_secs = 0;
    config.crawler.backoff_max_secs = 0;
    config
}

fn html_with_payload(payload: &Value) -> String {
    format!(
        "<html><head><title>profile</title></head><body>\
         <script type=\"text/javascript\">window._sharedData = {};</script>\
         </body></html>",
        payload
    )
}

fn profile_page(count: usize, private: bool, codes: &[&str], cursor: Option<&str>) -> String {
    let edges: Vec<Value> = codes
        .iter()
        .map(|c| json!({"node": {"shortcode": c}}))
        .collect();
    html_with_payload(&json!({"entry_data": {"ProfilePage": [{"graphql": {"user": {
        "is_private": private,
        "edge_owner_to_timeline_media": {
            "count": count,
            "page_info": {"has_next_page": cursor.is_some(), "end_cursor": cursor},
            "edges": edges
        }
    }}}]}}))
}

fn post_page(code: &str, day: u32) -> String {
    let taken_at = Utc.with_ymd_and_hms(2018, 3, day, 12, 0, 0).unwrap().timestamp();
    html_with_payload(&json!({"entry_data": {"PostPage": [{"graphql": {"shortcode_media": {
        "shortcode": code,
        "edge_media_preview_like": {"count": 100 + day},
        "edge_media_to_comment": {"count": day},
        "owner": {"username": "someone"},
        "display_url": "https://scontent.cdninstagram.com/vp/0123456789abcdef0123456789abcdef/5B3C1A2D/t51.2885-15/pic.jpg",
        "taken_at_timestamp": taken_at,
        "is_ad": false,
        "is_video": false,
        "edge_media_to_caption": {"edges": [{"node": {"text": format!("post {}", code)}}]},
        "location": null
    }}}]}}))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_posts(server: &MockServer, posts: &[(&str, u32)]) {
    for (code, day) in posts {
        Mock::given(method("GET"))
            .and(path(format!("/p/{}/", code)))
            .respond_with(html(post_page(code, *day)))
            .mount(server)
            .await;
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 3, day).unwrap()
}

#[tokio::test]
async fn test_full_crawl_over_two_feed_pages() {
    let server = MockServer::start().await;

    // The cursor page is mounted first so it wins over the bare profile path
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .and(query_param("max_id", "C1"))
        .respond_with(html(profile_page(5, false, &["p4", "p5"], None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(profile_page(5, false, &["p1", "p2", "p3"], Some("C1"))))
        .mount(&server)
        .await;
    mount_posts(
        &server,
        &[("p1", 12), ("p2", 11), ("p3", 10), ("p4", 8), ("p5", 7)],
    )
    .await;

    let config = create_test_config(&server.uri());
    let range = DateRange::new(march(9), march(11)).unwrap();

    let report = crawl(&config, &["someone".to_string()], range, 2, false)
        .await
        .expect("crawl should run");

    let mut kept: Vec<&str> = report.records.iter().map(|r| r.post_id.as_str()).collect();
    kept.sort();
    assert_eq!(kept, vec!["p2", "p3"]);
    for record in &report.records {
        assert!(range.contains(record.publish_date.date_naive()));
        assert_eq!(
            record.image,
            "https://scontent.cdninstagram.com/t51.2885-15/pic.jpg"
        );
        assert!(record.url.starts_with(&server.uri()));
    }

    match &report.profiles[0].outcome {
        ProfileOutcome::Harvested {
            records,
            failures,
            out_of_range,
        } => {
            assert_eq!(*records, 2);
            assert_eq!(*failures, 0);
            assert_eq!(*out_of_range, 3);
        }
        ProfileOutcome::Failed(e) => panic!("profile failed: {e}"),
    }
}

#[tokio::test]
async fn test_broken_post_is_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(profile_page(3, false, &["p1", "p2", "p3"], None)))
        .mount(&server)
        .await;
    mount_posts(&server, &[("p1", 12), ("p3", 10)]).await;
    Mock::given(method("GET"))
        .and(path("/p/p2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let range = DateRange::new(march(1), march(31)).unwrap();

    let report = crawl(&config, &["someone".to_string()], range, 3, false)
        .await
        .unwrap();

    assert_eq!(report.records.len(), 2);
    assert!(matches!(
        report.profiles[0].outcome,
        ProfileOutcome::Harvested { failures: 1, .. }
    ));
}

#[tokio::test]
async fn test_private_profile_does_not_stop_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hidden/"))
        .respond_with(html(profile_page(10, true, &[], None)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(profile_page(1, false, &["p1"], None)))
        .mount(&server)
        .await;
    mount_posts(&server, &[("p1", 12)]).await;

    let config = create_test_config(&server.uri());
    let range = DateRange::new(march(1), march(31)).unwrap();
    let profiles = vec!["hidden".to_string(), "someone".to_string()];

    let report = crawl(&config, &profiles, range, 2, false).await.unwrap();

    assert_eq!(report.records.len(), 1);
    assert!(matches!(
        report.profiles[0].outcome,
        ProfileOutcome::Failed(HarvestError::PrivateProfile { .. })
    ));
    assert_eq!(report.succeeded(), 1);
}

#[tokio::test]
async fn test_feed_without_next_page_stalls() {
    let server = MockServer::start().await;

    // Claims 50 posts but never serves more than the first two
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(profile_page(50, false, &["p1", "p2"], None)))
        .mount(&server)
        .await;
    mount_posts(&server, &[("p1", 12), ("p2", 11)]).await;

    let config = create_test_config(&server.uri());
    let range = DateRange::new(march(1), march(31)).unwrap();

    let report = crawl(&config, &["someone".to_string()], range, 2, false)
        .await
        .unwrap();

    assert!(report.records.is_empty());
    match &report.profiles[0].outcome {
        ProfileOutcome::Failed(HarvestError::PaginationStalled { collected, .. }) => {
            assert_eq!(collected.len(), 2);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn test_records_written_with_configured_columns() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(profile_page(1, false, &["p1"], None)))
        .mount(&server)
        .await;
    mount_posts(&server, &[("p1", 12)]).await;

    let mut config = create_test_config(&server.uri());
    config.output.columns = vec![
        "post_id".to_string(),
        "likes".to_string(),
        "location".to_string(),
        "sentiment".to_string(),
    ];
    let range = DateRange::new(march(1), march(31)).unwrap();

    let report = crawl(&config, &["someone".to_string()], range, 1, false)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("posts.csv");
    let schema = FieldSchema::new(config.output.columns.iter().cloned()).unwrap();
    write_delimited(&out, &schema, &report.records, ',').unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text, "post_id,likes,location,sentiment\np1,112,,\n");
}

fn linked_feed_page(codes: &[String], load_more: Option<&str>) -> String {
    let mut body = String::from("<html><body>");
    for code in codes {
        body.push_str(&format!("<a href=\"/p/{}/\">{}</a>", code, code));
    }
    if let Some(href) = load_more {
        body.push_str(&format!("<a href=\"{}\">Load more</a>", href));
    }
    body.push_str("</body></html>");
    body
}

#[tokio::test]
async fn test_load_more_link_without_cursor_loads_next_page() {
    let server = MockServer::start().await;

    let first: Vec<String> = (0..12).map(|i| format!("n{}", i)).collect();
    let second = vec!["n12".to_string(), "n13".to_string()];
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .and(query_param("max_id", "C1"))
        .respond_with(html(linked_feed_page(&second, None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(linked_feed_page(&first, Some("/someone/?max_id=C1"))))
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let mut browser = HttpFeedBrowser::new(build_http_client(&config.client).unwrap());
    browser
        .load(&format!("{}/someone/", server.uri()))
        .await
        .unwrap();
    assert_eq!(browser.read_visible_items().await.unwrap().len(), 12);

    assert!(browser.click_load_more().await.unwrap());
    let visible = browser.read_visible_items().await.unwrap();
    assert_eq!(visible.len(), 14);
    assert!(visible[13].as_str().ends_with("/p/n13/"));

    // The second page has no link of its own
    assert!(!browser.click_load_more().await.unwrap());
}

#[tokio::test]
async fn test_click_load_more_without_link_reports_false() {
    let server = MockServer::start().await;

    let codes: Vec<String> = (0..12).map(|i| format!("n{}", i)).collect();
    Mock::given(method("GET"))
        .and(path("/someone/"))
        .respond_with(html(linked_feed_page(&codes, None)))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let mut browser = HttpFeedBrowser::new(build_http_client(&config.client).unwrap());
    browser
        .load(&format!("{}/someone/", server.uri()))
        .await
        .unwrap();

    assert!(!browser.click_load_more().await.unwrap());
    assert_eq!(browser.read_visible_items().await.unwrap().len(), 12);
}
