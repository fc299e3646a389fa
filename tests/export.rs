mod common;

use chrono::TimeZone;
use chrono::Utc;
use common::{message, record};
use tempmail::api::models::MessageBody;
use tempmail::export::{self, ExportFormat};
use tempmail::sync::{BodyCache, merge};

fn fixture() -> (Vec<tempmail::sync::InboxEntry>, BodyCache) {
    let entries = merge(
        vec![message("m-1", 10, "Invoice <42>")],
        vec![record(&message("m-0", 5, "Old news"), None)],
    );
    let mut bodies = BodyCache::new();
    bodies.insert(
        "m-1".to_string(),
        MessageBody {
            text: "Please pay".to_string(),
            html: "<p>Please pay</p>".to_string(),
        },
    );
    (entries, bodies)
}

#[test]
fn default_file_name_carries_timestamp_and_extension() {
    let now = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
    assert_eq!(
        export::default_file_name(ExportFormat::Markdown, now),
        "emails_2025-02-03T04-05-06.md"
    );
    assert_eq!(
        export::default_file_name(ExportFormat::Html, now),
        "emails_2025-02-03T04-05-06.html"
    );
}

#[test]
fn json_export_includes_cached_bodies() {
    let (entries, bodies) = fixture();
    let selected = entries.iter().collect::<Vec<_>>();
    let rendered = export::render(ExportFormat::Json, &selected, &bodies).expect("render");

    let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
    let items = parsed.as_array().expect("array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], "m-1");
    assert_eq!(items[0]["text"], "Please pay");
    assert_eq!(items[0]["origin"], "provider");
    assert_eq!(items[1]["origin"], "mirror");
    assert!(items[1].get("text").is_none());
}

#[test]
fn markdown_export_falls_back_to_intro() {
    let (entries, bodies) = fixture();
    let selected = entries.iter().collect::<Vec<_>>();
    let rendered = export::render(ExportFormat::Markdown, &selected, &bodies).expect("render");

    assert!(rendered.starts_with("# Invoice <42>\n"));
    assert!(rendered.contains("**From:** Shop <sender@shop.test>"));
    assert!(rendered.contains("Please pay"));
    assert!(rendered.contains("intro of Old news"));
}

#[test]
fn html_export_escapes_headers() {
    let (entries, bodies) = fixture();
    let selected = entries.iter().collect::<Vec<_>>();
    let rendered = export::render(ExportFormat::Html, &selected, &bodies).expect("render");

    assert!(rendered.contains("Invoice &lt;42&gt;"));
    assert!(rendered.contains("<p>Please pay</p>"));
    assert_eq!(rendered.matches("class=\"email\"").count(), 2);
    assert!(rendered.trim_end().ends_with("</html>"));
}
