//! Free-text filtering over the merged inbox.
//!
//! Summary fields are always searched. Bodies only take part once they sit
//! in the body cache, so recall grows as more messages get fetched. Nothing
//! here touches the network.

use crate::api::models::{Message, MessageBody};
use crate::sync::{BodyCache, InboxEntry};

pub fn filter<'a>(entries: &'a [InboxEntry], query: &str, bodies: &BodyCache) -> Vec<&'a InboxEntry> {
    if query.trim().is_empty() {
        return entries.iter().collect();
    }
    let needle = query.to_lowercase();

    entries
        .iter()
        .filter(|entry| matches(&entry.message, &needle, bodies.get(&entry.message.id)))
        .collect()
}

/// `needle` must already be lowercased.
pub fn matches(message: &Message, needle: &str, body: Option<&MessageBody>) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(needle);

    let summary = hit(&message.subject)
        || hit(&message.intro)
        || hit(&message.from.address)
        || message.from.name.as_deref().is_some_and(hit)
        || message.to.iter().any(|to| {
            hit(&to.address) || to.name.as_deref().is_some_and(hit)
        });
    if summary {
        return true;
    }

    body.is_some_and(|body| hit(&body.text) || hit(&strip_html(&body.html)))
}

/// Text content of an HTML fragment: tags, comments, scripts and styles
/// removed, entities decoded, whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("<!--") {
            rest = tail.find("-->").map_or("", |end| &tail[end + 3..]);
            continue;
        }

        let Some(end) = tail.find('>') else {
            rest = "";
            break;
        };
        let tag = tail[1..end].trim_start().to_ascii_lowercase();
        rest = &tail[end + 1..];

        for raw_block in ["script", "style"] {
            if tag.starts_with(raw_block) && !tag.starts_with(&format!("{raw_block}/")) {
                let closing = format!("</{raw_block}");
                rest = match rest.to_ascii_lowercase().find(&closing) {
                    Some(at) => rest[at..].find('>').map_or("", |gt| &rest[at + gt + 1..]),
                    None => "",
                };
            }
        }

        text.push(' ');
    }
    text.push_str(rest);

    let decoded = html_escape::decode_html_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
