use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::api::models::Message;
use crate::mirror::MirrorRecord;

/// Which store an entry of the merged view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Provider,
    Mirror,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub message: Message,
    pub origin: Origin,
}

/// Combines a provider page with mirror rows into one listing.
///
/// Provider messages come first and win for ids present in both; mirror rows
/// only contribute ids the provider no longer returns. Soft-deleted rows are
/// left out. Every id appears at most once and the result is sorted newest
/// first.
pub fn merge(provider: Vec<Message>, mirror: Vec<MirrorRecord>) -> Vec<InboxEntry> {
    let mut seen_ids = HashSet::new();
    let mut merged = Vec::with_capacity(provider.len() + mirror.len());

    for message in provider {
        if seen_ids.insert(message.id.clone()) {
            merged.push(InboxEntry {
                message,
                origin: Origin::Provider,
            });
        }
    }

    for record in mirror {
        if record.is_deleted || !seen_ids.insert(record.message_id.clone()) {
            continue;
        }
        merged.push(InboxEntry {
            message: record.to_message(),
            origin: Origin::Mirror,
        });
    }

    sort_recent_first(&mut merged);
    merged
}

/// Newest first; equal timestamps fall back to id order so the result is deterministic.
pub fn sort_recent_first(entries: &mut [InboxEntry]) {
    entries.sort_by(|a, b| recency(&a.message, &b.message));
}

fn recency(a: &Message, b: &Message) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Provider page as-is, used when no account scope is available for the mirror.
pub fn provider_only(provider: Vec<Message>) -> Vec<InboxEntry> {
    merge(provider, Vec::new())
}
