use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::api::MailProvider;
use crate::api::models::MessageBody;

/// Bodies already fetched, keyed by message id.
pub type BodyCache = HashMap<String, MessageBody>;

/// Fetches message bodies with at most `concurrency` requests in flight.
///
/// A failed fetch is logged and skipped; the returned cache only holds the
/// bodies that arrived.
pub async fn prefetch_bodies(
    provider: Arc<dyn MailProvider>,
    token: &str,
    ids: Vec<String>,
    concurrency: usize,
) -> BodyCache {
    let mut bodies = BodyCache::with_capacity(ids.len());
    if ids.is_empty() {
        return bodies;
    }

    let permits = Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let token: Arc<str> = Arc::from(token);
    let mut tasks = JoinSet::new();

    for id in ids {
        let permits = Arc::clone(&permits);
        let provider = Arc::clone(&provider);
        let token = Arc::clone(&token);

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let result = provider.get_message(&token, &id).await;
            (id, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((id, Ok(detail))) => {
                bodies.insert(id, detail.body);
            }
            Ok((id, Err(err))) => warn!(message_id = %id, "body prefetch failed: {err}"),
            Err(err) => warn!("body prefetch task failed: {err}"),
        }
    }

    debug!(fetched = bodies.len(), "body prefetch finished");
    bodies
}
