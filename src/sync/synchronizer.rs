use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::MailProvider;
use crate::api::models::{Message, MessageBody, MessageDetail};
use crate::error::{AppError, AppResult};
use crate::mirror::{MirrorFlag, MirrorRecord, MirrorStore};
use crate::session::AccountRef;

use super::merge::{self, InboxEntry, Origin};
use super::prefetch::{self, BodyCache};
use super::single_flight::SingleFlight;

/// Credentials and identity a synchronizer works under.
#[derive(Debug, Clone)]
pub struct SyncScope {
    pub token: String,
    /// Without an identity the mirror cannot be scoped and is skipped.
    pub account: Option<AccountRef>,
}

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub page_size: u32,
    pub prefetch_concurrency: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 30,
            prefetch_concurrency: 4,
        }
    }
}

/// Result of one refresh cycle.
#[derive(Debug, Clone, Serialize)]
pub struct InboxView {
    pub account: Option<String>,
    pub messages: Vec<InboxEntry>,
    /// Size of the merged view, mirror-only messages included.
    pub total: usize,
    /// Total the provider reported for its own listing.
    pub provider_total: u64,
    #[serde(skip)]
    pub bodies: BodyCache,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenedMessage {
    #[serde(flatten)]
    pub detail: MessageDetail,
    pub origin: Origin,
}

/// Outcome of a best-effort write to both stores. Neither half failing makes
/// the operation fail; the flags only report what went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DualWrite {
    pub provider: bool,
    pub mirror: bool,
}

/// Reconciles the provider inbox with the mirror for one account.
pub struct Synchronizer {
    provider: Arc<dyn MailProvider>,
    mirror: Arc<dyn MirrorStore>,
    scope: SyncScope,
    options: SyncOptions,
    bodies: Mutex<BodyCache>,
    flight: SingleFlight,
}

impl Synchronizer {
    pub fn new(
        provider: Arc<dyn MailProvider>,
        mirror: Arc<dyn MirrorStore>,
        scope: SyncScope,
        options: SyncOptions,
    ) -> Self {
        Self {
            provider,
            mirror,
            scope,
            options,
            bodies: Mutex::new(BodyCache::new()),
            flight: SingleFlight::new(),
        }
    }

    pub fn account_email(&self) -> Option<&str> {
        self.scope.account.as_ref().map(|account| account.email.as_str())
    }

    /// Runs one full refresh cycle for the given provider page.
    pub async fn refresh(&self, page: u32) -> AppResult<InboxView> {
        let fetched = self
            .provider
            .list_messages(&self.scope.token, page, self.options.page_size)
            .await?;
        let provider_total = fetched.total_items;
        let messages = fetched.messages;

        self.prefetch_missing(&messages).await;

        let Some(account_email) = self.account_email() else {
            debug!("no account identity; returning provider page without mirror");
            let entries = merge::provider_only(messages);
            return Ok(self.view(None, entries, provider_total));
        };

        self.mirror_page(account_email, &messages).await;

        let mirrored = match self.mirror.list_for_account(account_email).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(account = account_email, "mirror query failed, showing provider page only: {err}");
                Vec::new()
            }
        };
        self.remember_mirrored_bodies(&mirrored);

        let entries = merge::merge(messages, mirrored);
        debug!(
            account = account_email,
            merged = entries.len(),
            provider_total,
            "refresh cycle complete"
        );
        Ok(self.view(Some(account_email.to_string()), entries, provider_total))
    }

    /// Like [`Synchronizer::refresh`], but returns `None` when another refresh
    /// of this synchronizer is still running.
    pub async fn refresh_coalesced(&self, page: u32) -> Option<AppResult<InboxView>> {
        let outcome = self.flight.run(self.refresh(page)).await;
        if outcome.is_none() {
            debug!("refresh already in flight; tick coalesced");
        }
        outcome
    }

    /// Loads one message with its body, preferring the provider and falling
    /// back to the mirror when the provider cannot serve it.
    pub async fn get_message(&self, id: &str) -> AppResult<OpenedMessage> {
        let provider_err = match self.provider.get_message(&self.scope.token, id).await {
            Ok(detail) => {
                self.cache_body(id, &detail.body);
                if let Some(account_email) = self.account_email() {
                    let record = MirrorRecord::from_detail(account_email, &detail);
                    if let Err(err) = self.mirror.insert_if_absent(&record).await {
                        warn!(message_id = id, "mirroring opened message failed: {err}");
                    }
                }
                return Ok(OpenedMessage {
                    detail,
                    origin: Origin::Provider,
                });
            }
            Err(err) => err,
        };

        let Some(account_email) = self.account_email() else {
            return Err(provider_err);
        };
        debug!(message_id = id, "provider fetch failed, trying mirror: {provider_err}");

        match self.mirror.find(account_email, id).await {
            Ok(Some(record)) if !record.is_deleted => {
                let detail = record.to_detail();
                self.cache_body(id, &detail.body);
                Ok(OpenedMessage {
                    detail,
                    origin: Origin::Mirror,
                })
            }
            Ok(_) => Err(AppError::NotFound(format!(
                "message {id} is neither at the provider nor in the mirror"
            ))),
            Err(err) => {
                warn!(message_id = id, "mirror lookup failed: {err}");
                Err(AppError::NotFound(format!(
                    "message {id} is unavailable from the provider and the mirror"
                )))
            }
        }
    }

    /// Marks a message seen in both stores, best-effort.
    pub async fn mark_as_read(&self, id: &str) -> DualWrite {
        let provider = match self.provider.mark_seen(&self.scope.token, id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(message_id = id, "provider mark-seen failed: {err}");
                false
            }
        };

        let mirror = self.set_mirror_flag(id, MirrorFlag::Seen).await;
        DualWrite { provider, mirror }
    }

    /// Hard-deletes at the provider and soft-deletes in the mirror. The mirror
    /// flag is written whatever the provider answered.
    pub async fn delete(&self, id: &str) -> DualWrite {
        let provider = match self.provider.delete_message(&self.scope.token, id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(message_id = id, "provider delete failed: {err}");
                false
            }
        };

        let mirror = self.set_mirror_flag(id, MirrorFlag::Deleted).await;
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        DualWrite { provider, mirror }
    }

    /// Snapshot of every body fetched or mirrored so far.
    pub fn cached_bodies(&self) -> BodyCache {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn prefetch_missing(&self, messages: &[Message]) {
        let missing = {
            let cache = self.bodies.lock().unwrap_or_else(PoisonError::into_inner);
            messages
                .iter()
                .filter(|message| !cache.contains_key(&message.id))
                .map(|message| message.id.clone())
                .collect::<Vec<_>>()
        };

        let fetched = prefetch::prefetch_bodies(
            Arc::clone(&self.provider),
            &self.scope.token,
            missing,
            self.options.prefetch_concurrency,
        )
        .await;

        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(fetched);
    }

    async fn mirror_page(&self, account_email: &str, messages: &[Message]) {
        let records = messages
            .iter()
            .map(|message| {
                let body = self.cached_body(&message.id);
                MirrorRecord::from_message(account_email, message, body.as_ref())
            })
            .collect::<Vec<_>>();

        match self.mirror.insert_all_if_absent(&records).await {
            Ok(0) => {}
            Ok(written) => debug!(account = account_email, written, "mirrored new messages"),
            Err(err) => warn!(account = account_email, "mirror write failed: {err}"),
        }
    }

    async fn set_mirror_flag(&self, id: &str, flag: MirrorFlag) -> bool {
        let Some(account_email) = self.account_email() else {
            debug!(message_id = id, "no account identity; mirror flag not written");
            return false;
        };

        match self.mirror.set_flag(account_email, id, flag, true).await {
            Ok(()) => true,
            Err(err) => {
                warn!(message_id = id, flag = flag.column(), "mirror flag update failed: {err}");
                false
            }
        }
    }

    fn remember_mirrored_bodies(&self, rows: &[MirrorRecord]) {
        let mut cache = self.bodies.lock().unwrap_or_else(PoisonError::into_inner);
        for row in rows.iter().filter(|row| !row.is_deleted) {
            if cache.contains_key(&row.message_id) {
                continue;
            }
            if let Some(body) = row.body() {
                cache.insert(row.message_id.clone(), body);
            }
        }
    }

    fn cache_body(&self, id: &str, body: &MessageBody) {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), body.clone());
    }

    fn cached_body(&self, id: &str) -> Option<MessageBody> {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn view(&self, account: Option<String>, messages: Vec<InboxEntry>, provider_total: u64) -> InboxView {
        let cache = self.bodies.lock().unwrap_or_else(PoisonError::into_inner);
        let bodies = messages
            .iter()
            .filter_map(|entry| {
                cache
                    .get(&entry.message.id)
                    .map(|body| (entry.message.id.clone(), body.clone()))
            })
            .collect();

        InboxView {
            account,
            total: messages.len(),
            messages,
            provider_total,
            bodies,
        }
    }
}
