#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Notify;

use tempmail::api::MailProvider;
use tempmail::api::models::{
    Address, Domain, IssuedToken, Message, MessageBody, MessageDetail, MessagePage,
    ProviderAccount,
};
use tempmail::error::{AppError, AppResult};
use tempmail::mirror::{MirrorFlag, MirrorRecord, MirrorStore};
use tempmail::session::{AccountRef, Session, SessionStore};
use tempmail::sync::{SyncOptions, SyncScope, Synchronizer};

pub const ACCOUNT: &str = "alice@dom.test";
pub const TOKEN: &str = "tok-1";

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Message created `minutes` after the base time.
pub fn message(id: &str, minutes: i64, subject: &str) -> Message {
    let at = base_time() + Duration::minutes(minutes);
    Message {
        id: id.to_string(),
        account_id: Some("acc-1".to_string()),
        msgid: None,
        from: Address {
            address: "sender@shop.test".to_string(),
            name: Some("Shop".to_string()),
        },
        to: vec![Address {
            address: ACCOUNT.to_string(),
            name: None,
        }],
        subject: subject.to_string(),
        intro: format!("intro of {subject}"),
        seen: false,
        is_deleted: false,
        has_attachments: false,
        size: 1024,
        created_at: at,
        updated_at: at,
    }
}

pub fn detail(message: Message, text: &str) -> MessageDetail {
    MessageDetail {
        message,
        body: MessageBody {
            text: text.to_string(),
            html: format!("<p>{text}</p>"),
        },
    }
}

pub fn record(message: &Message, text: Option<&str>) -> MirrorRecord {
    let body = text.map(|text| MessageBody {
        text: text.to_string(),
        html: String::new(),
    });
    MirrorRecord::from_message(ACCOUNT, message, body.as_ref())
}

#[derive(Default)]
pub struct FakeProvider {
    pub inbox: Mutex<Vec<MessageDetail>>,
    pub domains: Mutex<Vec<Domain>>,
    pub identity: Mutex<Option<ProviderAccount>>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub mark_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub created: Mutex<Vec<String>>,
    pub deleted_accounts: Mutex<Vec<String>>,
    pub fail_get: AtomicBool,
    pub fail_writes: AtomicBool,
    pub reject_login: AtomicBool,
    pub reject_token: AtomicBool,
    /// While set, `list_messages` signals `list_started` and waits for
    /// `list_release` before answering.
    pub hold_list: AtomicBool,
    pub list_started: Notify,
    pub list_release: Notify,
}

impl FakeProvider {
    pub fn with_inbox(details: Vec<MessageDetail>) -> Self {
        let provider = Self::default();
        *provider.inbox.lock().unwrap() = details;
        provider
    }

    pub fn remove(&self, id: &str) {
        self.inbox.lock().unwrap().retain(|detail| detail.message.id != id);
    }

    pub fn push(&self, detail: MessageDetail) {
        self.inbox.lock().unwrap().push(detail);
    }

    pub fn is_seen(&self, id: &str) -> bool {
        self.inbox
            .lock()
            .unwrap()
            .iter()
            .any(|detail| detail.message.id == id && detail.message.seen)
    }

    fn check_token(&self, token: &str) -> AppResult<()> {
        if self.reject_token.load(Ordering::SeqCst) || token.is_empty() {
            return Err(AppError::Auth("token rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MailProvider for FakeProvider {
    async fn list_domains(&self) -> AppResult<Vec<Domain>> {
        Ok(self.domains.lock().unwrap().clone())
    }

    async fn create_account(&self, address: &str, _password: &str) -> AppResult<ProviderAccount> {
        self.created.lock().unwrap().push(address.to_string());
        Ok(ProviderAccount {
            id: format!("id-{address}"),
            address: address.to_string(),
            quota: None,
            used: None,
            is_disabled: false,
            created_at: None,
        })
    }

    async fn issue_token(&self, address: &str, _password: &str) -> AppResult<IssuedToken> {
        if self.reject_login.load(Ordering::SeqCst) {
            return Err(AppError::Auth("Invalid credentials.".to_string()));
        }
        Ok(IssuedToken {
            token: format!("token-for-{address}"),
            id: Some(format!("id-{address}")),
        })
    }

    async fn me(&self, token: &str) -> AppResult<ProviderAccount> {
        self.check_token(token)?;
        self.identity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Api("identity unavailable".to_string()))
    }

    async fn list_messages(&self, token: &str, page: u32, per_page: u32) -> AppResult<MessagePage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        if self.hold_list.load(Ordering::SeqCst) {
            self.list_started.notify_one();
            self.list_release.notified().await;
        }
        let inbox = self.inbox.lock().unwrap();
        let skip = (page.saturating_sub(1) * per_page) as usize;
        Ok(MessagePage {
            messages: inbox
                .iter()
                .skip(skip)
                .take(per_page as usize)
                .map(|detail| detail.message.clone())
                .collect(),
            total_items: inbox.len() as u64,
        })
    }

    async fn get_message(&self, token: &str, id: &str) -> AppResult<MessageDetail> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(AppError::Api("provider unavailable".to_string()));
        }
        self.inbox
            .lock()
            .unwrap()
            .iter()
            .find(|detail| detail.message.id == id)
            .cloned()
            .ok_or_else(|| AppError::Api(format!("message {id} not found")))
    }

    async fn mark_seen(&self, token: &str, id: &str) -> AppResult<()> {
        self.mark_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Api("provider unavailable".to_string()));
        }
        let mut inbox = self.inbox.lock().unwrap();
        match inbox.iter_mut().find(|detail| detail.message.id == id) {
            Some(detail) => {
                detail.message.seen = true;
                Ok(())
            }
            None => Err(AppError::Api(format!("message {id} not found"))),
        }
    }

    async fn delete_message(&self, token: &str, id: &str) -> AppResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_token(token)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Api("provider unavailable".to_string()));
        }
        self.remove(id);
        Ok(())
    }

    async fn delete_account(&self, token: &str, account_id: &str) -> AppResult<()> {
        self.check_token(token)?;
        self.deleted_accounts.lock().unwrap().push(account_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMirror {
    pub rows: Mutex<Vec<MirrorRecord>>,
    pub fail: AtomicBool,
    pub inserts: AtomicUsize,
}

impl MemoryMirror {
    pub fn with_rows(rows: Vec<MirrorRecord>) -> Self {
        let mirror = Self::default();
        *mirror.rows.lock().unwrap() = rows;
        mirror
    }

    pub fn row(&self, id: &str) -> Option<MirrorRecord> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.message_id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Mirror("mirror offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for MemoryMirror {
    async fn insert_if_absent(&self, record: &MirrorRecord) -> AppResult<bool> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let exists = rows.iter().any(|row| {
            row.account_email == record.account_email && row.message_id == record.message_id
        });
        if exists {
            return Ok(false);
        }
        self.inserts.fetch_add(1, Ordering::SeqCst);
        rows.push(record.clone());
        Ok(true)
    }

    async fn list_for_account(&self, account_email: &str) -> AppResult<Vec<MirrorRecord>> {
        self.check()?;
        let mut rows = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.account_email == account_email)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find(&self, account_email: &str, message_id: &str) -> AppResult<Option<MirrorRecord>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.account_email == account_email && row.message_id == message_id)
            .cloned())
    }

    async fn set_flag(
        &self,
        account_email: &str,
        message_id: &str,
        flag: MirrorFlag,
        value: bool,
    ) -> AppResult<()> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        for row in rows
            .iter_mut()
            .filter(|row| row.account_email == account_email && row.message_id == message_id)
        {
            match flag {
                MirrorFlag::Seen => row.seen = value,
                MirrorFlag::Deleted => row.is_deleted = value,
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn get(&self, profile: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(profile).cloned()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, profile: &str) -> AppResult<Session> {
        Ok(self.get(profile).unwrap_or_default())
    }

    fn save(&self, profile: &str, session: &Session) -> AppResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(profile.to_string(), session.clone());
        Ok(())
    }

    fn clear(&self, profile: &str) -> AppResult<()> {
        self.sessions.lock().unwrap().remove(profile);
        Ok(())
    }
}

pub fn scope() -> SyncScope {
    SyncScope {
        token: TOKEN.to_string(),
        account: Some(AccountRef {
            id: Some("acc-1".to_string()),
            email: ACCOUNT.to_string(),
        }),
    }
}

pub fn synchronizer(
    provider: &Arc<FakeProvider>,
    mirror: &Arc<MemoryMirror>,
    scope: SyncScope,
) -> Synchronizer {
    Synchronizer::new(
        provider.clone(),
        mirror.clone(),
        scope,
        SyncOptions::default(),
    )
}
