use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Client-side lifetime of every session entry, counted from the moment it is written.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expiring<T> {
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    pub fn new(value: T, now: DateTime<Utc>) -> Self {
        Self {
            value,
            expires_at: now + Duration::hours(SESSION_LIFETIME_HOURS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn live(&self, now: DateTime<Utc>) -> Option<&T> {
        (!self.is_expired(now)).then_some(&self.value)
    }
}

/// Identity of the active mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub email: String,
}

/// Entry of the account switcher list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAccount {
    pub email: String,
    pub token: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SavedAccount {
    pub fn new(email: &str, token: &str, id: Option<String>) -> Self {
        Self {
            email: email.to_string(),
            token: token.to_string(),
            label: local_part(email).to_string(),
            id,
        }
    }
}

/// Everything the client keeps between runs: the active bearer token, the
/// active identity and the list of known accounts. Each part expires on its
/// own, like the browser cookies it stands in for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: Option<Expiring<String>>,
    #[serde(default)]
    pub account: Option<Expiring<AccountRef>>,
    #[serde(default)]
    pub accounts: Option<Expiring<Vec<SavedAccount>>>,
}

impl Session {
    pub fn active_token(&self, now: DateTime<Utc>) -> Option<&str> {
        self.token
            .as_ref()
            .and_then(|token| token.live(now))
            .map(String::as_str)
    }

    pub fn active_account(&self, now: DateTime<Utc>) -> Option<&AccountRef> {
        self.account.as_ref().and_then(|account| account.live(now))
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token.as_ref().map(|token| token.expires_at)
    }

    pub fn accounts(&self, now: DateTime<Utc>) -> &[SavedAccount] {
        self.accounts
            .as_ref()
            .and_then(|accounts| accounts.live(now))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Makes `account` active with `token` and records it in the account list.
    pub fn activate(&mut self, account: AccountRef, token: &str, now: DateTime<Utc>) {
        let mut accounts = self.accounts(now).to_vec();
        let saved = SavedAccount::new(&account.email, token, account.id.clone());
        match accounts.iter_mut().find(|entry| same_address(&entry.email, &account.email)) {
            Some(entry) => *entry = saved,
            None => accounts.push(saved),
        }

        self.token = Some(Expiring::new(token.to_string(), now));
        self.account = Some(Expiring::new(account, now));
        self.accounts = Some(Expiring::new(accounts, now));
    }

    /// Re-activates a stored account. The full inbox view is rebuilt on the next refresh.
    pub fn switch_to(&mut self, email: &str, now: DateTime<Utc>) -> AppResult<SavedAccount> {
        let wanted = |entry: &&SavedAccount| same_address(&entry.email, email);
        let Some(saved) = self.accounts(now).iter().find(wanted).cloned() else {
            let expired = self
                .accounts
                .as_ref()
                .is_some_and(|accounts| accounts.value.iter().any(|entry| wanted(&entry)));
            if expired {
                return Err(AppError::Auth(format!(
                    "stored session for `{email}` expired. run `tempmail account login`"
                )));
            }
            return Err(AppError::InvalidInput(format!(
                "unknown account `{email}`; run `tempmail account ls` to list stored accounts"
            )));
        };

        self.token = Some(Expiring::new(saved.token.clone(), now));
        self.account = Some(Expiring::new(
            AccountRef {
                id: saved.id.clone(),
                email: saved.email.clone(),
            },
            now,
        ));
        Ok(saved)
    }

    /// Drops the active token and identity; the account list stays.
    pub fn sign_out(&mut self) {
        self.token = None;
        self.account = None;
    }

    /// Removes an account from the list, signing out if it was the active one.
    pub fn forget(&mut self, email: &str, now: DateTime<Utc>) {
        let remaining = self
            .accounts(now)
            .iter()
            .filter(|entry| !same_address(&entry.email, email))
            .cloned()
            .collect::<Vec<_>>();
        self.accounts = Some(Expiring::new(remaining, now));

        let was_active = self
            .account
            .as_ref()
            .is_some_and(|account| same_address(&account.value.email, email));
        if was_active {
            self.sign_out();
        }
    }
}

/// Addresses compare case-insensitively, ignoring surrounding whitespace.
pub fn same_address(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

pub fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
