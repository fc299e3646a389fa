use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::MailProvider;
use crate::api::models::Domain;
use crate::error::{AppError, AppResult};

use super::state::{AccountRef, Session};
use super::store::SessionStore;

const GENERATED_USERNAME_LEN: usize = 10;
const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: Option<String>,
    pub domain: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    pub profile: String,
    pub address: String,
    pub account_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_password: Option<String>,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct AccountListing {
    pub email: String,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct AccountStatus {
    pub profile: String,
    pub logged_in: bool,
    pub address: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_seconds: Option<i64>,
    pub accounts: Vec<AccountListing>,
    pub note: Option<String>,
}

/// Account flows that touch both the provider and the session store.
#[derive(Debug, Default)]
pub struct AccountService;

impl AccountService {
    pub async fn domains(provider: &dyn MailProvider) -> AppResult<Vec<Domain>> {
        provider.list_domains().await
    }

    pub async fn register<S: SessionStore>(
        provider: &dyn MailProvider,
        store: &S,
        profile: &str,
        registration: Registration,
    ) -> AppResult<LoginResult> {
        let domain = match registration.domain {
            Some(domain) => domain.trim().trim_start_matches('@').to_string(),
            None => pick_domain(&provider.list_domains().await?)?,
        };

        let username = registration
            .username
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| random_string(GENERATED_USERNAME_LEN).to_ascii_lowercase());

        let (password, generated) = match registration.password {
            Some(password) if !password.is_empty() => (password, false),
            _ => (random_string(GENERATED_PASSWORD_LEN), true),
        };

        let address = format!("{username}@{domain}");
        let created = provider.create_account(&address, &password).await?;
        info!(address = %created.address, "created provider account");

        let mut result = Self::login(provider, store, profile, &created.address, &password).await?;
        if generated {
            result.generated_password = Some(password);
        }
        result.note = "account created and logged in".to_string();
        Ok(result)
    }

    pub async fn login<S: SessionStore>(
        provider: &dyn MailProvider,
        store: &S,
        profile: &str,
        address: &str,
        password: &str,
    ) -> AppResult<LoginResult> {
        let issued = provider.issue_token(address, password).await.map_err(|err| match err {
            AppError::Api(message) | AppError::Auth(message) => {
                AppError::Auth(format!("login failed for {address}: {message}"))
            }
            other => other,
        })?;

        let identity = match provider.me(&issued.token).await {
            Ok(me) => AccountRef {
                id: Some(me.id),
                email: me.address,
            },
            Err(err) => {
                warn!("identity lookup failed after login, using submitted address: {err}");
                AccountRef {
                    id: issued.id.clone(),
                    email: address.to_string(),
                }
            }
        };

        let now = Utc::now();
        let mut session = store.load(profile)?;
        session.activate(identity.clone(), &issued.token, now);
        store.save(profile, &session)?;
        info!(address = %identity.email, "session activated");

        Ok(LoginResult {
            profile: profile.to_string(),
            address: identity.email,
            account_id: identity.id,
            expires_at: session.token_expires_at(),
            generated_password: None,
            note: "logged in and session stored".to_string(),
        })
    }

    pub fn switch<S: SessionStore>(store: &S, profile: &str, email: &str) -> AppResult<AccountStatus> {
        let now = Utc::now();
        let mut session = store.load(profile)?;
        let saved = session.switch_to(email, now)?;
        store.save(profile, &session)?;
        info!(address = %saved.email, "switched active account");

        Ok(status_of(profile, &session, now, Some("active account switched".to_string())))
    }

    pub fn status<S: SessionStore>(store: &S, profile: &str) -> AppResult<AccountStatus> {
        let now = Utc::now();
        let session = store.load(profile)?;
        let note = match (session.active_token(now), session.token.as_ref()) {
            (Some(_), _) => None,
            (None, Some(_)) => Some("session expired; log in again".to_string()),
            (None, None) => Some("no active session".to_string()),
        };
        Ok(status_of(profile, &session, now, note))
    }

    pub fn logout<S: SessionStore>(store: &S, profile: &str, all: bool) -> AppResult<AccountStatus> {
        let now = Utc::now();
        if all {
            store.clear(profile)?;
            return Ok(status_of(
                profile,
                &Session::default(),
                now,
                Some("all stored accounts removed".to_string()),
            ));
        }

        let mut session = store.load(profile)?;
        session.sign_out();
        store.save(profile, &session)?;
        Ok(status_of(
            profile,
            &session,
            now,
            Some("signed out; stored accounts kept".to_string()),
        ))
    }

    /// Clears the active token after the provider rejected it, forcing a fresh login.
    pub fn expire<S: SessionStore>(store: &S, profile: &str) -> AppResult<()> {
        let mut session = store.load(profile)?;
        if session.token.is_none() {
            return Ok(());
        }

        session.sign_out();
        store.save(profile, &session)?;
        warn!(profile, "provider rejected the active token; session cleared");
        Ok(())
    }

    pub async fn delete<S: SessionStore>(
        provider: &dyn MailProvider,
        store: &S,
        profile: &str,
    ) -> AppResult<AccountStatus> {
        let now = Utc::now();
        let mut session = store.load(profile)?;
        let token = session
            .active_token(now)
            .map(ToOwned::to_owned)
            .ok_or(AppError::AuthMissing)?;

        let account = match session.active_account(now).cloned() {
            Some(AccountRef { id: Some(id), email }) => AccountRef { id: Some(id), email },
            _ => {
                let me = provider.me(&token).await?;
                AccountRef {
                    id: Some(me.id),
                    email: me.address,
                }
            }
        };
        let account_id = account.id.as_deref().unwrap_or_default();

        provider.delete_account(&token, account_id).await?;
        session.forget(&account.email, now);
        store.save(profile, &session)?;
        info!(address = %account.email, "deleted provider account");

        Ok(status_of(
            profile,
            &session,
            now,
            Some(format!("account {} deleted", account.email)),
        ))
    }
}

fn status_of(profile: &str, session: &Session, now: DateTime<Utc>, note: Option<String>) -> AccountStatus {
    let active_email = session.active_account(now).map(|account| account.email.clone());
    let logged_in = session.active_token(now).is_some();
    let expires_at = session.token_expires_at().filter(|_| logged_in);

    AccountStatus {
        profile: profile.to_string(),
        logged_in,
        address: active_email.clone(),
        expires_at,
        expires_in_seconds: expires_at.map(|at| (at - now).num_seconds()),
        accounts: session
            .accounts(now)
            .iter()
            .map(|entry| AccountListing {
                email: entry.email.clone(),
                label: entry.label.clone(),
                active: logged_in && active_email.as_deref() == Some(entry.email.as_str()),
            })
            .collect(),
        note,
    }
}

fn pick_domain(domains: &[Domain]) -> AppResult<String> {
    domains
        .iter()
        .find(|domain| domain.is_active && !domain.is_private)
        .or_else(|| domains.iter().find(|domain| domain.is_active))
        .map(|domain| domain.domain.clone())
        .ok_or_else(|| AppError::Api("mail provider offers no active domain".to_string()))
}

fn random_string(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
