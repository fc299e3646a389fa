use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::api::{MailProvider, MailTmClient, RetryPolicy};
use crate::config::{self, AppPaths, Settings};
use crate::error::{AppError, AppResult};
use crate::mirror::{FileMirror, MirrorStore, RestMirror};
use crate::output::Output;
use crate::session::{AccountService, FileSessionStore, SessionStore};
use crate::sync::{SyncOptions, SyncScope, Synchronizer};

pub struct AppContext {
    pub profile: String,
    pub paths: AppPaths,
    pub settings: Settings,
    pub session_store: FileSessionStore,
    pub provider: Arc<dyn MailProvider>,
    pub mirror: Arc<dyn MirrorStore>,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile)?;
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let session_store = FileSessionStore::new(paths.clone());

        let retry = RetryPolicy::new(settings.retry_attempts(), settings.retry_base_delay());
        let provider: Arc<dyn MailProvider> =
            Arc::new(MailTmClient::new(settings.api_base_url(), retry));

        let mirror: Arc<dyn MirrorStore> = match settings.mirror_remote()? {
            Some((url, key)) => {
                debug!(url, "using remote mirror");
                Arc::new(RestMirror::new(url, key))
            }
            None => {
                let path = paths.mirror_file(&profile);
                debug!(path = %path.display(), "using local file mirror");
                Arc::new(FileMirror::new(path))
            }
        };

        let output = Output::new(json);

        Ok(Self {
            profile,
            paths,
            settings,
            session_store,
            provider,
            mirror,
            output,
        })
    }

    /// Synchronizer bound to the active session. `page_size` overrides the
    /// profile setting.
    pub fn synchronizer(&self, page_size: Option<u32>) -> AppResult<Synchronizer> {
        let now = Utc::now();
        let session = self.session_store.load(&self.profile)?;
        let token = session
            .active_token(now)
            .map(ToOwned::to_owned)
            .ok_or(AppError::AuthMissing)?;
        let account = session.active_account(now).cloned();

        let options = SyncOptions {
            page_size: page_size.unwrap_or_else(|| self.settings.page_size()),
            prefetch_concurrency: self.settings.prefetch_concurrency(),
        };

        Ok(Synchronizer::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.mirror),
            SyncScope { token, account },
            options,
        ))
    }

    /// Forces a fresh login when the provider rejected the stored token.
    pub fn handle_rejected_session<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(err) = &result {
            if err.is_auth_rejected() {
                AccountService::expire(&self.session_store, &self.profile)?;
            }
        }
        result
    }
}
