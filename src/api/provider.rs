use async_trait::async_trait;

use crate::error::AppResult;

use super::models::{Domain, IssuedToken, MessageDetail, MessagePage, ProviderAccount};

/// Capabilities of the remote mailbox provider.
///
/// Arguments are passed through as given; implementations do no business
/// validation of their own.
#[async_trait]
pub trait MailProvider: Send + Sync {
    async fn list_domains(&self) -> AppResult<Vec<Domain>>;

    async fn create_account(&self, address: &str, password: &str) -> AppResult<ProviderAccount>;

    async fn issue_token(&self, address: &str, password: &str) -> AppResult<IssuedToken>;

    async fn me(&self, token: &str) -> AppResult<ProviderAccount>;

    async fn list_messages(&self, token: &str, page: u32, per_page: u32) -> AppResult<MessagePage>;

    async fn get_message(&self, token: &str, id: &str) -> AppResult<MessageDetail>;

    async fn mark_seen(&self, token: &str, id: &str) -> AppResult<()>;

    async fn delete_message(&self, token: &str, id: &str) -> AppResult<()>;

    async fn delete_account(&self, token: &str, account_id: &str) -> AppResult<()>;
}
