use async_trait::async_trait;

use crate::error::AppResult;

use super::record::{MirrorFlag, MirrorRecord};

/// Durable copy of provider messages, scoped by account address.
///
/// Content columns are write-once: `insert_if_absent` never touches an
/// existing row, and only the boolean flags can change afterwards.
#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Returns `true` when a new row was written.
    async fn insert_if_absent(&self, record: &MirrorRecord) -> AppResult<bool>;

    /// Inserts every record not yet present and returns how many rows were
    /// written. Stops at the first failing insert.
    async fn insert_all_if_absent(&self, records: &[MirrorRecord]) -> AppResult<usize> {
        let mut written = 0;
        for record in records {
            if self.insert_if_absent(record).await? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// All rows for the account, most recent first.
    async fn list_for_account(&self, account_email: &str) -> AppResult<Vec<MirrorRecord>>;

    async fn find(&self, account_email: &str, message_id: &str) -> AppResult<Option<MirrorRecord>>;

    async fn set_flag(
        &self,
        account_email: &str,
        message_id: &str,
        flag: MirrorFlag,
        value: bool,
    ) -> AppResult<()>;
}
