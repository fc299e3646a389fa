use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};

use super::record::{MirrorFlag, MirrorRecord};
use super::store::MirrorStore;

/// Local JSON file holding mirror rows for every account of one profile.
#[derive(Debug)]
pub struct FileMirror {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMirror {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_rows(&self) -> AppResult<Vec<MirrorRecord>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|err| {
            AppError::Mirror(format!(
                "unreadable mirror file {}: {err}",
                self.path.display()
            ))
        })
    }

    async fn write_rows(&self, rows: &[MirrorRecord]) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(rows)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).await?;
        fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl MirrorStore for FileMirror {
    async fn insert_if_absent(&self, record: &MirrorRecord) -> AppResult<bool> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows().await?;

        let exists = rows.iter().any(|row| {
            row.account_email == record.account_email && row.message_id == record.message_id
        });
        if exists {
            return Ok(false);
        }

        rows.push(record.clone());
        self.write_rows(&rows).await?;
        debug!(message_id = %record.message_id, "mirrored message to local file");
        Ok(true)
    }

    async fn insert_all_if_absent(&self, records: &[MirrorRecord]) -> AppResult<usize> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows().await?;

        let mut written = 0;
        for record in records {
            let exists = rows.iter().any(|row| {
                row.account_email == record.account_email && row.message_id == record.message_id
            });
            if !exists {
                rows.push(record.clone());
                written += 1;
            }
        }

        if written > 0 {
            self.write_rows(&rows).await?;
            debug!(written, "mirrored messages to local file");
        }
        Ok(written)
    }

    async fn list_for_account(&self, account_email: &str) -> AppResult<Vec<MirrorRecord>> {
        let _guard = self.lock.lock().await;
        let mut rows = self
            .read_rows()
            .await?
            .into_iter()
            .filter(|row| row.account_email == account_email)
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find(&self, account_email: &str, message_id: &str) -> AppResult<Option<MirrorRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_rows()
            .await?
            .into_iter()
            .find(|row| row.account_email == account_email && row.message_id == message_id))
    }

    async fn set_flag(
        &self,
        account_email: &str,
        message_id: &str,
        flag: MirrorFlag,
        value: bool,
    ) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut rows = self.read_rows().await?;

        let mut touched = false;
        for row in rows
            .iter_mut()
            .filter(|row| row.account_email == account_email && row.message_id == message_id)
        {
            match flag {
                MirrorFlag::Seen => row.seen = value,
                MirrorFlag::Deleted => row.is_deleted = value,
            }
            touched = true;
        }

        if touched {
            self.write_rows(&rows).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn scratch_mirror() -> (TempDir, FileMirror) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mirror = FileMirror::new(dir.path().join("mirror").join("default.json"));
        (dir, mirror)
    }

    fn record(id: &str, account: &str, hour: u32) -> MirrorRecord {
        let at = Utc.with_ymd_and_hms(2024, 2, 2, hour, 0, 0).unwrap();
        MirrorRecord {
            message_id: id.to_string(),
            account_email: account.to_string(),
            from_address: "sender@site.test".to_string(),
            from_name: None,
            to_addresses: Vec::new(),
            subject: format!("subject {id}"),
            intro: None,
            text_content: Some("original".to_string()),
            html_content: None,
            seen: false,
            is_deleted: false,
            has_attachments: false,
            size: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[tokio::test]
    async fn insert_is_write_once() {
        let (_dir, mirror) = scratch_mirror();

        assert!(mirror.insert_if_absent(&record("1", "a@x.test", 1)).await.expect("insert"));

        let mut changed = record("1", "a@x.test", 1);
        changed.text_content = Some("rewritten".to_string());
        assert!(!mirror.insert_if_absent(&changed).await.expect("second insert"));

        let stored = mirror.find("a@x.test", "1").await.expect("find").expect("row");
        assert_eq!(stored.text_content.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn batch_insert_skips_present_and_repeated_rows() {
        let (_dir, mirror) = scratch_mirror();
        mirror.insert_if_absent(&record("1", "a@x.test", 1)).await.expect("seed");

        let mut changed = record("1", "a@x.test", 1);
        changed.text_content = Some("rewritten".to_string());
        let batch = [
            changed,
            record("2", "a@x.test", 2),
            record("2", "a@x.test", 2),
            record("1", "b@x.test", 3),
        ];
        assert_eq!(mirror.insert_all_if_absent(&batch).await.expect("batch"), 2);
        assert_eq!(mirror.insert_all_if_absent(&batch).await.expect("again"), 0);

        let rows = mirror.list_for_account("a@x.test").await.expect("list");
        assert_eq!(rows.len(), 2);
        let first = mirror.find("a@x.test", "1").await.expect("find").expect("row");
        assert_eq!(first.text_content.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn empty_batch_creates_no_file() {
        let (dir, mirror) = scratch_mirror();
        assert_eq!(mirror.insert_all_if_absent(&[]).await.expect("batch"), 0);
        assert!(!dir.path().join("mirror").join("default.json").exists());
    }

    #[tokio::test]
    async fn lists_scoped_rows_newest_first_and_updates_flags() {
        let (_dir, mirror) = scratch_mirror();

        for row in [
            record("old", "a@x.test", 1),
            record("new", "a@x.test", 5),
            record("other", "b@x.test", 3),
        ] {
            mirror.insert_if_absent(&row).await.expect("insert");
        }

        mirror
            .set_flag("a@x.test", "old", MirrorFlag::Deleted, true)
            .await
            .expect("flag");

        let rows = mirror.list_for_account("a@x.test").await.expect("list");
        let ids = rows.iter().map(|row| row.message_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["new", "old"]);
        assert!(rows[1].is_deleted);
    }
}
