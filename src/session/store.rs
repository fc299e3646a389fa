use std::fs;

use crate::config::AppPaths;
use crate::error::AppResult;

use super::Session;

pub trait SessionStore {
    fn load(&self, profile: &str) -> AppResult<Session>;
    fn save(&self, profile: &str, session: &Session) -> AppResult<()>;
    fn clear(&self, profile: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    paths: AppPaths,
}

impl FileSessionStore {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, profile: &str) -> AppResult<Session> {
        let path = self.paths.session_file(profile);
        if !path.exists() {
            return Ok(Session::default());
        }

        let raw = fs::read_to_string(path)?;
        let session = serde_json::from_str(&raw)?;
        Ok(session)
    }

    fn save(&self, profile: &str, session: &Session) -> AppResult<()> {
        let path = self.paths.session_file(profile);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Staged next to the target so the rename stays on one filesystem.
        let staging = path.with_extension("json.tmp");
        let payload = serde_json::to_string_pretty(session)?;
        fs::write(&staging, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(&staging)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&staging, perms)?;
        }

        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn clear(&self, profile: &str) -> AppResult<()> {
        let path = self.paths.session_file(profile);
        if path.exists() {
            fs::remove_file(path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;

    use super::*;
    use crate::session::AccountRef;

    fn scratch_store() -> (TempDir, FileSessionStore) {
        let root = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::rooted(root.path().join("config"), root.path().join("data"))
            .expect("paths");
        (root, FileSessionStore::new(paths))
    }

    #[test]
    fn missing_session_loads_as_default() {
        let (_root, store) = scratch_store();
        assert_eq!(store.load("default").expect("load"), Session::default());
    }

    #[test]
    fn saves_loads_and_clears() {
        let (_root, store) = scratch_store();
        let now = Utc::now();
        let mut session = Session::default();
        session.activate(
            AccountRef {
                id: None,
                email: "a@dom.test".to_string(),
            },
            "tok",
            now,
        );

        store.save("work", &session).expect("save");
        assert_eq!(store.load("work").expect("load"), session);
        assert_eq!(store.load("default").expect("other profile"), Session::default());

        store.clear("work").expect("clear");
        assert_eq!(store.load("work").expect("reload"), Session::default());
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let (_root, store) = scratch_store();
        store.save("default", &Session::default()).expect("save");
        store.save("default", &Session::default()).expect("overwrite");

        let path = store.paths.session_file("default");
        let mode = fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
