pub mod service;
pub mod state;
pub mod store;

pub use service::{AccountService, AccountStatus, LoginResult, Registration};
pub use state::{AccountRef, SavedAccount, Session};
pub use store::{FileSessionStore, SessionStore};
