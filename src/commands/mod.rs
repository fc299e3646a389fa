pub mod account;
pub mod export;
pub mod get;
pub mod list;
pub mod read;
pub mod rm;
pub mod watch;
