pub mod client;
pub mod endpoints;
pub mod models;
pub mod provider;
pub mod retry;

pub use client::MailTmClient;
pub use provider::MailProvider;
pub use retry::RetryPolicy;
