//! Path segments of the provider endpoints. Ids always travel as one
//! percent-encoded segment.

use crate::error::{AppError, AppResult};

pub fn domains() -> &'static [&'static str] {
    &["domains"]
}

pub fn accounts() -> &'static [&'static str] {
    &["accounts"]
}

pub fn account(id: &str) -> AppResult<[&str; 2]> {
    Ok(["accounts", resource_id(id)?])
}

pub fn token() -> &'static [&'static str] {
    &["token"]
}

pub fn me() -> &'static [&'static str] {
    &["me"]
}

pub fn messages() -> &'static [&'static str] {
    &["messages"]
}

pub fn message(id: &str) -> AppResult<[&str; 2]> {
    Ok(["messages", resource_id(id)?])
}

pub fn page_query(page: u32, items_per_page: u32) -> Vec<(String, String)> {
    vec![
        ("page".to_string(), page.max(1).to_string()),
        ("itemsPerPage".to_string(), items_per_page.to_string()),
    ]
}

/// Dot segments would be dropped or resolved by the URL builder.
fn resource_id(id: &str) -> AppResult<&str> {
    match id.trim() {
        "" | "." | ".." => Err(AppError::InvalidInput(format!("invalid resource id `{id}`"))),
        _ => Ok(id),
    }
}
