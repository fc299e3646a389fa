use crate::error::{AppError, AppResult};

/// Profile names become file names, so only a conservative charset is allowed.
pub fn resolve_profile(requested: &str) -> AppResult<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Ok("default".to_string());
    }

    let valid = trimmed
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
    if !valid || trimmed.starts_with('.') {
        return Err(AppError::InvalidInput(format!(
            "invalid profile name `{trimmed}`; use letters, digits, `-`, `_` or `.`"
        )));
    }

    Ok(trimmed.to_string())
}
