use std::sync::LazyLock;

use regex::Regex;

use crate::CoreError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._]{1,64}$").expect("valid regex"));

/// Canonical form of an account handle: trimmed, leading `@` removed, lowercased.
///
/// # Errors
///
/// Returns [`CoreError::EmptyUsername`] for blank input and
/// [`CoreError::InvalidUsername`] when the handle contains characters other
/// than letters, digits, `.` and `_`, or is longer than 64 characters.
pub fn normalize_username(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed).to_lowercase();

    if handle.is_empty() {
        return Err(CoreError::EmptyUsername);
    }
    if !USERNAME_RE.is_match(&handle) {
        return Err(CoreError::InvalidUsername(raw.to_string()));
    }
    Ok(handle)
}
