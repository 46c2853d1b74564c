//! Validation of caller-supplied names used as path segments.
//!
//! Tokens, database names and table names all become directory names, so
//! they are checked before any path is built from them.

use crate::error::{Result, StoreError};

/// Longest name accepted, in bytes. Matches the common `NAME_MAX`.
pub const MAX_NAME_LEN: usize = 255;

/// Determine whether `name` is safe to use as a single path segment.
///
/// Rejects empty names, names starting with `.` (which also covers `.` and
/// `..` and keeps the store's own `.staging` directories out of reach),
/// path separators of either platform, ASCII control characters and names
/// longer than [`MAX_NAME_LEN`].
pub fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains(|c: char| c < ' ' || c == '\x7F')
}

/// Return `Ok(name)` if safe, otherwise `StoreError::InvalidName`.
pub fn check_name(name: &str) -> Result<&str> {
    if is_safe_name(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
