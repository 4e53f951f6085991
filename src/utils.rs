//! Utility functions for string truncation, hashing, LLM response cleanup and
//! output directory checks.
//!
//! All truncation helpers count Unicode scalar values rather than bytes: the
//! monitored sites publish mostly CJK text, where byte slicing would split
//! characters.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Keep at most `max` characters of `s`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("海关总署公告", 2), "海关");
/// assert_eq!(truncate_chars("short", 100), "short");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped characters appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let total = s.chars().count();
    if total <= max {
        s.to_string()
    } else {
        format!("{}…(+{} chars)", truncate_chars(s, max), total - max)
    }
}

/// Lowercase hex SHA-256 of `text`.
///
/// Used both for URL fingerprints and for body content hashes in the history
/// file.
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Strip a markdown code fence and a leading `json` language tag from an LLM
/// response.
///
/// Models frequently wrap JSON in ```` ```json ... ``` ```` even when told not
/// to. The opening fence line is dropped as a whole, then the closing fence,
/// then a bare `json` token left at the start.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if cleaned.starts_with("```") {
        cleaned = match cleaned.split_once('\n') {
            Some((_, rest)) => rest,
            None => cleaned.trim_start_matches('`'),
        };
        if let Some(idx) = cleaned.rfind("```") {
            cleaned = &cleaned[..idx];
        }
        cleaned = cleaned.trim();
    }
    if let Some(rest) = cleaned.strip_prefix("json") {
        cleaned = rest.trim();
    }
    cleaned
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
