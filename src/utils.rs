//! Utility functions for file naming, string handling, and file system checks.

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Characters that cannot appear in a single path component on common filesystems.
const FLATTENED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Flatten a release URL into a single-component record file name.
///
/// Path separators (and other characters filesystems reject) become `_`,
/// and `.json` is appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(record_file_name("/opa/pr/some-release"), "_opa_pr_some-release.json");
/// ```
pub fn record_file_name(url: &str) -> String {
    let flat: String = url
        .chars()
        .map(|c| if FLATTENED_CHARS.contains(&c) { '_' } else { c })
        .collect();
    format!("{flat}.json")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at `max` bytes (backing off to a char boundary) with
/// an ellipsis and the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch_path = path.join("..__write_check__");
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Data directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
