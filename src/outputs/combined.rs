//! Combined newline-delimited JSON output.
//!
//! Every record file in the data directory is copied verbatim onto its own
//! line of a single output file. Records are not re-parsed; the combined file
//! is valid NDJSON as long as each record file holds one JSON object.

use crate::error::ScrapeResult;
use crate::storage::Storage;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, instrument};

/// Log progress after this many files.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Rebuild `output` from all record files and return how many were combined.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub async fn combine(storage: &Storage, output: &Path) -> ScrapeResult<usize> {
    let files = storage.record_files(Some(output)).await?;
    let total = files.len();
    info!(total, "Loading record files");

    let mut writer = BufWriter::new(fs::File::create(output).await?);
    let mut combined = 0usize;
    for path in &files {
        let raw = fs::read(path).await?;
        writer.write_all(raw.trim_ascii_end()).await?;
        writer.write_all(b"\n").await?;
        combined += 1;

        if combined % PROGRESS_INTERVAL == 0 {
            info!(combined, total, "...loaded");
        }
    }
    writer.flush().await?;

    info!(combined, output = %output.display(), "Combined record files");
    Ok(combined)
}
