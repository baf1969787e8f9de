//! Local persistence: the link registry and the per-release record files.
//!
//! # Layout
//!
//! ```text
//! links.txt                # registry, one relative URL per line
//! links.txt.old            # registry as it was before the last collection run
//! data/
//! ├── _opa_pr_some-release.json
//! └── _opa_pr_another-release.json
//! ```
//!
//! Both the registry and records are written to a `.tmp` sibling first and
//! renamed into place, so a killed process never leaves a half-written file
//! under the final name.

use crate::config::ScraperConfig;
use crate::error::{ScrapeError, ScrapeResult};
use crate::models::ReleaseRecord;
use crate::utils::record_file_name;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
    registry_path: PathBuf,
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

fn parse_registry(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

async fn write_atomic(path: &Path, contents: &[u8]) -> ScrapeResult<()> {
    let tmp = with_suffix(path, ".tmp");
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>, registry_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            registry_path: registry_path.into(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(&config.data_dir, &config.registry_path)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry_path(&self) -> &Path {
        &self.registry_path
    }

    pub fn backup_path(&self) -> PathBuf {
        with_suffix(&self.registry_path, ".old")
    }

    pub fn record_path(&self, url: &str) -> PathBuf {
        self.data_dir.join(record_file_name(url))
    }

    pub async fn has_record(&self, url: &str) -> ScrapeResult<bool> {
        Ok(fs::try_exists(self.record_path(url)).await?)
    }

    #[instrument(level = "debug", skip(self, record))]
    pub async fn write_record(&self, url: &str, record: &ReleaseRecord) -> ScrapeResult<PathBuf> {
        let path = self.record_path(url);
        let json = serde_json::to_vec(record)?;
        write_atomic(&path, &json).await?;
        debug!(path = %path.display(), bytes = json.len(), "Wrote record");
        Ok(path)
    }

    /// Move the current registry aside and return its entries.
    ///
    /// The registry is renamed to [`Storage::backup_path`] before anything
    /// else happens. When no registry exists but a backup does (the previous
    /// collection died after its rename), the backup is loaded instead.
    #[instrument(level = "info", skip(self))]
    pub async fn load_registry_for_collection(&self) -> ScrapeResult<Vec<String>> {
        let backup = self.backup_path();
        if fs::try_exists(&self.registry_path).await? {
            fs::rename(&self.registry_path, &backup).await?;
            info!(backup = %backup.display(), "Backed up existing registry");
        } else if fs::try_exists(&backup).await? {
            warn!(backup = %backup.display(), "Registry missing; resuming from backup");
        } else {
            info!("No existing registry; starting fresh");
            return Ok(Vec::new());
        }

        let urls = parse_registry(&fs::read_to_string(&backup).await?);
        info!(count = urls.len(), "Loaded known release URLs");
        Ok(urls)
    }

    /// Read the registry for extraction. Fails if it has never been written.
    pub async fn read_registry(&self) -> ScrapeResult<Vec<String>> {
        if !fs::try_exists(&self.registry_path).await? {
            return Err(ScrapeError::MissingInput(self.registry_path.clone()));
        }
        Ok(parse_registry(&fs::read_to_string(&self.registry_path).await?))
    }

    #[instrument(level = "info", skip_all, fields(count = urls.len()))]
    pub async fn write_registry(&self, urls: &[String]) -> ScrapeResult<()> {
        write_atomic(&self.registry_path, urls.join("\n").as_bytes()).await?;
        info!(path = %self.registry_path.display(), "Wrote registry");
        Ok(())
    }

    /// All `*.json` record files in the data directory, sorted by name.
    ///
    /// `exclude` names an output file that may live inside the data
    /// directory (e.g. the combined dataset); it is never listed as a record.
    pub async fn record_files(&self, exclude: Option<&Path>) -> ScrapeResult<Vec<PathBuf>> {
        let excluded = match exclude {
            Some(path) => fs::canonicalize(path).await.ok(),
            None => None,
        };

        let mut files = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json")) || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(excluded) = &excluded {
                if excluded.file_name() == path.file_name()
                    && fs::canonicalize(&path).await? == *excluded
                {
                    debug!(path = %path.display(), "Skipping output file in data directory");
                    continue;
                }
            }
            files.push(path);
        }
        files.sort();
        Ok(files)
    }
}
