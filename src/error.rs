//! Error taxonomy for the scrape pipeline.
//!
//! Every variant is fatal at the run level. The only per-item skips in the
//! pipeline (speech transcripts, records already on disk) are policy decisions
//! made by the stages themselves and never pass through this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Network fetch failed or the server answered with a non-success status.
    #[error("transport error fetching {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The link registry the detail stage depends on does not exist.
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// A required element or attribute is absent from a fetched page.
    #[error("could not extract `{field}` from {url}")]
    Extraction { url: String, field: &'static str },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for ScrapeError {
    fn from(err: serde_yaml::Error) -> Self {
        ScrapeError::Config(err.to_string())
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::Config(format!("invalid url: {err}"))
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
