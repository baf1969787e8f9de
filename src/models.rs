//! Data models for harvested press releases.
//!
//! - [`ReleaseRecord`]: the structured extraction of one detail page, stored
//!   as one JSON object per release and one line of the combined dataset.
//! - [`CollectStats`], [`ExtractStats`]: per-stage counters reported at the end
//!   of a run.

use serde::{Deserialize, Serialize};

/// One press release as extracted from its detail page.
///
/// Field names are the on-disk JSON keys. `date` is kept as the raw string
/// the site supplies; no parsing or normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReleaseRecord {
    /// Release number assigned by the department, if the page shows one.
    pub id: Option<String>,
    pub title: String,
    /// Text of every body paragraph, joined with single spaces.
    pub contents: String,
    pub date: String,
    pub topics: Vec<String>,
    /// Related agencies or department components.
    pub components: Vec<String>,
}

/// Outcome of a link collection run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CollectStats {
    pub pages_visited: u32,
    pub total_pages: u32,
    pub added: usize,
    pub skipped: usize,
    pub registry_len: usize,
}

/// Outcome of a detail extraction run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractStats {
    pub written: usize,
    pub skipped_speech: usize,
    pub skipped_existing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_null_id() {
        let record = ReleaseRecord {
            id: None,
            title: "Title".to_string(),
            contents: "Body".to_string(),
            date: "2017-03-01T00:00:00-05:00".to_string(),
            topics: vec![],
            components: vec!["Civil Division".to_string()],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value["id"].is_null());
        assert_eq!(value["topics"], serde_json::json!([]));
        assert_eq!(value["components"][0], "Civil Division");
        assert_eq!(value.as_object().unwrap().len(), 6);
    }
}
