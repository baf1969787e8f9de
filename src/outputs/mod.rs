//! Dataset outputs built from the per-release record files.
//!
//! # Output Structure
//!
//! ```text
//! data/
//! ├── _opa_pr_release-one.json
//! └── _usao-sdny_pr_release-two.json
//! combined.json              # one record per line
//! ```

pub mod combined;
