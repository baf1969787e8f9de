//! Scrapers for the justice.gov Briefing Room.
//!
//! Scraping happens in two sequential phases, each restartable:
//!
//! 1. **Listing** ([`listing`]): walk `/news?page=N` and build the link
//!    registry of release URLs.
//! 2. **Detail** ([`detail`]): fetch each registered release and write its
//!    structured record to the data directory.
//!
//! Both phases fetch one page at a time and sleep for the configured delay
//! between requests.

pub mod detail;
pub mod listing;
