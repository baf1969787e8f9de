//! Command-line interface definitions.
//!
//! Every global option can also be supplied through an environment variable.

use crate::config::{DEFAULT_BASE_URL, DEFAULT_DELAY_SECS};
use clap::{Parser, Subcommand};

/// Harvest justice.gov press releases into JSON records.
///
/// # Examples
///
/// ```sh
/// # Full run: collect links, extract records, combine
/// doj_news_scraper
///
/// # Resume link collection from page 300
/// doj_news_scraper links --start-page 300
///
/// # Only rebuild combined.json
/// doj_news_scraper --data-dir ./data combine
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory holding one JSON record per release
    #[arg(short, long, env = "DOJ_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// Link registry file
    #[arg(short, long, env = "DOJ_LINKS_FILE", default_value = "links.txt")]
    pub links_file: String,

    /// Combined newline-delimited JSON output
    #[arg(short, long, env = "DOJ_COMBINED_FILE", default_value = "combined.json")]
    pub combined_file: String,

    /// Seconds to sleep between page fetches
    #[arg(long, env = "DOJ_SCRAPE_DELAY", default_value_t = DEFAULT_DELAY_SECS)]
    pub delay: f64,

    /// Site root
    #[arg(long, env = "DOJ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Optional YAML file overriding the page selectors
    #[arg(short, long)]
    pub selectors: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Collect links, extract records, then combine (default)
    Scrape {
        /// Listing page to start from
        #[arg(long, default_value_t = 0)]
        start_page: u32,
    },
    /// Only collect release links into the registry
    Links {
        /// Listing page to start from
        #[arg(long, default_value_t = 0)]
        start_page: u32,
    },
    /// Only extract records for registered links
    Details,
    /// Only rebuild the combined output
    Combine,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Scrape { start_page: 0 })
    }
}
