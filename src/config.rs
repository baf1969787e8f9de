//! Run configuration and the markup selectors used to locate page fields.
//!
//! Field locations are described as a tag name plus attribute-equality
//! predicates ([`SelectorSpec`]). The defaults match the justice.gov Briefing
//! Room markup; a YAML file can override any of them without a rebuild:
//!
//! ```yaml
//! title:
//!   tag: h1
//!   attrs:
//!     id: node-title
//! date_attr: content
//! ```

use crate::error::{ScrapeError, ScrapeResult};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.justice.gov";
pub const DEFAULT_DELAY_SECS: f64 = 1.5;
pub const SPEECH_MARKER: &str = "/speech/";

/// An element locator: tag name, exact attribute matches, and class tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectorSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    /// Class names the element must carry, in any order alongside others.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
}

impl SelectorSpec {
    pub fn new(tag: &str, attrs: &[(&str, &str)]) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            classes: Vec::new(),
        }
    }

    /// Locator matching any `tag` element whose class list contains `class`.
    pub fn with_class(tag: &str, class: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            classes: vec![class.to_string()],
        }
    }

    /// Render as a CSS selector, e.g. `div[class="views-field views-field-title"]`.
    ///
    /// Attribute values are matched as whole strings, so a multi-class
    /// `class` value only matches an element carrying exactly that attribute.
    /// Entries in `classes` render as `.token` and match by class membership.
    pub fn to_css(&self) -> String {
        let mut css = self.tag.clone();
        for class in &self.classes {
            css.push('.');
            css.push_str(class);
        }
        for (name, value) in &self.attrs {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            css.push_str(&format!("[{name}=\"{escaped}\"]"));
        }
        css
    }

    pub fn compile(&self) -> ScrapeResult<Selector> {
        let css = self.to_css();
        Selector::parse(&css)
            .map_err(|e| ScrapeError::Config(format!("invalid selector `{css}`: {e}")))
    }
}

/// Logical field name to selector mapping for listing and detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub last_page: SelectorSpec,
    pub release_entry: SelectorSpec,
    pub title: SelectorSpec,
    pub body: SelectorSpec,
    pub date: SelectorSpec,
    pub date_attr: String,
    pub topic_list: SelectorSpec,
    pub topic_item: SelectorSpec,
    pub component_list: SelectorSpec,
    pub id_container: SelectorSpec,
    pub id_item: SelectorSpec,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            last_page: SelectorSpec::new("a", &[("title", "Go to last page")]),
            release_entry: SelectorSpec::new(
                "div",
                &[("class", "views-field views-field-title")],
            ),
            title: SelectorSpec::new("h1", &[("id", "node-title")]),
            body: SelectorSpec::new(
                "div",
                &[(
                    "class",
                    "field field--name-field-pr-body field--type-text-long field--label-hidden",
                )],
            ),
            date: SelectorSpec::new("span", &[("class", "date-display-single")]),
            date_attr: "content".to_string(),
            topic_list: SelectorSpec::new(
                "div",
                &[(
                    "class",
                    "field field--name-field-pr-topic field--type-taxonomy-term-reference field--label-above",
                )],
            ),
            topic_item: SelectorSpec::with_class("div", "field__item"),
            component_list: SelectorSpec::new(
                "div",
                &[(
                    "class",
                    "field field--name-field-pr-component field--type-taxonomy-term-reference field--label-above",
                )],
            ),
            id_container: SelectorSpec::new(
                "div",
                &[(
                    "class",
                    "field field--name-field-pr-number field--type-text field--label-above",
                )],
            ),
            id_item: SelectorSpec::with_class("div", "field__item"),
        }
    }
}

impl SiteSelectors {
    /// Load overrides from a YAML file, or the built-in defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> ScrapeResult<Self> {
        match path {
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await?;
                let selectors: SiteSelectors = serde_yaml::from_str(&raw)?;
                info!(path, "Loaded selector overrides");
                Ok(selectors)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn compile(&self) -> ScrapeResult<CompiledSelectors> {
        Ok(CompiledSelectors {
            last_page: self.last_page.compile()?,
            release_entry: self.release_entry.compile()?,
            anchor: compile_css("a")?,
            paragraph: compile_css("p")?,
            title: self.title.compile()?,
            body: self.body.compile()?,
            date: self.date.compile()?,
            date_attr: self.date_attr.clone(),
            topic_list: self.topic_list.compile()?,
            topic_item: self.topic_item.compile()?,
            component_list: self.component_list.compile()?,
            id_container: self.id_container.compile()?,
            id_item: self.id_item.compile()?,
        })
    }
}

fn compile_css(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Config(format!("invalid selector `{css}`: {e}")))
}

/// Parsed selectors, ready for querying documents.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub last_page: Selector,
    pub release_entry: Selector,
    pub anchor: Selector,
    pub paragraph: Selector,
    pub title: Selector,
    pub body: Selector,
    pub date: Selector,
    pub date_attr: String,
    pub topic_list: Selector,
    pub topic_item: Selector,
    pub component_list: Selector,
    pub id_container: Selector,
    pub id_item: Selector,
}

/// Everything a run needs besides the selectors.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: Url,
    pub data_dir: PathBuf,
    pub registry_path: PathBuf,
    pub combined_path: PathBuf,
    pub delay: Duration,
    pub skip_marker: String,
}

impl ScraperConfig {
    pub fn new(
        base_url: &str,
        data_dir: impl Into<PathBuf>,
        registry_path: impl Into<PathBuf>,
        combined_path: impl Into<PathBuf>,
        delay_secs: f64,
    ) -> ScrapeResult<Self> {
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(ScrapeError::Config(format!(
                "delay must be a non-negative number of seconds, got {delay_secs}"
            )));
        }
        Ok(Self {
            base_url: Url::parse(base_url)?,
            data_dir: data_dir.into(),
            registry_path: registry_path.into(),
            combined_path: combined_path.into(),
            delay: Duration::from_secs_f64(delay_secs),
            skip_marker: SPEECH_MARKER.to_string(),
        })
    }

    /// `{base}/news?page={n}`
    pub fn listing_url(&self, page: u32) -> ScrapeResult<String> {
        let mut url = self.base_url.join("news")?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url.to_string())
    }

    /// Resolve a release's relative path against the base URL.
    pub fn detail_url(&self, relative: &str) -> ScrapeResult<String> {
        Ok(self.base_url.join(relative)?.to_string())
    }
}
