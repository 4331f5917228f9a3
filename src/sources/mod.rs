//! Websites we know how to scrape, and the registry that picks one by name.
//!
//! Adding a website means writing one [`Source`] implementation and one
//! [`SourceRegistry::register`] call in [`SourceRegistry::with_defaults`].

pub mod seloger;

use crate::domain::listing::{ListingReference, NormalizedListing};
use crate::scraper::fetch::USER_AGENT;
use crate::scraper::ScraperError;
use std::collections::BTreeMap;
use std::time::Duration;

pub use seloger::SeLogerSource;

/// Knobs shared by every source's HTTP session.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub request_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(300),
            timeout: Duration::from_secs(20),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

pub trait Source {
    fn name(&self) -> &str;

    /// Walks up to `max_pages` result pages of a saved search.
    fn discover_listing_urls(&self, search_url: &str, max_pages: usize) -> Vec<ListingReference>;

    /// Fetches and parses one listing page.
    fn fetch_record(&self, url: &str) -> Result<NormalizedListing, ScraperError>;
}

pub type SourceConstructor = Box<dyn Fn(&SourceSettings) -> Result<Box<dyn Source>, ScraperError>>;

pub struct SourceRegistry {
    settings: SourceSettings,
    constructors: BTreeMap<String, SourceConstructor>,
}

impl SourceRegistry {
    pub fn new(settings: SourceSettings) -> Self {
        Self {
            settings,
            constructors: BTreeMap::new(),
        }
    }

    /// Registry with every website shipped in this crate.
    pub fn with_defaults(settings: SourceSettings) -> Self {
        let mut registry = Self::new(settings);
        registry.register(SeLogerSource::NAME, |settings| {
            Ok(Box::new(SeLogerSource::new(settings)?) as Box<dyn Source>)
        });
        registry
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&SourceSettings) -> Result<Box<dyn Source>, ScraperError> + 'static,
    {
        self.constructors.insert(name.to_string(), Box::new(constructor));
    }

    /// `None` means no scraper exists for `name`; callers skip, they don't fail.
    pub fn resolve(&self, name: &str) -> Option<Result<Box<dyn Source>, ScraperError>> {
        self.constructors
            .get(name)
            .map(|constructor| constructor(&self.settings))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}
