// seloger/mod.rs
pub mod extract;

use crate::domain::listing::{ListingReference, NormalizedListing};
use crate::scraper::crawl::CrawlController;
use crate::scraper::fetch::{HttpFetcher, PageFetcher};
use crate::scraper::urls::UrlExtractor;
use crate::scraper::ScraperError;
use crate::sources::{Source, SourceSettings};
use chrono::Local;
use std::time::Duration;
use tracing::info;

pub const RESULT_CARD_CSS: &str = "a[data-testid='card-mfe-covering-link-testid'], a.css-1a6drk4";
pub const DETAIL_URL_PATTERN: &str = r"https://www\.seloger\.com/\d+/detail\.htm";

pub struct SeLogerSource {
    fetcher: Box<dyn PageFetcher>,
    extractor: UrlExtractor,
    delay: Duration,
}

impl SeLogerSource {
    pub const NAME: &'static str = "SeLoger";

    pub fn new(settings: &SourceSettings) -> Result<Self, ScraperError> {
        let fetcher = HttpFetcher::new(&settings.user_agent, settings.timeout)?;
        Self::with_fetcher(Box::new(fetcher), settings.request_delay)
    }

    pub fn with_fetcher(fetcher: Box<dyn PageFetcher>, delay: Duration) -> Result<Self, ScraperError> {
        Ok(Self {
            fetcher,
            extractor: UrlExtractor::new(RESULT_CARD_CSS, DETAIL_URL_PATTERN)?,
            delay,
        })
    }
}

impl Source for SeLogerSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn discover_listing_urls(&self, search_url: &str, max_pages: usize) -> Vec<ListingReference> {
        let controller = CrawlController {
            source_name: Self::NAME,
            fetcher: self.fetcher.as_ref(),
            extractor: &self.extractor,
            delay: self.delay,
        };
        controller.discover_urls(search_url, max_pages)
    }

    fn fetch_record(&self, url: &str) -> Result<NormalizedListing, ScraperError> {
        let html = self.fetcher.fetch(url)?;
        let raw = extract::parse_ad(url, html);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        info!(
            url = %raw.canonical_url,
            id = raw.external_id.as_deref().unwrap_or("-"),
            images = raw.image_urls.len(),
            "Parsed ad"
        );

        let scraped_date = Local::now().format("%m-%d-%Y").to_string();
        Ok(NormalizedListing::from_raw(Self::NAME, raw, scraped_date))
    }
}
