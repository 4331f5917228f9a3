// crawl.rs
use crate::domain::listing::ListingReference;
use crate::scraper::fetch::PageFetcher;
use crate::scraper::urls::UrlExtractor;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

fn page_param_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([?&])page=\d+").expect("static page pattern"))
}

/// URL of result page `page`. Page 1 is the search URL itself.
pub fn page_url(search_url: &str, page: usize) -> String {
    if page <= 1 {
        return search_url.to_string();
    }
    if page_param_re().is_match(search_url) {
        page_param_re()
            .replace_all(search_url, format!("${{1}}page={page}"))
            .into_owned()
    } else {
        let sep = if search_url.contains('?') { '&' } else { '?' };
        format!("{search_url}{sep}page={page}")
    }
}

/// Walks the result pages of one saved search for one source.
pub struct CrawlController<'a> {
    pub source_name: &'a str,
    pub fetcher: &'a dyn PageFetcher,
    pub extractor: &'a UrlExtractor,
    pub delay: Duration,
}

impl CrawlController<'_> {
    /// Stops early once a page that really advanced pagination adds no new URLs.
    /// A failed page contributes nothing and is judged by the same rule.
    pub fn discover_urls(&self, search_url: &str, max_pages: usize) -> Vec<ListingReference> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut found: Vec<ListingReference> = Vec::new();
        let mut prev_count = 0;

        for page in 1..=max_pages {
            if page > 1 && !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }

            let url = page_url(search_url, page);
            info!(source = self.source_name, page, url = %url, "Scraping result page");

            match self.fetcher.fetch(&url) {
                Ok(html) => {
                    for listing_url in self.extractor.extract_listing_urls(&html) {
                        if seen.insert(listing_url.clone()) {
                            found.push(ListingReference {
                                url: listing_url,
                                source_name: self.source_name.to_string(),
                            });
                        }
                    }
                }
                Err(e) => {
                    warn!(source = self.source_name, page, url = %url, "Result page failed: {e}");
                }
            }

            if page > 1 && url != search_url && found.len() == prev_count {
                info!(source = self.source_name, page, "No new listings, stopping");
                break;
            }
            prev_count = found.len();
        }

        found
    }
}
