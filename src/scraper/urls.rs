// urls.rs
use crate::scraper::normalize::unique;
use crate::scraper::ScraperError;
use regex::Regex;
use scraper::{Html, Selector};

/// Pulls listing-detail URLs out of a search results page.
pub struct UrlExtractor {
    anchors: Selector,
    detail_scan: Regex,
    detail_exact: Regex,
}

impl UrlExtractor {
    /// `anchor_css` selects result cards; `detail_pattern` is the unanchored
    /// shape of a detail URL for this source.
    pub fn new(anchor_css: &str, detail_pattern: &str) -> Result<Self, ScraperError> {
        let anchors =
            Selector::parse(anchor_css).map_err(|e| ScraperError::Selector(e.to_string()))?;
        let detail_scan = Regex::new(detail_pattern)?;
        let detail_exact = Regex::new(&format!("^(?:{detail_pattern})$"))?;

        Ok(Self {
            anchors,
            detail_scan,
            detail_exact,
        })
    }

    pub fn is_detail_url(&self, candidate: &str) -> bool {
        self.detail_exact.is_match(candidate)
    }

    /// Union of anchor hrefs and a raw-text scan, keeping only detail-shaped
    /// URLs. Treat the result as a set.
    pub fn extract_listing_urls(&self, page_html: &str) -> Vec<String> {
        let document = Html::parse_document(page_html);

        let from_anchors: Vec<String> = document
            .select(&self.anchors)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| href.trim().to_string())
            .collect();

        let from_text = self
            .detail_scan
            .find_iter(page_html)
            .map(|m| m.as_str().to_string());

        unique(
            from_anchors
                .into_iter()
                .chain(from_text)
                .filter(|url| self.is_detail_url(url)),
        )
    }
}
