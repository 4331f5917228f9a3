use crate::scraper::normalize::{digits_to_price, surface_to_float};
use serde::{Deserialize, Serialize};

/// A discovered listing-detail URL and the source that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ListingReference {
    pub url: String,
    #[serde(rename = "source")]
    pub source_name: String,
}

/// A saved search whose result pages get crawled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLink {
    pub id: i64,
    pub url: String,
    pub source_name: String,
}

/// Whatever could be read off one listing page. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawAdRecord {
    pub external_id: Option<String>,
    pub canonical_url: String,
    pub title: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Digits only, e.g. "1350000".
    pub price_digits: Option<String>,
    pub surface_area_text: Option<String>,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
}

/// Storage-ready listing. Enrichment columns are not ours to fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedListing {
    pub source_name: String,
    pub external_id: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub price: Option<i64>,
    pub surface_area: Option<f64>,
    pub description: Option<String>,
    /// Comma-separated gallery URLs.
    pub images: Option<String>,
    /// MM-DD-YYYY
    pub scraped_date: String,
    pub dpe: String,
    pub ges: String,
}

impl NormalizedListing {
    pub fn from_raw(source_name: &str, raw: RawAdRecord, scraped_date: String) -> Self {
        let price = raw.price_digits.as_deref().and_then(digits_to_price);
        let surface_area = raw.surface_area_text.as_deref().and_then(surface_to_float);
        let images = if raw.image_urls.is_empty() {
            None
        } else {
            Some(raw.image_urls.join(","))
        };

        Self {
            source_name: source_name.to_string(),
            external_id: raw.external_id,
            url: raw.canonical_url,
            title: raw.title,
            city: raw.city,
            postal_code: raw.postal_code,
            price,
            surface_area,
            description: raw.description,
            images,
            scraped_date,
            dpe: String::new(),
            ges: String::new(),
        }
    }
}

/// Counts for one pipeline execution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub search_links: usize,
    pub search_links_skipped: usize,
    pub discovered: usize,
    pub already_stored: usize,
    pub inserted: usize,
    pub fetch_failed: usize,
    pub persist_failed: usize,
    pub unknown_source: usize,
}
