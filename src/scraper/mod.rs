pub mod crawl;
pub mod fetch;
pub mod images;
pub mod normalize;
pub mod page;
pub mod strategy;
pub mod urls;
mod scraper_error;

pub use scraper_error::ScraperError;
