use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid selector: {0}")]
    Selector(String),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
