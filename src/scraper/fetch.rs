// fetch.rs
use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Anything that can turn a URL into page markup.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

/// Blocking HTTP fetcher with one reusable client. `file://` URLs are read
/// from disk so saved pages can be replayed without network access.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-FR,fr;q=0.9,en;q=0.8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        if url.starts_with("file://") {
            return read_local_page(url);
        }

        debug!(url, "GET");
        let resp = self.client.get(url).send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(resp.text()?)
    }
}

/// Reads a `file://` URL, tolerating invalid UTF-8.
pub fn read_local_page(url: &str) -> Result<String, ScraperError> {
    let path = Url::parse(url)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .ok_or_else(|| ScraperError::InvalidUrl(url.to_string()))?;

    let bytes = std::fs::read(&path).map_err(|source| ScraperError::Io {
        path: path.display().to_string(),
        source,
    })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
