use crate::db::connection::{init_db, Database};
use crate::scraper::fetch::PageFetcher;
use crate::scraper::ScraperError;
use crate::sources::{SeLogerSource, Source, SourceRegistry, SourceSettings};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

pub const SEARCH_URL: &str =
    "https://www.seloger.com/classified-search?distributionTypes=Buy&estateTypes=Building&locations=AD06FR60";

/// Fresh database with the production schema. Keep the `TempDir` alive for
/// as long as the database is used.
pub fn init_test_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir failed: {e}"));
    let db = Database::new(dir.path().join("test_db.sqlite"));

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    (dir, db)
}

/// Serves canned pages by exact URL and remembers every request.
#[derive(Clone, Default)]
pub struct FixtureFetcher {
    pages: Rc<HashMap<String, String>>,
    hits: Rc<RefCell<Vec<String>>>,
}

impl FixtureFetcher {
    pub fn new<I, U, H>(pages: I) -> Self
    where
        I: IntoIterator<Item = (U, H)>,
        U: Into<String>,
        H: Into<String>,
    {
        Self {
            pages: Rc::new(
                pages
                    .into_iter()
                    .map(|(u, h)| (u.into(), h.into()))
                    .collect(),
            ),
            hits: Rc::default(),
        }
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.borrow().clone()
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        self.hits.borrow_mut().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| ScraperError::Status {
            status: 404,
            url: url.to_string(),
        })
    }
}

pub fn seloger_with(fetcher: &FixtureFetcher) -> SeLogerSource {
    SeLogerSource::with_fetcher(Box::new(fetcher.clone()), Duration::ZERO)
        .unwrap_or_else(|e| panic!("SeLoger source failed: {e}"))
}

/// Registry whose "SeLoger" entry reads from `fetcher` instead of the network.
pub fn fixture_registry(fetcher: &FixtureFetcher) -> SourceRegistry {
    let mut registry = SourceRegistry::new(SourceSettings {
        request_delay: Duration::ZERO,
        ..SourceSettings::default()
    });
    let fetcher = fetcher.clone();
    registry.register(SeLogerSource::NAME, move |_| {
        Ok(Box::new(seloger_with(&fetcher)) as Box<dyn Source>)
    });
    registry
}

pub fn detail_url(id: u64) -> String {
    format!("https://www.seloger.com/{id}/detail.htm")
}

/// A results page with one covering-link card per URL.
pub fn search_page(urls: &[String]) -> String {
    let cards: String = urls
        .iter()
        .map(|u| {
            format!(
                r#"<div class="card"><a data-testid="card-mfe-covering-link-testid" href="{u}">Voir</a></div>"#
            )
        })
        .collect();
    format!("<html><body><main>{cards}</main></body></html>")
}

/// A minimal but complete ad page for listing `id`.
pub fn ad_page(id: u64, city: &str, price: &str) -> String {
    format!(
        r#"<html><head>
<title>Immeuble à vendre {city} | SeLoger</title>
<link rel="canonical" href="{url}">
<meta name="ad:cp" content="06000">
<meta name="ad:prix" content="{price}">
<meta name="ad:surface" content="180">
<meta property="og:title" content="Immeuble 8 pièces 180 m² {city} (06000)">
<meta property="og:description" content="Immeuble de rapport à {city}.">
</head><body>
<img src="https://v.seloger.com/s/width/800/visuels/{id}/photo.jpg?w=800&amp;h=600">
</body></html>"#,
        url = detail_url(id),
    )
}
