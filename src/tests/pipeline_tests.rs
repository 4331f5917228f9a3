use crate::db::listings::{count_listings, insert_listing, listing_exists_by_url};
use crate::db::search_links::add_search_link;
use crate::domain::listing::{ListingReference, NormalizedListing, RawAdRecord, RunReport, SearchLink};
use crate::errors::StoreError;
use crate::pipeline::artifact::{read_references, write_references};
use crate::pipeline::{dedupe_references, ListingStore, Pipeline};
use crate::scraper::fetch::{HttpFetcher, PageFetcher, USER_AGENT};
use crate::scraper::ScraperError;
use crate::sources::{SeLogerSource, Source, SourceRegistry, SourceSettings};
use crate::tests::utils::{
    ad_page, detail_url, fixture_registry, init_test_db, search_page, seloger_with,
    FixtureFetcher, SEARCH_URL,
};
use std::cell::{Cell, RefCell};
use std::fs;
use std::rc::Rc;
use std::time::Duration;
use url::Url;

fn reference(url: &str, source: &str) -> ListingReference {
    ListingReference {
        url: url.to_string(),
        source_name: source.to_string(),
    }
}

fn stored(url: &str) -> NormalizedListing {
    let raw = RawAdRecord {
        canonical_url: url.to_string(),
        ..RawAdRecord::default()
    };
    NormalizedListing::from_raw("SeLoger", raw, "01-02-2026".into())
}

/// In-memory store that can be told to fail on specific URLs.
#[derive(Default)]
struct MemoryStore {
    links: Vec<SearchLink>,
    rows: RefCell<Vec<String>>,
    reject_insert: Option<String>,
    broken_lookup: Option<String>,
    links_unavailable: bool,
}

impl ListingStore for MemoryStore {
    fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        if self.broken_lookup.as_deref() == Some(url) {
            return Err(StoreError::DbError("disk I/O error".into()));
        }
        Ok(self.rows.borrow().iter().any(|row| row == url))
    }

    fn insert(&self, listing: &NormalizedListing) -> Result<i64, StoreError> {
        if self.reject_insert.as_deref() == Some(listing.url.as_str()) {
            return Err(StoreError::DbError("UNIQUE constraint failed".into()));
        }
        let mut rows = self.rows.borrow_mut();
        rows.push(listing.url.clone());
        Ok(rows.len() as i64)
    }

    fn list_search_links(&self) -> Result<Vec<SearchLink>, StoreError> {
        if self.links_unavailable {
            return Err(StoreError::DbError("no such table: search_links".into()));
        }
        Ok(self.links.clone())
    }
}

#[test]
fn full_run_skips_known_listings_and_survives_failures() {
    let (dir, db) = init_test_db();
    add_search_link(&db, SEARCH_URL, "SeLoger").unwrap();
    add_search_link(&db, "https://www.bienici.com/recherche/achat/nice", "Bienici").unwrap();
    insert_listing(&db, &stored(&detail_url(1))).unwrap();

    let page2 = format!("{SEARCH_URL}&page=2");
    let fetcher = FixtureFetcher::new([
        (SEARCH_URL.to_string(), search_page(&[detail_url(1), detail_url(2)])),
        (page2.clone(), search_page(&[detail_url(2), detail_url(3)])),
        (detail_url(2), ad_page(2, "Nice", "1 350 000 €")),
    ]);
    let registry = fixture_registry(&fetcher);
    let artifact = dir.path().join("output/urls_aggregated.csv");

    let report = Pipeline::new(&db, &registry)
        .with_artifact(&artifact)
        .run(3);

    assert_eq!(
        report,
        RunReport {
            search_links: 2,
            search_links_skipped: 1,
            discovered: 3,
            already_stored: 1,
            inserted: 1,
            fetch_failed: 1,
            persist_failed: 0,
            unknown_source: 0,
        }
    );

    // The stored listing is never fetched again.
    assert!(!fetcher.hits().contains(&detail_url(1)));
    assert_eq!(
        fetcher.hits(),
        vec![
            SEARCH_URL.to_string(),
            page2,
            format!("{SEARCH_URL}&page=3"),
            detail_url(2),
            detail_url(3),
        ]
    );

    assert_eq!(count_listings(&db).unwrap(), 2);
    assert!(listing_exists_by_url(&db, &detail_url(2)).unwrap());
    assert!(!listing_exists_by_url(&db, &detail_url(3)).unwrap());

    let rows = read_references(&artifact).unwrap();
    assert_eq!(
        rows,
        vec![
            reference(&detail_url(1), "SeLoger"),
            reference(&detail_url(2), "SeLoger"),
            reference(&detail_url(3), "SeLoger"),
        ]
    );
}

#[test]
fn second_run_inserts_nothing() {
    let (_dir, db) = init_test_db();
    add_search_link(&db, SEARCH_URL, "SeLoger").unwrap();

    let fetcher = FixtureFetcher::new([
        (SEARCH_URL.to_string(), search_page(&[detail_url(5)])),
        (detail_url(5), ad_page(5, "Cannes", "890 000 €")),
    ]);
    let registry = fixture_registry(&fetcher);

    let first = Pipeline::new(&db, &registry).run(1);
    let second = Pipeline::new(&db, &registry).run(1);

    assert_eq!(first.inserted, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.already_stored, 1);
    assert_eq!(count_listings(&db).unwrap(), 1);
}

#[test]
fn overlapping_searches_write_each_url_once() {
    let (dir, db) = init_test_db();
    let other_search = "https://www.seloger.com/list.htm?types=11&places=[{ci:60088}]";
    add_search_link(&db, SEARCH_URL, "SeLoger").unwrap();
    add_search_link(&db, other_search, "SeLoger").unwrap();

    let fetcher = FixtureFetcher::new([
        (SEARCH_URL.to_string(), search_page(&[detail_url(1), detail_url(2)])),
        (other_search.to_string(), search_page(&[detail_url(2)])),
    ]);
    let registry = fixture_registry(&fetcher);
    let artifact = dir.path().join("urls.csv");

    let mut pipeline = Pipeline::new(&db, &registry).with_artifact(&artifact);
    let refs = pipeline.discover(1);

    assert_eq!(refs.len(), 2);
    let written = fs::read_to_string(&artifact).unwrap();
    assert_eq!(
        written,
        format!(
            "url,source\n{},SeLoger\n{},SeLoger\n",
            detail_url(1),
            detail_url(2)
        )
    );
}

#[test]
fn empty_discovery_still_writes_header() {
    let (dir, db) = init_test_db();
    let registry = fixture_registry(&FixtureFetcher::default());
    let artifact = dir.path().join("urls.csv");

    let refs = Pipeline::new(&db, &registry)
        .with_artifact(&artifact)
        .discover(3);

    assert!(refs.is_empty());
    assert_eq!(fs::read_to_string(&artifact).unwrap(), "url,source\n");
}

#[test]
fn unreadable_search_links_give_empty_discovery() {
    let store = MemoryStore {
        links_unavailable: true,
        ..MemoryStore::default()
    };
    let registry = fixture_registry(&FixtureFetcher::default());

    let report = Pipeline::new(&store, &registry).run(3);

    assert_eq!(report, RunReport::default());
}

#[test]
fn rejected_insert_does_not_stop_the_run() {
    let store = MemoryStore {
        reject_insert: Some(detail_url(1)),
        ..MemoryStore::default()
    };
    let fetcher = FixtureFetcher::new([
        (detail_url(1), ad_page(1, "Nice", "1 000 000 €")),
        (detail_url(2), ad_page(2, "Nice", "2 000 000 €")),
    ]);
    let registry = fixture_registry(&fetcher);

    let mut pipeline = Pipeline::new(&store, &registry);
    pipeline.fetch_and_persist(&[
        reference(&detail_url(1), "SeLoger"),
        reference(&detail_url(2), "SeLoger"),
    ]);
    let report = pipeline.finish();

    assert_eq!(report.persist_failed, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(*store.rows.borrow(), vec![detail_url(2)]);
}

#[test]
fn failed_lookup_skips_the_listing() {
    let store = MemoryStore {
        broken_lookup: Some(detail_url(1)),
        ..MemoryStore::default()
    };
    let fetcher = FixtureFetcher::new([(detail_url(1), ad_page(1, "Nice", "1 000 000 €"))]);
    let registry = fixture_registry(&fetcher);

    let mut pipeline = Pipeline::new(&store, &registry);
    pipeline.fetch_and_persist(&[reference(&detail_url(1), "SeLoger")]);
    let report = pipeline.finish();

    assert_eq!(report.persist_failed, 1);
    assert!(fetcher.hits().is_empty());
}

#[test]
fn extraction_reads_previous_discovery() {
    let (dir, db) = init_test_db();
    let artifact = dir.path().join("urls.csv");
    write_references(
        &artifact,
        &[
            reference(&detail_url(8), "SeLoger"),
            reference("https://www.bienici.com/annonce/vente/nice/immeuble/42", "Bienici"),
        ],
    )
    .unwrap();

    let fetcher = FixtureFetcher::new([(detail_url(8), ad_page(8, "Menton", "640 000 €"))]);
    let registry = fixture_registry(&fetcher);

    let mut pipeline = Pipeline::new(&db, &registry);
    let loaded = pipeline.extract_from_artifact(&artifact).unwrap();
    let report = pipeline.finish();

    assert_eq!(loaded, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.unknown_source, 1);
    assert!(listing_exists_by_url(&db, &detail_url(8)).unwrap());
}

#[test]
fn missing_artifact_is_an_error() {
    let (dir, db) = init_test_db();
    let registry = fixture_registry(&FixtureFetcher::default());

    let mut pipeline = Pipeline::new(&db, &registry);
    assert!(pipeline
        .extract_from_artifact(&dir.path().join("nope.csv"))
        .is_err());
}

#[test]
fn each_source_is_built_once_per_run() {
    let (_dir, db) = init_test_db();
    add_search_link(&db, SEARCH_URL, "SeLoger").unwrap();
    add_search_link(&db, "https://www.seloger.com/list.htm?types=2", "SeLoger").unwrap();

    let fetcher = FixtureFetcher::new([(SEARCH_URL.to_string(), search_page(&[detail_url(4)]))]);
    let built = Rc::new(Cell::new(0));

    let mut registry = SourceRegistry::new(SourceSettings::default());
    let (counter, pages) = (Rc::clone(&built), fetcher.clone());
    registry.register(SeLogerSource::NAME, move |_| {
        counter.set(counter.get() + 1);
        Ok(Box::new(seloger_with(&pages)) as Box<dyn Source>)
    });

    let report = Pipeline::new(&db, &registry).run(1);

    assert_eq!(built.get(), 1);
    assert_eq!(report.search_links, 2);
    assert_eq!(report.fetch_failed, 1);
}

#[test]
fn dedupe_keys_on_url_and_source() {
    let refs = vec![
        reference("https://a.test/1", "SeLoger"),
        reference("https://a.test/1", "Bienici"),
        reference("https://a.test/1", "SeLoger"),
        reference("https://a.test/2", "SeLoger"),
    ];

    assert_eq!(
        dedupe_references(refs),
        vec![
            reference("https://a.test/1", "SeLoger"),
            reference("https://a.test/1", "Bienici"),
            reference("https://a.test/2", "SeLoger"),
        ]
    );
}

#[test]
fn registry_knows_only_shipped_sources() {
    let registry = SourceRegistry::with_defaults(SourceSettings::default());

    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["SeLoger"]);
    assert!(registry.resolve("Bienici").is_none());

    let source = registry
        .resolve("SeLoger")
        .and_then(Result::ok)
        .unwrap_or_else(|| panic!("SeLoger should resolve"));
    assert_eq!(source.name(), "SeLoger");
}

#[test]
fn saved_ad_page_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ad.html");
    fs::write(&path, ad_page(7, "Nice", "1 350 000 €")).unwrap();
    let file_url = Url::from_file_path(&path).unwrap().to_string();

    let fetcher = HttpFetcher::new(USER_AGENT, Duration::from_secs(5)).unwrap();
    assert_eq!(fetcher.fetch(&file_url).unwrap(), ad_page(7, "Nice", "1 350 000 €"));

    let source = SeLogerSource::new(&SourceSettings {
        request_delay: Duration::ZERO,
        ..SourceSettings::default()
    })
    .unwrap();
    let listing = source.fetch_record(&file_url).unwrap();

    assert_eq!(listing.url, detail_url(7));
    assert_eq!(listing.external_id.as_deref(), Some("seloger_7"));
    assert_eq!(listing.city.as_deref(), Some("Nice"));
    assert_eq!(listing.price, Some(1_350_000));
    assert_eq!(listing.surface_area, Some(180.0));
    assert_eq!(listing.source_name, "SeLoger");

    let date: Vec<&str> = listing.scraped_date.split('-').collect();
    assert_eq!(date.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![2, 2, 4]);
}

#[test]
fn missing_local_page_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let file_url = Url::from_file_path(dir.path().join("gone.html"))
        .unwrap()
        .to_string();

    let fetcher = HttpFetcher::new(USER_AGENT, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        fetcher.fetch(&file_url),
        Err(ScraperError::Io { .. })
    ));
}
