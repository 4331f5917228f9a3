//! Discovery and extraction run end to end over every saved search.
//!
//! The run moves through `DiscoverUrls -> Deduplicate -> FetchAndPersist` once.
//! Every failure is scoped to a single search link or listing URL: it is logged,
//! counted in the [`RunReport`], and the run carries on.

pub mod artifact;

use crate::domain::listing::{ListingReference, NormalizedListing, RunReport, SearchLink};
use crate::errors::StoreError;
use crate::sources::{Source, SourceRegistry};
use artifact::ArtifactError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What the pipeline needs from persistent storage.
pub trait ListingStore {
    fn exists_by_url(&self, url: &str) -> Result<bool, StoreError>;
    fn insert(&self, listing: &NormalizedListing) -> Result<i64, StoreError>;
    fn list_search_links(&self) -> Result<Vec<SearchLink>, StoreError>;
}

/// Sources built during one run, so each keeps a single HTTP session.
struct SourceCache<'r> {
    registry: &'r SourceRegistry,
    built: HashMap<String, Option<Box<dyn Source>>>,
}

impl<'r> SourceCache<'r> {
    fn new(registry: &'r SourceRegistry) -> Self {
        Self {
            registry,
            built: HashMap::new(),
        }
    }

    fn get(&mut self, name: &str) -> Option<&dyn Source> {
        if !self.built.contains_key(name) {
            let source = match self.registry.resolve(name) {
                Some(Ok(source)) => Some(source),
                Some(Err(e)) => {
                    error!(source = name, "Could not start scraper: {e}");
                    None
                }
                None => {
                    warn!(source = name, "No scraper implemented for source");
                    None
                }
            };
            self.built.insert(name.to_string(), source);
        }
        self.built.get(name).and_then(|source| source.as_deref())
    }
}

/// Collapses references sharing `(url, source)`, keeping first-seen order.
pub fn dedupe_references(refs: Vec<ListingReference>) -> Vec<ListingReference> {
    let mut seen = HashSet::new();
    refs.into_iter()
        .filter(|reference| seen.insert(reference.clone()))
        .collect()
}

pub struct Pipeline<'a, S: ListingStore> {
    store: &'a S,
    sources: SourceCache<'a>,
    artifact_path: Option<PathBuf>,
    report: RunReport,
}

impl<'a, S: ListingStore> Pipeline<'a, S> {
    pub fn new(store: &'a S, registry: &'a SourceRegistry) -> Self {
        Self {
            store,
            sources: SourceCache::new(registry),
            artifact_path: None,
            report: RunReport::default(),
        }
    }

    /// Where the aggregated `url,source` CSV gets written after discovery.
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = Some(path.into());
        self
    }

    /// Discovery followed by extraction of every new listing.
    pub fn run(mut self, max_pages: usize) -> RunReport {
        info!("Step 1: collecting ad URLs from search links");
        let refs = self.discover(max_pages);

        info!("Step 2: scraping ad pages");
        self.fetch_and_persist(&refs);

        self.finish()
    }

    /// Crawls every saved search and returns the deduplicated references.
    pub fn discover(&mut self, max_pages: usize) -> Vec<ListingReference> {
        let links = match self.store.list_search_links() {
            Ok(links) => links,
            Err(e) => {
                error!("Could not read search links: {e}");
                Vec::new()
            }
        };
        self.report.search_links += links.len();

        let mut collected = Vec::new();
        for link in &links {
            let Some(source) = self.sources.get(&link.source_name) else {
                warn!(source = %link.source_name, url = %link.url, "Skipping search link");
                self.report.search_links_skipped += 1;
                continue;
            };

            info!(source = source.name(), url = %link.url, "Collecting ad URLs");
            let found = source.discover_listing_urls(&link.url, max_pages);
            info!(source = source.name(), count = found.len(), "Search link done");
            collected.extend(found);
        }

        let refs = dedupe_references(collected);
        self.report.discovered += refs.len();
        info!(
            unique = refs.len(),
            search_links = links.len(),
            "Collected unique ad URLs"
        );

        if let Some(path) = &self.artifact_path {
            match artifact::write_references(path, &refs) {
                Ok(()) => info!(path = %path.display(), "Aggregated URLs written"),
                Err(e) => error!(path = %path.display(), "Could not write aggregated URLs: {e}"),
            }
        }

        refs
    }

    /// Fetches and stores every reference not already in storage. Each one is
    /// attempted exactly once.
    pub fn fetch_and_persist(&mut self, refs: &[ListingReference]) {
        for reference in refs {
            self.fetch_one(reference);
        }
    }

    /// Extraction only, from the CSV a previous discovery wrote.
    pub fn extract_from_artifact(&mut self, path: &Path) -> Result<usize, ArtifactError> {
        let refs = artifact::read_references(path)?;
        info!(path = %path.display(), count = refs.len(), "Loaded URLs from aggregated CSV");
        self.report.discovered += refs.len();
        self.fetch_and_persist(&refs);
        Ok(refs.len())
    }

    fn fetch_one(&mut self, reference: &ListingReference) {
        let url = reference.url.as_str();

        match self.store.exists_by_url(url) {
            Ok(true) => {
                info!(url, "Already in DB, skipping");
                self.report.already_stored += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!(url, "Could not check storage, skipping: {e}");
                self.report.persist_failed += 1;
                return;
            }
        }

        let Some(source) = self.sources.get(&reference.source_name) else {
            warn!(source = %reference.source_name, url, "Skipping ad URL");
            self.report.unknown_source += 1;
            return;
        };

        info!(source = %reference.source_name, url, "Scraping ad");
        let listing = match source.fetch_record(url) {
            Ok(listing) => listing,
            Err(e) => {
                error!(url, "Failed to fetch ad data: {e}");
                self.report.fetch_failed += 1;
                return;
            }
        };

        match self.store.insert(&listing) {
            Ok(id) => {
                info!(id, url, "Inserted listing");
                self.report.inserted += 1;
            }
            Err(e) => {
                error!(url, "Failed to insert listing: {e}");
                self.report.persist_failed += 1;
            }
        }
    }

    pub fn finish(self) -> RunReport {
        let report = self.report;
        info!(
            discovered = report.discovered,
            inserted = report.inserted,
            already_stored = report.already_stored,
            fetch_failed = report.fetch_failed,
            persist_failed = report.persist_failed,
            unknown_source = report.unknown_source,
            "Scraping pipeline completed"
        );
        report
    }
}
