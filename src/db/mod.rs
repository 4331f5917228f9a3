pub mod connection;
pub mod listings;
pub mod search_links;

use crate::domain::listing::{NormalizedListing, SearchLink};
use crate::errors::StoreError;
use crate::pipeline::ListingStore;
use connection::Database;

impl ListingStore for Database {
    fn exists_by_url(&self, url: &str) -> Result<bool, StoreError> {
        listings::listing_exists_by_url(self, url)
    }

    fn insert(&self, listing: &NormalizedListing) -> Result<i64, StoreError> {
        listings::insert_listing(self, listing)
    }

    fn list_search_links(&self) -> Result<Vec<SearchLink>, StoreError> {
        search_links::list_search_links(self)
    }
}
