//! Bulk catalog import from CSV.

mod loader;

pub use loader::{CatalogLoader, CatalogLoaderError, CatalogRecord, LoadSummary};
