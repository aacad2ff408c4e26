//! Catalog sync driver.
//!
//! Pulls the external catalog page by page into the local [`CatalogStore`].
//! A run clears the catalog once, then appends every fetched page:
//!
//! - pages are fetched strictly one at a time, with a minimum delay between
//!   successive fetches;
//! - a network error retries the same offset with exponential backoff,
//!   then aborts the run;
//! - a protocol error or a duplicate slug aborts the run immediately;
//! - an empty page ends the run, and so does reaching the offset ceiling
//!   (with a warning).
//!
//! Pages committed before an abort stay in the catalog, and the next run
//! starts from a clean catalog again, so repeated runs converge.
//!
//! [`CatalogStore`]: crate::catalog::CatalogStore

mod config;
mod syncer;
mod types;

pub use config::SyncConfig;
pub use syncer::CatalogSyncer;
pub use types::*;
