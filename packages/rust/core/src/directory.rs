//! `crawl` pipeline: directory walk → skeleton catalog.

use tracing::{info, instrument};

use vtcfinder_crawler::{DirectoryCrawler, SiteClient};
use vtcfinder_shared::Result;
use vtcfinder_storage::CatalogStore;

use crate::progress::ProgressReporter;

/// Result of the skeleton pipeline.
#[derive(Debug, Clone)]
pub struct SkeletonResult {
    /// Unique ids discovered.
    pub ids_found: usize,
    /// Listing pages requested.
    pub pages_fetched: u32,
    /// Whether the catalog file was written.
    pub written: bool,
}

/// Walk the directory and overwrite the catalog with one skeleton record per id.
///
/// Nothing is written when the walk finds no ids.
#[instrument(skip_all, fields(max_pages = max_pages, catalog = %store.path().display()))]
pub async fn build_skeleton(
    client: &SiteClient,
    store: &CatalogStore,
    max_pages: u32,
    progress: &dyn ProgressReporter,
) -> Result<SkeletonResult> {
    progress.phase("Walking VTC directory");
    let crawl = DirectoryCrawler::new(client).crawl(max_pages).await;

    let written = if crawl.ids.is_empty() {
        info!("no VTC ids collected, catalog left untouched");
        false
    } else {
        progress.phase("Saving skeleton catalog");
        store.save_skeleton(&crawl.ids)?;
        true
    };

    progress.done();

    Ok(SkeletonResult {
        ids_found: crawl.ids.len(),
        pages_fetched: crawl.pages_fetched,
        written,
    })
}
