//! Paginated walk of the public VTC directory.

use std::collections::HashSet;

use tracing::{debug, info, instrument, warn};

use vtcfinder_shared::VtcId;

use crate::client::SiteClient;
use crate::extract::extract_vtc_ids;

/// Summary of a directory walk.
#[derive(Debug, Clone, Default)]
pub struct DirectoryCrawl {
    /// Ids in discovery order (page order, ascending within a page).
    pub ids: Vec<VtcId>,
    /// Number of listing pages requested.
    pub pages_fetched: u32,
}

/// Walks `/vtc?page=N` until a page contributes nothing new.
pub struct DirectoryCrawler<'a> {
    client: &'a SiteClient,
}

impl<'a> DirectoryCrawler<'a> {
    pub fn new(client: &'a SiteClient) -> Self {
        Self { client }
    }

    /// Collect every VTC id from up to `max_pages` listing pages.
    ///
    /// Stops at the first page yielding zero new ids, which covers an empty
    /// page, a failed fetch and a paginator that keeps serving the last page.
    #[instrument(skip(self))]
    pub async fn crawl(&self, max_pages: u32) -> DirectoryCrawl {
        let delay = self.client.config().directory_delay;
        let mut seen: HashSet<VtcId> = HashSet::new();
        let mut result = DirectoryCrawl::default();

        for page in 1..=max_pages {
            if page > 1 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let url = self.client.directory_url(page);
            result.pages_fetched += 1;

            let page_ids = match self.client.fetch(&url).await {
                Ok(html) => extract_vtc_ids(&html),
                Err(e) => {
                    warn!(page, error = %e, "directory page unavailable");
                    Default::default()
                }
            };
            debug!(page, found = page_ids.len(), "directory page scanned");

            let new_ids: Vec<VtcId> = page_ids
                .into_iter()
                .filter(|id| seen.insert(*id))
                .collect();

            if new_ids.is_empty() {
                info!(page, "no new VTC ids, stopping");
                break;
            }

            result.ids.extend(new_ids);
            info!(page, total = result.ids.len(), "directory page collected");
        }

        result
    }
}
