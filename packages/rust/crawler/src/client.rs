//! HTTP access to the community site.
//!
//! Every fetch is a single GET with no retry. Callers decide how soft a
//! failure is; the crawlers log it and treat the page as empty.

use reqwest::Client;
use tracing::{debug, instrument};

use vtcfinder_shared::{FetchConfig, Result, VtcFinderError, VtcId, VtcRecord};

use crate::extract;

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Thin wrapper around a configured `reqwest::Client` that knows the site's URL layout.
#[derive(Debug, Clone)]
pub struct SiteClient {
    config: FetchConfig,
    client: Client,
}

impl SiteClient {
    /// Create a client with the configured user agent and timeout.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| VtcFinderError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.as_str().trim_end_matches('/')
    }

    /// `<base>/events/<id>`
    pub fn event_url(&self, event_id: u64) -> String {
        format!("{}/events/{event_id}", self.base())
    }

    /// `<base>/vtc/<id>`
    pub fn vtc_url(&self, vtc_id: VtcId) -> String {
        format!("{}/vtc/{vtc_id}", self.base())
    }

    /// `<base>/vtc?page=<n>`
    pub fn directory_url(&self, page: u32) -> String {
        format!("{}/vtc?page={page}", self.base())
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VtcFinderError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(VtcFinderError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| VtcFinderError::Network(format!("{url}: body read failed: {e}")))
    }

    /// Fetch a VTC detail page and parse it into a full record.
    #[instrument(skip(self))]
    pub async fn fetch_vtc(&self, vtc_id: VtcId) -> Result<VtcRecord> {
        let url = self.vtc_url(vtc_id);
        let html = self.fetch(&url).await?;
        Ok(extract::parse_vtc_page(vtc_id, &url, &html))
    }
}
