//! Event-driven enrichment.
//!
//! Collects the VTCs attending one or more events, unions them with every id
//! already in the catalog, and scrapes detail pages for ids that have no
//! cached record yet. Cached records are reused verbatim and never re-fetched,
//! however stale or incomplete they are.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use url::Url;

use vtcfinder_crawler::{SiteClient, extract_vtc_ids};
use vtcfinder_shared::{Result, VtcFinderError, VtcId, VtcRecord};
use vtcfinder_storage::CatalogStore;

use crate::progress::ProgressReporter;

/// Numeric event identifier (the number in `/events/<id>-slug`).
pub type EventId = u64;

// ---------------------------------------------------------------------------
// Event URL parsing
// ---------------------------------------------------------------------------

/// Split a comma-separated line of URLs, dropping blank items.
pub fn split_event_urls(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(String::from)
        .collect()
}

/// Extract the event id from an event URL.
///
/// Takes the path segment after `events` and reads its leading digits:
/// `https://truckersmp.com/events/31728-some-name` → `31728`.
pub fn parse_event_id(event_url: &str) -> Result<EventId> {
    let invalid = || VtcFinderError::parse(format!("no event id in '{event_url}'"));

    let url = Url::parse(event_url.trim()).map_err(|_| invalid())?;
    let mut segments = url.path_segments().ok_or_else(invalid)?;

    segments
        .by_ref()
        .find(|s| s.eq_ignore_ascii_case("events"))
        .ok_or_else(invalid)?;
    let remainder = segments.next().ok_or_else(invalid)?;

    let digits: String = remainder.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(invalid());
    }
    digits.parse().map_err(|_| invalid())
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

/// Counters and merged records produced by [`enrich`].
#[derive(Debug, Clone, Default)]
pub struct EnrichOutcome {
    /// Merged catalog, ascending by id.
    pub records: Vec<VtcRecord>,
    /// Event URLs that yielded an event id.
    pub events_parsed: usize,
    /// Event URLs that were rejected.
    pub events_rejected: usize,
    /// Unique VTC ids linked from the event pages.
    pub attending: usize,
    /// Ids satisfied from the existing catalog.
    pub cached: usize,
    /// Ids freshly scraped.
    pub scraped: usize,
    /// Ids whose detail page could not be fetched.
    pub failed: usize,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Fetch each event page and union the VTC ids linked from it.
///
/// An event page that cannot be fetched contributes no ids.
pub async fn collect_attending(
    client: &SiteClient,
    event_ids: &[EventId],
    progress: &dyn ProgressReporter,
) -> BTreeSet<VtcId> {
    let mut attending = BTreeSet::new();

    for (idx, &event_id) in event_ids.iter().enumerate() {
        let url = client.event_url(event_id);
        progress.step(&url, idx + 1, event_ids.len());

        match client.fetch(&url).await {
            Ok(html) => {
                let ids = extract_vtc_ids(&html);
                info!(event_id, found = ids.len(), "event attendees collected");
                attending.extend(ids);
            }
            Err(e) => warn!(event_id, error = %e, "event page unavailable"),
        }
    }

    attending
}

/// Merge `attending` with the existing catalog, scraping only uncached ids.
///
/// Every id in `existing` is kept as-is. Ids only in `attending` are fetched
/// in ascending order with the configured detail delay between fetches;
/// ids whose page cannot be fetched are left out.
pub async fn merge_catalog(
    client: &SiteClient,
    attending: &BTreeSet<VtcId>,
    existing: Vec<VtcRecord>,
    progress: &dyn ProgressReporter,
) -> EnrichOutcome {
    let delay = client.config().detail_delay;
    let mut cached: BTreeMap<VtcId, VtcRecord> =
        existing.into_iter().map(|r| (r.id, r)).collect();

    let target_ids: BTreeSet<VtcId> = attending.iter().chain(cached.keys()).copied().collect();
    info!(
        attending = attending.len(),
        targets = target_ids.len(),
        "enriching existing + attending VTCs"
    );

    let mut outcome = EnrichOutcome {
        attending: attending.len(),
        ..Default::default()
    };
    let mut resolved = Vec::with_capacity(target_ids.len());
    let mut fetched_any = false;

    for (idx, vtc_id) in target_ids.iter().copied().enumerate() {
        progress.step(&format!("VTC {vtc_id}"), idx + 1, target_ids.len());

        if let Some(record) = cached.remove(&vtc_id) {
            debug!(vtc_id, "cached, no scrape");
            outcome.cached += 1;
            resolved.push(record);
            continue;
        }

        if fetched_any && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        fetched_any = true;

        match client.fetch_vtc(vtc_id).await {
            Ok(record) => {
                info!(vtc_id, name = record.name.as_deref().unwrap_or(""), "scraped");
                outcome.scraped += 1;
                resolved.push(record);
            }
            Err(e) => {
                warn!(vtc_id, error = %e, "scrape failed, skipping");
                outcome.failed += 1;
            }
        }
    }

    outcome.records = resolved;
    outcome
}

/// Full enrichment run over in-memory records: parse URLs, collect
/// attendees, merge. Returns `existing` untouched (and `events_parsed == 0`)
/// when no URL yields an event id.
#[instrument(skip_all, fields(urls = event_urls.len()))]
pub async fn enrich(
    client: &SiteClient,
    event_urls: &[String],
    existing: Vec<VtcRecord>,
    progress: &dyn ProgressReporter,
) -> EnrichOutcome {
    let start = Instant::now();

    let mut event_ids = Vec::new();
    let mut rejected = 0;
    for url in event_urls {
        match parse_event_id(url) {
            Ok(id) => event_ids.push(id),
            Err(e) => {
                warn!(%url, error = %e, "could not extract event id");
                rejected += 1;
            }
        }
    }

    if event_ids.is_empty() {
        info!("no valid event ids");
        return EnrichOutcome {
            records: existing,
            events_rejected: rejected,
            elapsed: start.elapsed(),
            ..Default::default()
        };
    }

    progress.phase("Collecting event attendees");
    let attending = collect_attending(client, &event_ids, progress).await;

    progress.phase("Enriching VTCs");
    let mut outcome = merge_catalog(client, &attending, existing, progress).await;
    outcome.events_parsed = event_ids.len();
    outcome.events_rejected = rejected;
    outcome.elapsed = start.elapsed();

    info!(
        cached = outcome.cached,
        scraped = outcome.scraped,
        failed = outcome.failed,
        total = outcome.records.len(),
        "enrichment completed"
    );

    outcome
}

/// Load the catalog, enrich it, and write it back.
///
/// The catalog is only rewritten when at least one event id was parsed.
/// A write failure is the one hard error of this pipeline.
pub async fn enrich_catalog(
    client: &SiteClient,
    store: &CatalogStore,
    event_urls: &[String],
    progress: &dyn ProgressReporter,
) -> Result<EnrichOutcome> {
    let existing = store.load();
    let outcome = enrich(client, event_urls, existing, progress).await;

    if outcome.events_parsed > 0 {
        progress.phase("Saving catalog");
        store.save(&outcome.records)?;
    }
    progress.done();

    Ok(outcome)
}
