//! Best-effort field extraction from community-site HTML.
//!
//! Each field is decided by an ordered rule table with a final default, so
//! the heuristics stay data-driven and can be tested one rule at a time.
//! None of this is guaranteed accurate; the site has no stable markup contract.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use vtcfinder_shared::{Game, Recruitment, VtcId, VtcRecord, VtcStatus};

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

/// Name selectors, most specific first.
const NAME_SELECTORS: &[&str] = &[".vtc-name h1", ".page-title h1", "h1"];

/// Raw-markup markers per status. Earlier rows win.
const STATUS_MARKERS: &[(VtcStatus, &[&str])] = &[
    (
        VtcStatus::Verified,
        &["verified vtc", "badge-verified", "vtc--verified"],
    ),
    (
        VtcStatus::Validated,
        &["validated vtc", "badge-validated", "vtc--validated"],
    ),
];

/// Visible-text markers per game. A page may match several rows.
const GAME_MARKERS: &[(Game, &[&str])] = &[
    (Game::Ets2, &["euro truck simulator 2", "ets2"]),
    (Game::Ats, &["american truck simulator", "ats"]),
];

/// Substrings identifying a Discord invite link.
const INVITE_MARKERS: &[&str] = &["discord.gg/", "discord.com/invite"];

static RECRUITMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"recruitment\s*[:\-]?\s*(open|closed)").expect("recruitment pattern")
});

static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*-\s*Virtual Trucking Company.*$").expect("title suffix pattern")
});

static VTC_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/vtc/(\d+)").expect("vtc link pattern"));

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Collect every VTC id referenced by a `/vtc/<id>` link on the page.
///
/// Works for relative and absolute hrefs, with or without a slug suffix
/// (`/vtc/7265-fox-log-group`).
pub fn extract_vtc_ids(html: &str) -> BTreeSet<VtcId> {
    let doc = Html::parse_document(html);
    doc.select(&LINK_SEL)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| VTC_LINK_RE.captures(href))
        .filter_map(|caps| caps[1].parse::<VtcId>().ok())
        .collect()
}

/// Parse a VTC detail page into a full record.
///
/// `url` is stored as the record's `tmp_url`. Member count, language and
/// region are not present on the page and stay unset.
pub fn parse_vtc_page(vtc_id: VtcId, url: &str, html: &str) -> VtcRecord {
    let doc = Html::parse_document(html);
    let page_text = visible_text(&doc).to_lowercase();

    VtcRecord {
        name: Some(extract_name(&doc).unwrap_or_else(|| VtcRecord::placeholder_name(vtc_id))),
        status: Some(detect_status(html)),
        recruitment: Some(detect_recruitment(&page_text)),
        games: detect_games(&page_text),
        tmp_url: Some(url.to_string()),
        discord_invites: extract_discord_invites(&doc),
        ..VtcRecord::skeleton(vtc_id)
    }
}

// ---------------------------------------------------------------------------
// Field matchers
// ---------------------------------------------------------------------------

/// First non-empty name selector, then the `<title>` with its suffix stripped.
pub(crate) fn extract_name(doc: &Html) -> Option<String> {
    for sel_str in NAME_SELECTORS {
        let sel = Selector::parse(sel_str).expect("name selector");
        if let Some(text) = doc.select(&sel).map(|el| element_text(&el)).find(|t| !t.is_empty()) {
            return Some(text);
        }
    }

    let title_sel = Selector::parse("title").expect("title selector");
    doc.select(&title_sel)
        .next()
        .map(|el| element_text(&el))
        .map(|title| TITLE_SUFFIX_RE.replace(&title, "").trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Scan the raw markup, case-insensitively, for verification markers.
pub(crate) fn detect_status(html: &str) -> VtcStatus {
    let html_lower = html.to_lowercase();
    STATUS_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| html_lower.contains(m)))
        .map(|(status, _)| *status)
        .unwrap_or_default()
}

/// `page_text` must already be lowercased.
pub(crate) fn detect_recruitment(page_text: &str) -> Recruitment {
    match RECRUITMENT_RE.captures(page_text).map(|c| c[1].to_string()) {
        Some(state) if state == "open" => Recruitment::Open,
        Some(_) => Recruitment::Closed,
        None => Recruitment::Unknown,
    }
}

/// `page_text` must already be lowercased.
pub(crate) fn detect_games(page_text: &str) -> BTreeSet<Game> {
    GAME_MARKERS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|m| page_text.contains(m)))
        .map(|(game, _)| *game)
        .collect()
}

/// Invite links in first-seen order, exact duplicates dropped.
pub(crate) fn extract_discord_invites(doc: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    doc.select(&LINK_SEL)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| INVITE_MARKERS.iter().any(|m| href.contains(m)))
        .filter(|href| seen.insert(href.to_string()))
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

/// All text nodes of the document, trimmed and joined by single spaces.
fn visible_text(doc: &Html) -> String {
    doc.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn element_text(el: &scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
