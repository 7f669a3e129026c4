//! Site access, HTML field extraction, and the directory crawler.
//!
//! This crate provides:
//! - [`client`] — [`SiteClient`], the retry-free HTTP fetcher for the community site
//! - [`extract`] — rule-table heuristics turning page markup into VTC fields
//! - [`directory`] — [`DirectoryCrawler`], the paginated id collector

pub mod client;
pub mod directory;
pub mod extract;

pub use client::SiteClient;
pub use directory::{DirectoryCrawl, DirectoryCrawler};
pub use extract::{extract_vtc_ids, parse_vtc_page};
