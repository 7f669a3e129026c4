//! Shared types, error model, and configuration for VTC Finder.
//!
//! This crate is the foundation depended on by all other VTC Finder crates.
//! It provides:
//! - [`VtcFinderError`] — the unified error type
//! - Domain types ([`VtcRecord`], [`VtcStatus`], [`Recruitment`], [`Game`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, CrawlPolicyConfig, FetchConfig, SiteConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, VtcFinderError};
pub use types::{Game, GameFlags, Recruitment, VtcId, VtcRecord, VtcStatus};
