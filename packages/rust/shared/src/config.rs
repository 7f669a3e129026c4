//! Application configuration for VTC Finder.
//!
//! User config lives at `~/.vtcfinder/vtcfinder.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, VtcFinderError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "vtcfinder.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".vtcfinder";

// ---------------------------------------------------------------------------
// Config structs (matching vtcfinder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source site settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Pagination and politeness settings.
    #[serde(default)]
    pub crawl: CrawlPolicyConfig,

    /// Catalog file location.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Origin of the community site.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://truckersmp.com".into()
}
fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (compatible; VTC-Finder/",
        env!("CARGO_PKG_VERSION"),
        "; +https://truckersmp.com)"
    )
    .into()
}
fn default_timeout_secs() -> u64 {
    15
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlPolicyConfig {
    /// Upper bound on directory pages walked by `crawl`.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Pause between directory page fetches.
    #[serde(default = "default_directory_delay")]
    pub directory_delay_ms: u64,

    /// Pause between detail page fetches during enrichment.
    #[serde(default = "default_detail_delay")]
    pub detail_delay_ms: u64,
}

impl Default for CrawlPolicyConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            directory_delay_ms: default_directory_delay(),
            detail_delay_ms: default_detail_delay(),
        }
    }
}

fn default_max_pages() -> u32 {
    200
}
fn default_directory_delay() -> u64 {
    1000
}
fn default_detail_delay() -> u64 {
    400
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path of the JSON catalog, relative paths resolve against the working directory.
    #[serde(default = "default_catalog_path")]
    pub path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> String {
    "vtcs_source.json".into()
}

// ---------------------------------------------------------------------------
// Fetch config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime HTTP configuration used by the site client and both crawlers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Site origin; page URLs are built relative to it.
    pub base_url: Url,
    /// User-Agent header value.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pause between directory page fetches.
    pub directory_delay: Duration,
    /// Pause between freshly scraped detail pages.
    pub detail_delay: Duration,
}

impl FetchConfig {
    /// Build a fetch config for `base_url` with no politeness delays (tests, local mirrors).
    pub fn for_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(default_timeout_secs()),
            directory_delay: Duration::ZERO,
            detail_delay: Duration::ZERO,
        })
    }
}

impl TryFrom<&AppConfig> for FetchConfig {
    type Error = VtcFinderError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(&config.site.base_url)?,
            user_agent: config.site.user_agent.clone(),
            timeout: Duration::from_secs(config.site.timeout_secs),
            directory_delay: Duration::from_millis(config.crawl.directory_delay_ms),
            detail_delay: Duration::from_millis(config.crawl.detail_delay_ms),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| VtcFinderError::config(format!("invalid base_url '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(VtcFinderError::config(format!(
            "base_url must be http or https, got '{other}'"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.vtcfinder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| VtcFinderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.vtcfinder/vtcfinder.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| VtcFinderError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        VtcFinderError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| VtcFinderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| VtcFinderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| VtcFinderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
