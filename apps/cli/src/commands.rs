//! CLI command definitions, routing, and tracing setup.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use vtcfinder_core::ProgressReporter;
use vtcfinder_core::filter::{FilterCriteria, FilteredVtc, GameFilter};
use vtcfinder_crawler::SiteClient;
use vtcfinder_shared::{
    AppConfig, FetchConfig, VtcId, VtcStatus, init_config, load_config, load_config_from,
};
use vtcfinder_storage::CatalogStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// VTC Finder: find TruckersMP VTCs to convoy with.
#[derive(Parser)]
#[command(
    name = "vtcfinder",
    version,
    about = "Scrape TruckersMP VTC pages into a local catalog and shortlist convoy partners.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Catalog file (overrides `[catalog] path` from the config).
    #[arg(long, global = true, env = "VTCFINDER_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Config file (defaults to ~/.vtcfinder/vtcfinder.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Walk the VTC directory and overwrite the catalog with id-only records.
    Crawl {
        /// Upper bound on listing pages (defaults to `[crawl] max_pages`).
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// Scrape VTCs attending the given events and merge them into the catalog.
    Enrich {
        /// Event URLs (space or comma separated). Prompts when omitted.
        urls: Vec<String>,
    },

    /// Fill in missing region/language from VTC names.
    Tag,

    /// List catalog VTCs matching the given criteria.
    Filter {
        /// VTC ids to exclude (already booked).
        #[arg(long, value_delimiter = ',')]
        busy: Vec<VtcId>,

        /// Allowed statuses: verified, validated, normal.
        #[arg(long, value_delimiter = ',')]
        status: Vec<VtcStatus>,

        /// Required game: ets2, ats, or both.
        #[arg(long)]
        game: Option<GameFilter>,

        /// Drop VTCs whose recruitment is closed.
        #[arg(long)]
        open_only: bool,

        /// Minimum member count (unknown counts are kept).
        #[arg(long)]
        min_members: Option<u32>,

        /// Language code substring, case-insensitive.
        #[arg(long)]
        language: Option<String>,

        /// Print matches as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `filter --json`
/// output stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "vtcfinder=info",
        1 => "vtcfinder=debug",
        _ => "vtcfinder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let Cli {
        catalog,
        config,
        command,
        ..
    } = cli;

    if let Command::Config { action } = command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config),
        };
    }

    let config = resolve_config(config)?;
    let store = CatalogStore::new(catalog.unwrap_or_else(|| PathBuf::from(&config.catalog.path)));

    match command {
        Command::Crawl { max_pages } => cmd_crawl(&config, &store, max_pages).await,
        Command::Enrich { urls } => cmd_enrich(&config, &store, &urls).await,
        Command::Tag => cmd_tag(&store),
        Command::Filter {
            busy,
            status,
            game,
            open_only,
            min_members,
            language,
            json,
        } => {
            let criteria = FilterCriteria {
                allowed_statuses: (!status.is_empty()).then(|| status.into_iter().collect()),
                game,
                recruitment_only_open: open_only,
                min_members,
                language,
            };
            cmd_filter(&store, &busy.into_iter().collect(), &criteria, json)
        }
        Command::Config { .. } => Ok(()),
    }
}

fn resolve_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(&path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn site_client(config: &AppConfig) -> Result<SiteClient> {
    let fetch = FetchConfig::try_from(config)?;
    Ok(SiteClient::new(fetch)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_crawl(config: &AppConfig, store: &CatalogStore, max_pages: Option<u32>) -> Result<()> {
    let client = site_client(config)?;
    let max_pages = max_pages.unwrap_or(config.crawl.max_pages);

    info!(max_pages, catalog = %store.path().display(), "crawling VTC directory");

    let reporter = CliProgress::new();
    let result =
        vtcfinder_core::directory::build_skeleton(&client, store, max_pages, &reporter).await?;

    println!();
    if result.written {
        println!("  Skeleton catalog written.");
    } else {
        println!("  No VTC ids found; catalog left untouched.");
    }
    println!("  Pages:  {}", result.pages_fetched);
    println!("  VTCs:   {}", result.ids_found);
    println!("  Path:   {}", store.path().display());
    println!();

    Ok(())
}

async fn cmd_enrich(config: &AppConfig, store: &CatalogStore, args: &[String]) -> Result<()> {
    let mut urls: Vec<String> = args
        .iter()
        .flat_map(|arg| vtcfinder_core::enrich::split_event_urls(arg))
        .collect();

    if urls.is_empty() {
        urls = prompt_event_urls().await?;
    }
    if urls.is_empty() {
        println!("No event URLs given; nothing to do.");
        return Ok(());
    }

    let client = site_client(config)?;
    info!(events = urls.len(), catalog = %store.path().display(), "enriching catalog");

    let reporter = CliProgress::new();
    let outcome =
        vtcfinder_core::enrich::enrich_catalog(&client, store, &urls, &reporter).await?;

    println!();
    if outcome.events_parsed == 0 {
        println!("  No valid event URLs; catalog left untouched.");
        println!();
        return Ok(());
    }
    println!("  Catalog updated!");
    println!("  Events:    {}", outcome.events_parsed);
    if outcome.events_rejected > 0 {
        println!("  Rejected:  {}", outcome.events_rejected);
    }
    println!("  Attending: {}", outcome.attending);
    println!("  Cached:    {}", outcome.cached);
    println!("  Scraped:   {}", outcome.scraped);
    println!("  Failed:    {}", outcome.failed);
    println!("  Total:     {}", outcome.records.len());
    println!("  Time:      {:.1}s", outcome.elapsed.as_secs_f64());
    println!();

    Ok(())
}

/// Ask for a comma-separated line of event URLs on stdin.
async fn prompt_event_urls() -> Result<Vec<String>> {
    print!("Event URL(s), comma-separated: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;

    Ok(vtcfinder_core::enrich::split_event_urls(&line))
}

fn cmd_tag(store: &CatalogStore) -> Result<()> {
    let report = vtcfinder_core::tagger::tag_catalog(store)?;

    if report.total == 0 {
        println!("Catalog is empty; nothing to tag.");
    } else {
        println!(
            "Tagged {} of {} VTCs ({}).",
            report.matched,
            report.total,
            store.path().display()
        );
    }
    Ok(())
}

fn cmd_filter(
    store: &CatalogStore,
    busy: &HashSet<VtcId>,
    criteria: &FilterCriteria,
    json: bool,
) -> Result<()> {
    let catalog = store.load();
    let matches = vtcfinder_core::filter::filter(&catalog, busy, criteria);

    info!(
        catalog = catalog.len(),
        busy = busy.len(),
        matches = matches.len(),
        "filtered catalog"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        print_table(&matches);
    }
    Ok(())
}

fn print_table(matches: &[FilteredVtc]) {
    if matches.is_empty() {
        println!("No matching VTCs.");
        return;
    }

    println!(
        "{:>8}  {:<32}  {:<9}  {:<8}  {:<11}  {:>7}  {:<4}",
        "ID", "NAME", "STATUS", "GAMES", "RECRUITMENT", "MEMBERS", "LANG"
    );
    for m in matches {
        let record = &m.record;
        let games = record
            .games
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        let members = record
            .known_members()
            .map_or_else(|| "?".to_string(), |n| n.to_string());

        println!(
            "{:>8}  {:<32}  {:<9}  {:<8}  {:<11}  {:>7}  {:<4}",
            record.id,
            truncate(record.name().unwrap_or("-"), 32),
            m.status_class,
            if games.is_empty() { "-" } else { &games },
            record.recruitment_or_default().as_str(),
            members,
            record.language().unwrap_or("-"),
        );
    }
    println!();
    println!("{} matching VTCs.", matches.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<PathBuf>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn step(&self, label: &str, current: usize, total: usize) {
        if total > 0 {
            self.spinner.set_message(format!("[{current}/{total}] {label}"));
        } else {
            self.spinner.set_message(format!("[{current}] {label}"));
        }
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
