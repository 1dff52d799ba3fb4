use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use certlist_core::ExtractionResult;
use certlist_core::config_file::{self, ConfigFile};
use certlist_parsing::{ParsingConfig, ParsingConfigBuilder};
use certlist_reporting::ExportFormat;
use certlist_store::{CertifiedListStore, MemberQuery};

mod output;

use output::ColorMode;

const ENV_DB_PATH: &str = "CERTLIST_DB_PATH";
const ENV_STATE: &str = "CERTLIST_STATE";

/// Certified list extractor - Turn county committee certified lists into member records
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract members from certified list PDFs or text dumps
    Extract {
        /// PDF or .txt files (pages separated by form feeds) to extract
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format: text, json or csv
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Write output to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// State code attached to every member (default: NY)
        #[arg(long)]
        state: Option<String>,
    },

    /// Extract certified lists and save them to the database
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Path to the SQLite database
        #[arg(long)]
        db: Option<PathBuf>,

        /// State code attached to every member (default: NY)
        #[arg(long)]
        state: Option<String>,
    },

    /// Query stored members
    Members {
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        county: Option<String>,

        #[arg(long)]
        party: Option<String>,

        /// Electoral district
        #[arg(long)]
        ed: Option<u32>,

        /// Assembly district
        #[arg(long)]
        ad: Option<u32>,

        /// Page size (max 25)
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long)]
        no_color: bool,
    },

    /// List imported certified lists
    Lists {
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long)]
        no_color: bool,
    },

    /// Show or initialize the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration and where it is read from
    Show,
    /// Write a starter config file to the user config directory
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let config = config_file::load_config();

    match cli.command {
        Command::Extract {
            files,
            format,
            output,
            no_color,
            state,
        } => extract(&config, files, format, output, no_color, state).await,
        Command::Import { files, db, state } => import(&config, files, db, state).await,
        Command::Members {
            db,
            county,
            party,
            ed,
            ad,
            limit,
            offset,
            no_color,
        } => {
            let query = MemberQuery {
                county,
                party,
                electoral_district: ed,
                assembly_district: ad,
                limit: limit.or(config.store.as_ref().and_then(|s| s.page_size)),
                offset,
            };
            members(&config, db, &query, no_color)
        }
        Command::Lists { db, no_color } => lists(&config, db, no_color),
        Command::Config { action } => match action {
            ConfigAction::Show => show_config(&config),
            ConfigAction::Init { force } => init_config(force),
        },
    }
}

/// Logs go to stderr so they never mix with exported data. `RUST_LOG`
/// overrides the default `warn` level.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ── Settings: CLI flag > env var > config file > default ──

fn resolve_state(flag: Option<String>, env: Option<String>, config: &ConfigFile) -> Option<String> {
    flag.or(env)
        .or_else(|| config.parsing.as_ref().and_then(|p| p.state.clone()))
        .filter(|s| !s.trim().is_empty())
}

fn resolve_db_path(
    flag: Option<PathBuf>,
    env: Option<String>,
    config: &ConfigFile,
) -> anyhow::Result<PathBuf> {
    flag.or_else(|| env.map(PathBuf::from))
        .or_else(|| {
            config
                .store
                .as_ref()
                .and_then(|s| s.db_path.as_ref())
                .map(PathBuf::from)
        })
        .or_else(config_file::default_db_path)
        .context("no database path: pass --db or set CERTLIST_DB_PATH")
}

fn use_color(no_color: bool, config: &ConfigFile) -> ColorMode {
    let configured = config
        .display
        .as_ref()
        .and_then(|d| d.color)
        .unwrap_or(true);
    ColorMode(!no_color && configured)
}

fn parsing_config(config: &ConfigFile, state: Option<String>) -> anyhow::Result<ParsingConfig> {
    let mut builder = config
        .parsing
        .as_ref()
        .map(ParsingConfigBuilder::from_section)
        .unwrap_or_default();
    if let Some(state) = state {
        builder = builder.default_state(&state);
    }
    builder.build().context("invalid pattern in [parsing] config")
}

fn open_store(db: Option<PathBuf>, config: &ConfigFile) -> anyhow::Result<CertifiedListStore> {
    let path = resolve_db_path(db, std::env::var(ENV_DB_PATH).ok(), config)?;
    tracing::debug!(path = %path.display(), "opening database");
    CertifiedListStore::open(&path)
        .with_context(|| format!("failed to open database at {}", path.display()))
}

// ── Extraction ──

/// Extract every file on the blocking pool. Results keep input order; a file
/// that cannot be read yields an error in its slot.
async fn extract_all(
    files: &[PathBuf],
    config: &ParsingConfig,
) -> Vec<(PathBuf, anyhow::Result<ExtractionResult>)> {
    let bar = if files.len() > 1 {
        let bar = ProgressBar::new(files.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{spinner:.green} [{bar:40.green/dim}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    } else {
        ProgressBar::hidden()
    };

    let handles: Vec<_> = files
        .iter()
        .map(|path| {
            let path = path.clone();
            let config = config.clone();
            tokio::task::spawn_blocking(move || {
                certlist_ingest::extract_certified_list_with_config(&path, config)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(files.len());
    for (path, handle) in files.iter().zip(handles) {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string());
        bar.set_message(name.unwrap_or_default());
        let result = match handle.await {
            Ok(r) => r.with_context(|| format!("failed to extract {}", path.display())),
            Err(e) => Err(anyhow::anyhow!("extraction task for {} failed: {e}", path.display())),
        };
        bar.inc(1);
        results.push((path.clone(), result));
    }
    bar.finish_and_clear();
    results
}

async fn extract(
    config: &ConfigFile,
    files: Vec<PathBuf>,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
    no_color: bool,
    state: Option<String>,
) -> anyhow::Result<()> {
    let state = resolve_state(state, std::env::var(ENV_STATE).ok(), config);
    let parsing = parsing_config(config, state)?;
    let format = match format {
        Some(f) => f,
        None => config
            .display
            .as_ref()
            .and_then(|d| d.format.as_deref())
            .map(str::parse::<ExportFormat>)
            .transpose()
            .map_err(|e: String| anyhow::anyhow!("[display] format: {e}"))?
            .unwrap_or_default(),
    };

    let mut extracted = Vec::new();
    let mut unreadable = 0usize;
    for (path, result) in extract_all(&files, &parsing).await {
        match result {
            Ok(r) => extracted.push(r),
            Err(e) => {
                unreadable += 1;
                tracing::error!(path = %path.display(), error = %e, "skipping document");
                eprintln!("Error: {e:#}");
            }
        }
    }

    match (&output, format) {
        (None, ExportFormat::Text) => {
            let color = use_color(no_color, config);
            let mut out = std::io::stdout().lock();
            for result in &extracted {
                output::print_result(&mut out, result, color)?;
            }
        }
        (Some(path), _) => {
            certlist_reporting::export_to_path(&extracted, format, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} document(s) as {} to {}",
                extracted.len(),
                format.label(),
                path.display()
            );
        }
        (None, _) => {
            let mut out = std::io::stdout().lock();
            certlist_reporting::export_results(&extracted, format, &mut out)?;
            out.flush()?;
        }
    }

    if unreadable > 0 {
        anyhow::bail!("{unreadable} of {} document(s) could not be read", files.len());
    }
    Ok(())
}

async fn import(
    config: &ConfigFile,
    files: Vec<PathBuf>,
    db: Option<PathBuf>,
    state: Option<String>,
) -> anyhow::Result<()> {
    let state = resolve_state(state, std::env::var(ENV_STATE).ok(), config);
    let parsing = parsing_config(config, state)?;
    let store = open_store(db, config)?;

    let mut rejected = 0usize;
    for (path, result) in extract_all(&files, &parsing).await {
        let saved = result.and_then(|r| {
            let id = store.save(&r)?;
            Ok((id, r))
        });
        match saved {
            Ok((id, r)) => println!(
                "Imported {} as list #{}: {} members, {} failed rows",
                display_name(&path),
                id,
                r.members.len(),
                r.failures.len()
            ),
            Err(e) => {
                rejected += 1;
                eprintln!("Error: {}: {e:#}", display_name(&path));
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!("{rejected} of {} document(s) were not imported", files.len());
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Queries ──

fn members(
    config: &ConfigFile,
    db: Option<PathBuf>,
    query: &MemberQuery,
    no_color: bool,
) -> anyhow::Result<()> {
    let store = open_store(db, config)?;
    let page = store.list_members(query)?;
    output::print_member_page(&mut std::io::stdout().lock(), &page, use_color(no_color, config))?;
    Ok(())
}

fn lists(config: &ConfigFile, db: Option<PathBuf>, no_color: bool) -> anyhow::Result<()> {
    let store = open_store(db, config)?;
    let lists = store.lists()?;
    output::print_lists(&mut std::io::stdout().lock(), &lists, use_color(no_color, config))?;
    Ok(())
}

// ── Config ──

fn show_config(config: &ConfigFile) -> anyhow::Result<()> {
    match config_file::config_path() {
        Some(path) if path.exists() => println!("# user config: {}", path.display()),
        Some(path) => println!("# user config: {} (not present)", path.display()),
        None => println!("# user config: no config directory on this platform"),
    }
    if Path::new(".certlist.toml").exists() {
        println!("# project config: .certlist.toml");
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_config(force: bool) -> anyhow::Result<()> {
    if let Some(path) = config_file::config_path()
        && path.exists()
        && !force
    {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let path = config_file::save_config(&starter_config()).map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn starter_config() -> ConfigFile {
    ConfigFile {
        parsing: Some(config_file::ParsingSection {
            state: Some(certlist_core::DEFAULT_STATE.to_string()),
            ..Default::default()
        }),
        store: Some(config_file::StoreSection {
            db_path: config_file::default_db_path().map(|p| p.display().to_string()),
            page_size: Some(certlist_store::DEFAULT_PAGE_SIZE),
        }),
        display: Some(config_file::DisplaySection {
            color: Some(true),
            format: Some(ExportFormat::Text.to_string()),
        }),
    }
}
