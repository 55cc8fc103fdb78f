//! Binary entrypoint for the Campaign Vault CLI.
//!
//! Commands:
//! - `init` - write a starter `vault.toml` and create the database
//! - `import <archive.zip>` - replace namespaces from a campaign archive
//! - `export [-o <path>]` - pack every stored asset into a zip archive
//! - `list [namespace]` - list stored assets
//! - `add <namespace> <file>` - store a single file
//! - `remove <namespace> <name>` - delete a single asset
//! - `clear --yes` - wipe every namespace
//! - `resolve <namespace> <name> [--keep]` - print a consumable URL
//! - `show <name>` - pretty-print a JSON document from `data`
//! - `save-json <name> <file>` - store hand-edited JSON text in `data`
//! - `status` - per-namespace counts and sizes
//!
//! See the library crate docs for module-level details: `campaign_vault::`.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use campaign_vault::assets::{AssetNamespace, AssetVault, ResolvedResource};
use campaign_vault::config::Config;
use campaign_vault::logutil::human_bytes;

#[derive(Parser)]
#[command(name = "campaign-vault")]
#[command(about = "Asset storage and packaging for tabletop campaigns")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "vault.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file and create the database
    Init,
    /// Import a campaign zip archive
    Import {
        /// Archive laid out as audio/, images/, data/
        archive: PathBuf,
    },
    /// Export every stored asset as a zip archive
    Export {
        /// Output path (defaults to a timestamped file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List stored assets
    List {
        /// audio, images or data (all when omitted)
        namespace: Option<AssetNamespace>,
    },
    /// Store a single file under its own name
    Add {
        namespace: AssetNamespace,
        file: PathBuf,
    },
    /// Delete a single asset
    Remove {
        namespace: AssetNamespace,
        name: String,
    },
    /// Delete every asset in every namespace
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
    /// Print a URL for an asset
    Resolve {
        namespace: AssetNamespace,
        name: String,
        /// Keep the materialized file after exit (PDF documents only)
        #[arg(long)]
        keep: bool,
    },
    /// Pretty-print a JSON document from the data namespace
    Show { name: String },
    /// Store JSON text from a file into the data namespace
    SaveJson { name: String, file: PathBuf },
    /// Show per-namespace counts and sizes
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config itself; everything else loads it first
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => match Config::load(&cli.config).await {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!("{} (using defaults)", e);
                None
            }
        },
    };
    init_logging(&pre_config, cli.verbose);
    let config = pre_config.unwrap_or_default();

    match cli.command {
        Commands::Init => {
            info!("Initializing new vault configuration");
            if Path::new(&cli.config).exists() {
                bail!("{} already exists; refusing to overwrite", cli.config);
            }
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            let config = Config::load(&cli.config).await?;
            AssetVault::from_config(&config)?;
            info!("Initialized vault database at {}", config.storage.db_path);
        }
        Commands::Import { archive } => {
            let vault = open_vault(&config)?;
            let report = vault.import_archive(&archive).await;
            finish(report.success, &report.message)?;
        }
        Commands::Export { output } => {
            let vault = open_vault(&config)?;
            let report = vault.export_archive().await;
            let Some(archive) = report.archive else {
                return finish(false, &report.message);
            };
            let path = output.unwrap_or_else(|| PathBuf::from(&archive.file_name));
            tokio::fs::write(&path, &archive.bytes).await?;
            if let Some(handle) = archive.handle {
                if let Err(e) = handle.release() {
                    warn!("failed to release export handle: {}", e);
                }
            }
            println!("{}", report.message);
            println!(
                "Wrote {} ({}) sha256={}",
                path.display(),
                human_bytes(archive.bytes.len() as u64),
                archive.checksum
            );
        }
        Commands::List { namespace } => {
            let vault = open_vault(&config)?;
            let namespaces = match namespace {
                Some(ns) => vec![ns],
                None => AssetNamespace::ALL.to_vec(),
            };
            for ns in namespaces {
                let assets = vault.list_assets(ns).await;
                println!("{} ({})", ns, assets.len());
                for asset in assets {
                    println!(
                        "  {:<40} {:<24} {}",
                        asset.name,
                        asset.content_type,
                        asset.last_modified.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        Commands::Add { namespace, file } => {
            let vault = open_vault(&config)?;
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("{} has no usable file name", file.display()))?;
            let bytes = tokio::fs::read(&file).await?;
            let result = vault.add_asset(namespace, name, &bytes).await;
            finish(result.success, &result.message)?;
        }
        Commands::Remove { namespace, name } => {
            let vault = open_vault(&config)?;
            let result = vault.delete_asset(namespace, &name).await;
            finish(result.success, &result.message)?;
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("refusing to clear every namespace without --yes");
            }
            let vault = open_vault(&config)?;
            let result = vault.clear_all_assets().await;
            finish(result.success, &result.message)?;
        }
        Commands::Resolve {
            namespace,
            name,
            keep,
        } => {
            let vault = open_vault(&config)?;
            let Some(resolved) = vault.resolve_url(namespace, &name).await else {
                return finish(false, &format!("{} not found in {}", name, namespace));
            };
            match resolved {
                ResolvedResource::Blob(blob) if keep => match blob.keep()? {
                    Some(path) => println!("{}", path.display()),
                    None => println!("(memory-hosted blob; nothing to keep)"),
                },
                ResolvedResource::Blob(blob) => {
                    println!("{}", blob.url());
                    info!("blob {} is removed on exit; pass --keep to retain it", blob.id());
                }
                other => println!("{}", other.url()),
            }
        }
        Commands::Show { name } => {
            let vault = open_vault(&config)?;
            match vault.read_document::<serde_json::Value>(&name).await {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => finish(false, &format!("{} is missing or unreadable", name))?,
            }
        }
        Commands::SaveJson { name, file } => {
            let vault = open_vault(&config)?;
            let text = tokio::fs::read_to_string(&file).await?;
            let result = vault.save_json_text(&name, &text).await;
            finish(result.success, &result.message)?;
        }
        Commands::Status => {
            let vault = open_vault(&config)?;
            let stats = vault
                .stats()
                .await
                .ok_or_else(|| anyhow!("could not read vault statistics"))?;
            println!("Campaign Vault v{}", env!("CARGO_PKG_VERSION"));
            println!("Database: {}", config.storage.db_path);
            for ns in AssetNamespace::ALL {
                println!(
                    "  {:<7} {:>6} record(s) {:>12}",
                    ns.as_str(),
                    stats.records.get(ns),
                    human_bytes(stats.payload_bytes.get(ns) as u64)
                );
            }
            match stats.latest_write {
                Some(ts) => println!("Last write: {}", ts.format("%Y-%m-%dT%H:%M:%SZ")),
                None => println!("Last write: never"),
            }
        }
    }

    Ok(())
}

fn open_vault(config: &Config) -> Result<AssetVault> {
    AssetVault::from_config(config)
        .map_err(|e| anyhow!("Failed to open vault at {}: {}", config.storage.db_path, e))
}

/// Print an operation's message, turning failure into a non-zero exit.
fn finish(success: bool, message: &str) -> Result<()> {
    if success {
        println!("{}", message);
        Ok(())
    } else {
        Err(anyhow!("{}", message))
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Warn),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Only echo to the console when stderr is interactive
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
