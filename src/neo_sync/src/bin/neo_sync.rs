use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use neo_source::{fetcher::PageFetcher, providers::nasa_rest::NasaNeoProvider};
use neo_sync::{
    config::{DATABASE_URL_ENV, SyncConfig, load_config_path},
    db::migrate,
    store::{AsteroidStore, SqliteStore},
    sync::SyncEngine,
};
use shared_utils::env::get_env_var;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Near-Earth object harvester")]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long, short, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply pending database migrations.
    Migrate,
    /// Harvest the NeoWs catalogue into the store.
    Run {
        /// Keep running, repeating the harvest every `interval_hours`.
        #[arg(long)]
        daemon: bool,
    },
    /// Inspect stored records.
    Records(RecordsCmd),
}

#[derive(Args)]
struct RecordsCmd {
    #[command(subcommand)]
    sub: RecordsSub,
}

#[derive(Subcommand)]
enum RecordsSub {
    /// List the latest snapshot of each object, ordered by name.
    List {
        /// Zero-based page.
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        per_page: u32,
    },
    /// Show one snapshot with its full payload.
    Show {
        #[arg(long)]
        id: i64,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

async fn run(cfg: &SyncConfig, database_url: &str, daemon: bool) -> Result<()> {
    migrate::run_all(database_url)?;
    let store: Arc<dyn AsteroidStore> = Arc::new(SqliteStore::open(database_url)?);

    let provider = NasaNeoProvider::new(cfg.provider_options())?;
    let fetcher = PageFetcher::new(Arc::new(provider), cfg.rate_tracker())
        .with_page_size(cfg.page_size);
    let engine = SyncEngine::new(fetcher, store, cfg.sync_options()?);

    if !daemon {
        let summary = engine.run().await?;
        if !summary.is_complete() {
            anyhow::bail!("{} of {} batches failed", summary.failed_batches, summary.batches);
        }
        return Ok(());
    }

    let mut ticker = tokio::time::interval(cfg.interval());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.run().await {
                    Ok(summary) if summary.is_complete() => {}
                    Ok(summary) => error!(failed_batches = summary.failed_batches, "sync run finished partially"),
                    Err(e) => error!(error = %e, "sync run failed"),
                }
                info!(next_in_hours = cfg.interval_hours, "waiting for next run");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

async fn records(database_url: &str, sub: RecordsSub) -> Result<()> {
    let store = SqliteStore::open(database_url)?;
    match sub {
        RecordsSub::List { page, per_page } => {
            for r in store.list_latest(page, per_page).await? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    r.storage_id,
                    r.logical_id,
                    r.name,
                    r.orbit_determination_date.as_deref().unwrap_or("-"),
                    r.fetched_on
                );
            }
        }
        RecordsSub::Show { id } => {
            let r = store
                .get(id)
                .await?
                .with_context(|| format!("no record with id {id}"))?;
            let payload: serde_json::Value = serde_json::from_str(&r.payload)?;
            println!("id:          {}", r.storage_id);
            println!("neo id:      {}", r.logical_id);
            println!("name:        {}", r.name);
            println!("fetched on:  {}", r.fetched_on);
            println!("latest:      {}", r.is_latest);
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => load_config_path(path)?,
        None => SyncConfig::default(),
    };
    let database_url = get_env_var(DATABASE_URL_ENV)?;

    match cli.cmd {
        Cmd::Migrate => migrate::run_all(&database_url)?,
        Cmd::Run { daemon } => run(&cfg, &database_url, daemon).await?,
        Cmd::Records(RecordsCmd { sub }) => records(&database_url, sub).await?,
    }

    Ok(())
}
