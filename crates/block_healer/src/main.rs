use std::path::PathBuf;
use std::time::Duration;

use block_healer::config::{
    CoordConfig, CycleConfig, DEFAULT_BLOCK_URL, DEFAULT_HEIGHT_POINTER, DEFAULT_LATEST_URL,
    PollerConfig, SourceConfig, StoreConfig,
};
use block_healer::{detector, healer, poller, scan};
use clap::{Args, Parser, Subcommand};
use colored::*;
use figlet_rs::FIGfont;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_banner() {
    let Ok(font) = FIGfont::standard() else {
        return;
    };
    let rule = "═══════════════════════════════════════════════════════════════════════════════";

    println!("{}", rule.bright_magenta());
    if let Some(figure) = font.convert("Block Healer") {
        println!("{}", figure.to_string().bright_cyan().bold());
    }
    println!("{}", rule.bright_magenta());
    println!("{}", "Tip poller • Gap detector • Healers".bright_yellow());
    println!("{}", rule.bright_magenta());
    println!();
}

#[derive(Parser, Debug)]
#[command(name = "block-healer")]
#[command(about = "Self-healing block ingestion from a REST block source", long_about = None)]
struct Cli {
    /// Skip the startup banner
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the latest block for one execution window
    Poll {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        redis: RedisArgs,
        #[arg(long, env = "EXECUTION_WINDOW_SECS", default_value_t = 60)]
        window_secs: u64,
        /// Delay after a failed poll
        #[arg(long, env = "POLL_BACKOFF_SECS", default_value_t = 5)]
        backoff_secs: u64,
    },
    /// Publish the heights missing from the shared block log
    Detect {
        #[command(flatten)]
        redis: RedisArgs,
        #[command(flatten)]
        cycles: CycleArgs,
        /// Most heights published per scan; the lowest ones are kept
        #[arg(long, env = "MAX_MISSING", default_value_t = detector::DEFAULT_MAX_MISSING)]
        max_missing: usize,
    },
    /// Backfill the heights published by `detect`
    Heal {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        store: StoreArgs,
        #[command(flatten)]
        redis: RedisArgs,
        #[command(flatten)]
        cycles: CycleArgs,
    },
    /// Find gaps in the local block directory and backfill them, without Redis
    Scan {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Endpoint returning the newest block
    #[arg(long, env = "BLOCK_CHAIN_URL", default_value = DEFAULT_LATEST_URL)]
    latest_url: String,
    /// Per-height endpoint; `{}` is replaced by the height
    #[arg(long, env = "BLOCK_BY_HEIGHT_URL", default_value = DEFAULT_BLOCK_URL)]
    block_url: String,
    /// JSON pointer to the height inside a block payload
    #[arg(long, env = "BLOCK_HEIGHT_POINTER", default_value = DEFAULT_HEIGHT_POINTER)]
    height_pointer: String,
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 12)]
    request_timeout_secs: u64,
}

impl From<SourceArgs> for SourceConfig {
    fn from(a: SourceArgs) -> Self {
        SourceConfig {
            latest_url: a.latest_url,
            block_url: a.block_url,
            height_pointer: a.height_pointer,
            request_timeout: Duration::from_secs(a.request_timeout_secs),
        }
    }
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Directory holding one file per block
    #[arg(long, env = "LOCAL_BLOCK_REPOSITORY", default_value = "../tendermint")]
    repository: PathBuf,
    /// Digit width of block file names
    #[arg(long, env = "BLOCK_ID_WIDTH", default_value_t = 7)]
    id_width: usize,
    /// Name block files `<height>.json`
    #[arg(long, env = "ADD_JSON_EXTENSION")]
    json_extension: bool,
}

impl From<StoreArgs> for StoreConfig {
    fn from(a: StoreArgs) -> Self {
        StoreConfig {
            root: a.repository,
            id_width: a.id_width,
            json_extension: a.json_extension,
        }
    }
}

#[derive(Args, Debug)]
struct RedisArgs {
    #[arg(long, env = "REDIS_HOST", default_value = "localhost")]
    redis_host: String,
    #[arg(long, env = "REDIS_PORT", default_value_t = 6379)]
    redis_port: u16,
    #[arg(long, env = "REDIS_DB", default_value_t = 0)]
    redis_db: i64,
    /// List of collected block heights
    #[arg(long, env = "BLOCKS_LOG_KEY", default_value = "blocks_collected")]
    log_key: String,
    /// Key holding the latest Missing Set
    #[arg(long, env = "GAPS_KEY", default_value = "gaps_detected")]
    gaps_key: String,
    /// Give up on Redis if connect + PING takes longer than this
    #[arg(long, env = "REDIS_CONNECT_TIMEOUT_SECS", default_value_t = 5)]
    redis_connect_timeout_secs: u64,
}

impl From<RedisArgs> for CoordConfig {
    fn from(a: RedisArgs) -> Self {
        CoordConfig {
            host: a.redis_host,
            port: a.redis_port,
            db: a.redis_db,
            log_key: a.log_key,
            gaps_key: a.gaps_key,
            connect_timeout: Duration::from_secs(a.redis_connect_timeout_secs),
        }
    }
}

#[derive(Args, Debug)]
struct CycleArgs {
    #[arg(long, env = "EXECUTION_WINDOW_SECS", default_value_t = 60)]
    window_secs: u64,
    /// Scans per execution
    #[arg(long, env = "SCANS_PER_EXECUTION", default_value_t = 5)]
    scans: u32,
    /// Delay between scans
    #[arg(long, env = "SCAN_INTERVAL_SECS", default_value_t = 12)]
    interval_secs: u64,
}

impl From<CycleArgs> for CycleConfig {
    fn from(a: CycleArgs) -> Self {
        CycleConfig {
            window: Duration::from_secs(a.window_secs),
            scans: a.scans,
            interval: Duration::from_secs(a.interval_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.quiet {
        print_banner();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?)
        .add_directive("redis=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::Poll {
            source,
            store,
            redis,
            window_secs,
            backoff_secs,
        } => {
            let config = PollerConfig {
                window: Duration::from_secs(window_secs),
                backoff: Duration::from_secs(backoff_secs),
            };
            let summary =
                poller::launch(&source.into(), &store.into(), &redis.into(), &config).await?;
            info!("Collected {} new blocks", summary.stored);
        }
        Command::Detect {
            redis,
            cycles,
            max_missing,
        } => {
            detector::launch(&redis.into(), &cycles.into(), max_missing).await?;
        }
        Command::Heal {
            source,
            store,
            redis,
            cycles,
        } => {
            let summary =
                healer::launch(&source.into(), &store.into(), &redis.into(), &cycles.into())
                    .await?;
            info!("Healed {} of {} requested blocks", summary.healed.len(), summary.attempted());
        }
        Command::Scan { source, store } => {
            let summary = scan::launch(&source.into(), &store.into()).await?;
            info!("Healed {} of {} missing blocks", summary.healed.len(), summary.attempted());
        }
    }

    Ok(())
}
