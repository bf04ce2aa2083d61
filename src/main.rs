//! Sopdesk admin binary
//!
//! Initializes the database, seeds baseline data and reports store
//! statistics. The HTTP API that fronts the service layer is deployed
//! separately.
//!
//! ## Usage
//!
//! ```bash
//! # Initialize the schema under the default data directory
//! sopdesk
//!
//! # Custom config and data directory
//! sopdesk --config /path/to/config.toml --data-dir /data/sopdesk
//!
//! # Seed baseline SOPs and onboarding modules
//! sopdesk --seed
//!
//! # Print store statistics as JSON
//! sopdesk --stats
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sopdesk::services::events::spawn_logging_listener;
use sopdesk::{seed_baseline, Config, Services, SopDb};

#[derive(Parser, Debug)]
#[command(name = "sopdesk")]
#[command(about = "SOP repository and onboarding progress store")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for the SQLite database
    #[arg(long, env = "SOPDESK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Seed baseline SOPs and onboarding modules
    #[arg(long)]
    seed: bool,

    /// Print store statistics as JSON
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sopdesk=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = if let Some(config_path) = &args.config {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    info!(data_dir = ?config.data_dir, "Starting sopdesk");

    let db = Arc::new(SopDb::open(&config.data_dir)?);
    let services = Services::new(db.clone());
    let _listener = spawn_logging_listener(services.events.clone());

    if args.seed {
        let report = seed_baseline(&db)?;
        info!(
            sops_created = report.sops_created,
            sops_skipped = report.sops_skipped,
            modules_created = report.modules_created,
            tasks_created = report.tasks_created,
            "Seed complete"
        );
    }

    if args.stats {
        let stats = db.stats()?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}
