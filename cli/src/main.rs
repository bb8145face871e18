mod config;
mod export;
mod page;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harvest_core::ApiClient;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::HarvestConfig;

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Harvest the specialist directory into CSV and HTML", long_about = None)]
struct Cli {
    /// Directory for snapshots and generated files (env: HARVEST_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Two-letter language code for output (env: HARVEST_LANGUAGE)
    #[arg(long, global = true)]
    language: Option<String>,

    /// Pause after each list/specialist request, in ms (env: HARVEST_DELAY_MS)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Pause after each service request, in ms (env: HARVEST_SERVICE_DELAY_MS)
    #[arg(long, global = true)]
    service_delay_ms: Option<u64>,

    /// Expected number of listed specialists (env: HARVEST_TOTAL_COUNT)
    #[arg(long, global = true)]
    total_count: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the paginated specialist list
    Collect,
    /// Fetch details for every collected specialist (resumable)
    EnrichSpecialists,
    /// Extract distinct service ids from specialist details
    ExtractServiceIds,
    /// Fetch details for every referenced service (resumable)
    EnrichServices,
    /// Replace service ids with service names
    Link,
    /// Export specialists as CSV
    ExportCsv,
    /// Generate the filterable HTML page
    GenerateHtml,
    /// Run every stage in order
    Run,
}

impl Cli {
    fn config(&self) -> HarvestConfig {
        let mut config = HarvestConfig::from_env();
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(language) = &self.language {
            config.language = language.trim().to_lowercase();
        }
        if let Some(ms) = self.delay_ms {
            config.delay_ms = ms;
        }
        if let Some(ms) = self.service_delay_ms {
            config.service_delay_ms = ms;
        }
        if let Some(total) = self.total_count {
            config.total_count = total;
        }
        config
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config();
    let client = || {
        ApiClient::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")
    };

    match cli.command {
        Commands::Collect => {
            run::collect(&config, &client()?).await?;
        }
        Commands::EnrichSpecialists => {
            run::enrich_specialists(&config, &client()?).await?;
        }
        Commands::ExtractServiceIds => {
            run::extract_service_ids(&config)?;
        }
        Commands::EnrichServices => {
            run::enrich_services(&config, &client()?).await?;
        }
        Commands::Link => {
            run::link(&config)?;
        }
        Commands::ExportCsv => {
            run::export_csv(&config)?;
        }
        Commands::GenerateHtml => {
            run::generate_html(&config)?;
        }
        Commands::Run => {
            run::run_all(&config, &client()?).await?;
        }
    }

    Ok(())
}
