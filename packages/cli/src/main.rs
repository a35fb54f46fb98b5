#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for loading and inspecting COVID-19 time series.
//!
//! Uses `indicatif-log-bridge` (via [`covid_tracker_cli_utils::init_logger`])
//! so that log lines and the table-fetch progress bar share the terminal.

mod output;

use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use covid_tracker_cli_utils::{IndicatifProgress, MultiProgress};
use covid_tracker_loader::load_data_with_progress;
use covid_tracker_scraper::HttpTableSource;
use covid_tracker_series_models::{AreaCollection, KeyFormat};
use covid_tracker_source::SourceError;
use covid_tracker_source::config::LoadConfig;

/// Environment variable naming a config file, used when `--config` is absent.
const CONFIG_ENV: &str = "COVID_TRACKER_CONFIG";

#[derive(Parser)]
#[command(name = "covid_tracker", about = "COVID-19 time series loader")]
struct Cli {
    #[command(flatten)]
    load: LoadArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LoadArgs {
    /// Path to a TOML config (overrides `COVID_TRACKER_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Spelling of US keys: "qualified" or "abbreviated"
    #[arg(long, global = true)]
    key_format: Option<KeyFormat>,
    /// Skip moving averages
    #[arg(long, global = true)]
    no_moving_average: bool,
    /// Skip the population table and join
    #[arg(long, global = true)]
    no_population: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured tables
    Sources,
    /// Load everything and print a summary
    Load,
    /// Load everything and print one area's series
    Show {
        /// Area key (e.g., "Jackson, Missouri, US" or "Hubei, China")
        key: String,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        /// Only print the most recent N days
        #[arg(long)]
        last: Option<usize>,
    },
    /// Load everything and rank areas by latest new cases
    Top {
        /// Number of areas to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

impl LoadArgs {
    fn resolve(&self) -> Result<LoadConfig, SourceError> {
        let path = self
            .config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Using config {}", path.display());
                LoadConfig::from_path(&path)?
            }
            None => LoadConfig::embedded(),
        };

        if let Some(format) = self.key_format {
            config.derive.key_format = format;
        }
        if self.no_moving_average {
            config.derive.include_moving_average = false;
        }
        if self.no_population {
            config.derive.include_population = false;
        }

        config.validate()?;
        Ok(config)
    }
}

async fn load(
    multi: &MultiProgress,
    config: &LoadConfig,
) -> Result<AreaCollection, Box<dyn std::error::Error>> {
    let source = HttpTableSource::new(config.http.timeout())?;
    let total = config.sources.all().len() as u64;
    let progress = IndicatifProgress::tables_bar(multi, "Fetching tables", total);
    Ok(load_data_with_progress(&source, config, &progress).await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = covid_tracker_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = cli.load.resolve()?;

    match cli.command {
        Commands::Sources => {
            output::write_sources(&mut io::stdout().lock(), &config)?;
        }
        Commands::Load => {
            let areas = load(&multi, &config).await?;
            println!("{}", output::Summary::of(&areas));
        }
        Commands::Show { key, format, last } => {
            let areas = load(&multi, &config).await?;
            let area = areas
                .get(&key)
                .ok_or_else(|| format!("Unknown area: {key}"))?;
            match format {
                Format::Json => output::write_json(&mut io::stdout().lock(), area, last)?,
                Format::Csv => {
                    output::write_csv(io::stdout().lock(), output::tail(&area.values, last))?;
                }
            }
        }
        Commands::Top { limit } => {
            let areas = load(&multi, &config).await?;
            let ranked = output::rank(&areas, limit);
            output::write_rank(&mut io::stdout().lock(), &ranked)?;
        }
    }

    Ok(())
}
