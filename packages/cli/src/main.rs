#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the climate need map.
//!
//! ```text
//! climate_need convert data/cb_2018_us_county_5m.shp
//! climate_need states [--data visual_data.csv]
//! climate_need report --state Alabama [--political-weight 0.5] [--resilience-weight 1] [--output reports]
//! climate_need serve [--bind 0.0.0.0] [--port 8080]
//! ```
//!
//! Running `climate_need` with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via [`climate_need_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod interactive;
mod report;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use climate_need_cli_utils::{IndicatifProgress, MultiProgress};
use climate_need_config::NeedConfig;
use climate_need_county_models::{CountyRecord, Weights};
use climate_need_geography::{BoundaryKey, CountyBoundary, convert_shapefile, load_boundaries};
use climate_need_scoring::load_records;
use dialoguer::Select;

use crate::report::{ReportRequest, build_report};

#[derive(Parser)]
#[command(
    name = "climate_need",
    about = "County climate need scores: convert boundaries, write reports, serve the dashboard"
)]
struct Cli {
    /// Config file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a county shapefile to GeoJSON next to it
    Convert {
        /// Path to the `.shp` file
        shapefile: PathBuf,
    },
    /// List the states in the county dataset
    States {
        /// County dataset (defaults to the configured one)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Write the map, scatter, table, and GeoJSON for one state
    Report {
        /// State to map
        #[arg(long)]
        state: String,
        /// Political weighting in [0, 1]
        #[arg(long)]
        political_weight: Option<f64>,
        /// Resilience weighting in [0, 1]
        #[arg(long)]
        resilience_weight: Option<f64>,
        /// Output directory (defaults to the configured one)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Start the dashboard server
    Serve {
        /// Bind address
        #[arg(long)]
        bind: Option<String>,
        /// Listen port
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Top-level tool selection for interactive mode.
enum Tool {
    Report,
    Serve,
    Convert,
    States,
}

impl Tool {
    const ALL: &[Self] = &[Self::Report, Self::Serve, Self::Convert, Self::States];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "Write a state report",
            Self::Serve => "Start dashboard server",
            Self::Convert => "Convert shapefile to GeoJSON",
            Self::States => "List states",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = climate_need_cli_utils::init_logger();
    let cli = Cli::parse();
    let mut config = NeedConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return run_interactive(config, &multi).await;
    };

    match command {
        Commands::Convert { shapefile } => convert(&shapefile, &multi)?,
        Commands::States { data } => {
            let path = data.unwrap_or_else(|| config.data.records.clone());
            print_states(&path)?;
        }
        Commands::Report {
            state,
            political_weight,
            resilience_weight,
            output,
        } => {
            let defaults = config.weights()?;
            let weights = Weights::new(
                political_weight.unwrap_or(defaults.political),
                resilience_weight.unwrap_or(defaults.resilience),
            )?;
            let request = ReportRequest {
                state,
                weights,
                output_dir: output.unwrap_or_else(|| config.report.output_dir.clone()),
            };
            let (records, boundaries) = load_sources(&config)?;
            write_report(&records, &boundaries, &config, &request, &multi)?;
        }
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, false).await?;
        }
    }

    Ok(())
}

async fn run_interactive(
    config: NeedConfig,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Climate Need Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Report => interactive::report(&config, multi)?,
        Tool::Serve => serve(config, true).await?,
        Tool::Convert => interactive::convert(multi)?,
        Tool::States => print_states(&config.data.records)?,
    }

    Ok(())
}

/// Converts a shapefile with a progress bar and prints the output path.
fn convert(shapefile: &Path, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::conversion(multi, "Converting shapefile");
    let out = convert_shapefile(shapefile, &progress)?;
    println!("{}", out.display());
    Ok(())
}

fn print_states(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(path)?;
    for state in climate_need_scoring::states(&records) {
        println!("{state}");
    }
    Ok(())
}

fn load_sources(
    config: &NeedConfig,
) -> Result<(Vec<CountyRecord>, Vec<CountyBoundary>), Box<dyn std::error::Error>> {
    let records = load_records(&config.data.records)?;
    let key = BoundaryKey::new(&config.data.boundary_key);
    let boundaries = load_boundaries(&config.data.boundaries, &key)?;
    Ok((records, boundaries))
}

/// Builds and writes a report, printing the written paths.
fn write_report(
    records: &[CountyRecord],
    boundaries: &[CountyBoundary],
    config: &NeedConfig,
    request: &ReportRequest,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_report(records, boundaries, config, request)?;
    let progress = IndicatifProgress::report(multi, "Writing report");
    for path in report::write_report(&report, &request.output_dir, &progress)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// Runs the dashboard server.
async fn serve(config: NeedConfig, prompt: bool) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        let system = actix_web::rt::System::new();
        if prompt {
            system.block_on(climate_need_server::interactive::run(config))
        } else {
            system.block_on(climate_need_server::run_server(config))
        }
    })
    .await??;
    Ok(())
}
