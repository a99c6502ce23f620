//! Guided prompts for the commands that take arguments.

use std::path::PathBuf;

use climate_need_cli_utils::MultiProgress;
use climate_need_config::NeedConfig;
use climate_need_county_models::Weights;
use climate_need_geography::{BoundaryKey, load_boundaries};
use climate_need_scoring::{load_records, states};
use dialoguer::{Input, Select};

use crate::report::ReportRequest;

/// Prompts for a shapefile path and converts it.
///
/// # Errors
///
/// Returns an error if the prompt fails or the conversion fails.
pub fn convert(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let path: String = Input::new()
        .with_prompt("Shapefile (.shp)")
        .default("data/cb_2018_us_county_5m.shp".to_string())
        .interact_text()?;

    crate::convert(&PathBuf::from(path), multi)
}

/// Prompts for a state and weights, then writes a report.
///
/// # Errors
///
/// Returns an error if the source data cannot be loaded, a prompt fails, or
/// the report cannot be written.
pub fn report(config: &NeedConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(&config.data.records)?;
    let boundaries = load_boundaries(
        &config.data.boundaries,
        &BoundaryKey::new(&config.data.boundary_key),
    )?;

    let all_states = states(&records);
    if all_states.is_empty() {
        println!("No states found in {}", config.data.records.display());
        return Ok(());
    }

    let idx = Select::new()
        .with_prompt("State")
        .items(&all_states)
        .default(0)
        .interact()?;

    let defaults = config.weights()?;
    let political: f64 = Input::new()
        .with_prompt("Political weighting (0 = Democratic, 1 = Republican)")
        .default(defaults.political)
        .validate_with(|v: &f64| unit_interval(*v))
        .interact_text()?;
    let resilience: f64 = Input::new()
        .with_prompt("Resilience weighting")
        .default(defaults.resilience)
        .validate_with(|v: &f64| unit_interval(*v))
        .interact_text()?;

    let output_dir: String = Input::new()
        .with_prompt("Output directory")
        .default(config.report.output_dir.display().to_string())
        .interact_text()?;

    let request = ReportRequest {
        state: all_states[idx].clone(),
        weights: Weights::new(political, resilience)?,
        output_dir: PathBuf::from(output_dir),
    };

    crate::write_report(&records, &boundaries, config, &request, multi)
}

fn unit_interval(value: f64) -> Result<(), &'static str> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err("Enter a value between 0 and 1")
    }
}
