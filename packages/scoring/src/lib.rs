#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County need-score pipeline.
//!
//! Loads the flat county dataset and turns it into one [`CountyMetrics`] row
//! per county:
//!
//! 1. [`perception`]: mean perceived risk per county (the base table)
//! 2. [`votes`]: vote shares pivoted into party buckets
//! 3. [`hazard`]: one FEMA risk/resilience pair per county
//! 4. [`composite`]: left joins plus the weighted need formula
//!
//! [`score`] runs all stages and is pure: the same records, weights, and
//! options always produce the same metrics.

pub mod composite;
pub mod hazard;
pub mod load;
pub mod perception;
pub mod selection;
pub mod votes;

use std::collections::BTreeMap;
use std::path::PathBuf;

use climate_need_county_models::{
    CountyFips, CountyMetrics, CountyRecord, InvalidWeightError, ScoringOptions, Weights,
};
use thiserror::Error;

pub use load::{load_records, read_records};
pub use selection::{state_counties, states};

/// Errors that can occur while loading or scoring the dataset.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The dataset file could not be opened.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A weight was outside `[0, 1]`.
    #[error("{0}")]
    InvalidWeight(#[from] InvalidWeightError),

    /// No county has a positive resilience score, so the resilience factor
    /// cannot be normalized.
    #[error("Resilience factor is undefined: no county has a positive resilience score")]
    DegenerateResilience,
}

/// Runs every scoring stage over `records`.
///
/// Rows without a county code cannot join anything and are skipped; they
/// are not grouped under a `00000` pseudo-county, so the result never holds
/// the placeholder code. The result holds one entry per county, sorted by
/// county code.
///
/// # Errors
///
/// Returns [`ScoringError::InvalidWeight`] for weights outside `[0, 1]` and
/// [`ScoringError::DegenerateResilience`] when the resilience normalization
/// is undefined and the options ask to fail.
pub fn score(
    records: &[CountyRecord],
    weights: Weights,
    options: ScoringOptions,
) -> Result<Vec<CountyMetrics>, ScoringError> {
    weights.validate()?;

    let keyed: Vec<&CountyRecord> = records
        .iter()
        .filter(|r| !r.county_fips.is_unknown())
        .collect();
    let skipped = records.len() - keyed.len();
    if skipped > 0 {
        log::warn!("Skipping {skipped} rows without a county code");
    }

    let perceived = perception::perceived_risk(keyed.iter().copied(), options.coercion);
    let votes = votes::vote_shares(keyed.iter().copied(), options.coercion);
    let hazards = hazard::hazard_scores(keyed.iter().copied(), options.coercion);
    let states = first_states(keyed.iter().copied());

    log::debug!(
        "Stage sizes: perceived={} votes={} hazards={}",
        perceived.len(),
        votes.len(),
        hazards.len()
    );

    let metrics = composite::compose(
        &composite::StageTables {
            perceived: &perceived,
            states: &states,
            votes: &votes,
            hazards: &hazards,
        },
        weights,
        options.resilience_fallback,
    )?;

    log::info!(
        "Scored {} counties (political weight {}, resilience weight {})",
        metrics.len(),
        weights.political,
        weights.resilience
    );

    Ok(metrics)
}

/// State name from the first row of each county.
fn first_states<'a, I>(records: I) -> BTreeMap<CountyFips, String>
where
    I: IntoIterator<Item = &'a CountyRecord>,
{
    let mut states = BTreeMap::new();
    for record in records {
        states
            .entry(record.county_fips.clone())
            .or_insert_with(|| record.state.trim().to_owned());
    }
    states
}
