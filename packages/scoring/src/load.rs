//! CSV loading for the county dataset.
//!
//! Header names are trimmed before matching. Missing columns and
//! unparseable cells never fail the load: the affected values become `None`
//! and are resolved later by each stage's [`CoercionPolicy`].
//!
//! [`CoercionPolicy`]: climate_need_county_models::CoercionPolicy

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use climate_need_county_models::{CountyFips, CountyRecord};

use crate::ScoringError;

/// Columns the pipeline reads from the dataset.
pub const EXPECTED_COLUMNS: &[&str] = &[
    "county_fips",
    "state",
    "party",
    "happening",
    "candidatevotes",
    "totalvotes",
    "risk_score",
    "resl_score",
];

/// Loads every row of the county CSV at `path`.
///
/// # Errors
///
/// Returns [`ScoringError::Io`] if the file cannot be opened and
/// [`ScoringError::Csv`] if it is not readable as CSV.
pub fn load_records(path: &Path) -> Result<Vec<CountyRecord>, ScoringError> {
    let file = File::open(path).map_err(|source| ScoringError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read_records(file)?;
    log::info!("Loaded {} rows from {}", records.len(), path.display());
    Ok(records)
}

/// Parses county rows from any CSV source.
///
/// # Errors
///
/// Returns [`ScoringError::Csv`] if the header or a row cannot be read.
pub fn read_records<R: Read>(source: R) -> Result<Vec<CountyRecord>, ScoringError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(source);

    let columns: BTreeMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_owned(), i))
        .collect();

    for name in EXPECTED_COLUMNS {
        if !columns.contains_key(*name) {
            log::warn!("Column '{name}' is missing; its values will be treated as missing");
        }
    }

    let column = |name: &str| columns.get(name).copied();
    let fips_col = column("county_fips");
    let state_col = column("state");
    let party_col = column("party");
    let happening_col = column("happening");
    let candidate_col = column("candidatevotes");
    let total_col = column("totalvotes");
    let risk_col = column("risk_score");
    let resl_col = column("resl_score");

    let mut records = Vec::new();
    let mut invalid_fips = 0u64;

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        let county_fips = match cell(fips_col) {
            None => CountyFips::unknown(),
            Some(raw) => CountyFips::parse(raw).unwrap_or_else(|e| {
                log::debug!("Row {}: {e}", row + 1);
                invalid_fips += 1;
                CountyFips::unknown()
            }),
        };

        records.push(CountyRecord {
            county_fips,
            state: cell(state_col).unwrap_or_default().to_owned(),
            happening: parse_numeric(cell(happening_col)),
            party: cell(party_col).map(str::to_owned),
            candidatevotes: parse_numeric(cell(candidate_col)),
            totalvotes: parse_numeric(cell(total_col)),
            risk_score: parse_numeric(cell(risk_col)),
            resl_score: parse_numeric(cell(resl_col)),
        });
    }

    if invalid_fips > 0 {
        log::warn!("{invalid_fips} rows had an invalid county_fips and were marked unknown");
    }

    Ok(records)
}

/// Parses a numeric cell. Empty, non-numeric, and non-finite values are
/// `None`.
#[must_use]
pub fn parse_numeric(cell: Option<&str>) -> Option<f64> {
    cell?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
county_fips , state,party,happening,candidatevotes,totalvotes,risk_score,resl_score
1001,Alabama,DEMOCRAT,2,600,1000,50,80
1001.0,Alabama,REPUBLICAN,n/a,400,1000,50,80
,Alabama,GREEN,5,1,1000,,
";

    #[test]
    fn reads_rows_with_trimmed_headers() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].county_fips.as_str(), "01001");
        assert_eq!(records[1].county_fips.as_str(), "01001");
        assert_eq!(records[0].state, "Alabama");
        assert_eq!(records[0].party.as_deref(), Some("DEMOCRAT"));
        assert_eq!(records[0].candidatevotes, Some(600.0));
    }

    #[test]
    fn non_numeric_cells_become_none() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records[1].happening, None);
        assert_eq!(records[2].risk_score, None);
    }

    #[test]
    fn missing_fips_becomes_unknown() {
        let records = read_records(SAMPLE.as_bytes()).unwrap();
        assert!(records[2].county_fips.is_unknown());
    }

    #[test]
    fn missing_columns_do_not_fail() {
        let records = read_records("county_fips,state\n6037,California\n".as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].happening, None);
        assert_eq!(records[0].party, None);
    }

    #[test]
    fn parse_numeric_rejects_garbage() {
        assert_eq!(parse_numeric(Some(" 4.5 ")), Some(4.5));
        assert_eq!(parse_numeric(Some("NaN")), None);
        assert_eq!(parse_numeric(Some("abc")), None);
        assert_eq!(parse_numeric(None), None);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_records(Path::new("/nonexistent/visual_data.csv")).unwrap_err();
        assert!(matches!(err, ScoringError::Io { .. }));
    }
}
