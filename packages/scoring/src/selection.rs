//! State selection helpers driven by the dataset's `state` column.

use std::collections::BTreeSet;

use climate_need_county_models::{CountyFips, CountyRecord};

/// Distinct non-empty state names, sorted.
#[must_use]
pub fn states(records: &[CountyRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.state.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// County codes whose rows name `state` (compared case-insensitively).
#[must_use]
pub fn state_counties(records: &[CountyRecord], state: &str) -> BTreeSet<CountyFips> {
    let state = state.trim();
    records
        .iter()
        .filter(|r| !r.county_fips.is_unknown() && r.state.trim().eq_ignore_ascii_case(state))
        .map(|r| r.county_fips.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fips: &str, state: &str) -> CountyRecord {
        CountyRecord {
            county_fips: CountyFips::parse(fips).unwrap(),
            state: state.to_string(),
            happening: None,
            party: None,
            candidatevotes: None,
            totalvotes: None,
            risk_score: None,
            resl_score: None,
        }
    }

    #[test]
    fn lists_distinct_sorted_states() {
        let records = vec![
            record("6037", "California"),
            record("1001", "Alabama"),
            record("1003", "Alabama"),
            record("1005", " "),
        ];
        assert_eq!(states(&records), vec!["Alabama", "California"]);
    }

    #[test]
    fn selects_counties_by_state_name() {
        let records = vec![
            record("6037", "California"),
            record("1001", "Alabama"),
            record("1003", "alabama"),
            record("1003", "Alabama"),
        ];
        let counties = state_counties(&records, "ALABAMA");
        let codes: Vec<&str> = counties.iter().map(CountyFips::as_str).collect();
        assert_eq!(codes, vec!["01001", "01003"]);
    }

    #[test]
    fn unknown_state_selects_nothing() {
        let records = vec![record("6037", "California")];
        assert!(state_counties(&records, "Texas").is_empty());
    }
}
