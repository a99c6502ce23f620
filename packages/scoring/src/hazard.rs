//! FEMA hazard/resilience stage: one pair of scores per county.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use climate_need_county_models::{CoercionPolicy, CountyFips, CountyRecord, HazardScores};

/// Keeps the first FEMA row seen for each county.
///
/// The dataset repeats FEMA indices on every row of a county. When later
/// rows disagree with the kept one the first row still wins; the number of
/// disagreeing rows is logged so that inconsistent inputs are visible.
pub fn hazard_scores<'a, I>(records: I, policy: CoercionPolicy) -> BTreeMap<CountyFips, HazardScores>
where
    I: IntoIterator<Item = &'a CountyRecord>,
{
    let mut kept: BTreeMap<CountyFips, HazardScores> = BTreeMap::new();
    let mut conflicts = 0u64;

    for record in records {
        let scores = match policy {
            CoercionPolicy::ZeroFillNumeric => HazardScores {
                risk_score: record.risk_score.unwrap_or(0.0),
                resilience_score: record.resl_score.unwrap_or(0.0),
            },
            CoercionPolicy::DropRow => match (record.risk_score, record.resl_score) {
                (Some(risk_score), Some(resilience_score)) => HazardScores {
                    risk_score,
                    resilience_score,
                },
                _ => continue,
            },
        };

        match kept.entry(record.county_fips.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(scores);
            }
            Entry::Occupied(entry) => {
                if *entry.get() != scores {
                    conflicts += 1;
                    log::debug!(
                        "County {}: FEMA row {scores:?} disagrees with kept {:?}",
                        entry.key(),
                        entry.get()
                    );
                }
            }
        }
    }

    if conflicts > 0 {
        log::warn!(
            "{conflicts} duplicate FEMA rows disagree with the first row for their county; \
             the first row was kept"
        );
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fips: &str, risk: Option<f64>, resl: Option<f64>) -> CountyRecord {
        CountyRecord {
            county_fips: CountyFips::parse(fips).unwrap(),
            state: "Test".to_string(),
            happening: None,
            party: None,
            candidatevotes: None,
            totalvotes: None,
            risk_score: risk,
            resl_score: resl,
        }
    }

    #[test]
    fn first_occurrence_wins() {
        let records = vec![
            record("1001", Some(50.0), Some(80.0)),
            record("1001", Some(99.0), Some(1.0)),
        ];
        let result = hazard_scores(&records, CoercionPolicy::ZeroFillNumeric);
        assert_eq!(result.len(), 1);
        let scores = result[&CountyFips::parse("01001").unwrap()];
        assert!((scores.risk_score - 50.0).abs() < f64::EPSILON);
        assert!((scores.resilience_score - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_fill_coerces_missing_scores() {
        let records = vec![record("1001", None, Some(10.0))];
        let scores = hazard_scores(&records, CoercionPolicy::ZeroFillNumeric)
            [&CountyFips::parse("01001").unwrap()];
        assert!(scores.risk_score.abs() < f64::EPSILON);
    }

    #[test]
    fn drop_row_takes_first_complete_row() {
        let records = vec![
            record("1001", None, Some(10.0)),
            record("1001", Some(30.0), Some(20.0)),
            record("1003", Some(1.0), None),
        ];
        let result = hazard_scores(&records, CoercionPolicy::DropRow);
        assert_eq!(result.len(), 1);
        let scores = result[&CountyFips::parse("01001").unwrap()];
        assert!((scores.risk_score - 30.0).abs() < f64::EPSILON);
    }
}
