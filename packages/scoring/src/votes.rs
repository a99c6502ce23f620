//! Vote-share stage: per-row candidate share, summed per county and party
//! bucket, pivoted into one [`VoteShares`] per county.

use std::collections::BTreeMap;

use climate_need_county_models::{
    CoercionPolicy, CountyFips, CountyRecord, PartyBucket, VoteShares,
};

/// Computes vote shares (in percent) per county.
///
/// Rows without a party or without a positive `totalvotes` are excluded
/// because their share is undefined. A missing `candidatevotes` counts as
/// `0` under [`CoercionPolicy::ZeroFillNumeric`] and drops the row under
/// [`CoercionPolicy::DropRow`]. Counties with no remaining rows are absent
/// from the result; buckets without rows stay at `0`.
pub fn vote_shares<'a, I>(records: I, policy: CoercionPolicy) -> BTreeMap<CountyFips, VoteShares>
where
    I: IntoIterator<Item = &'a CountyRecord>,
{
    let mut shares: BTreeMap<CountyFips, VoteShares> = BTreeMap::new();
    let mut excluded = 0u64;

    for record in records {
        let Some(party) = record.party.as_deref().filter(|p| !p.trim().is_empty()) else {
            continue;
        };

        let Some(total) = record.totalvotes.filter(|t| *t > 0.0) else {
            excluded += 1;
            continue;
        };

        let candidate = match (record.candidatevotes, policy) {
            (Some(v), _) => v,
            (None, CoercionPolicy::ZeroFillNumeric) => 0.0,
            (None, CoercionPolicy::DropRow) => {
                excluded += 1;
                continue;
            }
        };

        shares
            .entry(record.county_fips.clone())
            .or_default()
            .add(PartyBucket::classify(party), candidate / total * 100.0);
    }

    if excluded > 0 {
        log::info!("Vote shares: excluded {excluded} rows with zero or missing vote totals");
    }
    log::debug!("Vote shares computed for {} counties", shares.len());

    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fips: &str, party: &str, candidate: Option<f64>, total: Option<f64>) -> CountyRecord {
        CountyRecord {
            county_fips: CountyFips::parse(fips).unwrap(),
            state: "Test".to_string(),
            happening: None,
            party: Some(party.to_string()),
            candidatevotes: candidate,
            totalvotes: total,
            risk_score: None,
            resl_score: None,
        }
    }

    fn fips(s: &str) -> CountyFips {
        CountyFips::parse(s).unwrap()
    }

    #[test]
    fn pivots_parties_into_buckets() {
        let records = vec![
            record("1001", "DEMOCRAT", Some(600.0), Some(1000.0)),
            record("1001", "republican", Some(400.0), Some(1000.0)),
        ];
        let result = vote_shares(&records, CoercionPolicy::ZeroFillNumeric);
        let shares = result[&fips("01001")];
        assert!((shares.democrat_pct - 60.0).abs() < 1e-9);
        assert!((shares.republican_pct - 40.0).abs() < 1e-9);
        assert!(shares.other_pct.abs() < 1e-9);
    }

    #[test]
    fn third_parties_do_not_count_toward_named_buckets() {
        let records = vec![
            record("1001", "DEMOCRAT", Some(500.0), Some(1000.0)),
            record("1001", "REPUBLICAN", Some(400.0), Some(1000.0)),
            record("1001", "LIBERTARIAN", Some(100.0), Some(1000.0)),
        ];
        let shares = vote_shares(&records, CoercionPolicy::ZeroFillNumeric)[&fips("01001")];
        assert!((shares.democrat_pct + shares.republican_pct - 90.0).abs() < 1e-9);
        assert!((shares.other_pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn zero_totals_contribute_nothing() {
        let records = vec![
            record("1001", "DEMOCRAT", Some(10.0), Some(0.0)),
            record("1001", "REPUBLICAN", Some(10.0), None),
        ];
        let result = vote_shares(&records, CoercionPolicy::ZeroFillNumeric);
        assert!(!result.contains_key(&fips("01001")));
    }

    #[test]
    fn missing_bucket_defaults_to_zero() {
        let records = vec![record("1001", "DEMOCRAT", Some(300.0), Some(1000.0))];
        let shares = vote_shares(&records, CoercionPolicy::ZeroFillNumeric)[&fips("01001")];
        assert!(shares.republican_pct.abs() < 1e-12);
    }

    #[test]
    fn sums_repeated_rows_for_the_same_party() {
        let records = vec![
            record("1001", "DEMOCRAT", Some(100.0), Some(1000.0)),
            record("1001", "DEMOCRAT", Some(200.0), Some(1000.0)),
        ];
        let shares = vote_shares(&records, CoercionPolicy::ZeroFillNumeric)[&fips("01001")];
        assert!((shares.democrat_pct - 30.0).abs() < 1e-9);
    }

    #[test]
    fn missing_candidate_votes_follow_policy() {
        let records = vec![record("1001", "DEMOCRAT", None, Some(1000.0))];
        let zero_filled = vote_shares(&records, CoercionPolicy::ZeroFillNumeric);
        assert!(zero_filled[&fips("01001")].democrat_pct.abs() < 1e-12);
        let dropped = vote_shares(&records, CoercionPolicy::DropRow);
        assert!(dropped.is_empty());
    }

    #[test]
    fn rows_without_party_are_ignored() {
        let mut row = record("1001", "DEMOCRAT", Some(1.0), Some(10.0));
        row.party = None;
        assert!(vote_shares(&[row], CoercionPolicy::ZeroFillNumeric).is_empty());
    }
}
