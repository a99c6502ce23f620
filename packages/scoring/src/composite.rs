//! Composite scoring: merges the stage outputs and applies the weighted
//! need formula.

use std::collections::BTreeMap;

use climate_need_county_models::{
    CountyFips, CountyMetrics, HazardScores, ResilienceFallback, VoteShares, Weights,
};

use crate::ScoringError;

/// Stage outputs keyed by county, ready to be merged.
pub struct StageTables<'a> {
    /// Mean perceived risk (the base table of the merge).
    pub perceived: &'a BTreeMap<CountyFips, f64>,
    /// State name per county.
    pub states: &'a BTreeMap<CountyFips, String>,
    /// Vote shares per county.
    pub votes: &'a BTreeMap<CountyFips, VoteShares>,
    /// FEMA indices per county.
    pub hazards: &'a BTreeMap<CountyFips, HazardScores>,
}

/// Left-joins votes and FEMA indices onto the perceived-risk table and
/// derives every metric.
///
/// Counties missing from the vote or FEMA tables keep `None` for the
/// metrics that depend on them.
///
/// # Errors
///
/// Returns [`ScoringError::DegenerateResilience`] when no county has a
/// positive resilience score and `fallback` is [`ResilienceFallback::Fail`].
pub fn compose(
    tables: &StageTables<'_>,
    weights: Weights,
    fallback: ResilienceFallback,
) -> Result<Vec<CountyMetrics>, ScoringError> {
    let max_resilience = resilience_max(tables)
        .filter(|max| *max > 0.0)
        .map_or_else(
            || match fallback {
                ResilienceFallback::Fail => Err(ScoringError::DegenerateResilience),
                ResilienceFallback::ZeroFactor => {
                    log::warn!(
                        "No county has a positive resilience score; resilience factor set to 0"
                    );
                    Ok(None)
                }
            },
            |max| Ok(Some(max)),
        )?;

    let metrics = tables
        .perceived
        .iter()
        .map(|(fips, &perceived_risk)| {
            let votes = tables.votes.get(fips);
            let hazard = tables.hazards.get(fips);

            let total_risk_score = hazard.map(|h| h.risk_score);
            let resilience_score = hazard.map(|h| h.resilience_score);
            let risk_gap = total_risk_score.map(|risk| risk - perceived_risk);
            let resilience_factor =
                resilience_score.map(|score| max_resilience.map_or(0.0, |max| 1.0 - score / max));
            let weighted_political = votes.map(|v| {
                weights
                    .political
                    .mul_add(v.republican_pct, (1.0 - weights.political) * v.democrat_pct)
                    / 100.0
            });
            let need_score = risk_gap
                .zip(weighted_political)
                .map(|(gap, political)| gap * political);
            let enhanced_need_score = need_score
                .zip(resilience_factor)
                .map(|(need, factor)| need * weights.resilience.mul_add(factor, 1.0));

            CountyMetrics {
                county_fips: fips.clone(),
                state: tables.states.get(fips).cloned().unwrap_or_default(),
                perceived_risk,
                dem_vote_pct: votes.map(|v| v.democrat_pct),
                rep_vote_pct: votes.map(|v| v.republican_pct),
                other_vote_pct: votes.map(|v| v.other_pct),
                total_risk_score,
                resilience_score,
                risk_gap,
                resilience_factor,
                weighted_political,
                need_score,
                enhanced_need_score,
            }
        })
        .collect::<Vec<_>>();

    let unscored = metrics
        .iter()
        .filter(|m| m.enhanced_need_score.is_none())
        .count();
    if unscored > 0 {
        log::info!(
            "{unscored} of {} counties lack vote or FEMA data and have no need score",
            metrics.len()
        );
    }

    Ok(metrics)
}

/// Largest resilience score among the counties in the merged table.
fn resilience_max(tables: &StageTables<'_>) -> Option<f64> {
    tables
        .perceived
        .keys()
        .filter_map(|fips| tables.hazards.get(fips))
        .map(|h| h.resilience_score)
        .fold(None, |max: Option<f64>, score| {
            Some(max.map_or(score, |m| m.max(score)))
        })
}
