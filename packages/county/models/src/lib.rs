#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County-level record, metric, and weighting types.
//!
//! These types describe the flat county dataset (risk perception, election
//! returns, FEMA hazard/resilience indices) and the per-county metrics derived
//! from it. They carry no behavior beyond validation so that the scoring,
//! geography, and rendering crates can share them.

pub mod fips;

pub use fips::{CountyFips, InvalidFipsError};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// One row of the source dataset.
///
/// A county usually appears on several rows (one per party, per survey
/// breakdown, ...). Numeric fields are `None` when the source cell was empty
/// or not a number; how that is treated is decided by [`CoercionPolicy`] in
/// each pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyRecord {
    /// Normalized county code ([`CountyFips::unknown`] when absent).
    pub county_fips: CountyFips,
    /// State name as written in the source.
    pub state: String,
    /// Share of residents who think climate change is happening.
    pub happening: Option<f64>,
    /// Party name as written in the source.
    pub party: Option<String>,
    /// Votes received by this row's candidate.
    pub candidatevotes: Option<f64>,
    /// Total votes cast in the county.
    pub totalvotes: Option<f64>,
    /// FEMA national risk index score.
    pub risk_score: Option<f64>,
    /// FEMA community resilience score.
    pub resl_score: Option<f64>,
}

/// The two named party buckets plus everything else.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyBucket {
    /// Democratic party and its spelling variants.
    Democrat,
    /// Republican party and its spelling variants (including `GOP`).
    Republican,
    /// Third parties, independents, write-ins.
    Other,
}

impl PartyBucket {
    /// Classifies a raw party name, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn classify(party: &str) -> Self {
        let party = party.trim().to_lowercase();
        if party.starts_with("dem") {
            Self::Democrat
        } else if party.starts_with("rep") || party == "gop" {
            Self::Republican
        } else {
            Self::Other
        }
    }
}

/// How missing or non-numeric cells are treated by the aggregation stages.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CoercionPolicy {
    /// Treat missing numeric values as `0` and keep the row.
    #[default]
    ZeroFillNumeric,
    /// Drop rows whose required numeric values are missing.
    DropRow,
}

/// What to do when no county has a positive resilience score, which makes
/// the resilience normalization undefined.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResilienceFallback {
    /// Use a resilience factor of `0` for every county.
    #[default]
    ZeroFactor,
    /// Abort the run.
    Fail,
}

/// Options that tune how the pipeline treats imperfect input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringOptions {
    /// Missing-value policy for every aggregation stage.
    pub coercion: CoercionPolicy,
    /// Behavior when the resilience maximum is not positive.
    pub resilience_fallback: ResilienceFallback,
}

/// User-chosen weights, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weights {
    /// Political weighting `w`: `1` uses only the Republican share, `0` only
    /// the Democratic share.
    pub political: f64,
    /// Resilience weighting `r`: how strongly low resilience amplifies need.
    pub resilience: f64,
}

impl Weights {
    /// Both weights at `1.0`.
    pub const DEFAULT: Self = Self {
        political: 1.0,
        resilience: 1.0,
    };

    /// Creates validated weights.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWeightError`] if either weight is not a finite value
    /// in `[0, 1]`.
    pub fn new(political: f64, resilience: f64) -> Result<Self, InvalidWeightError> {
        let weights = Self {
            political,
            resilience,
        };
        weights.validate()?;
        Ok(weights)
    }

    /// Checks that both weights are finite and within `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWeightError`] naming the first offending weight.
    pub fn validate(&self) -> Result<(), InvalidWeightError> {
        for (name, value) in [
            ("political", self.political),
            ("resilience", self.resilience),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(InvalidWeightError { name, value });
            }
        }
        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Error returned when a weight falls outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidWeightError {
    /// Which weight was rejected.
    pub name: &'static str,
    /// The rejected value.
    pub value: f64,
}

impl std::fmt::Display for InvalidWeightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} weight {}: expected a value between 0 and 1",
            self.name, self.value
        )
    }
}

impl std::error::Error for InvalidWeightError {}

/// Per-county vote shares in percent (`100 * sum(candidatevotes / totalvotes)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteShares {
    /// Democratic share.
    pub democrat_pct: f64,
    /// Republican share.
    pub republican_pct: f64,
    /// Everything that is neither Democratic nor Republican.
    pub other_pct: f64,
}

impl VoteShares {
    /// Adds a percentage to the given bucket.
    pub fn add(&mut self, bucket: PartyBucket, pct: f64) {
        match bucket {
            PartyBucket::Democrat => self.democrat_pct += pct,
            PartyBucket::Republican => self.republican_pct += pct,
            PartyBucket::Other => self.other_pct += pct,
        }
    }
}

/// FEMA indices kept for a county.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardScores {
    /// National risk index score.
    pub risk_score: f64,
    /// Community resilience score.
    pub resilience_score: f64,
}

/// Metrics derived for one county.
///
/// Field names serialize to the column names used in exports. Values that
/// cannot be computed because the county is missing from the FEMA or vote
/// data are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyMetrics {
    /// County code.
    pub county_fips: CountyFips,
    /// State name from the first source row for this county.
    pub state: String,
    /// Mean self-reported risk perception.
    #[serde(rename = "PerceivedRisk")]
    pub perceived_risk: f64,
    /// Democratic vote share in percent.
    #[serde(rename = "DemVotePct")]
    pub dem_vote_pct: Option<f64>,
    /// Republican vote share in percent.
    #[serde(rename = "RepVotePct")]
    pub rep_vote_pct: Option<f64>,
    /// Third-party vote share in percent.
    #[serde(rename = "OtherVotePct")]
    pub other_vote_pct: Option<f64>,
    /// FEMA risk score.
    #[serde(rename = "TotalRiskScore")]
    pub total_risk_score: Option<f64>,
    /// FEMA resilience score.
    #[serde(rename = "ResilienceScore")]
    pub resilience_score: Option<f64>,
    /// `TotalRiskScore - PerceivedRisk`.
    #[serde(rename = "RiskGap")]
    pub risk_gap: Option<f64>,
    /// `1 - ResilienceScore / max(ResilienceScore)`.
    #[serde(rename = "ResilienceFactor")]
    pub resilience_factor: Option<f64>,
    /// `(w * RepVotePct + (1 - w) * DemVotePct) / 100`.
    #[serde(rename = "WeightedPolitical")]
    pub weighted_political: Option<f64>,
    /// `RiskGap * WeightedPolitical`.
    #[serde(rename = "NeedScore")]
    pub need_score: Option<f64>,
    /// `NeedScore * (1 + r * ResilienceFactor)`.
    #[serde(rename = "EnhancedNeedScore")]
    pub enhanced_need_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_party_variants() {
        assert_eq!(PartyBucket::classify("DEMOCRAT"), PartyBucket::Democrat);
        assert_eq!(PartyBucket::classify(" democratic "), PartyBucket::Democrat);
        assert_eq!(PartyBucket::classify("Republican"), PartyBucket::Republican);
        assert_eq!(PartyBucket::classify("GOP"), PartyBucket::Republican);
        assert_eq!(PartyBucket::classify("LIBERTARIAN"), PartyBucket::Other);
        assert_eq!(PartyBucket::classify("GREEN"), PartyBucket::Other);
        assert_eq!(PartyBucket::classify(""), PartyBucket::Other);
    }

    #[test]
    fn policies_parse_from_snake_case() {
        assert_eq!(
            "drop_row".parse::<CoercionPolicy>().unwrap(),
            CoercionPolicy::DropRow
        );
        assert_eq!(
            "zero_factor".parse::<ResilienceFallback>().unwrap(),
            ResilienceFallback::ZeroFactor
        );
        assert_eq!(CoercionPolicy::default(), CoercionPolicy::ZeroFillNumeric);
    }

    #[test]
    fn weights_accept_unit_interval() {
        assert!(Weights::new(0.0, 1.0).is_ok());
        assert!(Weights::new(0.5, 0.25).is_ok());
        assert_eq!(Weights::default(), Weights::DEFAULT);
    }

    #[test]
    fn weights_reject_out_of_range() {
        let err = Weights::new(1.5, 0.0).unwrap_err();
        assert_eq!(err.name, "political");
        let err = Weights::new(0.5, -0.1).unwrap_err();
        assert_eq!(err.name, "resilience");
        assert!(Weights::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn vote_shares_accumulate_per_bucket() {
        let mut shares = VoteShares::default();
        shares.add(PartyBucket::Democrat, 30.0);
        shares.add(PartyBucket::Democrat, 10.0);
        shares.add(PartyBucket::Other, 5.0);
        assert!((shares.democrat_pct - 40.0).abs() < f64::EPSILON);
        assert!(shares.republican_pct.abs() < f64::EPSILON);
        assert!((shares.other_pct - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn metrics_serialize_with_export_column_names() {
        let metrics = CountyMetrics {
            county_fips: CountyFips::parse("1001").unwrap(),
            state: "Alabama".to_string(),
            perceived_risk: 3.0,
            dem_vote_pct: Some(60.0),
            rep_vote_pct: Some(40.0),
            other_vote_pct: Some(0.0),
            total_risk_score: Some(50.0),
            resilience_score: Some(80.0),
            risk_gap: Some(47.0),
            resilience_factor: Some(0.0),
            weighted_political: Some(0.4),
            need_score: Some(18.8),
            enhanced_need_score: Some(18.8),
        };
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["county_fips"], "01001");
        assert_eq!(json["RiskGap"], 47.0);
        assert!(json.get("EnhancedNeedScore").is_some());
    }
}
