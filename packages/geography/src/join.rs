//! Joins county metrics onto boundaries for one state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use climate_need_county_models::{CountyFips, CountyMetrics};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue, feature::Id};

use crate::GeoError;
use crate::boundaries::CountyBoundary;

/// A scored county with its geometry; the unit of spatial output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCounty {
    /// Metrics computed for the county.
    pub metrics: CountyMetrics,
    /// Display name from the boundary file.
    pub name: Option<String>,
    /// County outline.
    pub geometry: MultiPolygon<f64>,
    /// Human-readable summary used for tooltips.
    pub description: String,
}

impl ScoredCounty {
    /// The county's enhanced need score. Always present after a join.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.metrics.enhanced_need_score.unwrap_or_default()
    }
}

/// Restricts `metrics` to `counties` and joins them onto `boundaries`.
///
/// Boundaries are the left side: each county in `counties` with a boundary
/// geometry is looked up in `metrics`. Counties without a geometry, without
/// metrics, or without an enhanced need score are dropped. The result is in
/// boundary order.
#[must_use]
pub fn join_scores(
    metrics: &[CountyMetrics],
    boundaries: &[CountyBoundary],
    counties: &BTreeSet<CountyFips>,
) -> Vec<ScoredCounty> {
    let by_code: BTreeMap<&CountyFips, &CountyMetrics> = metrics
        .iter()
        .filter(|m| counties.contains(&m.county_fips))
        .map(|m| (&m.county_fips, m))
        .collect();

    let mut joined = Vec::new();
    let mut without_geometry = 0usize;
    let mut without_score = 0usize;

    for boundary in boundaries {
        let Some(metrics) = by_code.get(&boundary.code) else {
            continue;
        };
        let Some(geometry) = &boundary.geometry else {
            without_geometry += 1;
            continue;
        };
        if metrics.enhanced_need_score.is_none() {
            log::debug!("County {} has no need score", boundary.code);
            without_score += 1;
            continue;
        }

        joined.push(ScoredCounty {
            metrics: (*metrics).clone(),
            name: boundary.name.clone(),
            geometry: geometry.clone(),
            description: describe(metrics, boundary.name.as_deref()),
        });
    }

    let matched = joined.len() + without_geometry + without_score;
    let unmatched = by_code.len().saturating_sub(matched);
    if unmatched > 0 {
        log::debug!("{unmatched} scored counties have no boundary");
    }
    log::info!(
        "Joined {} of {} counties ({without_geometry} without geometry, {without_score} without score, {unmatched} without boundary)",
        joined.len(),
        counties.len(),
    );

    joined
}

/// Builds the tooltip text for a county.
#[must_use]
pub fn describe(metrics: &CountyMetrics, name: Option<&str>) -> String {
    let mut text = name.map_or_else(
        || format!("County {}", metrics.county_fips),
        |name| format!("{name} ({})", metrics.county_fips),
    );
    if !metrics.state.is_empty() {
        let _ = write!(text, ", {}", metrics.state);
    }

    let lines = [
        ("Need score", metrics.enhanced_need_score),
        ("Risk gap", metrics.risk_gap),
        ("FEMA risk", metrics.total_risk_score),
        ("Resilience", metrics.resilience_score),
        ("Dem vote %", metrics.dem_vote_pct),
        ("Rep vote %", metrics.rep_vote_pct),
    ];
    let _ = write!(text, "\nPerceived risk: {:.2}", metrics.perceived_risk);
    for (label, value) in lines {
        match value {
            Some(v) => {
                let _ = write!(text, "\n{label}: {v:.2}");
            }
            None => {
                let _ = write!(text, "\n{label}: n/a");
            }
        }
    }
    text
}

/// Serializes scored counties as a `GeoJSON` `FeatureCollection`.
///
/// Each feature carries the county code as its id and every metric, the
/// name, and the description as properties.
///
/// # Errors
///
/// Returns [`GeoError::Json`] if the metrics cannot be serialized.
pub fn to_feature_collection(counties: &[ScoredCounty]) -> Result<FeatureCollection, GeoError> {
    let mut features = Vec::with_capacity(counties.len());

    for county in counties {
        let mut properties = match serde_json::to_value(&county.metrics)? {
            JsonValue::Object(map) => map,
            _ => JsonObject::new(),
        };
        properties.insert(
            "name".to_string(),
            county
                .name
                .clone()
                .map_or(JsonValue::Null, JsonValue::String),
        );
        properties.insert(
            "description".to_string(),
            JsonValue::String(county.description.clone()),
        );

        features.push(Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(
                &county.geometry,
            ))),
            id: Some(Id::String(county.metrics.county_fips.to_string())),
            properties: Some(properties),
            foreign_members: None,
        });
    }

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
