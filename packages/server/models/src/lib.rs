#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the climate need dashboard server.
//!
//! These types are serialized to JSON for the REST API. Metrics are passed
//! through unchanged so exports and API responses share column names.

use climate_need_county_models::{CountyMetrics, Weights};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by the dashboard and every scoring endpoint.
///
/// Missing weights fall back to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    /// Selected state name.
    pub state: Option<String>,
    /// Political weighting in `[0, 1]`.
    pub political_weight: Option<f64>,
    /// Resilience weighting in `[0, 1]`.
    pub resilience_weight: Option<f64>,
}

impl DashboardParams {
    /// Weights from the query, each falling back to `defaults`.
    #[must_use]
    pub fn weights_or(&self, defaults: Weights) -> Weights {
        Weights {
            political: self.political_weight.unwrap_or(defaults.political),
            resilience: self.resilience_weight.unwrap_or(defaults.resilience),
        }
    }

    /// The requested state, ignoring blank values.
    #[must_use]
    pub fn state(&self) -> Option<&str> {
        self.state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of source rows loaded.
    pub records: usize,
    /// Number of county boundaries loaded.
    pub boundaries: usize,
}

/// States available in the source data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStates {
    /// Distinct state names, sorted.
    pub states: Vec<String>,
}

/// Scored counties for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiScores {
    /// State the counties were restricted to, if any.
    pub state: Option<String>,
    /// Weights the scores were computed with.
    pub weights: Weights,
    /// One entry per county.
    pub counties: Vec<CountyMetrics>,
}

/// Error body returned with 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_fall_back_to_default_weights() {
        let params: DashboardParams =
            serde_json::from_str(r#"{"state": " Alabama ", "politicalWeight": 0.25}"#).unwrap();
        let weights = params.weights_or(Weights::DEFAULT);
        assert!((weights.political - 0.25).abs() < f64::EPSILON);
        assert!((weights.resilience - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.state(), Some("Alabama"));
    }

    #[test]
    fn blank_state_is_none() {
        let params = DashboardParams {
            state: Some("  ".to_string()),
            ..DashboardParams::default()
        };
        assert_eq!(params.state(), None);
    }
}
