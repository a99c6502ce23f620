#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Presentation of scored counties.
//!
//! Everything here is read-only over already computed metrics: an SVG
//! choropleth of one state's counties, an SVG scatter of vote share against
//! risk gap, the top-N table with its CSV export, and the HTML page that
//! puts the three together.

pub mod choropleth;
pub mod color;
pub mod dashboard;
pub mod projection;
pub mod scatter;
pub mod table;

use thiserror::Error;

/// Errors that can occur while writing rendered output.
#[derive(Debug, Error)]
pub enum RenderError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Escapes text for use in SVG/HTML element content.
pub(crate) fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escapes text for use inside a double-quoted attribute.
pub(crate) fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Formats an optional metric for display.
pub(crate) fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}
