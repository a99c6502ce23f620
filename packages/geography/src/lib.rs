#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County boundary handling for the climate need map.
//!
//! Converts Census county shapefiles into `GeoJSON` (regenerating a missing
//! `.shx` index on the way), loads county boundaries keyed by FIPS code, and
//! joins scored county metrics onto those boundaries for one state at a
//! time.

pub mod boundaries;
pub mod convert;
pub mod join;
pub mod progress;
pub mod shx;

use std::path::PathBuf;

use thiserror::Error;

pub use boundaries::{BoundaryKey, CountyBoundary, bounding_rect, load_boundaries};
pub use convert::convert_shapefile;
pub use join::{ScoredCounty, join_scores, to_feature_collection};

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// The input file does not exist.
    #[error("File not found: {}", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The shapefile reader failed.
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// `GeoJSON` parsing failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data conversion error.
    #[error("Conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl GeoError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
