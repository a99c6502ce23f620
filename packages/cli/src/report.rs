//! Static report generation for one state.
//!
//! Runs the full pipeline once and writes every view to an output
//! directory, together with a `manifest.json` describing the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use climate_need_config::NeedConfig;
use climate_need_county_models::{CountyRecord, ScoringOptions, Weights};
use climate_need_geography::progress::ProgressCallback;
use climate_need_geography::{CountyBoundary, GeoError, join_scores, to_feature_collection};
use climate_need_render::RenderError;
use climate_need_render::choropleth::{self, ChoroplethOptions};
use climate_need_render::dashboard::{DashboardView, render_page};
use climate_need_render::scatter::{self, ScatterOptions};
use climate_need_render::table;
use climate_need_scoring::{ScoringError, score, state_counties, states};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while generating a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested state does not occur in the data.
    #[error("Unknown state '{state}'")]
    UnknownState {
        /// The requested name.
        state: String,
    },

    /// Scoring failed.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Building the spatial output failed.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// Rendering the table failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Serializing JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a file failed.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// What to report on.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// State to map.
    pub state: String,
    /// Scoring weights.
    pub weights: Weights,
    /// Directory the files are written to.
    pub output_dir: PathBuf,
}

/// Description of a generated report, written as `manifest.json`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Mapped state.
    pub state: String,
    /// Weights used.
    pub weights: Weights,
    /// Missing-value and resilience options used.
    pub options: ScoringOptions,
    /// Source dataset.
    pub records: PathBuf,
    /// Source boundaries.
    pub boundaries: PathBuf,
    /// Counties scored nationally.
    pub scored_counties: usize,
    /// Counties drawn on the map.
    pub mapped_counties: usize,
    /// Rows in the ranked table.
    pub top_counties: usize,
    /// Files written next to the manifest.
    pub files: Vec<String>,
}

/// A rendered report, not yet written.
#[derive(Debug, Clone)]
pub struct Report {
    /// Run description.
    pub manifest: Manifest,
    /// `(file name, contents)` pairs.
    pub files: Vec<(&'static str, String)>,
}

/// Renders every output for `request`.
///
/// # Errors
///
/// Returns [`ReportError`] if the state is unknown, scoring fails, or an
/// output cannot be serialized.
pub fn build_report(
    records: &[CountyRecord],
    boundaries: &[CountyBoundary],
    config: &NeedConfig,
    request: &ReportRequest,
) -> Result<Report, ReportError> {
    let all_states = states(records);
    let state = all_states
        .iter()
        .find(|s| s.eq_ignore_ascii_case(request.state.trim()))
        .cloned()
        .ok_or_else(|| ReportError::UnknownState {
            state: request.state.clone(),
        })?;

    let options = config.scoring_options();
    let metrics = score(records, request.weights, options)?;
    let counties = state_counties(records, &state);
    let joined = join_scores(&metrics, boundaries, &counties);
    let top = table::top_counties(&metrics, config.report.top_n);

    let map_svg = choropleth::render_svg(
        &joined,
        &ChoroplethOptions {
            title: format!("Enhanced need score, {state}"),
            ..ChoroplethOptions::default()
        },
    );
    let scatter_svg = scatter::render_svg(&metrics, &ScatterOptions::default());
    let top_csv = table::to_csv_string(&top)?;
    let geojson = serde_json::to_string(&to_feature_collection(&joined)?)?;
    let dashboard = render_page(&DashboardView {
        states: &all_states,
        state: &state,
        weights: request.weights,
        map_svg: &map_svg,
        scatter_svg: &scatter_svg,
        table_html: &table::render_html(&top),
        csv_href: "top_counties.csv",
        mapped_counties: joined.len(),
    });

    let files = vec![
        ("choropleth.svg", map_svg),
        ("scatter.svg", scatter_svg),
        ("top_counties.csv", top_csv),
        ("counties.geojson", geojson),
        ("dashboard.html", dashboard),
    ];

    let manifest = Manifest {
        generated_at: Utc::now(),
        state,
        weights: request.weights,
        options,
        records: config.data.records.clone(),
        boundaries: config.data.boundaries.clone(),
        scored_counties: metrics.len(),
        mapped_counties: joined.len(),
        top_counties: top.len(),
        files: files.iter().map(|(name, _)| (*name).to_string()).collect(),
    };

    Ok(Report { manifest, files })
}

/// Writes a report into `dir`, creating it if needed. Returns the paths
/// written, manifest last.
///
/// # Errors
///
/// Returns [`ReportError::Io`] if a file cannot be written.
pub fn write_report(
    report: &Report,
    dir: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    progress.set_total(report.files.len() as u64 + 1);
    let mut written = Vec::with_capacity(report.files.len() + 1);

    for (name, contents) in &report.files {
        progress.set_message(format!("Writing {name}"));
        written.push(write_file(&dir.join(name), contents)?);
        progress.inc(1);
    }

    let manifest = serde_json::to_string_pretty(&report.manifest)?;
    written.push(write_file(&dir.join("manifest.json"), &manifest)?);
    progress.inc(1);

    progress.finish(format!("Report written to {}", dir.display()));
    log::info!(
        "Wrote {} files for {} to {}",
        written.len(),
        report.manifest.state,
        dir.display()
    );
    Ok(written)
}

fn write_file(path: &Path, contents: &str) -> Result<PathBuf, ReportError> {
    std::fs::write(path, contents).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use climate_need_geography::BoundaryKey;
    use climate_need_geography::boundaries::parse_boundaries;
    use climate_need_geography::progress::null_progress;
    use climate_need_scoring::read_records;

    use super::*;

    const RECORDS: &str = "\
county_fips,state,party,happening,candidatevotes,totalvotes,risk_score,resl_score
1001,Alabama,DEMOCRAT,2,600,1000,50,80
1001,Alabama,REPUBLICAN,4,400,1000,50,80
1003,Alabama,DEMOCRAT,6,300,1000,90,20
1003,Alabama,REPUBLICAN,6,700,1000,90,20
";

    const BOUNDARIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "001", "NAME": "Autauga"},
                "geometry": {"type": "Polygon", "coordinates": [[[-87,32],[-86,32],[-86,33],[-87,33],[-87,32]]]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "003", "NAME": "Baldwin"},
                "geometry": {"type": "Polygon", "coordinates": [[[-86,32],[-85,32],[-85,33],[-86,33],[-86,32]]]}
            }
        ]
    }"#;

    fn request(state: &str, output_dir: PathBuf) -> ReportRequest {
        ReportRequest {
            state: state.to_string(),
            weights: Weights::DEFAULT,
            output_dir,
        }
    }

    fn inputs() -> (Vec<CountyRecord>, Vec<CountyBoundary>) {
        (
            read_records(RECORDS.as_bytes()).unwrap(),
            parse_boundaries(BOUNDARIES, &BoundaryKey::default()).unwrap(),
        )
    }

    #[test]
    fn builds_every_view() {
        let (records, boundaries) = inputs();
        let report = build_report(
            &records,
            &boundaries,
            &NeedConfig::defaults(),
            &request("alabama", PathBuf::from("unused")),
        )
        .unwrap();

        assert_eq!(report.manifest.state, "Alabama");
        assert_eq!(report.manifest.scored_counties, 2);
        assert_eq!(report.manifest.mapped_counties, 2);
        assert_eq!(report.files.len(), 5);

        let csv = &report
            .files
            .iter()
            .find(|(name, _)| *name == "top_counties.csv")
            .unwrap()
            .1;
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].starts_with("01003,"));
        assert!(rows[2].starts_with("01001,"));
    }

    #[test]
    fn unknown_state_fails() {
        let (records, boundaries) = inputs();
        let err = build_report(
            &records,
            &boundaries,
            &NeedConfig::defaults(),
            &request("Atlantis", PathBuf::from("unused")),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::UnknownState { .. }));
    }

    #[test]
    fn writes_files_and_manifest() {
        let (records, boundaries) = inputs();
        let dir = std::env::temp_dir().join(format!("climate-need-{}", uuid::Uuid::new_v4()));
        let request = request("Alabama", dir.clone());
        let report =
            build_report(&records, &boundaries, &NeedConfig::defaults(), &request).unwrap();

        let written = write_report(&report, &request.output_dir, &null_progress()).unwrap();
        assert_eq!(written.len(), 6);
        assert!(written.iter().all(|p| p.exists()));

        let manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["state"], "Alabama");
        assert_eq!(manifest["weights"]["political"], 1.0);
        assert!(manifest["generatedAt"].is_string());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
