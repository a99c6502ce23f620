//! Ranked county table and its CSV export.

use std::fmt::Write as _;
use std::io::Write;

use climate_need_county_models::{CountyFips, CountyMetrics};
use serde::Serialize;

use crate::{RenderError, escape, format_metric};

/// One exported row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCountyRow {
    /// County code.
    pub county_fips: CountyFips,
    /// FEMA risk score.
    #[serde(rename = "TotalRiskScore")]
    pub total_risk_score: Option<f64>,
    /// Mean perceived risk.
    #[serde(rename = "PerceivedRisk")]
    pub perceived_risk: f64,
    /// Democratic vote share in percent.
    #[serde(rename = "DemVotePct")]
    pub dem_vote_pct: Option<f64>,
    /// Republican vote share in percent.
    #[serde(rename = "RepVotePct")]
    pub rep_vote_pct: Option<f64>,
    /// FEMA resilience score.
    #[serde(rename = "ResilienceScore")]
    pub resilience_score: Option<f64>,
    /// Risk minus perceived risk.
    #[serde(rename = "RiskGap")]
    pub risk_gap: Option<f64>,
    /// Final score used for ranking.
    #[serde(rename = "EnhancedNeedScore")]
    pub enhanced_need_score: f64,
}

/// Returns the `n` counties with the highest enhanced need score.
///
/// Counties without a score are left out. Equal scores are ordered by
/// county code.
#[must_use]
pub fn top_counties(metrics: &[CountyMetrics], n: usize) -> Vec<TopCountyRow> {
    let mut ranked: Vec<(&CountyMetrics, f64)> = metrics
        .iter()
        .filter_map(|m| Some((m, m.enhanced_need_score.filter(|s| s.is_finite())?)))
        .collect();

    ranked.sort_by(|(a, a_score), (b, b_score)| {
        b_score
            .total_cmp(a_score)
            .then_with(|| a.county_fips.cmp(&b.county_fips))
    });
    ranked.truncate(n);

    ranked
        .into_iter()
        .map(|(m, score)| TopCountyRow {
            county_fips: m.county_fips.clone(),
            total_risk_score: m.total_risk_score,
            perceived_risk: m.perceived_risk,
            dem_vote_pct: m.dem_vote_pct,
            rep_vote_pct: m.rep_vote_pct,
            resilience_score: m.resilience_score,
            risk_gap: m.risk_gap,
            enhanced_need_score: score,
        })
        .collect()
}

/// Writes `rows` as CSV with a header row. Missing values are empty cells.
///
/// # Errors
///
/// Returns [`RenderError`] if writing fails.
pub fn write_csv<W: Write>(writer: W, rows: &[TopCountyRow]) -> Result<(), RenderError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    if rows.is_empty() {
        csv.write_record(CSV_COLUMNS)?;
    }
    csv.flush()?;
    Ok(())
}

/// [`write_csv`] into a string.
///
/// # Errors
///
/// Returns [`RenderError`] if serialization fails.
pub fn to_csv_string(rows: &[TopCountyRow]) -> Result<String, RenderError> {
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Header of the CSV export.
pub const CSV_COLUMNS: [&str; 8] = [
    "county_fips",
    "TotalRiskScore",
    "PerceivedRisk",
    "DemVotePct",
    "RepVotePct",
    "ResilienceScore",
    "RiskGap",
    "EnhancedNeedScore",
];

/// Renders `rows` as an HTML table with a rank column.
#[must_use]
pub fn render_html(rows: &[TopCountyRow]) -> String {
    let mut html = String::from(r#"<table class="top-counties"><thead><tr><th>#</th>"#);
    for column in CSV_COLUMNS {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");

    for (rank, row) in rows.iter().enumerate() {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
            rank + 1,
            escape(row.county_fips.as_str()),
            format_metric(row.total_risk_score),
            row.perceived_risk,
            format_metric(row.dem_vote_pct),
            format_metric(row.rep_vote_pct),
            format_metric(row.resilience_score),
            format_metric(row.risk_gap),
            row.enhanced_need_score,
        );
    }

    if rows.is_empty() {
        let _ = write!(
            html,
            r#"<tr><td colspan="{}">No scored counties</td></tr>"#,
            CSV_COLUMNS.len() + 1
        );
    }
    html.push_str("</tbody></table>");
    html
}
