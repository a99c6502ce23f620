//! The dashboard page: controls plus the three views.

use std::fmt::Write as _;

use climate_need_county_models::Weights;

use crate::{escape, escape_attr};

/// Slider granularity for both weights.
pub const WEIGHT_STEP: f64 = 0.05;

/// Everything the page shows, already rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    /// States offered in the selector.
    pub states: &'a [String],
    /// Currently selected state.
    pub state: &'a str,
    /// Current weights.
    pub weights: Weights,
    /// Choropleth SVG.
    pub map_svg: &'a str,
    /// Scatter SVG.
    pub scatter_svg: &'a str,
    /// Ranked table HTML.
    pub table_html: &'a str,
    /// Link for downloading the ranked table as CSV.
    pub csv_href: &'a str,
    /// Number of counties drawn on the map.
    pub mapped_counties: usize,
}

const STYLE: &str = "body{font-family:sans-serif;margin:0;padding:16px 24px;color:#222}\
h1{font-size:22px;margin:0 0 12px}\
form{display:flex;flex-wrap:wrap;gap:16px;align-items:center;margin-bottom:16px}\
label{display:flex;gap:6px;align-items:center}\
.views{display:flex;flex-wrap:wrap;gap:24px}\
.views svg{max-width:100%;height:auto}\
table{border-collapse:collapse;font-size:13px}\
th,td{border:1px solid #ddd;padding:4px 8px;text-align:right}\
th{background:#f4f4f4}";

/// Renders the complete HTML document.
#[must_use]
pub fn render_page(view: &DashboardView<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><title>Climate need: {title}</title><style>{STYLE}</style></head><body>"#,
        title = escape(view.state),
    );
    html.push_str("<h1>US Counties in Most Need: Climate Risk, Perception &amp; Resilience</h1>");

    html.push_str(r#"<form method="get" action="/"><label>State <select name="state" onchange="this.form.submit()">"#);
    for state in view.states {
        let selected = if state.eq_ignore_ascii_case(view.state) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            r#"<option value="{value}"{selected}>{label}</option>"#,
            value = escape_attr(state),
            label = escape(state),
        );
    }
    html.push_str("</select></label>");

    write_slider(
        &mut html,
        "politicalWeight",
        "Political weighting (0 = Democratic, 1 = Republican)",
        view.weights.political,
    );
    write_slider(
        &mut html,
        "resilienceWeight",
        "Resilience weighting",
        view.weights.resilience,
    );

    let _ = write!(
        html,
        r#"<noscript><button type="submit">Update</button></noscript><a href="{href}" download>Download top counties (CSV)</a></form>"#,
        href = escape_attr(view.csv_href),
    );

    let _ = write!(
        html,
        r#"<div class="views"><section><h2>Need score by county ({count} counties)</h2>{map}</section><section><h2>Democratic vote share vs. risk gap</h2>{scatter}</section></div><section><h2>Top counties by need score</h2>{table}</section>"#,
        count = view.mapped_counties,
        map = view.map_svg,
        scatter = view.scatter_svg,
        table = view.table_html,
    );

    html.push_str("</body></html>");
    html
}

fn write_slider(html: &mut String, name: &str, label: &str, value: f64) {
    let _ = write!(
        html,
        r#"<label>{label} <input type="range" name="{name}" min="0" max="1" step="{WEIGHT_STEP}" value="{value}" oninput="this.nextElementSibling.value=this.value" onchange="this.form.submit()"><output>{value}</output></label>"#,
        label = escape(label),
        name = escape_attr(name),
    );
}
