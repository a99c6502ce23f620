//! SVG scatter plot of Democratic vote share against risk gap.

use std::fmt::Write as _;

use climate_need_county_models::CountyMetrics;

use crate::color::{ColorScale, MISSING};
use crate::{escape, format_metric};

/// Layout of the scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterOptions {
    /// Viewport width in pixels.
    pub width: f64,
    /// Viewport height in pixels.
    pub height: f64,
    /// Point radius.
    pub radius: f64,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 420.0,
            radius: 4.0,
        }
    }
}

const MARGIN_LEFT: f64 = 56.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 16.0;
const MARGIN_BOTTOM: f64 = 44.0;
const TICKS: usize = 5;

/// Renders one point per county with both a Democratic vote share and a
/// risk gap. Points are colored by enhanced need score; counties without a
/// score are drawn grey.
#[must_use]
pub fn render_svg(metrics: &[CountyMetrics], options: &ScatterOptions) -> String {
    let points: Vec<(f64, f64, &CountyMetrics)> = metrics
        .iter()
        .filter_map(|m| Some((m.dem_vote_pct?, m.risk_gap?, m)))
        .collect();

    let dropped = metrics.len() - points.len();
    if dropped > 0 {
        log::debug!("{dropped} counties lack a vote share or risk gap and are not plotted");
    }

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="scatter" viewBox="0 0 {w} {h}" width="{w}" height="{h}" font-family="sans-serif" font-size="11">"#,
        w = options.width,
        h = options.height,
    );

    if points.is_empty() {
        let _ = write!(
            svg,
            r##"<text x="{x}" y="{y}" text-anchor="middle" fill="#666">No counties to display</text></svg>"##,
            x = options.width / 2.0,
            y = options.height / 2.0,
        );
        return svg;
    }

    let x_axis = Axis::new(points.iter().map(|p| p.0), MARGIN_LEFT, options.width - MARGIN_RIGHT);
    let y_axis = Axis::new(
        points.iter().map(|p| p.1),
        options.height - MARGIN_BOTTOM,
        MARGIN_TOP,
    );
    let scale = ColorScale::from_values(points.iter().filter_map(|p| p.2.enhanced_need_score));

    write_axes(&mut svg, &x_axis, &y_axis, options);

    svg.push_str(r##"<g stroke="#555555" stroke-width="0.5" fill-opacity="0.85">"##);
    for (x, y, m) in &points {
        let fill = match (m.enhanced_need_score, &scale) {
            (Some(score), Some(scale)) => scale.color(score),
            _ => MISSING.to_string(),
        };
        let title = format!(
            "{} ({})\nDem vote %: {x:.2}\nRisk gap: {y:.2}\nNeed score: {}",
            m.county_fips,
            m.state,
            format_metric(m.enhanced_need_score),
        );
        let _ = write!(
            svg,
            r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r}" fill="{fill}"><title>{title}</title></circle>"#,
            cx = x_axis.to_pixel(*x),
            cy = y_axis.to_pixel(*y),
            r = options.radius,
            title = escape(&title),
        );
    }
    svg.push_str("</g></svg>");
    svg
}

fn write_axes(svg: &mut String, x_axis: &Axis, y_axis: &Axis, options: &ScatterOptions) {
    let bottom = options.height - MARGIN_BOTTOM;
    let right = options.width - MARGIN_RIGHT;

    let _ = write!(
        svg,
        r##"<g stroke="#333333"><line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{right}" y2="{bottom}"/><line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}"/></g>"##,
    );

    for tick in x_axis.ticks() {
        let px = x_axis.to_pixel(tick);
        let _ = write!(
            svg,
            r##"<line x1="{px:.2}" y1="{bottom}" x2="{px:.2}" y2="{y2}" stroke="#333333"/><text x="{px:.2}" y="{ty}" text-anchor="middle">{tick}</text>"##,
            y2 = bottom + 4.0,
            ty = bottom + 16.0,
            tick = tick_label(tick),
        );
    }
    for tick in y_axis.ticks() {
        let py = y_axis.to_pixel(tick);
        let _ = write!(
            svg,
            r##"<line x1="{x1}" y1="{py:.2}" x2="{MARGIN_LEFT}" y2="{py:.2}" stroke="#333333"/><text x="{tx}" y="{ty:.2}" text-anchor="end">{tick}</text>"##,
            x1 = MARGIN_LEFT - 4.0,
            tx = MARGIN_LEFT - 6.0,
            ty = py + 4.0,
            tick = tick_label(tick),
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{x}" y="{y}" text-anchor="middle" font-size="12">Democratic vote share (%)</text>"#,
        x = f64::midpoint(MARGIN_LEFT, right),
        y = options.height - 8.0,
    );
    let _ = write!(
        svg,
        r#"<text transform="translate(14 {y}) rotate(-90)" text-anchor="middle" font-size="12">Risk gap</text>"#,
        y = f64::midpoint(MARGIN_TOP, bottom),
    );
}

/// Linear axis from a data range to a pixel range, widened to round ticks.
#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    max: f64,
    step: f64,
    pixel_start: f64,
    pixel_end: f64,
}

impl Axis {
    fn new(values: impl Iterator<Item = f64>, pixel_start: f64, pixel_end: f64) -> Self {
        let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let (lo, hi) = if hi - lo > f64::EPSILON {
            (lo, hi)
        } else {
            (lo - 1.0, hi + 1.0)
        };
        #[allow(clippy::cast_precision_loss)]
        let step = nice_step((hi - lo) / TICKS as f64);
        Self {
            min: (lo / step).floor() * step,
            max: (hi / step).ceil() * step,
            step,
            pixel_start,
            pixel_end,
        }
    }

    fn to_pixel(&self, value: f64) -> f64 {
        let t = (value - self.min) / (self.max - self.min);
        t.mul_add(self.pixel_end - self.pixel_start, self.pixel_start)
    }

    fn ticks(&self) -> Vec<f64> {
        let mut ticks = Vec::new();
        let mut i = 0u32;
        loop {
            let tick = f64::from(i).mul_add(self.step, self.min);
            if tick > self.max + self.step * 1e-9 {
                break;
            }
            ticks.push(tick);
            i += 1;
        }
        ticks
    }
}

/// Rounds a raw step up to 1, 2, or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn tick_label(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}
