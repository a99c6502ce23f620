//! SVG choropleth of scored counties.

use std::fmt::Write as _;

use climate_need_geography::{ScoredCounty, bounding_rect};

use crate::color::{ColorScale, interpolate};
use crate::projection::Projection;
use crate::{escape, escape_attr};

/// Layout of the choropleth.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethOptions {
    /// Viewport width in pixels.
    pub width: f64,
    /// Viewport height in pixels, excluding the legend strip.
    pub height: f64,
    /// Padding around the map.
    pub margin: f64,
    /// Caption drawn above the legend.
    pub title: String,
}

impl Default for ChoroplethOptions {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 600.0,
            margin: 16.0,
            title: "Enhanced need score".to_string(),
        }
    }
}

const LEGEND_HEIGHT: f64 = 56.0;
const LEGEND_WIDTH: f64 = 240.0;
const LEGEND_STEPS: usize = 24;

/// Renders `counties` as a standalone SVG document.
///
/// Each county is filled by its enhanced need score and carries its
/// description as a `<title>` tooltip. The legend shows the score range.
#[must_use]
pub fn render_svg(counties: &[ScoredCounty], options: &ChoroplethOptions) -> String {
    let total_height = options.height + LEGEND_HEIGHT;
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="choropleth" viewBox="0 0 {w} {h}" width="{w}" height="{h}" font-family="sans-serif">"#,
        w = options.width,
        h = total_height,
    );

    let (Some(bbox), Some(scale)) = (
        bounding_rect(counties.iter().map(|c| &c.geometry)),
        ColorScale::from_values(counties.iter().map(ScoredCounty::score)),
    ) else {
        log::debug!("No mapped counties; drawing the empty choropleth");
        let _ = write!(
            svg,
            r##"<text x="{x}" y="{y}" text-anchor="middle" fill="#666">No counties to display</text></svg>"##,
            x = options.width / 2.0,
            y = options.height / 2.0,
        );
        return svg;
    };

    log::debug!("Drawing {} counties on the choropleth", counties.len());
    let projection = Projection::fit(bbox, options.width, options.height, options.margin);

    svg.push_str(r##"<g stroke="#ffffff" stroke-width="0.5" fill-rule="evenodd">"##);
    for county in counties {
        let _ = write!(
            svg,
            r#"<path id="county-{fips}" d="{d}" fill="{fill}"><title>{title}</title></path>"#,
            fips = escape_attr(county.metrics.county_fips.as_str()),
            d = projection.path_data(&county.geometry),
            fill = scale.color(county.score()),
            title = escape(&county.description),
        );
    }
    svg.push_str("</g>");

    write_legend(&mut svg, &scale, options);
    svg.push_str("</svg>");
    svg
}

fn write_legend(svg: &mut String, scale: &ColorScale, options: &ChoroplethOptions) {
    let x0 = options.margin;
    let y0 = options.height + 8.0;
    #[allow(clippy::cast_precision_loss)]
    let step_width = LEGEND_WIDTH / LEGEND_STEPS as f64;

    let _ = write!(
        svg,
        r#"<g class="legend"><text x="{x0}" y="{y}" font-size="12">{title}</text>"#,
        y = y0 + 10.0,
        title = escape(&options.title),
    );
    for i in 0..LEGEND_STEPS {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / (LEGEND_STEPS - 1) as f64;
        #[allow(clippy::cast_precision_loss)]
        let x = (i as f64).mul_add(step_width, x0);
        let _ = write!(
            svg,
            r#"<rect x="{x:.2}" y="{y}" width="{w:.2}" height="12" fill="{fill}"/>"#,
            y = y0 + 16.0,
            w = step_width + 0.5,
            fill = interpolate(t),
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{x0}" y="{y}" font-size="11">{min:.1}</text><text x="{x1}" y="{y}" font-size="11" text-anchor="end">{max:.1}</text></g>"#,
        y = y0 + 42.0,
        x1 = x0 + LEGEND_WIDTH,
        min = scale.min(),
        max = scale.max(),
    );
}
