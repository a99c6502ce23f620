//! Equirectangular projection of county outlines into SVG space.

use std::fmt::Write as _;

use geo::{Coord, LineString, MultiPolygon, Rect};

/// Fits geographic coordinates into a pixel viewport.
///
/// Longitude is scaled by the cosine of the bounding box's middle latitude
/// so shapes keep roughly their proportions at state scale. The fitted map
/// is centered inside the viewport minus `margin` on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    scale: f64,
    x_factor: f64,
    origin: Coord<f64>,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    /// Fits `bbox` into a `width` x `height` viewport.
    #[must_use]
    pub fn fit(bbox: Rect<f64>, width: f64, height: f64, margin: f64) -> Self {
        let mid_lat = f64::midpoint(bbox.min().y, bbox.max().y);
        let x_factor = mid_lat.to_radians().cos().max(0.01);

        let geo_width = (bbox.max().x - bbox.min().x) * x_factor;
        let geo_height = bbox.max().y - bbox.min().y;

        let avail_w = 2.0f64.mul_add(-margin, width).max(1.0);
        let avail_h = 2.0f64.mul_add(-margin, height).max(1.0);

        let scale = match (geo_width > 0.0, geo_height > 0.0) {
            (true, true) => (avail_w / geo_width).min(avail_h / geo_height),
            (true, false) => avail_w / geo_width,
            (false, true) => avail_h / geo_height,
            (false, false) => 1.0,
        };

        Self {
            scale,
            x_factor,
            origin: Coord {
                x: bbox.min().x,
                y: bbox.max().y,
            },
            offset_x: geo_width.mul_add(-scale, width) / 2.0,
            offset_y: geo_height.mul_add(-scale, height) / 2.0,
        }
    }

    /// Projects a longitude/latitude pair to SVG pixels (y grows downward).
    #[must_use]
    pub fn project(&self, coord: Coord<f64>) -> (f64, f64) {
        let x = ((coord.x - self.origin.x) * self.x_factor).mul_add(self.scale, self.offset_x);
        let y = (self.origin.y - coord.y).mul_add(self.scale, self.offset_y);
        (x, y)
    }

    /// SVG path data for a multipolygon, holes included.
    ///
    /// Use with `fill-rule="evenodd"` so interior rings render as holes.
    #[must_use]
    pub fn path_data(&self, geometry: &MultiPolygon<f64>) -> String {
        let mut d = String::new();
        for polygon in geometry {
            self.push_ring(&mut d, polygon.exterior());
            for ring in polygon.interiors() {
                self.push_ring(&mut d, ring);
            }
        }
        d
    }

    fn push_ring(&self, d: &mut String, ring: &LineString<f64>) {
        for (i, coord) in ring.coords().enumerate() {
            let (x, y) = self.project(*coord);
            let command = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{command}{x:.2},{y:.2}");
        }
        if !ring.0.is_empty() {
            d.push('Z');
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, polygon};

    use super::*;

    #[test]
    fn fits_square_at_equator() {
        let bbox = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
        let projection = Projection::fit(bbox, 100.0, 100.0, 0.0);

        let (x, y) = projection.project(coord! { x: 0.0, y: 10.0 });
        assert!(x.abs() < 0.5 && y.abs() < 1e-9);

        let (x, y) = projection.project(coord! { x: 10.0, y: 0.0 });
        assert!((x - 100.0).abs() < 0.5);
        assert!((y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn narrows_longitude_away_from_equator() {
        let bbox = Rect::new(coord! { x: 0.0, y: 59.0 }, coord! { x: 2.0, y: 61.0 });
        let projection = Projection::fit(bbox, 200.0, 100.0, 0.0);

        let (left, top) = projection.project(coord! { x: 0.0, y: 61.0 });
        let (right, bottom) = projection.project(coord! { x: 2.0, y: 59.0 });
        let width = right - left;
        let height = bottom - top;
        // cos(60 deg) = 0.5, so the map is half as wide as it is tall.
        assert!((width / height - 0.5).abs() < 1e-3);
        assert!((height - 100.0).abs() < 1e-9);
    }

    #[test]
    fn path_data_closes_rings() {
        let bbox = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let projection = Projection::fit(bbox, 10.0, 10.0, 0.0);
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        let d = projection.path_data(&MultiPolygon(vec![square]));
        assert!(d.starts_with('M'));
        assert!(d.ends_with('Z'));
        assert_eq!(d.matches('L').count(), 4);
    }
}
