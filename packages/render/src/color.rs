//! Sequential color scale.

/// Yellow-orange-red stops, light to dark.
const STOPS: [(u8, u8, u8); 5] = [
    (0xff, 0xff, 0xb2),
    (0xfe, 0xcc, 0x5c),
    (0xfd, 0x8d, 0x3c),
    (0xf0, 0x3b, 0x20),
    (0xbd, 0x00, 0x26),
];

/// Fill used for counties without a value.
pub const MISSING: &str = "#d9d9d9";

/// Maps values in `[min, max]` onto the sequential palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    /// Creates a scale over `[min, max]`.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Creates a scale spanning `values`, or `None` if there are none.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<(f64, f64)>, v| {
                Some(range.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })
            .map(|(min, max)| Self::new(min, max))
    }

    /// Lower end of the scale.
    #[must_use]
    pub const fn min(&self) -> f64 {
        self.min
    }

    /// Upper end of the scale.
    #[must_use]
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Position of `value` on the scale, clamped to `[0, 1]`.
    ///
    /// A scale whose ends coincide puts every value in the middle.
    #[must_use]
    pub fn position(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Hex color for `value`.
    #[must_use]
    pub fn color(&self, value: f64) -> String {
        interpolate(self.position(value))
    }
}

/// Hex color at position `t` in `[0, 1]` along the palette.
#[must_use]
pub fn interpolate(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    #[allow(clippy::cast_precision_loss)]
    let scaled = t * (STOPS.len() - 1) as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = (scaled.floor() as usize).min(STOPS.len() - 2);
    #[allow(clippy::cast_precision_loss)]
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = STOPS[lower];
    let (r1, g1, b1) = STOPS[lower + 1];
    format!(
        "#{:02x}{:02x}{:02x}",
        lerp(r0, r1, frac),
        lerp(g0, g1, frac),
        lerp(b0, b1, frac)
    )
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (f64::from(b) - f64::from(a))
        .mul_add(t, f64::from(a))
        .round()
        .clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ends_of_palette() {
        assert_eq!(interpolate(0.0), "#ffffb2");
        assert_eq!(interpolate(1.0), "#bd0026");
        assert_eq!(interpolate(-3.0), "#ffffb2");
        assert_eq!(interpolate(7.0), "#bd0026");
    }

    #[test]
    fn scale_spans_values() {
        let scale = ColorScale::from_values([18.8, 102.9, 50.0]).unwrap();
        assert!((scale.min() - 18.8).abs() < f64::EPSILON);
        assert!((scale.max() - 102.9).abs() < f64::EPSILON);
        assert_eq!(scale.color(18.8), "#ffffb2");
        assert_eq!(scale.color(102.9), "#bd0026");
        assert!(ColorScale::from_values(Vec::<f64>::new()).is_none());
    }

    #[test]
    fn flat_scale_uses_midpoint() {
        let scale = ColorScale::new(5.0, 5.0);
        assert!((scale.position(5.0) - 0.5).abs() < f64::EPSILON);
        assert_eq!(scale.color(5.0), interpolate(0.5));
    }
}
