//! County boundary loading from `GeoJSON`.

use std::collections::BTreeSet;
use std::path::Path;

use climate_need_county_models::CountyFips;
use geo::{BoundingRect, MultiPolygon, Rect, coord};
use geojson::{FeatureCollection, GeoJson, JsonObject, JsonValue};

use crate::GeoError;

/// Property holding the county code when no other is configured.
pub const DEFAULT_KEY_PROPERTY: &str = "COUNTYFP";

/// How to read a county code from a boundary feature's properties.
///
/// Census cartographic boundary files store a three-digit `COUNTYFP` next
/// to a two-digit `STATEFP` and the combined five-digit `GEOID`; other
/// sources store the full code under a single property. The configured
/// property is tried first: a value of at most three digits is combined
/// with `STATEFP`, a longer one is used as-is. `GEOID` is the fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryKey {
    /// Name of the property to read first.
    pub property: String,
}

impl Default for BoundaryKey {
    fn default() -> Self {
        Self {
            property: DEFAULT_KEY_PROPERTY.to_string(),
        }
    }
}

impl BoundaryKey {
    /// Uses `property` as the primary key property.
    #[must_use]
    pub fn new(property: &str) -> Self {
        Self {
            property: property.to_string(),
        }
    }

    /// Resolves the county code of a feature.
    #[must_use]
    pub fn resolve(&self, properties: &JsonObject) -> Option<CountyFips> {
        if let Some(value) = property_string(properties, &self.property) {
            let value = value.trim();
            if value.len() > 3 {
                if let Ok(fips) = CountyFips::parse(value) {
                    return Some(fips);
                }
            } else if let Some(state) = property_string(properties, "STATEFP")
                && let Ok(fips) = CountyFips::from_parts(&state, value)
            {
                return Some(fips);
            }
        }

        property_string(properties, "GEOID").and_then(|geoid| CountyFips::parse(&geoid).ok())
    }
}

/// One county boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyBoundary {
    /// County code resolved through [`BoundaryKey`].
    pub code: CountyFips,
    /// Display name (`NAME`, falling back to `NAMELSAD`).
    pub name: Option<String>,
    /// Polygonal geometry; `None` if the feature had none or it was not
    /// polygonal.
    pub geometry: Option<MultiPolygon<f64>>,
    /// All original feature properties.
    pub properties: JsonObject,
}

/// Loads county boundaries from a `GeoJSON` `FeatureCollection` file.
///
/// # Errors
///
/// Returns [`GeoError::NotFound`] if the file does not exist and
/// [`GeoError::GeoJson`] if it is not a valid feature collection.
pub fn load_boundaries(path: &Path, key: &BoundaryKey) -> Result<Vec<CountyBoundary>, GeoError> {
    let text = std::fs::read_to_string(path).map_err(|e| GeoError::io(path, e))?;
    let boundaries = parse_boundaries(&text, key)?;
    log::info!(
        "Loaded {} county boundaries from {}",
        boundaries.len(),
        path.display()
    );
    Ok(boundaries)
}

/// Parses county boundaries from `GeoJSON` text.
///
/// Features without a usable county code are skipped. When several features
/// share a code, the first one is kept.
///
/// # Errors
///
/// Returns [`GeoError::GeoJson`] if the text is not a feature collection.
pub fn parse_boundaries(text: &str, key: &BoundaryKey) -> Result<Vec<CountyBoundary>, GeoError> {
    let geojson: GeoJson = text.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;

    let mut seen = BTreeSet::new();
    let mut boundaries = Vec::with_capacity(collection.features.len());
    let mut unkeyed = 0u64;

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        let Some(code) = key.resolve(&properties) else {
            unkeyed += 1;
            continue;
        };

        if !seen.insert(code.clone()) {
            log::debug!("Duplicate boundary for county {code}; keeping the first");
            continue;
        }

        let geometry = feature.geometry.and_then(|g| {
            let parsed = to_multipolygon(g);
            if parsed.is_none() {
                log::debug!("Boundary for county {code} is not polygonal");
            }
            parsed
        });

        let name = property_string(&properties, "NAME")
            .or_else(|| property_string(&properties, "NAMELSAD"));

        boundaries.push(CountyBoundary {
            code,
            name,
            geometry,
            properties,
        });
    }

    if unkeyed > 0 {
        log::warn!(
            "Skipped {unkeyed} boundary features without a usable '{}' or GEOID",
            key.property
        );
    }

    Ok(boundaries)
}

/// Converts a `GeoJSON` geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
#[must_use]
pub fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Bounding rectangle enclosing every geometry; `None` when there are none.
#[must_use]
pub fn bounding_rect<'a>(
    geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
) -> Option<Rect<f64>> {
    geometries
        .into_iter()
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            )
        })
}

/// Reads a property as a string; numbers are rendered in their JSON form.
fn property_string(properties: &JsonObject, name: &str) -> Option<String> {
    match properties.get(name)? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(json: &str) -> JsonObject {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn combines_state_and_county_parts() {
        let key = BoundaryKey::default();
        let code = key
            .resolve(&props(r#"{"STATEFP": "01", "COUNTYFP": "001"}"#))
            .unwrap();
        assert_eq!(code.as_str(), "01001");
    }

    #[test]
    fn accepts_full_codes_in_key_property() {
        let key = BoundaryKey::default();
        let code = key.resolve(&props(r#"{"COUNTYFP": "1001"}"#)).unwrap();
        assert_eq!(code.as_str(), "01001");
        let code = key.resolve(&props(r#"{"COUNTYFP": 6037}"#)).unwrap();
        assert_eq!(code.as_str(), "06037");
    }

    #[test]
    fn falls_back_to_geoid() {
        let key = BoundaryKey::default();
        let code = key
            .resolve(&props(r#"{"COUNTYFP": "001", "GEOID": "01001"}"#))
            .unwrap();
        assert_eq!(code.as_str(), "01001");
    }

    #[test]
    fn custom_key_property() {
        let key = BoundaryKey::new("fips");
        let code = key.resolve(&props(r#"{"fips": "48201"}"#)).unwrap();
        assert_eq!(code.as_str(), "48201");
        assert!(key.resolve(&props(r#"{"other": "48201"}"#)).is_none());
    }

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "001", "NAME": "Autauga"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "003", "NAME": "Baldwin"},
                "geometry": null
            },
            {
                "type": "Feature",
                "properties": {"NAME": "Nowhere"},
                "geometry": {"type": "Point", "coordinates": [0, 0]}
            },
            {
                "type": "Feature",
                "properties": {"STATEFP": "01", "COUNTYFP": "001", "NAME": "Duplicate"},
                "geometry": null
            }
        ]
    }"#;

    #[test]
    fn parses_collection() {
        let boundaries = parse_boundaries(COLLECTION, &BoundaryKey::default()).unwrap();
        assert_eq!(boundaries.len(), 2);

        assert_eq!(boundaries[0].code.as_str(), "01001");
        assert_eq!(boundaries[0].name.as_deref(), Some("Autauga"));
        assert_eq!(boundaries[0].geometry.as_ref().map(|g| g.0.len()), Some(1));

        assert_eq!(boundaries[1].code.as_str(), "01003");
        assert!(boundaries[1].geometry.is_none());
    }

    #[test]
    fn bounding_rect_spans_all_geometries() {
        let boundaries = parse_boundaries(COLLECTION, &BoundaryKey::default()).unwrap();
        let bbox = bounding_rect(boundaries.iter().filter_map(|b| b.geometry.as_ref())).unwrap();
        assert!((bbox.min().x - 0.0).abs() < 1e-9);
        assert!((bbox.max().y - 1.0).abs() < 1e-9);

        assert!(bounding_rect(std::iter::empty()).is_none());
    }

    #[test]
    fn rejects_non_collections() {
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(parse_boundaries(point, &BoundaryKey::default()).is_err());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_boundaries(
            Path::new("/nonexistent/counties.geojson"),
            &BoundaryKey::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeoError::NotFound { .. }));
    }
}
