//! Shapefile to `GeoJSON` conversion.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use shapefile::dbase::{FieldValue, Record};

use crate::GeoError;
use crate::progress::ProgressCallback;
use crate::shx;

/// The `GeoJSON` path produced for a shapefile: same directory and stem.
#[must_use]
pub fn geojson_path(shp_path: &Path) -> PathBuf {
    shp_path.with_extension("geojson")
}

/// Converts a shapefile into a sibling `.geojson` file and returns its path.
///
/// Every shape becomes one feature whose properties are the attribute
/// record. Null or unconvertible shapes become features with a `null`
/// geometry. All records are read before anything is written, and the
/// output goes to a temporary file that is renamed into place, so a failed
/// conversion never leaves a partial `.geojson` behind. A missing `.shx`
/// index is regenerated first; the `.shp` and `.dbf` are never modified.
///
/// # Errors
///
/// Returns [`GeoError::NotFound`] if `shp_path` does not exist, or another
/// [`GeoError`] if the shapefile cannot be read or the output written.
pub fn convert_shapefile(
    shp_path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<PathBuf, GeoError> {
    if !shp_path.is_file() {
        return Err(GeoError::NotFound {
            path: shp_path.to_path_buf(),
        });
    }

    shx::restore_index(shp_path)?;

    progress.set_message(format!("Reading {}", shp_path.display()));
    let mut reader = shapefile::Reader::from_path(shp_path)?;
    let entries = reader
        .iter_shapes_and_records()
        .collect::<Result<Vec<_>, _>>()?;

    progress.set_total(entries.len() as u64);
    progress.set_message("Converting shapes".to_string());

    let mut null_geometries = 0u64;
    let mut features = Vec::with_capacity(entries.len());

    for (shape, record) in entries {
        let geometry = match geo::Geometry::<f64>::try_from(shape) {
            Ok(geometry) => Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
            Err(e) => {
                log::debug!("Shape without usable geometry: {e}");
                null_geometries += 1;
                None
            }
        };

        features.push(Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(record_properties(record)),
            foreign_members: None,
        });
        progress.inc(1);
    }

    if null_geometries > 0 {
        log::warn!("{null_geometries} shapes had no geometry and were written as null");
    }

    let count = features.len();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    let out_path = geojson_path(shp_path);
    let json = serde_json::to_string(&collection)?;
    write_replacing(&out_path, json.as_bytes())?;

    progress.finish(format!("Wrote {count} features"));
    log::info!(
        "Converted {} -> {} ({count} features)",
        shp_path.display(),
        out_path.display()
    );

    Ok(out_path)
}

/// Writes `contents` to a `.tmp` sibling of `path` and renames it over
/// `path`. The temporary file is removed if either step fails.
fn write_replacing(path: &Path, contents: &[u8]) -> Result<(), GeoError> {
    let tmp_path = path.with_extension("geojson.tmp");

    let result = std::fs::write(&tmp_path, contents)
        .map_err(|e| GeoError::io(&tmp_path, e))
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(|e| GeoError::io(path, e)));

    if result.is_err() && tmp_path.exists() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

/// Turns a `dBase` attribute record into `GeoJSON` properties.
fn record_properties(record: Record) -> JsonObject {
    let mut properties = JsonObject::new();
    for (name, value) in record {
        properties.insert(name, field_to_json(value));
    }
    properties
}

fn field_to_json(value: FieldValue) -> JsonValue {
    match value {
        FieldValue::Character(Some(s)) => JsonValue::String(s.trim_end().to_string()),
        FieldValue::Memo(s) => JsonValue::String(s),
        FieldValue::Numeric(Some(n)) => number(n),
        FieldValue::Float(Some(f)) => number(f64::from(f)),
        FieldValue::Double(d) | FieldValue::Currency(d) => number(d),
        FieldValue::Integer(i) => JsonValue::from(i),
        FieldValue::Logical(Some(b)) => JsonValue::Bool(b),
        FieldValue::Date(Some(date)) => JsonValue::String(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        )),
        _ => JsonValue::Null,
    }
}

fn number(value: f64) -> JsonValue {
    serde_json::Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}
