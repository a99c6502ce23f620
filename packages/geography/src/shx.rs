//! Regeneration of the `.shx` index sidecar.
//!
//! The index is a copy of the 100-byte `.shp` header followed by one 8-byte
//! entry per record: the record's offset and its content length, both as
//! big-endian counts of 16-bit words. Everything needed to rebuild it is in
//! the record headers of the `.shp` file itself.

use std::path::{Path, PathBuf};

use crate::GeoError;

/// Length of the main file (and index) header in bytes.
const HEADER_LEN: usize = 100;

/// Length of each record header in the `.shp` file.
const RECORD_HEADER_LEN: usize = 8;

/// Length of each index entry.
const INDEX_ENTRY_LEN: usize = 8;

/// Magic number at the start of every shapefile.
const FILE_CODE: i32 = 9994;

/// Byte offset of the file-length field in the header.
const FILE_LENGTH_OFFSET: usize = 24;

/// The index path that belongs to a `.shp` file.
#[must_use]
pub fn index_path(shp_path: &Path) -> PathBuf {
    shp_path.with_extension("shx")
}

/// Writes a `.shx` next to `shp_path` if none exists.
///
/// Returns `true` if an index was regenerated, `false` if one was already
/// present.
///
/// # Errors
///
/// Returns [`GeoError`] if the `.shp` file cannot be read, is malformed, or
/// the index cannot be written.
pub fn restore_index(shp_path: &Path) -> Result<bool, GeoError> {
    let shx_path = index_path(shp_path);
    if shx_path.exists() {
        return Ok(false);
    }

    let shp = std::fs::read(shp_path).map_err(|e| GeoError::io(shp_path, e))?;
    let index = build_index(&shp)?;
    std::fs::write(&shx_path, &index).map_err(|e| GeoError::io(&shx_path, e))?;

    log::warn!(
        "Index {} was missing; regenerated it with {} entries",
        shx_path.display(),
        (index.len() - HEADER_LEN) / INDEX_ENTRY_LEN
    );
    Ok(true)
}

/// Builds the bytes of a `.shx` index from the bytes of a `.shp` file.
///
/// # Errors
///
/// Returns [`GeoError::Conversion`] if the file is not a shapefile or a
/// record extends past the end of the file.
pub fn build_index(shp: &[u8]) -> Result<Vec<u8>, GeoError> {
    if shp.len() < HEADER_LEN || read_be_i32(shp, 0) != Some(FILE_CODE) {
        return Err(malformed("missing shapefile header"));
    }

    // Trust the shorter of the declared and the actual length so a
    // truncated tail does not read out of bounds.
    let declared = read_be_i32(shp, FILE_LENGTH_OFFSET)
        .and_then(|words| usize::try_from(words).ok())
        .map_or(shp.len(), |words| words * 2);
    let file_len = declared.min(shp.len());

    let mut entries: Vec<(i32, i32)> = Vec::new();
    let mut offset = HEADER_LEN;

    while offset + RECORD_HEADER_LEN <= file_len {
        let content_words = read_be_i32(shp, offset + 4)
            .filter(|words| *words >= 0)
            .ok_or_else(|| malformed(&format!("bad record header at byte {offset}")))?;
        let content_len = usize::try_from(content_words)
            .map_err(|_| malformed(&format!("bad record length at byte {offset}")))?
            * 2;

        let next = offset + RECORD_HEADER_LEN + content_len;
        if next > file_len {
            return Err(malformed(&format!(
                "record at byte {offset} extends past the end of the file"
            )));
        }

        entries.push((to_words(offset)?, content_words));
        offset = next;
    }

    let mut index = Vec::with_capacity(HEADER_LEN + entries.len() * INDEX_ENTRY_LEN);
    index.extend_from_slice(&shp[..HEADER_LEN]);
    let index_words = to_words(HEADER_LEN + entries.len() * INDEX_ENTRY_LEN)?;
    index[FILE_LENGTH_OFFSET..FILE_LENGTH_OFFSET + 4].copy_from_slice(&index_words.to_be_bytes());

    for (offset_words, content_words) in entries {
        index.extend_from_slice(&offset_words.to_be_bytes());
        index.extend_from_slice(&content_words.to_be_bytes());
    }

    Ok(index)
}

fn read_be_i32(bytes: &[u8], at: usize) -> Option<i32> {
    let slice: [u8; 4] = bytes.get(at..at + 4)?.try_into().ok()?;
    Some(i32::from_be_bytes(slice))
}

fn to_words(bytes: usize) -> Result<i32, GeoError> {
    i32::try_from(bytes / 2).map_err(|_| malformed("shapefile exceeds the 2 GB format limit"))
}

fn malformed(message: &str) -> GeoError {
    GeoError::Conversion {
        message: format!("malformed shapefile: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A two-record point shapefile built by hand.
    fn point_shapefile() -> Vec<u8> {
        let mut shp = vec![0u8; HEADER_LEN];
        shp[0..4].copy_from_slice(&FILE_CODE.to_be_bytes());
        shp[28..32].copy_from_slice(&1000i32.to_le_bytes());
        shp[32..36].copy_from_slice(&1i32.to_le_bytes());

        for (number, (x, y)) in [(1i32, (1.0f64, 2.0f64)), (2, (3.0, 4.0))] {
            shp.extend_from_slice(&number.to_be_bytes());
            shp.extend_from_slice(&10i32.to_be_bytes());
            shp.extend_from_slice(&1i32.to_le_bytes());
            shp.extend_from_slice(&x.to_le_bytes());
            shp.extend_from_slice(&y.to_le_bytes());
        }

        let words = i32::try_from(shp.len() / 2).unwrap();
        shp[24..28].copy_from_slice(&words.to_be_bytes());
        shp
    }

    #[test]
    fn indexes_every_record() {
        let index = build_index(&point_shapefile()).unwrap();
        assert_eq!(index.len(), HEADER_LEN + 2 * INDEX_ENTRY_LEN);

        assert_eq!(read_be_i32(&index, 0), Some(FILE_CODE));
        assert_eq!(read_be_i32(&index, FILE_LENGTH_OFFSET), Some(58));

        assert_eq!(read_be_i32(&index, 100), Some(50));
        assert_eq!(read_be_i32(&index, 104), Some(10));
        assert_eq!(read_be_i32(&index, 108), Some(64));
        assert_eq!(read_be_i32(&index, 112), Some(10));
    }

    #[test]
    fn rejects_non_shapefiles() {
        assert!(build_index(b"not a shapefile").is_err());
        assert!(build_index(&[0u8; HEADER_LEN]).is_err());
    }

    #[test]
    fn rejects_truncated_records() {
        let mut shp = point_shapefile();
        let len = shp.len();
        shp.truncate(len - 4);
        assert!(build_index(&shp).is_err());
    }

    #[test]
    fn index_path_swaps_extension() {
        assert_eq!(
            index_path(Path::new("data/cb_2018_us_county_5m.shp")),
            PathBuf::from("data/cb_2018_us_county_5m.shx")
        );
    }
}
