//! County FIPS code normalization.
//!
//! Source files carry county codes as integers (`1001`), floats exported by
//! spreadsheet tools (`1001.0`), or already padded strings (`"01001"`). All of
//! these normalize to the same five-character [`CountyFips`].

use serde::{Deserialize, Serialize};

/// Placeholder code assigned to rows that carry no county code at all.
pub const UNKNOWN_FIPS: &str = "00000";

/// Number of characters in a normalized county FIPS code.
pub const FIPS_LEN: usize = 5;

/// A five-character, zero-padded, all-numeric county FIPS code
/// (two-digit state code followed by the three-digit county code).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountyFips(String);

impl CountyFips {
    /// Normalizes a raw county code.
    ///
    /// Leading/trailing whitespace is ignored and an all-zero fractional
    /// part (`"1001.0"`) is accepted. The remaining digits are left-padded
    /// with zeros to five characters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFipsError`] if the value is empty, contains anything
    /// other than digits, or has more than five digits.
    pub fn parse(raw: &str) -> Result<Self, InvalidFipsError> {
        let trimmed = raw.trim();
        let digits = match trimmed.split_once('.') {
            Some((int_part, frac)) if frac.chars().all(|c| c == '0') => int_part,
            Some(_) => return Err(InvalidFipsError::new(raw)),
            None => trimmed,
        };

        if digits.is_empty() || digits.len() > FIPS_LEN || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(InvalidFipsError::new(raw));
        }

        Ok(Self(format!("{digits:0>FIPS_LEN$}")))
    }

    /// Builds a code from a state code (1-2 digits) and a county code
    /// (1-3 digits), as found in Census boundary attributes
    /// (`STATEFP` + `COUNTYFP`).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFipsError`] if either part is empty, non-numeric, or
    /// too long.
    pub fn from_parts(state: &str, county: &str) -> Result<Self, InvalidFipsError> {
        let state = state.trim();
        let county = county.trim();
        let numeric = |s: &str, max: usize| {
            !s.is_empty() && s.len() <= max && s.bytes().all(|b| b.is_ascii_digit())
        };

        if !numeric(state, 2) || !numeric(county, 3) {
            return Err(InvalidFipsError::new(&format!("{state}{county}")));
        }

        Ok(Self(format!("{state:0>2}{county:0>3}")))
    }

    /// The placeholder code used for rows without a county code.
    #[must_use]
    pub fn unknown() -> Self {
        Self(UNKNOWN_FIPS.to_string())
    }

    /// Whether this is the [`UNKNOWN_FIPS`] placeholder.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN_FIPS
    }

    /// The full five-character code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CountyFips {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CountyFips {
    type Err = InvalidFipsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountyFips {
    type Error = InvalidFipsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountyFips> for String {
    fn from(value: CountyFips) -> Self {
        value.0
    }
}

/// Error returned when a value cannot be normalized into a [`CountyFips`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFipsError {
    /// The raw value that was rejected.
    pub value: String,
}

impl InvalidFipsError {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for InvalidFipsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid county FIPS code '{}': expected 1-{FIPS_LEN} digits",
            self.value
        )
    }
}

impl std::error::Error for InvalidFipsError {}
