//! Perceived-risk aggregation: mean `happening` per county.

use std::collections::BTreeMap;

use climate_need_county_models::{CoercionPolicy, CountyFips, CountyRecord};

/// Averages `happening` per county.
///
/// With [`CoercionPolicy::ZeroFillNumeric`] missing values count as `0`, so
/// every county in the input gets exactly one entry. With
/// [`CoercionPolicy::DropRow`] missing values are skipped and a county whose
/// values are all missing has no entry.
pub fn perceived_risk<'a, I>(records: I, policy: CoercionPolicy) -> BTreeMap<CountyFips, f64>
where
    I: IntoIterator<Item = &'a CountyRecord>,
{
    let mut sums: BTreeMap<&CountyFips, (f64, u32)> = BTreeMap::new();
    let mut coerced = 0u64;

    for record in records {
        let value = match (record.happening, policy) {
            (Some(v), _) => v,
            (None, CoercionPolicy::ZeroFillNumeric) => {
                coerced += 1;
                0.0
            }
            (None, CoercionPolicy::DropRow) => continue,
        };

        let entry = sums.entry(&record.county_fips).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    if coerced > 0 {
        log::warn!("Perceived risk: {coerced} missing 'happening' values treated as 0");
    }

    sums.into_iter()
        .map(|(fips, (sum, count))| (fips.clone(), sum / f64::from(count)))
        .collect()
}
