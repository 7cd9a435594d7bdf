//! Median utilities used by the aggregation pipeline.

use std::collections::HashMap;

/// Computes the median of a slice of values. Returns `None` for empty input.
///
/// Even-length input yields the mean of the two middle values, matching the
/// percentile semantics of the warehouse queries this pipeline consumes.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Groups `(key, value)` pairs and computes the median per key.
pub fn group_median<'a, I>(pairs: I) -> HashMap<String, f64>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for (key, value) in pairs {
        groups.entry(key).or_default().push(value);
    }

    groups
        .into_iter()
        .filter_map(|(key, values)| median(&values).map(|m| (key.to_string(), m)))
        .collect()
}
