//! Static table of the countries covered by the ranking report.

/// Country code → full country name, for every country the report covers.
pub static COUNTRY_NAMES: &[(&str, &str)] = &[
    ("US", "United States"),
    ("DE", "Germany"),
    ("JP", "Japan"),
    ("GB", "United Kingdom"),
    ("FR", "France"),
    ("RU", "Russian Federation"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("CA", "Canada"),
    ("BR", "Brazil"),
    ("ES", "Spain"),
    ("PL", "Poland"),
];

/// Returns the full country name for a code, or `None` for unknown codes.
pub fn country_name(code: &str) -> Option<&'static str> {
    COUNTRY_NAMES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// All known country codes, in report order.
pub fn all_codes() -> impl Iterator<Item = &'static str> {
    COUNTRY_NAMES.iter().map(|(code, _)| *code)
}
