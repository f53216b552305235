/// Lowercase a column header and drop everything but letters and digits, so
/// `propertyPrice`, `property_price` and `Property Price` compare equal.
pub(crate) fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}
