//! String matching helpers.

/// True when `source` contains any of `values` (case-sensitive substring).
///
/// An empty source never matches.
pub fn contains_any<'a, I>(source: &str, values: I) -> bool
where
    I: IntoIterator<Item = &'a String>,
{
    if source.is_empty() {
        return false;
    }
    values.into_iter().any(|value| source.contains(value.as_str()))
}
