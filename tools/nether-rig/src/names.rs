//! Identifier helpers for exported element ids

/// Replace every occurrence of `pattern` in `data`
///
/// Matches are found left to right and never overlap; text inserted by a
/// replacement is not searched again.
pub fn replace_all(data: &str, pattern: &str, replacement: &str) -> String {
    if pattern.is_empty() {
        return data.to_string();
    }
    data.replace(pattern, replacement)
}

/// Make a name usable inside a URL fragment reference
///
/// Only `#` needs escaping for the references written by the exporter.
pub fn url_encode(name: &str) -> String {
    replace_all(name, "#", "%23")
}
