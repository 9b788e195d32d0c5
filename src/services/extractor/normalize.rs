//! Whitespace normalization shared by every extracted text field

/// Collapse each whitespace run to one ASCII space and trim both ends.
/// `None` stays `None`; a whitespace-only input becomes `Some("")`.
pub fn normalize(raw: Option<&str>) -> Option<String> {
    raw.map(collapse_ws)
}

/// Normalize and treat an empty result as absent
pub fn normalize_non_empty(raw: Option<&str>) -> Option<String> {
    normalize(raw).filter(|s| !s.is_empty())
}

pub fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for word in s.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Header text loses its trailing colon (`"Delivered :"` -> `"Delivered"`)
pub fn strip_trailing_colon(s: &str) -> String {
    s.trim_end().trim_end_matches(':').trim_end().to_string()
}
