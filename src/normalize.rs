// src/normalize.rs
//! Text normalization primitives shared by every matching stage.

fn ws_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"\s+").unwrap())
}

fn tag_re() -> &'static regex::Regex {
    static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    RE.get_or_init(|| regex::Regex::new(r"<[^>]+>").unwrap())
}

/// Decode HTML entities, collapse whitespace runs, trim, lowercase.
/// Empty input stays empty.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(text);
    let collapsed = ws_re().replace_all(&decoded, " ");
    collapsed.trim().to_lowercase()
}

/// Strip HTML down to text: decode entities, replace each tag with a space,
/// collapse whitespace. Case is preserved; lowercasing is `normalize_text`'s
/// job. Good enough for ATS-generated descriptions.
pub fn html_to_text(maybe_html: &str) -> String {
    if maybe_html.is_empty() {
        return String::new();
    }
    let decoded = html_escape::decode_html_entities(maybe_html);
    let stripped = tag_re().replace_all(&decoded, " ");
    let collapsed = ws_re().replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Trim + lowercase each item, drop empties, deduplicate keeping first-seen
/// order.
pub fn unique_lower<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let key = item.as_ref().trim().to_lowercase();
        if !key.is_empty() && seen.insert(key.clone()) {
            out.push(key);
        }
    }
    out
}
