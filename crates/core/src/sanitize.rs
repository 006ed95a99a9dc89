use once_cell::sync::Lazy;
use regex::Regex;

// Greedy on purpose: spans from the first opening brace/bracket to the last
// closing one, so nested objects stay intact.
static JSON_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("valid json fragment regex"));

/// Extracts the JSON payload from free-form model text.
///
/// Strips surrounding whitespace and a markdown code fence, then returns the
/// first object/array-looking span. When nothing JSON-like is present the
/// trimmed text is returned unchanged and parsing fails downstream. JSON
/// content itself is never rewritten.
pub fn sanitize_response(raw: &str) -> String {
    let mut content = raw.trim().to_string();

    if let Some(rest) = content.strip_prefix("```") {
        let body = rest.trim_start_matches(is_fence_tag_char).trim_end();
        content = body.strip_suffix("```").unwrap_or(body).to_string();
    }

    if let Some(found) = JSON_FRAGMENT.find(&content) {
        content = found.as_str().to_string();
    }

    content.trim().to_string()
}

fn is_fence_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')
}
