//! Shared helpers for resolver modules: static regex/selector compilation and text extraction.

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::Selector;
use url::Url;

use crate::fetcher::FetchError;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Parses a CSS selector at static init; panics on invalid selector.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

/// Returns the first capture group of `regex` in `text`, or an empty string.
#[must_use]
pub fn first_capture_or_empty(regex: &Regex, text: &str) -> String {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .unwrap_or_default()
}

/// Decodes a JSON-escaped string fragment (`https:\/\/a.b\/c%` style).
///
/// Returns `None` when the fragment is not a valid JSON string body.
#[must_use]
pub fn unescape_json_fragment(raw: &str) -> Option<String> {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).ok()
}

/// Returns the host of `url` if it parses.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
}

/// Returns a trimmed, non-empty attribute value.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Builds a header map from configured name/value pairs.
///
/// # Errors
///
/// Returns [`FetchError::Client`] naming the offending header.
pub fn header_map_from_pairs(
    purpose: &str,
    pairs: &[(String, String)],
) -> Result<HeaderMap, FetchError> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::client(purpose, format!("invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            FetchError::client(purpose, format!("invalid value for header '{name}': {e}"))
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
