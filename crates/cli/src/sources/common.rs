//! Shared infrastructure for source adapters.
//!
//! Each adapter (eiga, yahoo, filmarks) reuses:
//! - `ScrapeClient` — blocking HTTP client with timeout and a fixed
//!   User-Agent; one attempt per request, no retry (a failed candidate
//!   is skipped, the run continues)
//! - HTML helpers — tag stripping, entity decoding, fragment capture
//! - `truncate_summary` — the 300-char storage cut for synopsis text

use std::time::Duration;

use cinefill_enrich::FetchError;
use regex::Regex;

pub(super) const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

pub(super) struct ScrapeClient {
    http: reqwest::blocking::Client,
}

impl ScrapeClient {
    pub(super) fn new() -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");
        Self { http }
    }

    /// GET a page and return its body. Any transport or HTTP-status
    /// failure maps to a `FetchError` for the caller to report.
    pub(super) fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| FetchError(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| FetchError(e.to_string()))?;
        response.text().map_err(|e| FetchError(e.to_string()))
    }
}

/// First capture group of `pattern` over `text`, tags stripped and
/// whitespace collapsed. Patterns are static; compilation cannot fail.
pub(super) fn capture_text(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).unwrap();
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| clean_fragment(m.as_str()))
        .filter(|s| !s.is_empty())
}

/// Like [`capture_text`], parsed as an integer.
pub(super) fn capture_int(pattern: &str, text: &str) -> Option<i64> {
    capture_text(pattern, text).and_then(|s| s.parse().ok())
}

/// Strip tags, decode common entities, and collapse whitespace in an
/// HTML fragment.
pub(super) fn clean_fragment(fragment: &str) -> String {
    let no_tags = Regex::new(r"<[^>]*>").unwrap().replace_all(fragment, " ");
    let decoded = decode_entities(&no_tags);
    collapse_whitespace(&decoded)
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut synopsis text to the 300-char storage limit, marking the cut
/// with an ellipsis.
pub(super) fn truncate_summary(text: &str) -> String {
    const MAX: usize = cinefill_enrich::model::SUMMARY_MAX_CHARS;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX).collect();
    format!("{cut}...")
}

/// Top-4 cast display string: `Name (Role), Name, ...`.
pub(super) fn cast_display(members: &[(String, Option<String>)]) -> Option<String> {
    if members.is_empty() {
        return None;
    }
    let parts: Vec<String> = members
        .iter()
        .take(4)
        .map(|(name, role)| match role {
            Some(role) if !role.is_empty() => format!("{name} ({role})"),
            _ => name.clone(),
        })
        .collect();
    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_fragment_strips_markup() {
        let html = "<span itemprop=\"name\">役所  広司</span>&nbsp;<small>勝四郎</small>";
        assert_eq!(clean_fragment(html), "役所 広司 勝四郎");
    }

    #[test]
    fn capture_int_parses() {
        assert_eq!(capture_int(r"(\d{4})年製作", "2004年製作／118分"), Some(2004));
        assert_eq!(capture_int(r"(\d+)分", "2004年製作／118分"), Some(118));
        assert_eq!(capture_int(r"(\d{4})年製作", "no year here"), None);
    }

    #[test]
    fn summary_truncation_at_300_chars() {
        let long = "あ".repeat(350);
        let cut = truncate_summary(&long);
        assert_eq!(cut.chars().count(), 303);
        assert!(cut.ends_with("..."));

        let short = "short synopsis";
        assert_eq!(truncate_summary(short), short);
    }

    #[test]
    fn cast_display_tops_out_at_four() {
        let members: Vec<(String, Option<String>)> = (1..=6)
            .map(|i| (format!("Actor{i}"), Some(format!("Role{i}"))))
            .collect();
        let display = cast_display(&members).unwrap();
        assert_eq!(display.matches(',').count(), 3);
        assert!(display.starts_with("Actor1 (Role1)"));
        assert!(!display.contains("Actor5"));
    }
}
