//! filmarks.com adapter.
//!
//! Filmarks ships the synopsis in a JSON-LD `Movie` block rather than in
//! visible markup, so this adapter parses that script before falling back
//! to the page body. Staff coverage is thinner than the other sources:
//! the site lists only directors and cast.

use cinefill_enrich::report::{Event, ReportSink};
use cinefill_enrich::{DetailsPayload, FetchError, MovieDetailsFetcher, PageRef};
use regex::Regex;
use serde_json::{json, Value};

use super::common::{capture_int, cast_display, clean_fragment, truncate_summary, ScrapeClient};

const BASE_URL: &str = "https://filmarks.com";
const SOURCE: &str = "filmarks.com";

// ── Fetcher ─────────────────────────────────────────────────────────

pub struct FilmarksFetcher {
    client: ScrapeClient,
    base_url: String,
}

impl FilmarksFetcher {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: ScrapeClient::new(),
            base_url,
        }
    }
}

impl MovieDetailsFetcher for FilmarksFetcher {
    fn source(&self) -> &str {
        SOURCE
    }

    fn search(&self, title: &str) -> Result<Option<PageRef>, FetchError> {
        let url = format!(
            "{}/search/movies?q={}",
            self.base_url,
            urlencoding::encode(title)
        );
        let body = self.client.get(&url)?;
        let re = Regex::new(r#"(?s)p-content-cassette.*?href="(/movies/[^"]+)""#).unwrap();
        Ok(re
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| PageRef(format!("{}{}", self.base_url, m.as_str()))))
    }

    fn fetch_details(&self, page: &PageRef, sink: &mut dyn ReportSink) -> DetailsPayload {
        match self.client.get(&page.0) {
            Ok(body) => parse_page(&body, sink),
            Err(e) => {
                sink.emit(Event::SourceNote {
                    source: SOURCE.to_string(),
                    detail: format!("detail page fetch failed: {e}"),
                });
                DetailsPayload::new(SOURCE)
            }
        }
    }
}

// ── Page extraction ─────────────────────────────────────────────────

fn parse_page(body: &str, sink: &mut dyn ReportSink) -> DetailsPayload {
    let mut details = DetailsPayload::new(SOURCE);

    if let Some(year) = capture_int(r"(\d{4})年", body) {
        details.year = Some(json!(year));
    }
    if let Some(runtime) = capture_int(r"上映時間[：:]\s*(\d+)分", body) {
        details.runtime = Some(json!(runtime));
    }

    // Countries are a linked list after the 製作国 heading.
    let country_block = Regex::new(r"(?s)製作国[：:]?</h3>\s*<ul>(.*?)</ul>").unwrap();
    if let Some(block) = country_block.captures(body).and_then(|c| c.get(1)) {
        let countries = anchor_texts(block.as_str());
        if !countries.is_empty() {
            details.country = Some(countries.join(" / "));
        }
    }

    let distributor_block = Regex::new(r"(?s)配給[^<]*</h3>\s*<ul>(.*?)</ul>").unwrap();
    if let Some(block) = distributor_block.captures(body).and_then(|c| c.get(1)) {
        let names = anchor_texts(block.as_str());
        if !names.is_empty() {
            details.distributor = Some(names.join(", "));
        }
    }

    if let Some(summary) = json_ld_outline(body, sink) {
        details.summary = Some(truncate_summary(&summary));
    }

    parse_people(body, &mut details);
    parse_reviews(body, &mut details);

    details
}

/// `outline` field of the page's JSON-LD `Movie` block, if present.
fn json_ld_outline(body: &str, sink: &mut dyn ReportSink) -> Option<String> {
    let script =
        Regex::new(r#"(?s)<script type="application/ld\+json">(.*?)</script>"#).unwrap();
    let raw = script.captures(body)?.get(1)?.as_str();
    let parsed: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(e) => {
            sink.emit(Event::SourceNote {
                source: SOURCE.to_string(),
                detail: format!("malformed JSON-LD block: {e}"),
            });
            return None;
        }
    };
    // Either a single object or a list with the movie first.
    let movie = match &parsed {
        Value::Array(items) => items.first()?,
        other => other,
    };
    if movie["@type"] != "Movie" {
        return None;
    }
    movie["outline"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_people(body: &str, details: &mut DetailsPayload) {
    let director_block =
        Regex::new(r"(?s)監督</h3>(.*?)</ul>").unwrap();
    if let Some(block) = director_block.captures(body).and_then(|c| c.get(1)) {
        let names: Vec<String> = button_texts(block.as_str(), "c2-button-tertiary-s__text");
        if !names.is_empty() {
            details.director = Some(names.join(", "));
            let entries: Vec<Value> = names
                .iter()
                .map(|n| json!({ "name": n, "role": "" }))
                .collect();
            details.full_staff = Some(json!({ "監督": entries }));
        }
    }

    let cast_block = Regex::new(r"(?s)出演者</h3>(.*?)(?:<h3|</section>|</body>)").unwrap();
    if let Some(block) = cast_block.captures(body).and_then(|c| c.get(1)) {
        let name_re =
            Regex::new(r#"(?s)c2-button-tertiary-s-multi-text__text[^>]*>(.*?)<"#).unwrap();
        let role_re =
            Regex::new(r#"(?s)c2-button-tertiary-s-multi-text__subtext[^>]*>(.*?)<"#).unwrap();
        let item = Regex::new(r"(?s)<h4[^>]*>(.*?)</h4>").unwrap();

        let mut members: Vec<(String, Option<String>)> = Vec::new();
        for cap in item.captures_iter(block.as_str()) {
            let entry = &cap[1];
            let Some(name) = name_re
                .captures(entry)
                .map(|c| clean_fragment(&c[1]))
                .filter(|n| !n.is_empty())
            else {
                continue;
            };
            let role = role_re
                .captures(entry)
                .map(|c| clean_fragment(&c[1]))
                .filter(|r| !r.is_empty());
            members.push((name, role));
        }

        if !members.is_empty() {
            let full: Vec<Value> = members
                .iter()
                .map(|(name, role)| json!({ "name": name, "role": role }))
                .collect();
            details.full_cast = Some(Value::Array(full));
            details.cast = cast_display(&members);
        }
    }
}

fn parse_reviews(body: &str, details: &mut DetailsPayload) {
    let mut reviews = serde_json::Map::new();
    let score_re = Regex::new(r#"(?s)c2-rating-l__text[^>]*>\s*([\d.]+)\s*<"#).unwrap();
    if let Some(score) = score_re
        .captures(body)
        .and_then(|c| c[1].parse::<f64>().ok())
    {
        reviews.insert("average_score".into(), json!(score));
    }
    let count_re = Regex::new(r#"(?s)total-count[^>]*>\D*([\d,]+)"#).unwrap();
    if let Some(count) = count_re
        .captures(body)
        .and_then(|c| c[1].replace(',', "").parse::<i64>().ok())
    {
        reviews.insert("review_count".into(), json!(count));
    }
    if !reviews.is_empty() {
        details.reviews = Some(Value::Object(reviews));
    }
}

fn anchor_texts(block: &str) -> Vec<String> {
    Regex::new(r"(?s)<a[^>]*>(.*?)</a>")
        .unwrap()
        .captures_iter(block)
        .map(|c| clean_fragment(&c[1]))
        .filter(|s| !s.is_empty())
        .collect()
}

fn button_texts(block: &str, class: &str) -> Vec<String> {
    Regex::new(&format!(r"(?s){class}[^>]*>(.*?)<"))
        .unwrap()
        .captures_iter(block)
        .map(|c| clean_fragment(&c[1]))
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
