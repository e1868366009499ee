//! eiga.com adapter.

use cinefill_enrich::report::{Event, ReportSink};
use cinefill_enrich::{DetailsPayload, FetchError, MovieDetailsFetcher, PageRef};
use regex::Regex;
use serde_json::{json, Value};

use super::common::{capture_int, capture_text, cast_display, clean_fragment, truncate_summary, ScrapeClient};

const BASE_URL: &str = "https://eiga.com";
const SOURCE: &str = "eiga.com";

// ── Fetcher ─────────────────────────────────────────────────────────

pub struct EigaFetcher {
    client: ScrapeClient,
    base_url: String,
}

impl EigaFetcher {
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

impl MovieDetailsFetcher for EigaFetcher {
    fn source(&self) -> &str {
        SOURCE
    }

    fn search(&self, title: &str) -> Result<Option<PageRef>, FetchError> {
        let url = format!("{}/search/{}", self.base_url, urlencoding::encode(title));
        let body = self.client.get(&url)?;
        // First movie link inside the #rslt-movie result block.
        let re = Regex::new(r#"(?s)id="rslt-movie".*?href="(/movie/[^"]+)""#).unwrap();
        Ok(re
            .captures(&body)
            .and_then(|c| c.get(1))
            .map(|m| PageRef(format!("{}{}", self.base_url, m.as_str()))))
    }

    fn fetch_details(&self, page: &PageRef, sink: &mut dyn ReportSink) -> DetailsPayload {
        match self.client.get(&page.0) {
            Ok(body) => parse_page(&body),
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

fn parse_page(body: &str) -> DetailsPayload {
    let mut details = DetailsPayload::new(SOURCE);

    // Production line: "2004年製作／118分／日本／配給：東宝" under p.data.
    if let Some(data) = capture_text(r#"(?s)<p class="data"[^>]*>(.*?)</p>"#, body) {
        if let Some(year) = capture_int(r"(\d{4})年製作", &data) {
            details.year = Some(json!(year));
        }
        if let Some(runtime) = capture_int(r"(\d+)分", &data) {
            details.runtime = Some(json!(runtime));
        }
        if let Some(dist) = capture_text(r"配給：([^/／]+)", &data) {
            details.distributor = Some(dist);
        }
        // Country is conventionally the last separator part that has no
        // digits and is not the distributor clause.
        let country = data
            .split(['/', '／'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .filter(|p| !p.chars().any(|c| c.is_ascii_digit()) && !p.contains("配給"))
            .last();
        if let Some(country) = country {
            details.country = Some(country.to_string());
        }
    }

    parse_staff(body, &mut details);

    if let Some(summary) = capture_text(r#"(?s)<div id="story"[^>]*>.*?<p[^>]*>(.*?)</p>"#, body) {
        details.summary = Some(truncate_summary(&summary));
    }

    parse_cast(body, &mut details);
    parse_reviews(body, &mut details);

    details
}

fn parse_staff(body: &str, details: &mut DetailsPayload) {
    let section = Regex::new(r#"(?s)<dl class="movie-staff"[^>]*>(.*?)</dl>"#).unwrap();
    let Some(block) = section.captures(body).and_then(|c| c.get(1)) else {
        return;
    };

    let mut staff = serde_json::Map::new();
    let mut directors: Vec<String> = Vec::new();
    let mut producers: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut cinematographers: Vec<String> = Vec::new();

    // dt = role heading, following dd tags carry one name each.
    let tag = Regex::new(r"(?s)<(dt|dd)[^>]*>(.*?)</(?:dt|dd)>").unwrap();
    let mut current_role: Option<String> = None;
    for cap in tag.captures_iter(block.as_str()) {
        let text = clean_fragment(&cap[2]);
        if &cap[1] == "dt" {
            current_role = (!text.is_empty()).then(|| {
                staff.entry(text.clone()).or_insert_with(|| Value::Array(Vec::new()));
                text
            });
        } else if let Some(role) = &current_role {
            if text.is_empty() {
                continue;
            }
            if let Some(Value::Array(names)) = staff.get_mut(role) {
                names.push(json!({ "name": text, "role": "" }));
            }
            match role.as_str() {
                "監督" => directors.push(text),
                "製作" | "プロデューサー" | "製作総指揮" | "エグゼクティブプロデューサー" => {
                    producers.insert(text);
                }
                "撮影" => cinematographers.push(text),
                _ => {}
            }
        }
    }

    if !staff.is_empty() {
        details.full_staff = Some(Value::Object(staff));
    }
    if !directors.is_empty() {
        details.director = Some(directors.join(", "));
    }
    if !producers.is_empty() {
        details.producer = Some(producers.into_iter().collect::<Vec<_>>().join(", "));
    }
    if !cinematographers.is_empty() {
        details.cinematographer = Some(cinematographers.join(", "));
    }
}

fn parse_cast(body: &str, details: &mut DetailsPayload) {
    let section = Regex::new(r#"(?s)<ul class="movie-cast"[^>]*>(.*?)</ul>"#).unwrap();
    let Some(block) = section.captures(body).and_then(|c| c.get(1)) else {
        return;
    };

    let item = Regex::new(r"(?s)<li[^>]*>(.*?)</li>").unwrap();
    let name_re = Regex::new(r#"itemprop="name"[^>]*>([^<]+)<"#).unwrap();
    let role_re = Regex::new(r"(?s)<small[^>]*>(.*?)</small>").unwrap();

    let mut members: Vec<(String, Option<String>)> = Vec::new();
    for cap in item.captures_iter(block.as_str()) {
        let li = &cap[1];
        let Some(name) = name_re
            .captures(li)
            .map(|c| clean_fragment(&c[1]))
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        let role = role_re
            .captures(li)
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

fn parse_reviews(body: &str, details: &mut DetailsPayload) {
    let mut reviews = serde_json::Map::new();
    // Average score is encoded in a class suffix: "rating-star val38" = 3.8.
    if let Some(tenths) = capture_int(r#"class="rating-star val(\d+)""#, body) {
        reviews.insert("average_score".into(), json!(tenths as f64 / 10.0));
    }
    if let Some(count) = capture_int(r#"(?s)rvw-count[^>]*>.*?<a[^>]*>\D*(\d+)"#, body) {
        reviews.insert("review_count".into(), json!(count));
    }
    if !reviews.is_empty() {
        details.reviews = Some(Value::Object(reviews));
    }
}

// ── Tests ───────────────────────────────────────────────────────────
