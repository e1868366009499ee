//! movies.yahoo.co.jp adapter.
//!
//! Spec block is a `dl.spec` definition list keyed by Japanese labels
//! (公開, 上映時間, 製作国, 配給); staff and cast live in their own
//! sections.

use cinefill_enrich::report::{Event, ReportSink};
use cinefill_enrich::{DetailsPayload, FetchError, MovieDetailsFetcher, PageRef};
use regex::Regex;
use serde_json::{json, Value};

use super::common::{capture_int, capture_text, cast_display, clean_fragment, truncate_summary, ScrapeClient};

const BASE_URL: &str = "https://movies.yahoo.co.jp";
const SOURCE: &str = "yahoo.co.jp";

// ── Fetcher ─────────────────────────────────────────────────────────

pub struct YahooFetcher {
    client: ScrapeClient,
    base_url: String,
}

impl YahooFetcher {
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

impl MovieDetailsFetcher for YahooFetcher {
    fn source(&self) -> &str {
        SOURCE
    }

    fn search(&self, title: &str) -> Result<Option<PageRef>, FetchError> {
        let url = format!("{}/search/?q={}", self.base_url, urlencoding::encode(title));
        let body = self.client.get(&url)?;
        let re = Regex::new(r#"href="(/movie/[^"]+)""#).unwrap();
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

    for (label, value) in definition_pairs(body, r#"(?s)<dl class="spec"[^>]*>(.*?)</dl>"#) {
        match label.as_str() {
            "公開" => {
                if let Some(year) = capture_int(r"(\d{4})", &value) {
                    details.year = Some(json!(year));
                }
            }
            "上映時間" => {
                if let Some(runtime) = capture_int(r"(\d+)", &value) {
                    details.runtime = Some(json!(runtime));
                }
            }
            "製作国" => details.country = Some(value),
            "配給" => details.distributor = Some(value),
            _ => {}
        }
    }

    parse_staff(body, &mut details);

    if let Some(summary) =
        capture_text(r#"(?s)<section id="story"[^>]*>.*?<p[^>]*>(.*?)</p>"#, body)
    {
        details.summary = Some(truncate_summary(&summary));
    }

    parse_cast(body, &mut details);
    parse_reviews(body, &mut details);

    details
}

/// dt/dd pairs from the first block matched by `section_pattern`; labels
/// and values come back tag-stripped.
fn definition_pairs(body: &str, section_pattern: &str) -> Vec<(String, String)> {
    let section = Regex::new(section_pattern).unwrap();
    let Some(block) = section.captures(body).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let tag = Regex::new(r"(?s)<(dt|dd)[^>]*>(.*?)</(?:dt|dd)>").unwrap();
    let mut pairs = Vec::new();
    let mut pending: Option<String> = None;
    for cap in tag.captures_iter(block.as_str()) {
        let text = clean_fragment(&cap[2]);
        if &cap[1] == "dt" {
            pending = (!text.is_empty()).then_some(text);
        } else if let Some(label) = pending.take() {
            if !text.is_empty() {
                pairs.push((label, text));
            }
        }
    }
    pairs
}

fn parse_staff(body: &str, details: &mut DetailsPayload) {
    let section = Regex::new(r#"(?s)<section id="staff"[^>]*>(.*?)</section>"#).unwrap();
    let Some(block) = section.captures(body).and_then(|c| c.get(1)) else {
        return;
    };

    let mut staff = serde_json::Map::new();
    let mut directors: Vec<String> = Vec::new();
    let mut producers: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
    let mut cinematographers: Vec<String> = Vec::new();

    // A dd may hold several linked names for one role.
    let anchor = Regex::new(r"(?s)<a[^>]*>(.*?)</a>").unwrap();
    let tag = Regex::new(r"(?s)<(dt|dd)[^>]*>(.*?)</(?:dt|dd)>").unwrap();
    let mut current_role: Option<String> = None;
    for cap in tag.captures_iter(block.as_str()) {
        if &cap[1] == "dt" {
            let role = clean_fragment(&cap[2]);
            current_role = (!role.is_empty()).then_some(role);
            continue;
        }
        let Some(role) = &current_role else { continue };
        let mut names: Vec<String> = anchor
            .captures_iter(&cap[2])
            .map(|a| clean_fragment(&a[1]))
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            let plain = clean_fragment(&cap[2]);
            if !plain.is_empty() {
                names.push(plain);
            }
        }
        if names.is_empty() {
            continue;
        }

        let entries: Vec<Value> = names
            .iter()
            .map(|n| json!({ "name": n, "role": "" }))
            .collect();
        staff.insert(role.clone(), Value::Array(entries));
        match role.as_str() {
            "監督" => directors.extend(names),
            "製作" | "プロデューサー" | "製作総指揮" => {
                producers.extend(names);
            }
            "撮影" => cinematographers.extend(names),
            _ => {}
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
    let section = Regex::new(r#"(?s)<section id="cast"[^>]*>(.*?)</section>"#).unwrap();
    let Some(block) = section.captures(body).and_then(|c| c.get(1)) else {
        return;
    };

    let item = Regex::new(r"(?s)<li[^>]*>(.*?)</li>").unwrap();
    let name_re = Regex::new(r#"(?s)class="name"[^>]*>\s*<a[^>]*>(.*?)</a>"#).unwrap();
    let role_re = Regex::new(r#"(?s)class="role"[^>]*>(.*?)<"#).unwrap();

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
    if let Some(score) = capture_text(r#"(?s)class="Rating__value"[^>]*>(.*?)<"#, body) {
        if let Ok(score) = score.parse::<f64>() {
            reviews.insert("average_score".into(), json!(score));
        }
    }
    if let Some(count) = capture_text(r#"(?s)class="Review__count"[^>]*>(.*?)<"#, body) {
        if let Some(count) = capture_int(r"(\d+)", &count.replace(',', "")) {
            reviews.insert("review_count".into(), json!(count));
        }
    }
    if !reviews.is_empty() {
        details.reviews = Some(Value::Object(reviews));
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const SAMPLE_PAGE: &str = r#"
<html><body>
<dl class="spec">
  <dt>公開</dt><dd>2016年8月26日</dd>
  <dt>上映時間</dt><dd>120分</dd>
  <dt>製作国</dt><dd>日本</dd>
  <dt>配給</dt><dd>東宝映像事業部</dd>
</dl>
<section id="staff">
  <dl>
    <dt>監督</dt><dd><a>庵野秀明</a><a>樋口真嗣</a></dd>
    <dt>製作</dt><dd><a>市川南</a></dd>
  </dl>
</section>
<section id="story"><p>巨大不明生物が東京湾に出現し、政府は対応に追われる。</p></section>
<section id="cast">
  <ul>
    <li><p class="name"><a>長谷川博己</a></p><p class="role">矢口蘭堂</p></li>
    <li><p class="name"><a>石原さとみ</a></p></li>
  </ul>
</section>
<div class="Review__average">
  <span class="Rating__value">3.9</span>
  <span class="Review__count">12,345件</span>
</div>
</body></html>
"#;

    #[test]
    fn spec_list_fields() {
        let details = parse_page(SAMPLE_PAGE);
        assert_eq!(details.year, Some(json!(2016)));
        assert_eq!(details.runtime, Some(json!(120)));
        assert_eq!(details.country.as_deref(), Some("日本"));
        assert_eq!(details.distributor.as_deref(), Some("東宝映像事業部"));
    }

    #[test]
    fn staff_with_multiple_names_per_role() {
        let details = parse_page(SAMPLE_PAGE);
        assert_eq!(details.director.as_deref(), Some("庵野秀明, 樋口真嗣"));
        assert_eq!(details.producer.as_deref(), Some("市川南"));

        let staff = details.full_staff.as_ref().unwrap();
        assert_eq!(staff["監督"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn cast_and_summary() {
        let details = parse_page(SAMPLE_PAGE);
        assert_eq!(
            details.cast.as_deref(),
            Some("長谷川博己 (矢口蘭堂), 石原さとみ")
        );
        assert!(details.summary.as_deref().unwrap().starts_with("巨大不明生物"));
    }

    #[test]
    fn review_summary_with_comma_count() {
        let details = parse_page(SAMPLE_PAGE);
        let reviews = details.reviews.as_ref().unwrap();
        assert_eq!(reviews["average_score"], json!(3.9));
        assert_eq!(reviews["review_count"], json!(12345));
    }

    #[test]
    fn search_resolves_relative_movie_link() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/search/");
            then.status(200)
                .body(r#"<div class="ResultList__itemBody"><a href="/movie/367770/">シン・ゴジラ</a></div>"#);
        });

        let fetcher = YahooFetcher::with_base_url(server.base_url());
        let page = fetcher.search("シン・ゴジラ").unwrap().unwrap();
        assert_eq!(page.0, format!("{}/movie/367770/", server.base_url()));
    }

    #[test]
    fn search_network_error_propagates() {
        // Nothing listens on this port.
        let fetcher = YahooFetcher::with_base_url("http://127.0.0.1:1".to_string());
        assert!(fetcher.search("anything").is_err());
    }
}
