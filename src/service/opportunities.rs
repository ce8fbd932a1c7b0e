//! Competitor-gap keyword opportunities: keywords the target's organic
//! competitors rank for and the target does not.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};
use url::Url;

use crate::api::DataForSeoApi;
use crate::error::KeywordError;
use crate::types::dataforseo::{DataForSeoResponse, first_truthy, path, result_items};

pub const DEFAULT_OPPORTUNITY_LOCATION: i64 = 2124;
pub const MAX_COMPETITORS: usize = 3;
pub const GAP_KEYWORDS_PER_COMPETITOR: u32 = 250;
pub const MIN_GAP_VOLUME: i64 = 10;
const COMPETITOR_FETCH_LIMIT: u32 = 50;
const EXAMPLE_COMPETITORS: usize = 5;

/// Host (and explicit port) of `site_url`, lower-cased and without `www.`.
/// Inputs that do not parse as absolute URLs yield `""`.
pub fn normalize_target_domain(site_url: &str) -> String {
    let Ok(url) = Url::parse(site_url.trim()) else {
        return String::new();
    };
    let Some(host) = url.host_str().filter(|h| !h.is_empty()) else {
        return String::new();
    };
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Target used for the gap analysis; falls back to stripping the scheme by hand.
pub fn opportunity_target(domain: &str) -> String {
    let normalized = normalize_target_domain(domain);
    if !normalized.is_empty() {
        return normalized;
    }
    domain
        .replace("https://", "")
        .replace("http://", "")
        .trim()
        .to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub keyword: String,
    pub search_volume: i64,
    pub cpc: f64,
    pub competition: f64,
    pub competitor_count: usize,
    pub example_competitors: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OpportunitiesReport {
    pub opportunities: Vec<Opportunity>,
    pub competitors_used: Vec<String>,
    pub error: Option<String>,
}

impl OpportunitiesReport {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct GapStats {
    search_volume: i64,
    cpc: f64,
    competition: f64,
    competitors: Vec<String>,
}

/// Per-keyword maxima across competitors, in first-seen keyword order.
#[derive(Debug, Default)]
pub struct GapAggregator {
    index: HashMap<String, usize>,
    stats: Vec<(String, GapStats)>,
}

impl GapAggregator {
    pub fn add(&mut self, competitor: &str, item: &Value) {
        let keyword = first_truthy(item, &[&["keyword"], &["keyword_data", "keyword"]]);
        let keyword = keyword.as_str().unwrap_or_default().trim();
        if keyword.is_empty() {
            return;
        }
        let number = |key: &str| {
            path(item, &["keyword_data", "keyword_info", key])
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };
        let volume = number("search_volume") as i64;
        let cpc = number("cpc");
        let competition = number("competition");

        let slot = *self.index.entry(keyword.to_string()).or_insert_with(|| {
            self.stats.push((
                keyword.to_string(),
                GapStats {
                    search_volume: volume,
                    cpc,
                    competition,
                    competitors: Vec::new(),
                },
            ));
            self.stats.len() - 1
        });
        let stats = &mut self.stats[slot].1;
        stats.search_volume = stats.search_volume.max(volume);
        stats.cpc = stats.cpc.max(cpc);
        stats.competition = stats.competition.max(competition);
        if !stats.competitors.iter().any(|c| c == competitor) {
            stats.competitors.push(competitor.to_string());
        }
    }

    /// Scored opportunities, best first. `score = volume * (1 + cpc)`.
    pub fn into_opportunities(self) -> Vec<Opportunity> {
        let mut out: Vec<Opportunity> = self
            .stats
            .into_iter()
            .map(|(keyword, s)| Opportunity {
                keyword,
                search_volume: s.search_volume,
                cpc: round4(s.cpc),
                competition: round4(s.competition),
                competitor_count: s.competitors.len(),
                example_competitors: s
                    .competitors
                    .iter()
                    .take(EXAMPLE_COMPETITORS)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                score: round4(s.search_volume as f64 * (1.0 + s.cpc)),
            })
            .collect();
        out.sort_by(|a, b| b.score.total_cmp(&a.score));
        out
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Competitor domains from a `competitors_domain` response, deduplicated and
/// excluding `target`.
pub fn competitor_domains(raw: &Value, target: &str) -> Vec<String> {
    let Ok(resp) = DataForSeoResponse::from_value(raw) else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::new();
    for task in resp.tasks() {
        for result in task.results() {
            for item in result_items(result) {
                let domain = first_truthy(item, &[&["domain"], &["competitor"]]);
                let Some(domain) = domain.as_str() else {
                    continue;
                };
                let domain = domain.trim().to_lowercase();
                if domain != target && !out.contains(&domain) {
                    out.push(domain);
                }
            }
        }
    }
    out
}

fn gap_items(raw: &Value) -> Vec<Value> {
    DataForSeoResponse::from_value(raw)
        .map(|resp| {
            resp.tasks()
                .iter()
                .flat_map(|t| t.results())
                .flat_map(|r| result_items(r).iter().cloned())
                .collect()
        })
        .unwrap_or_default()
}

async fn fetch_competitors(
    api: &DataForSeoApi,
    target: &str,
    location_code: i64,
    language_code: &str,
) -> Result<Vec<String>, KeywordError> {
    let payload = json!([{
        "target": target,
        "location_code": location_code,
        "language_code": language_code,
        "limit": COMPETITOR_FETCH_LIMIT,
    }]);
    let raw = api.labs("competitors_domain/live", &payload).await?;
    Ok(competitor_domains(&raw, target))
}

async fn fetch_gap(
    api: &DataForSeoApi,
    competitor: &str,
    target: &str,
    location_code: i64,
    language_code: &str,
) -> Result<Vec<Value>, KeywordError> {
    let payload = json!([{
        "target1": competitor,
        "target2": target,
        "location_code": location_code,
        "language_code": language_code,
        "intersections": false,
        "item_types": ["organic"],
        "limit": GAP_KEYWORDS_PER_COMPETITOR,
        "filters": [["keyword_data.keyword_info.search_volume", ">", MIN_GAP_VOLUME]],
        "order_by": ["keyword_data.keyword_info.search_volume,desc"],
    }]);
    let raw = api.labs("domain_intersection/live", &payload).await?;
    Ok(gap_items(&raw))
}

/// Run the whole pipeline. Failures are reported in `error` rather than returned.
pub async fn fetch_keyword_opportunities(
    api: &DataForSeoApi,
    domain: &str,
    location_code: i64,
    language_code: &str,
) -> OpportunitiesReport {
    let target = opportunity_target(domain);
    if target.is_empty() {
        return OpportunitiesReport::failed("Invalid or missing domain");
    }
    if !api.is_configured() {
        return OpportunitiesReport::failed("DATAFORSEO credentials not set");
    }

    info!(%target, location_code, "fetching competitors");
    let mut competitors =
        match fetch_competitors(api, &target, location_code, language_code).await {
            Ok(c) => c,
            Err(e) => {
                warn!(%target, error = %e, "competitor lookup failed");
                return OpportunitiesReport::failed(e.to_string());
            }
        };
    competitors.truncate(MAX_COMPETITORS);
    if competitors.is_empty() {
        warn!(%target, "no competitors found");
        return OpportunitiesReport::default();
    }
    info!(%target, competitors = ?competitors, "using competitors");

    let mut aggregator = GapAggregator::default();
    for competitor in &competitors {
        match fetch_gap(api, competitor, &target, location_code, language_code).await {
            Ok(items) => items.iter().for_each(|it| aggregator.add(competitor, it)),
            Err(e) => warn!(%competitor, error = %e, "gap fetch failed"),
        }
    }

    let opportunities = aggregator.into_opportunities();
    info!(%target, count = opportunities.len(), "keyword opportunities ready");
    OpportunitiesReport {
        opportunities,
        competitors_used: competitors,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_www_and_lowercases() {
        assert_eq!(normalize_target_domain("https://www.SetSail.ca/blog"), "setsail.ca");
        assert_eq!(normalize_target_domain("http://shop.example.com:8080/"), "shop.example.com:8080");
        assert_eq!(normalize_target_domain("setsail.ca"), "");
        assert_eq!(normalize_target_domain(""), "");
    }

    #[test]
    fn target_falls_back_to_manual_strip() {
        assert_eq!(opportunity_target("https://www.setsail.ca"), "setsail.ca");
        assert_eq!(opportunity_target(" SetSail.ca "), "setsail.ca");
        assert_eq!(opportunity_target("   "), "");
    }

    #[test]
    fn competitors_are_deduped_and_exclude_target() {
        let raw = json!({"tasks": [{"result": [{
            "items": [
                {"domain": "Rival.com"},
                {"competitor": "setsail.ca"},
                {"domain": "rival.com"},
                {"domain": null, "competitor": "other.io"},
                {"domain": 42}
            ]
        }]}]});
        assert_eq!(competitor_domains(&raw, "setsail.ca"), vec!["rival.com", "other.io"]);
    }

    fn gap_item(keyword: &str, volume: i64, cpc: f64, competition: f64) -> Value {
        json!({
            "keyword_data": {
                "keyword": keyword,
                "keyword_info": {"search_volume": volume, "cpc": cpc, "competition": competition}
            }
        })
    }

    #[test]
    fn aggregation_takes_maxima_and_scores() {
        let mut agg = GapAggregator::default();
        agg.add("a.com", &gap_item("crm", 100, 2.0, 0.3));
        agg.add("b.com", &gap_item("crm", 80, 3.123456, 0.9));
        agg.add("a.com", &gap_item("crm", 10, 0.0, 0.0));
        agg.add("b.com", &gap_item("erp", 1000, 0.0, 0.1));
        agg.add("b.com", &json!({"keyword": "  "}));

        let out = agg.into_opportunities();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].keyword, "erp");
        assert_eq!(out[0].score, 1000.0);
        assert_eq!(out[0].example_competitors, "b.com");

        assert_eq!(out[1].keyword, "crm");
        assert_eq!(out[1].search_volume, 100);
        assert_eq!(out[1].cpc, 3.1235);
        assert_eq!(out[1].competition, 0.9);
        assert_eq!(out[1].competitor_count, 2);
        assert_eq!(out[1].example_competitors, "a.com,b.com");
        assert_eq!(out[1].score, 412.3456);
    }

    #[test]
    fn aggregation_reads_top_level_keyword_and_nested_items() {
        let raw = json!({"tasks": [{"result": [{"items_data": {"items": [
            {"keyword": "seo audit", "keyword_data": {"keyword_info": {"search_volume": 20}}}
        ]}}]}]});
        let mut agg = GapAggregator::default();
        for item in gap_items(&raw) {
            agg.add("x.com", &item);
        }
        let out = agg.into_opportunities();
        assert_eq!(out[0].keyword, "seo audit");
        assert_eq!(out[0].score, 20.0);
    }

    #[tokio::test]
    async fn missing_credentials_reported_in_error() {
        let api = DataForSeoApi::new(reqwest::Client::new(), &crate::config::Config::default());
        let report = fetch_keyword_opportunities(&api, "setsail.ca", 2124, "en").await;
        assert_eq!(report.error.as_deref(), Some("DATAFORSEO credentials not set"));

        let report = fetch_keyword_opportunities(&api, "https://", 2124, "en").await;
        assert_eq!(report.error.as_deref(), Some("Invalid or missing domain"));
    }
}
