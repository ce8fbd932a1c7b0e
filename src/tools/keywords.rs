//! DataForSEO keyword research tools.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::api::dataforseo_api::{KEYWORDS_DATA_GOOGLE_ADS, LABS_GOOGLE, LIVE_TIMEOUT};
use crate::error::KeywordError;
use crate::router::McpState;
use crate::tools::{ToolRegistry, object_schema};
use crate::types::dataforseo::{DataForSeoResponse, field, first_truthy, is_truthy, path};

pub const DEFAULT_LOCATION_CODE: i64 = 2840;
const MAX_SEED_KEYWORDS: usize = 20;
const MAX_IDEAS_LIMIT: i64 = 1000;
const MAX_PLANNER_KEYWORDS: usize = 1000;

fn default_location() -> i64 {
    DEFAULT_LOCATION_CODE
}

pub(crate) fn default_language() -> String {
    "en".to_string()
}

fn default_ideas_limit() -> i64 {
    100
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SearchVolumeArgs {
    pub keyword: String,
    #[serde(default = "default_location")]
    pub location_code: i64,
    #[serde(default = "default_language")]
    pub language_code: String,
}

pub async fn get_search_volume(
    state: McpState,
    args: SearchVolumeArgs,
) -> Result<Value, KeywordError> {
    let payload = json!([{
        "language_code": args.language_code,
        "location_code": args.location_code,
        "include_clickstream_data": true,
        "include_serp_info": true,
        "keywords": [args.keyword],
    }]);
    let raw = state
        .dataforseo
        .post(
            &format!("{LABS_GOOGLE}/keyword_overview/live"),
            &payload,
            LIVE_TIMEOUT,
        )
        .await?;
    shape_search_volume(&args.keyword, &raw)
}

fn shape_search_volume(keyword: &str, raw: &Value) -> Result<Value, KeywordError> {
    let resp = DataForSeoResponse::from_value(raw)?;
    let task = resp.first_task()?;
    let Some(result) = task.results().first() else {
        return Err(KeywordError::UnexpectedResponse(format!(
            "DataForSEO API returned no result. Status: {} - {}",
            task.status_code
                .map_or_else(|| "unknown".to_string(), |c| c.to_string()),
            task.status_message.as_deref().unwrap_or("Unknown error"),
        )));
    };

    let Some(item) = path(result, &["items"])
        .and_then(Value::as_array)
        .and_then(|items| items.first())
    else {
        return Ok(json!({
            "keyword": keyword,
            "search_volume": null,
            "keyword_difficulty": null,
            "main_intent": null,
            "error": "No data available for this keyword",
        }));
    };

    Ok(json!({
        "keyword": field(item, &["keyword"]),
        "search_volume": field(item, &["keyword_info", "search_volume"]),
        "keyword_difficulty": field(item, &["keyword_properties", "keyword_difficulty"]),
        "main_intent": field(item, &["search_intent_info", "main_intent"]),
    }))
}

#[derive(Debug, Deserialize)]
pub struct KeywordIdeasArgs {
    pub keywords: Vec<String>,
    #[serde(default = "default_location")]
    pub location_code: i64,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default = "default_ideas_limit")]
    pub limit: i64,
    #[serde(default = "default_true")]
    pub include_serp_info: bool,
    #[serde(default)]
    pub include_clickstream_data: bool,
    #[serde(default)]
    pub filters: Option<Vec<Value>>,
    #[serde(default)]
    pub order_by: Option<Vec<Value>>,
}

pub async fn get_keyword_ideas(
    state: McpState,
    args: KeywordIdeasArgs,
) -> Result<Value, KeywordError> {
    if args.keywords.is_empty() {
        return Err(KeywordError::Validation(
            "At least one seed keyword is required.".into(),
        ));
    }
    if args.keywords.len() > MAX_SEED_KEYWORDS {
        return Err(KeywordError::Validation(
            "Maximum 20 seed keywords allowed.".into(),
        ));
    }

    let mut task = json!({
        "keywords": args.keywords,
        "location_code": args.location_code,
        "language_code": args.language_code,
        "limit": args.limit.min(MAX_IDEAS_LIMIT),
        "include_serp_info": args.include_serp_info,
        "include_clickstream_data": args.include_clickstream_data,
    });
    if let Some(filters) = args.filters.as_ref().filter(|f| !f.is_empty()) {
        task["filters"] = json!(filters);
    }
    if let Some(order_by) = args.order_by.as_ref().filter(|o| !o.is_empty()) {
        task["order_by"] = json!(order_by);
    }

    let raw = state
        .dataforseo
        .post(
            &format!("{LABS_GOOGLE}/keyword_ideas/live"),
            &json!([task]),
            LIVE_TIMEOUT,
        )
        .await?;
    shape_keyword_ideas(&args, &raw)
}

fn shape_keyword_ideas(args: &KeywordIdeasArgs, raw: &Value) -> Result<Value, KeywordError> {
    let resp = DataForSeoResponse::from_value(raw)?;
    let task = resp.first_task()?;
    task.ensure_ok()?;

    let Some(result) = task.results().first() else {
        return Ok(json!({
            "total_count": 0,
            "items_count": 0,
            "items": [],
            "seed_keywords": args.keywords,
        }));
    };

    let items: Vec<Value> = path(result, &["items"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| keyword_idea(item, args.include_serp_info))
                .collect()
        })
        .unwrap_or_default();

    Ok(json!({
        "total_count": path(result, &["total_count"]).cloned().unwrap_or(json!(0)),
        "items_count": path(result, &["items_count"]).cloned().unwrap_or(json!(0)),
        "items": items,
        "seed_keywords": args.keywords,
        "location_code": args.location_code,
        "language_code": args.language_code,
    }))
}

fn keyword_idea(item: &Value, include_serp_info: bool) -> Value {
    let info = |key: &str| field(item, &["keyword_info", key]);
    let monthly: Vec<Value> = path(item, &["keyword_info", "monthly_searches"])
        .and_then(Value::as_array)
        .map(|m| m.iter().take(6).cloned().collect())
        .unwrap_or_default();

    let mut idea = json!({
        "keyword": field(item, &["keyword"]),
        "search_volume": info("search_volume"),
        "competition": info("competition"),
        "competition_level": info("competition_level"),
        "cpc": info("cpc"),
        "low_top_of_page_bid": info("low_top_of_page_bid"),
        "high_top_of_page_bid": info("high_top_of_page_bid"),
        "keyword_difficulty": field(item, &["keyword_properties", "keyword_difficulty"]),
        "main_intent": field(item, &["search_intent_info", "main_intent"]),
        "monthly_searches": monthly,
    });

    if include_serp_info
        && let Some(serp) = path(item, &["serp_info"]).filter(|s| is_truthy(s))
    {
        idea["serp_item_types"] = path(serp, &["serp_item_types"])
            .cloned()
            .unwrap_or_else(|| json!([]));
        idea["se_results_count"] = field(serp, &["se_results_count"]);
    }
    idea
}

#[derive(Debug, Deserialize)]
pub struct KeywordPlannerArgs {
    pub keywords: Vec<String>,
    #[serde(default = "default_location")]
    pub location_code: i64,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
}

pub async fn google_ads_keyword_planner(
    state: McpState,
    args: KeywordPlannerArgs,
) -> Result<Value, KeywordError> {
    if args.keywords.is_empty() {
        return Err(KeywordError::Validation(
            "At least one keyword is required.".into(),
        ));
    }
    if args.keywords.len() > MAX_PLANNER_KEYWORDS {
        return Err(KeywordError::Validation(
            "Maximum 1000 keywords allowed per request.".into(),
        ));
    }

    let mut task = json!({
        "keywords": args.keywords,
        "location_code": args.location_code,
        "language_code": args.language_code,
        "bid": 1.0,
        "match": "broad",
    });
    if let Some(from) = args.date_from.as_deref().filter(|d| !d.is_empty()) {
        task["date_from"] = json!(from);
    }
    if let Some(to) = args.date_to.as_deref().filter(|d| !d.is_empty()) {
        task["date_to"] = json!(to);
    }

    let raw = state
        .dataforseo
        .post(
            &format!("{KEYWORDS_DATA_GOOGLE_ADS}/ad_traffic_by_keywords/live"),
            &json!([task]),
            LIVE_TIMEOUT,
        )
        .await?;
    shape_ad_traffic(&args, &raw)
}

fn shape_ad_traffic(args: &KeywordPlannerArgs, raw: &Value) -> Result<Value, KeywordError> {
    let resp = DataForSeoResponse::from_value(raw)?;
    let task = resp.first_task()?;
    task.ensure_ok()?;

    let Some(result) = task.results().first() else {
        return Ok(json!({
            "total_count": 0,
            "items_count": 0,
            "items": [],
            "keywords": args.keywords,
            "location_code": args.location_code,
            "language_code": args.language_code,
        }));
    };

    let items: Vec<Value> = match path(result, &["items"])
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
    {
        Some(items) => items.iter().map(ad_traffic_item).collect(),
        None => args
            .keywords
            .iter()
            .map(|kw| aggregated_ad_traffic_item(kw, result))
            .collect(),
    };

    Ok(json!({
        "total_count": items.len(),
        "items_count": items.len(),
        "items": items,
        "keywords": args.keywords,
        "location_code": args.location_code,
        "language_code": args.language_code,
        "date_from": args.date_from,
        "date_to": args.date_to,
        "date_interval": field(result, &["date_interval"]),
        "match": field(result, &["match"]),
        "bid": field(result, &["bid"]),
    }))
}

fn ad_traffic_item(item: &Value) -> Value {
    let info = |key: &str| field(item, &["keyword_info", key]);
    let cost = first_truthy(
        item,
        &[&["ad_traffic", "cost_micros"], &["ad_traffic", "daily_cost_average"]],
    );
    let (cost_micros, cost_usd) = if is_truthy(&cost) {
        let usd = cost.as_f64().map(|micros| micros / 1_000_000.0);
        (cost, json!(usd))
    } else {
        (Value::Null, Value::Null)
    };

    json!({
        "keyword": field(item, &["keyword"]),
        "search_volume": info("search_volume"),
        "competition": info("competition"),
        "competition_level": info("competition_level"),
        "competition_index": info("competition_index"),
        "cpc": info("cpc"),
        "cpc_min": first_truthy(item, &[&["keyword_info", "cpc_min"], &["ad_traffic", "cpc_min"]]),
        "cpc_max": first_truthy(item, &[&["keyword_info", "cpc_max"], &["ad_traffic", "cpc_max"]]),
        "low_top_of_page_bid": info("low_top_of_page_bid"),
        "high_top_of_page_bid": info("high_top_of_page_bid"),
        "ad_position": first_truthy(
            item,
            &[&["ad_traffic", "ad_position_average"], &["ad_traffic", "ad_position"]],
        ),
        "impressions": first_truthy(
            item,
            &[&["ad_traffic", "impressions"], &["ad_traffic", "daily_impressions_average"]],
        ),
        "clicks": first_truthy(
            item,
            &[&["ad_traffic", "clicks"], &["ad_traffic", "daily_clicks_average"]],
        ),
        "cost_micros": cost_micros,
        "cost_usd": cost_usd,
    })
}

/// The endpoint may answer with one aggregate for all keywords; repeat it per keyword.
fn aggregated_ad_traffic_item(keyword: &str, result: &Value) -> Value {
    let cost = field(result, &["cost"]);
    let (cost_usd, cost_micros) = if is_truthy(&cost) {
        let micros = cost.as_f64().map(|usd| (usd * 1_000_000.0) as i64);
        (cost, json!(micros))
    } else {
        (Value::Null, Value::Null)
    };

    json!({
        "keyword": keyword,
        "search_volume": null,
        "competition": null,
        "competition_level": null,
        "competition_index": null,
        "cpc": field(result, &["average_cpc"]),
        "cpc_min": null,
        "cpc_max": null,
        "low_top_of_page_bid": null,
        "high_top_of_page_bid": null,
        "ad_position": null,
        "impressions": field(result, &["impressions"]),
        "clicks": field(result, &["clicks"]),
        "ctr": field(result, &["ctr"]),
        "cost_usd": cost_usd,
        "cost_micros": cost_micros,
    })
}

/// `{keyword, search_volume, cpc, competition}` rows from a `keywords_data` task.
pub fn parse_keywords_data(raw: &Value) -> Result<Vec<Value>, KeywordError> {
    let resp = DataForSeoResponse::from_value(raw)?;
    let task = resp
        .tasks()
        .first()
        .ok_or_else(|| KeywordError::UnexpectedResponse("DataForSEO API returned no tasks".into()))?;
    task.ensure_ok()?;
    Ok(task
        .results()
        .iter()
        .map(|item| {
            json!({
                "keyword": first_truthy(item, &[&["keyword"]]).as_str().unwrap_or_default(),
                "search_volume": field(item, &["search_volume"]),
                "cpc": field(item, &["cpc"]),
                "competition": field(item, &["competition"]),
            })
        })
        .collect())
}

fn slice_to_limit(mut rows: Vec<Value>, limit: i64) -> Vec<Value> {
    rows.truncate(limit.max(1) as usize);
    rows
}

#[derive(Debug, Deserialize)]
pub struct KeywordsForSiteArgs {
    pub url: String,
    pub location_code: i64,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn keywords_for_site(
    state: McpState,
    args: KeywordsForSiteArgs,
) -> Result<Value, KeywordError> {
    let target = args.url.trim();
    if target.is_empty() {
        return Ok(json!({"seeds": [], "raw": null}));
    }
    let payload = json!([{
        "target": target,
        "location_code": args.location_code,
        "language_code": args.language_code,
    }]);
    let raw = state
        .dataforseo
        .keywords_data("keywords_for_site/live", &payload)
        .await?;
    let Ok(rows) = parse_keywords_data(&raw) else {
        return Ok(json!({"seeds": [], "raw": raw}));
    };
    let seeds = slice_to_limit(rows, args.limit.unwrap_or(50));
    info!(target, seeds = seeds.len(), "keywords for site");
    Ok(json!({"seeds": seeds, "raw": raw}))
}

#[derive(Debug, Deserialize)]
pub struct KeywordsForKeywordsArgs {
    pub keywords: Vec<String>,
    pub location_code: i64,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn keywords_for_keywords(
    state: McpState,
    args: KeywordsForKeywordsArgs,
) -> Result<Value, KeywordError> {
    if args.keywords.is_empty() {
        return Ok(json!({"suggestions": [], "raw": null}));
    }
    let seeds: Vec<&String> = args.keywords.iter().take(MAX_SEED_KEYWORDS).collect();
    let payload = json!([{
        "keywords": seeds,
        "location_code": args.location_code,
        "language_code": args.language_code,
    }]);
    let raw = state
        .dataforseo
        .keywords_data("keywords_for_keywords/live", &payload)
        .await?;
    let Ok(rows) = parse_keywords_data(&raw) else {
        return Ok(json!({"suggestions": [], "raw": raw}));
    };
    let suggestions = slice_to_limit(rows, args.limit.unwrap_or(200));
    Ok(json!({"suggestions": suggestions, "raw": raw}))
}

pub fn register(registry: &mut ToolRegistry) {
    registry
        .register(
            "get_search_volume",
            "Fetch keyword overview data (search volume, keyword difficulty, main search intent) \
             for one keyword from DataForSEO Labs. location_code defaults to 2840 (United States), \
             language_code to \"en\".",
            object_schema(
                json!({
                    "keyword": {"type": "string", "description": "Keyword to look up."},
                    "location_code": {"type": "integer", "default": 2840},
                    "language_code": {"type": "string", "default": "en"},
                }),
                &["keyword"],
            ),
            get_search_volume,
        )
        .register(
            "getKeywordIdeas",
            "Keyword ideas for up to 20 seed keywords from DataForSEO Labs, with search volume, \
             competition, CPC, difficulty and intent. limit defaults to 100 (max 1000). \
             filters example: [[\"keyword_info.search_volume\", \">\", 100], \"and\", \
             [\"keyword_info.competition_level\", \"=\", \"LOW\"]]. order_by example: \
             [\"keyword_info.search_volume,desc\"].",
            object_schema(
                json!({
                    "keywords": {"type": "array", "items": {"type": "string"}, "maxItems": 20},
                    "location_code": {"type": "integer", "default": 2840},
                    "language_code": {"type": "string", "default": "en"},
                    "limit": {"type": "integer", "default": 100},
                    "include_serp_info": {"type": "boolean", "default": true},
                    "include_clickstream_data": {"type": "boolean", "default": false},
                    "filters": {"type": ["array", "null"]},
                    "order_by": {"type": ["array", "null"], "items": {"type": "string"}},
                }),
                &["keywords"],
            ),
            get_keyword_ideas,
        )
        .register(
            "google_ads_keyword_planner",
            "Google Ads planner metrics (CPC range, ad position, impressions, clicks, cost) for up \
             to 1000 keywords via DataForSEO ad_traffic_by_keywords. Dates are YYYY-MM-DD.",
            object_schema(
                json!({
                    "keywords": {"type": "array", "items": {"type": "string"}, "maxItems": 1000},
                    "location_code": {"type": "integer", "default": 2840},
                    "language_code": {"type": "string", "default": "en"},
                    "date_from": {"type": ["string", "null"]},
                    "date_to": {"type": ["string", "null"]},
                }),
                &["keywords"],
            ),
            google_ads_keyword_planner,
        )
        .register(
            "keywords_for_site",
            "Keywords relevant to a site or page (Google Ads keywords_for_site). Returns \
             {seeds, raw}; seeds carry keyword, search_volume, cpc and competition.",
            object_schema(
                json!({
                    "url": {"type": "string", "description": "Target URL or domain."},
                    "location_code": {"type": "integer", "description": "e.g. 2840 US, 2124 Canada."},
                    "language_code": {"type": "string", "default": "en"},
                    "limit": {"type": ["integer", "null"], "default": 50},
                }),
                &["url", "location_code"],
            ),
            keywords_for_site,
        )
        .register(
            "keywords_for_keywords",
            "Keyword suggestions for up to 20 seed keywords (Google Ads keywords_for_keywords). \
             Returns {suggestions, raw}.",
            object_schema(
                json!({
                    "keywords": {"type": "array", "items": {"type": "string"}},
                    "location_code": {"type": "integer"},
                    "language_code": {"type": "string", "default": "en"},
                    "limit": {"type": ["integer", "null"], "default": 200},
                }),
                &["keywords", "location_code"],
            ),
            keywords_for_keywords,
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_response(result: Value) -> Value {
        json!({
            "status_code": 20000,
            "tasks": [{"status_code": 20000, "status_message": "Ok.", "result": result}]
        })
    }

    #[test]
    fn search_volume_picks_first_item() {
        let raw = ok_response(json!([{
            "items": [{
                "keyword": "seo tools",
                "keyword_info": {"search_volume": 5400},
                "keyword_properties": {"keyword_difficulty": 61},
                "search_intent_info": {"main_intent": "commercial"}
            }]
        }]));
        let out = shape_search_volume("seo tools", &raw).unwrap();
        assert_eq!(out["search_volume"], 5400);
        assert_eq!(out["keyword_difficulty"], 61);
        assert_eq!(out["main_intent"], "commercial");
    }

    #[test]
    fn search_volume_without_items_is_graceful() {
        let raw = ok_response(json!([{"items": null}]));
        let out = shape_search_volume("nothing", &raw).unwrap();
        assert_eq!(out["keyword"], "nothing");
        assert!(out["search_volume"].is_null());
        assert_eq!(out["error"], "No data available for this keyword");
    }

    #[test]
    fn search_volume_without_result_reports_status() {
        let raw = json!({"tasks": [{"status_code": 40501, "status_message": "Invalid Field", "result": null}]});
        let err = shape_search_volume("x", &raw).unwrap_err();
        assert_eq!(
            err.to_string(),
            "DataForSEO API returned no result. Status: 40501 - Invalid Field"
        );
    }

    fn ideas_args(include_serp_info: bool) -> KeywordIdeasArgs {
        serde_json::from_value(json!({
            "keywords": ["crm"],
            "include_serp_info": include_serp_info
        }))
        .unwrap()
    }

    #[test]
    fn ideas_args_defaults() {
        let args = ideas_args(true);
        assert_eq!(args.location_code, 2840);
        assert_eq!(args.language_code, "en");
        assert_eq!(args.limit, 100);
        assert!(!args.include_clickstream_data);
    }

    #[test]
    fn keyword_ideas_trim_monthly_searches_and_add_serp() {
        let monthly: Vec<Value> = (1..=12).map(|m| json!({"month": m})).collect();
        let raw = ok_response(json!([{
            "total_count": 900,
            "items_count": 1,
            "items": [{
                "keyword": "crm software",
                "keyword_info": {"search_volume": 100, "cpc": 12.5, "monthly_searches": monthly},
                "serp_info": {"serp_item_types": ["organic"], "se_results_count": 42}
            }]
        }]));

        let out = shape_keyword_ideas(&ideas_args(true), &raw).unwrap();
        let item = &out["items"][0];
        assert_eq!(out["total_count"], 900);
        assert_eq!(item["monthly_searches"].as_array().unwrap().len(), 6);
        assert_eq!(item["serp_item_types"], json!(["organic"]));
        assert_eq!(item["se_results_count"], 42);

        let out = shape_keyword_ideas(&ideas_args(false), &raw).unwrap();
        assert!(out["items"][0].get("serp_item_types").is_none());
    }

    #[test]
    fn keyword_ideas_empty_result() {
        let out = shape_keyword_ideas(&ideas_args(true), &ok_response(json!([]))).unwrap();
        assert_eq!(out, json!({"total_count": 0, "items_count": 0, "items": [], "seed_keywords": ["crm"]}));
    }

    #[test]
    fn keyword_ideas_task_error() {
        let raw = json!({"tasks": [{"status_code": 40200, "status_message": "Payment Required."}]});
        let err = shape_keyword_ideas(&ideas_args(true), &raw).unwrap_err();
        assert_eq!(err.to_string(), "DataForSEO API error: 40200 - Payment Required.");
    }

    fn planner_args() -> KeywordPlannerArgs {
        serde_json::from_value(json!({"keywords": ["seo", "sem"]})).unwrap()
    }

    #[test]
    fn ad_traffic_items_use_fallbacks() {
        let raw = ok_response(json!([{
            "match": "broad",
            "items": [{
                "keyword": "seo",
                "keyword_info": {"cpc": 3.1},
                "ad_traffic": {
                    "cpc_min": 1.0,
                    "ad_position": 2.4,
                    "daily_impressions_average": 300,
                    "daily_clicks_average": 12,
                    "daily_cost_average": 2_500_000
                }
            }]
        }]));
        let out = shape_ad_traffic(&planner_args(), &raw).unwrap();
        let item = &out["items"][0];
        assert_eq!(out["items_count"], 1);
        assert_eq!(item["cpc_min"], 1.0);
        assert_eq!(item["ad_position"], 2.4);
        assert_eq!(item["impressions"], 300);
        assert_eq!(item["clicks"], 12);
        assert_eq!(item["cost_micros"], 2_500_000);
        assert_eq!(item["cost_usd"], 2.5);
        assert_eq!(out["match"], "broad");
    }

    #[test]
    fn ad_traffic_aggregate_repeats_per_keyword() {
        let raw = ok_response(json!([{
            "average_cpc": 2.0,
            "impressions": 1000,
            "clicks": 50,
            "ctr": 0.05,
            "cost": 1.5
        }]));
        let out = shape_ad_traffic(&planner_args(), &raw).unwrap();
        let items = out["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["keyword"], "sem");
        assert_eq!(items[0]["cpc"], 2.0);
        assert_eq!(items[0]["cost_usd"], 1.5);
        assert_eq!(items[0]["cost_micros"], 1_500_000);
        assert!(items[0]["search_volume"].is_null());
    }

    #[test]
    fn ad_traffic_zero_cost_is_null() {
        let raw = ok_response(json!([{"items": [{"keyword": "seo", "ad_traffic": {"cost_micros": 0}}]}]));
        let out = shape_ad_traffic(&planner_args(), &raw).unwrap();
        assert!(out["items"][0]["cost_micros"].is_null());
        assert!(out["items"][0]["cost_usd"].is_null());
    }

    #[test]
    fn keywords_data_rows() {
        let raw = ok_response(json!([
            {"keyword": "plumber", "search_volume": 10, "cpc": 4.2, "competition": "HIGH"},
            {"keyword": null}
        ]));
        let rows = parse_keywords_data(&raw).unwrap();
        assert_eq!(rows[0]["competition"], "HIGH");
        assert_eq!(rows[1]["keyword"], "");
        assert!(rows[1]["cpc"].is_null());
    }

    #[test]
    fn keywords_data_requires_ok_task() {
        assert!(parse_keywords_data(&json!({"tasks": []})).is_err());
        let raw = json!({"tasks": [{"status_code": 40000, "status_message": "bad"}]});
        assert!(parse_keywords_data(&raw).is_err());
    }

    #[test]
    fn slice_keeps_at_least_one() {
        let rows = vec![json!(1), json!(2), json!(3)];
        assert_eq!(slice_to_limit(rows.clone(), 0).len(), 1);
        assert_eq!(slice_to_limit(rows.clone(), 2).len(), 2);
        assert_eq!(slice_to_limit(rows, 50).len(), 3);
    }
}
