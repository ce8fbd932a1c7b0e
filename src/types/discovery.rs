use serde_json::{Map, Value};

use crate::error::KeywordError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Boolean,
    /// Accepted as JSON text, stored as `jsonb`.
    Json,
}

/// One column of `discovery_documents` that callers may fill in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub description: &'static str,
}

const fn field(name: &'static str, kind: FieldKind, description: &'static str) -> DiscoveryField {
    DiscoveryField {
        name,
        kind,
        description,
    }
}

pub const DISCOVERY_FIELDS: &[DiscoveryField] = &[
    // Domain
    field("domain", FieldKind::Text, "The client's domain name (e.g., \"acme.com\")."),
    // Section 0: Meta/Header
    field("client_name", FieldKind::Text, "Company/client name."),
    field("discovery_date", FieldKind::Text, "Date of discovery in YYYY-MM-DD format."),
    field("contact_name", FieldKind::Text, "Primary contact person's name."),
    field("contact_title", FieldKind::Text, "Primary contact's job title."),
    field("contact_email", FieldKind::Text, "Primary contact's email."),
    field("contact_phone", FieldKind::Text, "Primary contact's phone number."),
    field("industry", FieldKind::Text, "The industry the company operates in."),
    // Section 1: Company Overview & Business Objectives
    field(
        "primary_business",
        FieldKind::Text,
        "Company's primary business/service offering description.",
    ),
    field("years_in_business", FieldKind::Text, "How long the company has been in business."),
    field(
        "annual_revenue",
        FieldKind::Text,
        "Current annual revenue or revenue range (e.g., \"$1-3M\").",
    ),
    field("num_employees", FieldKind::Integer, "Number of employees."),
    field("geographic_market", FieldKind::Text, "Geographic service area/market."),
    field(
        "primary_goal_12_months",
        FieldKind::Text,
        "Primary business goal for the next 12 months.",
    ),
    field("target_leads_per_month", FieldKind::Integer, "Target number of leads per month."),
    field("target_leads_timeframe", FieldKind::Text, "Timeframe for achieving target leads."),
    field("target_cpl_amount", FieldKind::Text, "Target cost per lead amount."),
    field("target_cpl_reasoning", FieldKind::Text, "How the target CPL was determined."),
    field(
        "qualified_lead_definition",
        FieldKind::Text,
        "What defines a \"qualified lead\" for this business.",
    ),
    field("customer_ltv", FieldKind::Text, "Estimated customer lifetime value."),
    field("customer_ltv_calculation", FieldKind::Text, "How LTV is calculated."),
    field(
        "sales_cycle_length",
        FieldKind::Text,
        "Typical sales cycle length (e.g., \"6-8 weeks\").",
    ),
    field("close_rate_percent", FieldKind::Text, "Percentage of leads that close."),
    field("close_rate_not_tracked", FieldKind::Boolean, "Whether close rate is currently tracked."),
    field("current_monthly_leads", FieldKind::Integer, "Current number of monthly leads."),
    field("current_lead_generation_method", FieldKind::Text, "How leads are currently generated."),
    field("current_sql_percent", FieldKind::Text, "Percentage of leads that are sales-qualified."),
    field(
        "previous_marketing_efforts",
        FieldKind::Json,
        "JSON array of previous marketing efforts with fields: channel_name, timeframe, result, why_worked.",
    ),
    field("what_is_working", FieldKind::Text, "What is currently working in their marketing."),
    field("budget_monthly", FieldKind::Text, "Total monthly marketing budget."),
    field("budget_quarterly", FieldKind::Text, "Total quarterly marketing budget."),
    field("budget_annual", FieldKind::Text, "Total annual marketing budget."),
    field(
        "leadgen_budget_monthly",
        FieldKind::Text,
        "Monthly budget allocated to lead generation.",
    ),
    field("leadgen_budget_quarterly", FieldKind::Text, "Quarterly budget for lead generation."),
    field("leadgen_budget_annual", FieldKind::Text, "Annual budget for lead generation."),
    field("seasonal_peak_months", FieldKind::Text, "Peak business months."),
    field("seasonal_slow_months", FieldKind::Text, "Slow business months."),
    field("seasonal_details", FieldKind::Text, "Details about seasonality."),
    // Section 2: Target Audience
    field("ideal_customer_description", FieldKind::Text, "Description of the ideal customer."),
    field("decision_maker_titles", FieldKind::Text, "Job titles of decision makers."),
    field(
        "decision_authority_level",
        FieldKind::Text,
        "Decision authority level (C-Suite, Director, Manager, Other).",
    ),
    field(
        "target_company_size",
        FieldKind::Text,
        "Target company size (employees or revenue range).",
    ),
    field("target_industries", FieldKind::Text, "List of target industries."),
    field("geographic_focus", FieldKind::Text, "Geographic focus for customers."),
    field("customer_age_range", FieldKind::Text, "Target customer age range."),
    field("customer_gender", FieldKind::Text, "Target gender (All, Specific)."),
    field(
        "customer_education",
        FieldKind::Text,
        "Education level (High school, Bachelor's, Advanced, Any).",
    ),
    field("customer_income_range", FieldKind::Text, "Income/budget authority range."),
    field("pain_point_1", FieldKind::Text, "Main customer pain point #1."),
    field("pain_point_2", FieldKind::Text, "Main customer pain point #2."),
    field("pain_point_3", FieldKind::Text, "Main customer pain point #3."),
    field("goal_motivation_1", FieldKind::Text, "Customer goal/motivation #1."),
    field("goal_motivation_2", FieldKind::Text, "Customer goal/motivation #2."),
    field("goal_motivation_3", FieldKind::Text, "Customer goal/motivation #3."),
    field("buying_process", FieldKind::Text, "Typical buying process description."),
    field(
        "secondary_audiences",
        FieldKind::Json,
        "JSON array of secondary audiences with fields: description, job_titles, why_target.",
    ),
    // Section 3: Value Proposition & Messaging
    field(
        "differentiation",
        FieldKind::Text,
        "What makes the business different from competitors.",
    ),
    field("value_prop_1", FieldKind::Text, "Top value proposition #1."),
    field("value_prop_2", FieldKind::Text, "Top value proposition #2."),
    field("value_prop_3", FieldKind::Text, "Top value proposition #3."),
    field("why_choose_us", FieldKind::Text, "Why prospects should choose them over competitors."),
    field("market_perception", FieldKind::Text, "How they want to be perceived in the market."),
    field(
        "brand_voice_tones",
        FieldKind::Json,
        "JSON array of brand voice/tone selections from: \"Professional / Corporate\", \"Casual / Conversational\", \"Educational / Thought Leadership\", \"Results-Driven / ROI-Focused\", \"Innovative / Forward-Thinking\", \"Supportive / Customer-Centric\".",
    ),
    field("brand_voice_other", FieldKind::Text, "Other brand voice description if applicable."),
    field("messaging_theme_1", FieldKind::Text, "Key messaging theme #1."),
    field("messaging_theme_2", FieldKind::Text, "Key messaging theme #2."),
    field("messaging_theme_3", FieldKind::Text, "Key messaging theme #3."),
    field(
        "testimonials_available",
        FieldKind::Text,
        "Whether testimonials are available (Yes, Some, No).",
    ),
    field(
        "testimonials_count",
        FieldKind::Integer,
        "Number of testimonials/case studies available.",
    ),
    field("testimonials_examples", FieldKind::Text, "Examples or descriptions of testimonials."),
    field("proof_customer_stories", FieldKind::Text, "Customer success stories."),
    field("proof_statistics", FieldKind::Text, "Relevant statistics/metrics."),
    field("proof_awards", FieldKind::Text, "Awards/certifications."),
    field("proof_notable_customers", FieldKind::Text, "Notable customers."),
    // Section 4: Competitive Landscape
    field("competitor_1", FieldKind::Text, "Main competitor #1 name."),
    field("competitor_2", FieldKind::Text, "Main competitor #2 name."),
    field("competitor_3", FieldKind::Text, "Main competitor #3 name."),
    field(
        "competitor_channels",
        FieldKind::Json,
        "JSON array of competitor channel info with fields: name, google_ads, meta_ads, social_media, seo_content, website_quality, other_channels.",
    ),
    field("competitor_strengths", FieldKind::Text, "What competitors are doing well."),
    field("competitive_advantages", FieldKind::Text, "Where they have competitive advantages."),
    // Section 5: SetSail Services Assessment
    field(
        "services_interested",
        FieldKind::Json,
        "JSON array of services interested in: \"google_ads\", \"meta_ads\", \"social_media\", \"seo\", \"website_dev\".",
    ),
    field(
        "services_interest_reasons",
        FieldKind::Json,
        "JSON object mapping service to reason for interest.",
    ),
    field("google_ads_used", FieldKind::Boolean, "Whether Google Ads has been used before."),
    field(
        "google_ads_experience",
        FieldKind::Text,
        "Google Ads experience level (Beginner, Intermediate, Advanced, N/A).",
    ),
    field("meta_ads_used", FieldKind::Boolean, "Whether Meta Ads has been used before."),
    field("meta_ads_experience", FieldKind::Text, "Meta Ads experience level."),
    field("social_media_used", FieldKind::Boolean, "Whether social media marketing has been used."),
    field("social_media_experience", FieldKind::Text, "Social media experience level."),
    field("seo_used", FieldKind::Boolean, "Whether SEO has been used before."),
    field("seo_experience", FieldKind::Text, "SEO experience level."),
    field(
        "website_dev_used",
        FieldKind::Boolean,
        "Whether website development services were used.",
    ),
    field("website_dev_experience", FieldKind::Text, "Website development experience level."),
    field(
        "services_not_wanted",
        FieldKind::Boolean,
        "Whether there are services they specifically don't want.",
    ),
    field(
        "services_not_wanted_details",
        FieldKind::Text,
        "Details on services not wanted and why.",
    ),
    // Section 6: Current Digital Presence
    field("has_website", FieldKind::Boolean, "Whether they currently have a website."),
    field("website_url", FieldKind::Text, "Website URL."),
    field(
        "website_status",
        FieldKind::Json,
        "JSON array of website status selections: \"Recently built\", \"Needs updating / redesign\", \"Being built\".",
    ),
    field("website_status_other", FieldKind::Text, "Other website status description."),
    field("website_monthly_visitors", FieldKind::Integer, "Monthly website visitors."),
    field("website_conversion_rate", FieldKind::Text, "Website conversion rate."),
    field("website_main_issues", FieldKind::Text, "Main website issues."),
    field(
        "social_platforms",
        FieldKind::Json,
        "JSON array of social platforms with fields: platform, followers, activity_level, primary_goal.",
    ),
    field("social_strategy", FieldKind::Text, "Current social media strategy description."),
    // Section 7: Analytics & Tracking
    field(
        "analytics_tools",
        FieldKind::Json,
        "JSON array of analytics tools used: \"Google Analytics 4\", \"Google Analytics (Universal Analytics)\", \"None currently\".",
    ),
    field("analytics_other", FieldKind::Text, "Other analytics tools."),
    field("crm_name", FieldKind::Text, "CRM/lead management system name."),
    field("crm_features_used", FieldKind::Text, "CRM features being used."),
    field("lead_data_tracked", FieldKind::Text, "What lead data is tracked."),
    field(
        "conversion_tracking_status",
        FieldKind::Text,
        "Conversion tracking status (Yes - Fully set up, Partially set up, No - Needs to be set up).",
    ),
    field("conversion_tracking_details", FieldKind::Text, "Details on conversion tracking setup."),
    field(
        "crm_integration_possible",
        FieldKind::Text,
        "Whether CRM integration is possible (Yes - CRM supports integrations, Unsure, No - Manual lead entry only).",
    ),
    field("crm_integration_details", FieldKind::Text, "Details on CRM integration possibilities."),
    // Section 8: Current Tech Stack
    field(
        "tools_used",
        FieldKind::Json,
        "JSON array of tools used: \"Google Workspace (Gmail, Docs, Sheets)\", \"Microsoft 365\", \"Slack\", \"Monday.com\", \"Asana\", \"Salesforce\", \"HubSpot\", \"Zapier\".",
    ),
    field("tools_other", FieldKind::Text, "Other tools used."),
    // Section 9: Team & Support
    field("poc_name", FieldKind::Text, "Primary point of contact name."),
    field("poc_title", FieldKind::Text, "Primary point of contact title."),
    field("poc_email", FieldKind::Text, "Primary point of contact email."),
    field("poc_phone", FieldKind::Text, "Primary point of contact phone."),
    field("poc_availability", FieldKind::Text, "POC availability (days/hours)."),
    field(
        "other_stakeholders",
        FieldKind::Json,
        "JSON array of other stakeholders with fields: name, title, role, email.",
    ),
    field("final_decision_name", FieldKind::Text, "Name of final decision authority."),
    field("final_decision_title", FieldKind::Text, "Title of final decision authority."),
    field("decision_timeline", FieldKind::Text, "Typical decision timeline."),
    field(
        "resources_available",
        FieldKind::Json,
        "JSON array of available resources: \"Brand guidelines / style guide\", \"Product / service information documents\", etc.",
    ),
    field("resources_other", FieldKind::Text, "Other resources available."),
    field("has_dev_support", FieldKind::Boolean, "Whether developer/IT support is available."),
    field("has_marketing_support", FieldKind::Boolean, "Whether marketing support is available."),
    field("has_sales_support", FieldKind::Boolean, "Whether sales support is available."),
    field("internal_resources_other", FieldKind::Text, "Other internal resources."),
    // Section 10: Timeline & Expectations
    field("target_launch_date", FieldKind::Text, "Target strategy launch date (YYYY-MM-DD)."),
    field("urgency_level", FieldKind::Text, "How urgent (Very flexible, Moderate, Fast, Urgent)."),
    field("first_leads_timeframe", FieldKind::Text, "Timeframe for first leads."),
    field("ramp_up_timeframe", FieldKind::Text, "Timeframe for performance ramp-up."),
    field("full_results_timeframe", FieldKind::Text, "Timeframe for full results."),
    field("success_indicator_1", FieldKind::Text, "Success indicator #1 for first 90 days."),
    field("success_indicator_2", FieldKind::Text, "Success indicator #2."),
    field("success_indicator_3", FieldKind::Text, "Success indicator #3."),
    field("exceed_expectations", FieldKind::Text, "What would exceed expectations."),
    field("concern_1", FieldKind::Text, "Biggest concern #1."),
    field("concern_2", FieldKind::Text, "Biggest concern #2."),
    field("concern_3", FieldKind::Text, "Biggest concern #3."),
    // Section 11: Additional Information
    field(
        "regulatory_considerations",
        FieldKind::Json,
        "JSON array of regulatory considerations: \"HIPAA (Healthcare)\", \"GDPR / Privacy regulations\", \"Financial services regulations\", \"Advertising restrictions\", \"None\".",
    ),
    field("regulatory_other", FieldKind::Text, "Other regulatory considerations."),
    field("industry_keywords", FieldKind::Text, "Industry-specific keywords/terminology."),
    field("is_seasonal", FieldKind::Boolean, "Whether the business is seasonal."),
    field("seasonality_peak", FieldKind::Text, "Peak season months if seasonal."),
    field("seasonality_slow", FieldKind::Text, "Slow season months if seasonal."),
    field("seasonality_strategy", FieldKind::Text, "How seasonality should affect strategy."),
    field("anything_else", FieldKind::Text, "Anything else to know about the business/goals."),
    field("success_definition", FieldKind::Text, "What would make the engagement successful."),
    field(
        "case_study_consent",
        FieldKind::Text,
        "Consent to use results as case study (Yes, Maybe - ask later, No).",
    ),
];

pub fn find_field(name: &str) -> Option<&'static DiscoveryField> {
    DISCOVERY_FIELDS.iter().find(|f| f.name == name)
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Json(Value),
}

impl DiscoveryField {
    /// Type-check one argument. `Ok(None)` means "leave the column alone".
    pub fn coerce(&self, value: &Value) -> Result<Option<FieldValue>, KeywordError> {
        if value.is_null() {
            return Ok(None);
        }
        let mismatch = |expected: &str| {
            KeywordError::InvalidArguments(format!(
                "field '{}' expects {expected}, got {value}",
                self.name
            ))
        };
        let coerced = match self.kind {
            FieldKind::Text => FieldValue::Text(
                value
                    .as_str()
                    .ok_or_else(|| mismatch("a string"))?
                    .to_string(),
            ),
            FieldKind::Integer => {
                FieldValue::Integer(value.as_i64().ok_or_else(|| mismatch("an integer"))?)
            }
            FieldKind::Boolean => {
                FieldValue::Boolean(value.as_bool().ok_or_else(|| mismatch("a boolean"))?)
            }
            FieldKind::Json => match value {
                Value::String(raw) => match parse_json_text(raw) {
                    Some(parsed) => FieldValue::Json(parsed),
                    None => return Ok(None),
                },
                other => FieldValue::Json(other.clone()),
            },
        };
        Ok(Some(coerced))
    }
}

/// JSON text as sent by agents. Text that is not valid JSON, or that decodes
/// to a bare string, is kept as a one-element array.
fn parse_json_text(raw: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Null) => None,
        Ok(Value::String(s)) => Some(Value::Array(vec![Value::String(s)])),
        Ok(parsed) => Some(parsed),
        Err(_) => Some(Value::Array(vec![Value::String(raw.to_string())])),
    }
}

/// Validated set of columns to write, in declaration order.
pub fn collect_updates(
    args: &Map<String, Value>,
) -> Result<Vec<(&'static DiscoveryField, FieldValue)>, KeywordError> {
    if let Some(unknown) = args
        .keys()
        .find(|k| k.as_str() != "client_id" && find_field(k).is_none())
    {
        return Err(KeywordError::InvalidArguments(format!(
            "unknown discovery document field '{unknown}'"
        )));
    }

    let mut updates = Vec::new();
    for field in DISCOVERY_FIELDS {
        if let Some(value) = args.get(field.name)
            && let Some(v) = field.coerce(value)?
        {
            updates.push((field, v));
        }
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_covers_every_section() {
        assert_eq!(DISCOVERY_FIELDS.len(), 151);
        let json_fields = DISCOVERY_FIELDS
            .iter()
            .filter(|f| f.kind == FieldKind::Json)
            .count();
        assert_eq!(json_fields, 13);
        assert_eq!(find_field("num_employees").map(|f| f.kind), Some(FieldKind::Integer));
        assert_eq!(find_field("has_website").map(|f| f.kind), Some(FieldKind::Boolean));
    }

    #[test]
    fn json_text_is_parsed_or_wrapped() {
        let f = find_field("brand_voice_tones").unwrap();
        assert_eq!(
            f.coerce(&json!(r#"["Professional / Corporate"]"#)).unwrap(),
            Some(FieldValue::Json(json!(["Professional / Corporate"])))
        );
        assert_eq!(
            f.coerce(&json!("Casual, friendly")).unwrap(),
            Some(FieldValue::Json(json!(["Casual, friendly"])))
        );
        assert_eq!(
            f.coerce(&json!(r#""quoted""#)).unwrap(),
            Some(FieldValue::Json(json!(["quoted"])))
        );
        assert_eq!(f.coerce(&json!("null")).unwrap(), None);
    }

    #[test]
    fn wrong_scalar_type_is_rejected() {
        let f = find_field("num_employees").unwrap();
        assert!(f.coerce(&json!("twelve")).is_err());
        assert_eq!(f.coerce(&json!(12)).unwrap(), Some(FieldValue::Integer(12)));
    }

    #[test]
    fn collect_skips_nulls_and_rejects_unknown_names() {
        let args = json!({
            "client_id": 7,
            "industry": "Marine",
            "domain": null,
            "seo_used": true
        });
        let updates = collect_updates(args.as_object().unwrap()).unwrap();
        let names: Vec<_> = updates.iter().map(|(f, _)| f.name).collect();
        assert_eq!(names, vec!["industry", "seo_used"]);

        let bad = json!({"client_id": 7, "favourite_colour": "teal"});
        assert!(collect_updates(bad.as_object().unwrap()).is_err());
    }
}
