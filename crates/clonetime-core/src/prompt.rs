//! Prompt construction and response parsing for the estimate model.
//!
//! The model is asked for a single JSON object matching [`AnalysisResult`].
//! [`parse_response`] is strict about the fields the pipeline cannot invent
//! (`total_hours`, `missions`, `product_map`) and lenient about the rest.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::hints::Hints;
use crate::models::{
    AnalysisResult, CrawlResult, Evidence, Mission, MissionCategory, ProductMap, Tier,
};

/// Default character budget for crawled text embedded in the prompt.
pub const DEFAULT_PROMPT_CHAR_BUDGET: usize = 12_000;

const SYSTEM_PROMPT: &str = "You are an expert developer who can accurately estimate build times \
for web applications. Respond only with valid JSON.";

/// A system + user message pair ready to send to a chat model.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Render crawled pages as `URL/Title/Content` blocks, truncated to
/// `budget` characters. Failed pages are skipped.
pub fn render_pages(pages: &[CrawlResult], budget: usize) -> String {
    let joined = pages
        .iter()
        .filter(|p| p.is_ok())
        .map(|p| format!("URL: {}\nTitle: {}\nContent: {}", p.url, p.title, p.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    joined.chars().take(budget).collect()
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Build the estimate prompt for `tier`.
pub fn build_prompt(pages: &[CrawlResult], tier: Tier, hints: &Hints, budget: usize) -> Prompt {
    let content = render_pages(pages, budget);
    let categories = MissionCategory::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let user = format!(
        r#"You are analyzing a website to estimate how long it would take to rebuild as a {description}.

Website content:
{content}

Signals detected in the crawled text (heuristic, may be wrong):
- Authentication / user accounts: {auth}
- Admin or back-office features: {admin}
- Public API or developer platform: {api}
- Looks like a portfolio or agency site: {portfolio}

Only include Accounts, Admin, or API missions when the matching signal is "yes" or the content clearly shows that feature.

Please analyze this website and provide a JSON response with the following structure:
{{
  "total_hours": <number>,
  "confidence": <0-1>,
  "missions": [
    {{
      "category": "<category>",
      "title": "{marker} <mission title>",
      "hours": <number>,
      "confidence": <0-1>
    }}
  ],
  "product_map": {{
    "roles": ["<user role>"],
    "objects": ["<main data objects>"],
    "stories": [{{"role": "<role>", "i_can": "<action>"}}]
  }},
  "evidence": [
    {{
      "url": "<page url>",
      "snippet": "<relevant text from page>"
    }}
  ],
  "scope": "<assumptions and limitations>",
  "summary": "<one sentence summary of the product>"
}}

Mission categories should be one of: {categories}
Every mission title must start with "{marker}".

Base time estimates on these factors:
- UI complexity (simple forms vs rich interactions)
- Data modeling needs (users, content, relationships)
- Core features (auth, CRUD, search, payments, etc.)
- Integration complexity

For {tier} tier, multiply base estimates by {multiplier}x. The total must not exceed {max} hours and must equal the sum of mission hours.

Be realistic but not overly pessimistic. Focus on core functionality needed to recreate the main value proposition."#,
        description = tier.description(),
        content = content,
        auth = yes_no(hints.has_auth),
        admin = yes_no(hints.has_admin),
        api = yes_no(hints.mentions_api),
        portfolio = yes_no(hints.is_portfolio_like),
        marker = tier.marker(),
        categories = categories,
        tier = tier.as_str(),
        multiplier = tier.multiplier(),
        max = crate::models::MAX_TOTAL_HOURS,
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[derive(Deserialize)]
struct RawAnalysis {
    total_hours: Option<f64>,
    confidence: Option<f64>,
    missions: Option<Vec<RawMission>>,
    product_map: Option<ProductMap>,
    #[serde(default)]
    evidence: Vec<Evidence>,
    #[serde(default)]
    scope: String,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct RawMission {
    category: String,
    title: String,
    hours: f64,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Cut the JSON object out of a reply that may be wrapped in a code fence
/// or surrounded by prose.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

/// Parse a model reply into an [`AnalysisResult`].
///
/// Fails if the reply is not JSON or lacks a positive `total_hours`,
/// `missions`, or `product_map`. Missions with an unknown category or
/// non-positive hours are dropped.
pub fn parse_response(content: &str) -> Result<AnalysisResult> {
    let json = extract_json_object(content).ok_or_else(|| anyhow!("no JSON object in response"))?;
    let raw: RawAnalysis = serde_json::from_str(json).context("response is not valid analysis JSON")?;

    let total_hours = match raw.total_hours {
        Some(h) if h.is_finite() && h > 0.0 => h,
        _ => bail!("Invalid analysis format: missing total_hours"),
    };
    let raw_missions = raw
        .missions
        .ok_or_else(|| anyhow!("Invalid analysis format: missing missions"))?;
    let product_map = raw
        .product_map
        .ok_or_else(|| anyhow!("Invalid analysis format: missing product_map"))?;

    let missions = raw_missions
        .into_iter()
        .filter_map(|m| {
            let category = m.category.parse::<MissionCategory>().ok()?;
            if !m.hours.is_finite() || m.hours <= 0.0 {
                return None;
            }
            Some(Mission {
                category,
                title: m.title.trim().to_string(),
                hours: m.hours,
                confidence: clamp_unit(m.confidence.unwrap_or(0.5)),
            })
        })
        .collect();

    Ok(AnalysisResult {
        total_hours,
        confidence: clamp_unit(raw.confidence.unwrap_or(0.5)),
        missions,
        product_map,
        evidence: raw.evidence,
        scope: raw.scope,
        summary: raw.summary.filter(|s| !s.trim().is_empty()),
    })
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, content: &str) -> CrawlResult {
        CrawlResult {
            url: url.into(),
            title: "Acme".into(),
            content: content.into(),
            error: None,
        }
    }

    const GOOD: &str = r#"{
        "total_hours": 12,
        "confidence": 0.8,
        "missions": [
            {"category": "Content", "title": "[M] Landing page", "hours": 4, "confidence": 0.9},
            {"category": "data", "title": "[M] Projects", "hours": 8}
        ],
        "product_map": {"roles": ["User"], "objects": ["Project"], "stories": [{"role": "User", "i_can": "create a project"}]},
        "evidence": [{"url": "https://acme.io", "snippet": "Build projects"}],
        "scope": "core flows only"
    }"#;

    #[test]
    fn test_prompt_embeds_tier_hints_and_content() {
        let hints = Hints {
            has_auth: true,
            ..Hints::default()
        };
        let p = build_prompt(&[page("https://acme.io", "Ship faster")], Tier::ProdLite, &hints, 1000);
        assert!(p.system.contains("valid JSON"));
        assert!(p.user.contains(Tier::ProdLite.description()));
        assert!(p.user.contains("multiply base estimates by 5x"));
        assert!(p.user.contains("Authentication / user accounts: yes"));
        assert!(p.user.contains("Admin or back-office features: no"));
        assert!(p.user.contains("Ship faster"));
        assert!(p.user.contains("\"[P] <mission title>\""));
        assert!(p.user.contains("Notifications"));
    }

    #[test]
    fn test_render_pages_respects_budget_and_skips_failures() {
        let pages = vec![
            page("https://acme.io", &"a".repeat(500)),
            CrawlResult::failed("https://acme.io/docs", "404"),
            page("https://acme.io/pricing", &"b".repeat(500)),
        ];
        let rendered = render_pages(&pages, 300);
        assert_eq!(rendered.chars().count(), 300);
        assert!(!rendered.contains("/docs"));

        let full = render_pages(&pages, usize::MAX);
        assert!(full.contains("\n\n---\n\n"));
        assert!(full.contains("URL: https://acme.io/pricing"));
    }

    #[test]
    fn test_parse_valid_response() {
        let r = parse_response(GOOD).unwrap();
        assert_eq!(r.total_hours, 12.0);
        assert_eq!(r.missions.len(), 2);
        assert_eq!(r.missions[1].category, MissionCategory::Data);
        assert_eq!(r.missions[1].confidence, 0.5);
        assert_eq!(r.product_map.objects, vec!["Project".to_string()]);
        assert_eq!(r.summary, None);
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let fenced = format!("```json\n{}\n```", GOOD);
        assert!(parse_response(&fenced).is_ok());
    }

    #[test]
    fn test_parse_rejects_missing_required_fields() {
        assert!(parse_response(r#"{"missions": [], "product_map": {}}"#).is_err());
        assert!(parse_response(r#"{"total_hours": 0, "missions": [], "product_map": {}}"#).is_err());
        assert!(parse_response(r#"{"total_hours": 5, "product_map": {}}"#).is_err());
        assert!(parse_response(r#"{"total_hours": 5, "missions": []}"#).is_err());
        assert!(parse_response("I cannot help with that").is_err());
        assert!(parse_response("{ not json }").is_err());
    }

    #[test]
    fn test_parse_drops_unknown_categories_and_bad_hours() {
        let body = r#"{
            "total_hours": 9,
            "missions": [
                {"category": "Billing", "title": "x", "hours": 3},
                {"category": "Search", "title": "y", "hours": -1},
                {"category": "Search", "title": "z", "hours": 2}
            ],
            "product_map": {"roles": [], "objects": [], "stories": []}
        }"#;
        let r = parse_response(body).unwrap();
        assert_eq!(r.missions.len(), 1);
        assert_eq!(r.missions[0].title, "z");
        assert_eq!(r.confidence, 0.5);
    }
}
