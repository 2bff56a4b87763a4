//! Static per-tier estimate used whenever the model cannot produce one.
//!
//! The baseline total depends only on the tier (4, 8, or 16 hours). Hints
//! decide which templated missions share it: account, admin, and API
//! missions only appear when the crawl mentioned them, and the remaining
//! missions absorb their share so the hours always add up to the baseline.

use crate::hints::Hints;
use crate::models::{
    AnalysisResult, CrawlResult, Evidence, Mission, MissionCategory, ProductMap, Tier, UserStory,
};

const FALLBACK_CONFIDENCE: f64 = 0.5;
const SNIPPET_CHARS: usize = 100;

#[derive(Clone, Copy)]
enum Gate {
    Always,
    Auth,
    Admin,
    Api,
}

struct Template {
    category: MissionCategory,
    title: &'static str,
    weight: f64,
    gate: Gate,
}

const PRODUCT_TEMPLATES: &[Template] = &[
    Template {
        category: MissionCategory::Content,
        title: "Landing and marketing pages",
        weight: 3.0,
        gate: Gate::Always,
    },
    Template {
        category: MissionCategory::Data,
        title: "Core data model and CRUD screens",
        weight: 3.0,
        gate: Gate::Always,
    },
    Template {
        category: MissionCategory::Accounts,
        title: "Sign-up, login and sessions",
        weight: 2.0,
        gate: Gate::Auth,
    },
    Template {
        category: MissionCategory::Admin,
        title: "Admin dashboard",
        weight: 2.0,
        gate: Gate::Admin,
    },
    Template {
        category: MissionCategory::Api,
        title: "Public API endpoints",
        weight: 2.0,
        gate: Gate::Api,
    },
];

const PORTFOLIO_TEMPLATES: &[Template] = &[
    Template {
        category: MissionCategory::Content,
        title: "Portfolio and project pages",
        weight: 4.0,
        gate: Gate::Always,
    },
    Template {
        category: MissionCategory::Media,
        title: "Image galleries and media",
        weight: 2.0,
        gate: Gate::Always,
    },
    Template {
        category: MissionCategory::Api,
        title: "Public API endpoints",
        weight: 1.0,
        gate: Gate::Api,
    },
];

impl Gate {
    fn open(self, hints: &Hints) -> bool {
        match self {
            Gate::Always => true,
            Gate::Auth => hints.has_auth,
            Gate::Admin => hints.has_admin,
            Gate::Api => hints.mentions_api,
        }
    }
}

/// Build the static estimate for `tier`. Mission hours sum to
/// [`Tier::fallback_hours`] exactly.
pub fn fallback_analysis(tier: Tier, hints: &Hints, pages: &[CrawlResult]) -> AnalysisResult {
    let templates = if hints.is_portfolio_like {
        PORTFOLIO_TEMPLATES
    } else {
        PRODUCT_TEMPLATES
    };
    let active: Vec<&Template> = templates.iter().filter(|t| t.gate.open(hints)).collect();

    let total = tier.fallback_hours();
    let hours = distribute(total, &active.iter().map(|t| t.weight).collect::<Vec<_>>());

    let missions = active
        .iter()
        .zip(hours)
        .map(|(t, h)| Mission {
            category: t.category,
            title: format!("{} {}", tier.marker(), t.title),
            hours: h,
            confidence: FALLBACK_CONFIDENCE,
        })
        .collect();

    AnalysisResult {
        total_hours: total,
        confidence: FALLBACK_CONFIDENCE,
        missions,
        product_map: fallback_product_map(hints),
        evidence: pages
            .iter()
            .filter(|p| !p.content.is_empty())
            .map(|p| Evidence {
                url: p.url.clone(),
                snippet: p.content.chars().take(SNIPPET_CHARS).collect(),
            })
            .collect(),
        scope: format!(
            "{} - Analysis failed, showing fallback estimate",
            tier.description()
        ),
        summary: None,
    }
}

fn fallback_product_map(hints: &Hints) -> ProductMap {
    let mut roles = vec!["User".to_string()];
    let mut stories = vec![UserStory {
        role: "User".to_string(),
        i_can: "view content".to_string(),
    }];
    if hints.has_auth {
        stories.push(UserStory {
            role: "User".to_string(),
            i_can: "sign in to my account".to_string(),
        });
    }
    if hints.has_admin {
        roles.push("Admin".to_string());
        stories.push(UserStory {
            role: "Admin".to_string(),
            i_can: "manage users and content".to_string(),
        });
    }

    ProductMap {
        roles,
        objects: vec!["Content".to_string()],
        stories,
    }
}

/// Split `total` across `weights` in half-hour steps; the last share takes
/// the remainder so the parts always sum to `total`.
fn distribute(total: f64, weights: &[f64]) -> Vec<f64> {
    let weight_sum: f64 = weights.iter().sum();
    if weights.is_empty() || weight_sum <= 0.0 {
        return Vec::new();
    }

    let mut parts = Vec::with_capacity(weights.len());
    let mut assigned = 0.0;
    for (i, w) in weights.iter().enumerate() {
        if i + 1 == weights.len() {
            parts.push(total - assigned);
        } else {
            let share = (total * w / weight_sum * 2.0).round() / 2.0;
            let share = share.max(0.5);
            assigned += share;
            parts.push(share);
        }
    }
    parts
}
