//! Core data models used throughout Clonetime.
//!
//! These types represent the requests, crawled pages, estimates, and stored
//! records that flow through the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::normalize::validate_url;

/// Ceiling applied to every returned `total_hours`.
pub const MAX_TOTAL_HOURS: f64 = 48.0;

/// Floor applied by the hint filter to every returned `total_hours`.
pub const MIN_TOTAL_HOURS: f64 = 1.0;

/// Fidelity level of a rebuild estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "speedrun")]
    Speedrun,
    #[serde(rename = "mvp")]
    Mvp,
    #[serde(rename = "prod-lite")]
    ProdLite,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Speedrun, Tier::Mvp, Tier::ProdLite];

    /// Wire name (`speedrun`, `mvp`, `prod-lite`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Speedrun => "speedrun",
            Tier::Mvp => "mvp",
            Tier::ProdLite => "prod-lite",
        }
    }

    /// What a rebuild at this tier means, used in prompts and fallback scopes.
    pub fn description(&self) -> &'static str {
        match self {
            Tier::Speedrun => "quick prototype with minimal features, no auth, basic UI",
            Tier::Mvp => "functional product with core features, basic auth, decent UI",
            Tier::ProdLite => "production-ready with full features, proper auth, polished UI",
        }
    }

    /// Factor the model is asked to apply to its base estimates.
    pub fn multiplier(&self) -> f64 {
        match self {
            Tier::Speedrun => 1.0,
            Tier::Mvp => 2.5,
            Tier::ProdLite => 5.0,
        }
    }

    /// Total hours of the static estimate used when the model is unavailable.
    pub fn fallback_hours(&self) -> f64 {
        match self {
            Tier::Speedrun => 4.0,
            Tier::Mvp => 8.0,
            Tier::ProdLite => 16.0,
        }
    }

    /// Prefix carried by every mission title at this tier.
    pub fn marker(&self) -> &'static str {
        match self {
            Tier::Speedrun => "[S]",
            Tier::Mvp => "[M]",
            Tier::ProdLite => "[P]",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speedrun" => Ok(Tier::Speedrun),
            "mvp" => Ok(Tier::Mvp),
            "prod-lite" => Ok(Tier::ProdLite),
            _ => Err(ValidationError::InvalidTier),
        }
    }
}

/// Request body as received from a caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalysisRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub force: Option<bool>,
}

/// A validated request to estimate one site at one tier.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// The URL exactly as the caller supplied it.
    pub url: String,
    pub tier: Tier,
    /// Ask to bypass the cache. Only honoured outside production.
    pub force: bool,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>, tier: Tier) -> Self {
        Self {
            url: url.into(),
            tier,
            force: false,
        }
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }
}

impl TryFrom<RawAnalysisRequest> for AnalysisRequest {
    type Error = ValidationError;

    fn try_from(raw: RawAnalysisRequest) -> Result<Self, Self::Error> {
        let url = raw.url.filter(|u| !u.trim().is_empty());
        let tier = raw.tier.filter(|t| !t.is_empty());
        let (url, tier) = match (url, tier) {
            (Some(url), Some(tier)) => (url, tier),
            _ => return Err(ValidationError::MissingFields),
        };

        if !validate_url(&url) {
            return Err(ValidationError::InvalidUrl);
        }
        let tier: Tier = tier.parse()?;

        Ok(Self {
            url,
            tier,
            force: raw.force.unwrap_or(false),
        })
    }
}

/// One crawled page. Produced by the crawler, consumed by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlResult {
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            content: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The fixed set of mission categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissionCategory {
    Accounts,
    Data,
    Content,
    Commerce,
    Social,
    #[serde(rename = "API")]
    Api,
    Admin,
    Analytics,
    Notifications,
    Search,
    Media,
}

impl MissionCategory {
    pub const ALL: [MissionCategory; 11] = [
        MissionCategory::Accounts,
        MissionCategory::Data,
        MissionCategory::Content,
        MissionCategory::Commerce,
        MissionCategory::Social,
        MissionCategory::Api,
        MissionCategory::Admin,
        MissionCategory::Analytics,
        MissionCategory::Notifications,
        MissionCategory::Search,
        MissionCategory::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionCategory::Accounts => "Accounts",
            MissionCategory::Data => "Data",
            MissionCategory::Content => "Content",
            MissionCategory::Commerce => "Commerce",
            MissionCategory::Social => "Social",
            MissionCategory::Api => "API",
            MissionCategory::Admin => "Admin",
            MissionCategory::Analytics => "Analytics",
            MissionCategory::Notifications => "Notifications",
            MissionCategory::Search => "Search",
            MissionCategory::Media => "Media",
        }
    }
}

impl fmt::Display for MissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissionCategory {
    type Err = String;

    /// Case-insensitive match against the fixed category names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MissionCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown mission category: {}", s))
    }
}

/// A single categorized build task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub category: MissionCategory,
    pub title: String,
    pub hours: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStory {
    pub role: String,
    pub i_can: String,
}

/// Roles, data objects, and user stories inferred for the product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMap {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub objects: Vec<String>,
    #[serde(default)]
    pub stories: Vec<UserStory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub url: String,
    pub snippet: String,
}

/// The estimate returned to callers and persisted as an opaque blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub total_hours: f64,
    pub confidence: f64,
    pub missions: Vec<Mission>,
    pub product_map: ProductMap,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AnalysisResult {
    pub fn mission_hours(&self) -> f64 {
        self.missions.iter().map(|m| m.hours).sum()
    }
}

/// A persisted analysis row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    pub id: String,
    pub url: String,
    pub url_canonical: String,
    pub tier: Tier,
    pub fingerprint: String,
    pub result: AnalysisResult,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert/update payload for the store. The store assigns `id` and
/// `created_at` on first insert and keeps them on conflict.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis {
    pub url: String,
    pub url_canonical: String,
    pub tier: Tier,
    pub fingerprint: String,
    pub result: AnalysisResult,
    pub is_public: bool,
}

/// Parameters of the list operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 50;

    /// Requested limit, defaulted to 10 and clamped to `[1, 50]`.
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// Search term, if one was given and is not blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
