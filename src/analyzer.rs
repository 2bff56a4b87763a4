//! Turns crawled pages into an estimate.
//!
//! The analyzer derives hints, prompts the model once, and parses the reply.
//! Any failure (no usable pages, client error, unparseable or incomplete
//! JSON) produces the static per-tier fallback instead. Both paths finish
//! in [`AnalysisOutcome::finalize`], which caps the total and applies the
//! hint filter, so callers never see an error from here.

use std::sync::Arc;

use clonetime_core::hints::{detect_hints, Hints};
use clonetime_core::models::{AnalysisResult, CrawlResult, Tier};
use clonetime_core::outcome::AnalysisOutcome;
use clonetime_core::prompt::{build_prompt, parse_response};

use crate::config::LlmConfig;
use crate::llm::{ChatRequest, LlmClient};

/// Generation parameters, taken from `[llm]`.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub temperature: f64,
    pub max_tokens: u32,
    pub prompt_char_budget: usize,
}

impl From<&LlmConfig> for AnalyzerSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            prompt_char_budget: config.prompt_char_budget,
        }
    }
}

#[derive(Clone)]
pub struct Analyzer {
    llm: Arc<dyn LlmClient>,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(llm: Arc<dyn LlmClient>, settings: AnalyzerSettings) -> Self {
        Self { llm, settings }
    }

    /// Estimate the rebuild of the crawled site at `tier`.
    pub async fn analyze(&self, pages: &[CrawlResult], tier: Tier) -> AnalysisResult {
        let hints = detect_hints(pages);
        tracing::debug!(?hints, %tier, "derived hints");

        let outcome = self.estimate(pages, tier, &hints).await;
        if outcome.is_fallback() {
            tracing::info!(%tier, "using fallback estimate");
        }
        outcome.finalize(tier, &hints)
    }

    async fn estimate(&self, pages: &[CrawlResult], tier: Tier, hints: &Hints) -> AnalysisOutcome {
        if !pages.iter().any(CrawlResult::is_ok) {
            tracing::warn!("no page was crawled successfully");
            return AnalysisOutcome::fallback(tier, hints, pages);
        }

        let prompt = build_prompt(pages, tier, hints, self.settings.prompt_char_budget);
        let request = ChatRequest {
            system: prompt.system,
            user: prompt.user,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let reply = self.llm.complete(&request).await;
        match reply.and_then(|content| parse_response(&content)) {
            Ok(result) => {
                tracing::debug!(
                    model = self.llm.model_name(),
                    total_hours = result.total_hours,
                    missions = result.missions.len(),
                    "model estimate parsed"
                );
                AnalysisOutcome::Parsed(result)
            }
            Err(e) => {
                tracing::warn!(model = self.llm.model_name(), error = %format!("{:#}", e), "model analysis failed");
                AnalysisOutcome::fallback(tier, hints, pages)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use clonetime_core::models::MissionCategory;
    use std::sync::Mutex;

    struct ScriptedClient {
        reply: Result<String, String>,
        prompts: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection reset".into()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    fn settings() -> AnalyzerSettings {
        AnalyzerSettings::from(&LlmConfig::default())
    }

    fn pages(content: &str) -> Vec<CrawlResult> {
        vec![CrawlResult {
            url: "https://acme.io".into(),
            title: "Acme".into(),
            content: content.into(),
            error: None,
        }]
    }

    const REPLY: &str = r#"{
        "total_hours": 30,
        "confidence": 0.7,
        "missions": [
            {"category": "Content", "title": "Landing page", "hours": 6, "confidence": 0.9},
            {"category": "Accounts", "title": "[M] Login", "hours": 10, "confidence": 0.8},
            {"category": "Data", "title": "[M] Projects", "hours": 14, "confidence": 0.7}
        ],
        "product_map": {"roles": ["User"], "objects": ["Project"], "stories": []},
        "evidence": [],
        "scope": "web app"
    }"#;

    #[tokio::test]
    async fn test_parsed_reply_is_filtered_by_hints() {
        let client = ScriptedClient::replying(REPLY);
        let analyzer = Analyzer::new(client.clone(), settings());

        let r = analyzer
            .analyze(&pages("Project tracking for small teams."), Tier::Mvp)
            .await;
        assert!(r.missions.iter().all(|m| m.category != MissionCategory::Accounts));
        assert_eq!(r.total_hours, 20.0);
        assert_eq!(r.total_hours, r.mission_hours());
        assert_eq!(r.missions[0].title, "[M] Landing page");

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].temperature, 0.3);
        assert_eq!(prompts[0].max_tokens, 2000);
    }

    #[tokio::test]
    async fn test_auth_mission_kept_when_site_has_login() {
        let analyzer = Analyzer::new(ScriptedClient::replying(REPLY), settings());
        let r = analyzer
            .analyze(&pages("Log in to track projects."), Tier::Mvp)
            .await;
        assert!(r.missions.iter().any(|m| m.category == MissionCategory::Accounts));
        assert_eq!(r.total_hours, 30.0);
    }

    #[tokio::test]
    async fn test_client_failure_falls_back_per_tier() {
        let analyzer = Analyzer::new(ScriptedClient::failing(), settings());
        for tier in Tier::ALL {
            let r = analyzer.analyze(&pages("A plain brochure site."), tier).await;
            assert_eq!(r.total_hours, tier.fallback_hours());
            assert_eq!(r.total_hours, r.mission_hours());
            assert!(r.scope.contains("fallback"));
        }
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let analyzer = Analyzer::new(
            ScriptedClient::replying(r#"{"total_hours": 5, "missions": []}"#),
            settings(),
        );
        let r = analyzer.analyze(&pages("Landing page"), Tier::Speedrun).await;
        assert_eq!(r.total_hours, 4.0);
    }

    #[tokio::test]
    async fn test_no_usable_pages_skips_model() {
        let client = ScriptedClient::replying(REPLY);
        let analyzer = Analyzer::new(client.clone(), settings());
        let failed = vec![CrawlResult::failed("https://acme.io", "Failed to crawl: dns")];

        let r = analyzer.analyze(&failed, Tier::ProdLite).await;
        assert_eq!(r.total_hours, 16.0);
        assert!(client.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_total_capped_at_ceiling() {
        let reply = r#"{
            "total_hours": 400,
            "missions": [
                {"category": "Data", "title": "Everything", "hours": 300},
                {"category": "Search", "title": "Search", "hours": 100}
            ],
            "product_map": {}
        }"#;
        let analyzer = Analyzer::new(ScriptedClient::replying(reply), settings());
        let r = analyzer.analyze(&pages("Big platform"), Tier::ProdLite).await;
        assert_eq!(r.total_hours, 48.0);
    }
}
