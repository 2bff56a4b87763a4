//! Collapsing model and fallback estimates into one result.

use crate::fallback::fallback_analysis;
use crate::filter::apply_hint_filter;
use crate::hints::Hints;
use crate::models::{AnalysisResult, CrawlResult, Tier, MAX_TOTAL_HOURS};

/// Where an estimate came from.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The model replied with a usable estimate.
    Parsed(AnalysisResult),
    /// The model failed; a static per-tier estimate stands in.
    Fallback(AnalysisResult),
}

impl AnalysisOutcome {
    pub fn fallback(tier: Tier, hints: &Hints, pages: &[CrawlResult]) -> Self {
        AnalysisOutcome::Fallback(fallback_analysis(tier, hints, pages))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AnalysisOutcome::Fallback(_))
    }

    /// Post-process and unwrap. Both variants go through the hint filter.
    pub fn finalize(self, tier: Tier, hints: &Hints) -> AnalysisResult {
        let result = match self {
            AnalysisOutcome::Parsed(mut result) => {
                result.total_hours = result.total_hours.min(MAX_TOTAL_HOURS);
                ensure_tier_markers(&mut result, tier);
                result
            }
            AnalysisOutcome::Fallback(result) => result,
        };
        apply_hint_filter(result, hints)
    }
}

/// Prefix mission titles with the tier marker when the model left it off.
pub fn ensure_tier_markers(result: &mut AnalysisResult, tier: Tier) {
    let marker = tier.marker();
    for mission in &mut result.missions {
        if !mission.title.starts_with(marker) {
            mission.title = format!("{} {}", marker, mission.title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mission, MissionCategory, ProductMap};

    fn parsed(total: f64, missions: Vec<(MissionCategory, &str, f64)>) -> AnalysisOutcome {
        AnalysisOutcome::Parsed(AnalysisResult {
            total_hours: total,
            confidence: 0.8,
            missions: missions
                .into_iter()
                .map(|(category, title, hours)| Mission {
                    category,
                    title: title.to_string(),
                    hours,
                    confidence: 0.8,
                })
                .collect(),
            product_map: ProductMap::default(),
            evidence: vec![],
            scope: String::new(),
            summary: Some("A todo app".into()),
        })
    }

    #[test]
    fn test_parsed_total_matches_missions_after_filter() {
        let outcome = parsed(
            200.0,
            vec![
                (MissionCategory::Content, "Landing", 5.0),
                (MissionCategory::Accounts, "Login", 7.0),
            ],
        );
        let r = outcome.finalize(Tier::Mvp, &Hints::default());
        assert_eq!(r.total_hours, 5.0);
        assert_eq!(r.total_hours, r.mission_hours());
        assert_eq!(r.missions[0].title, "[M] Landing");
    }

    #[test]
    fn test_marker_not_duplicated() {
        let outcome = parsed(3.0, vec![(MissionCategory::Data, "[S] Tasks", 3.0)]);
        let r = outcome.finalize(Tier::Speedrun, &Hints::default());
        assert_eq!(r.missions[0].title, "[S] Tasks");
    }

    #[test]
    fn test_fallback_goes_through_filter() {
        for tier in Tier::ALL {
            let outcome = AnalysisOutcome::fallback(tier, &Hints::default(), &[]);
            assert!(outcome.is_fallback());
            let r = outcome.finalize(tier, &Hints::default());
            assert_eq!(r.total_hours, tier.fallback_hours());
            assert_eq!(r.total_hours, r.mission_hours());
            assert!(r
                .missions
                .iter()
                .all(|m| m.category != MissionCategory::Accounts));
        }
    }
}
