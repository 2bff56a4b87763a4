//! Hint-based mission filter.
//!
//! Every estimate leaves the analyzer through [`apply_hint_filter`], whether
//! it came from the model or from the static fallback. Afterwards
//! `total_hours` is the sum of the surviving missions, clamped to
//! `[MIN_TOTAL_HOURS, MAX_TOTAL_HOURS]`.

use crate::hints::{title_mentions_admin, title_mentions_api, title_mentions_auth, Hints};
use crate::models::{AnalysisResult, Mission, MissionCategory, MAX_TOTAL_HOURS, MIN_TOTAL_HOURS};

/// Drop Accounts/Admin/API missions the crawl gave no evidence for, then
/// recompute and clamp the total.
///
/// If no mission hours remain, the incoming total is kept (still clamped).
pub fn apply_hint_filter(mut result: AnalysisResult, hints: &Hints) -> AnalysisResult {
    let original_total = result.total_hours;
    result.missions.retain(|m| keep_mission(m, hints));

    let sum = result.mission_hours();
    let total = if sum > 0.0 { sum } else { original_total };
    result.total_hours = clamp_total(total);
    result
}

fn keep_mission(mission: &Mission, hints: &Hints) -> bool {
    let is_accounts =
        mission.category == MissionCategory::Accounts || title_mentions_auth(&mission.title);
    let is_admin = mission.category == MissionCategory::Admin || title_mentions_admin(&mission.title);
    let is_api = mission.category == MissionCategory::Api || title_mentions_api(&mission.title);

    !((is_accounts && !hints.has_auth)
        || (is_admin && !hints.has_admin)
        || (is_api && !hints.mentions_api))
}

/// Clamp to `[1, 48]`; non-finite totals become the floor.
pub fn clamp_total(hours: f64) -> f64 {
    if !hours.is_finite() {
        return MIN_TOTAL_HOURS;
    }
    hours.clamp(MIN_TOTAL_HOURS, MAX_TOTAL_HOURS)
}
