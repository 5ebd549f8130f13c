use crate::models::{AppInfo, RiskLevel, ScoredApp};
use crate::risk::rules;

/// Score an app against the rule chain.
///
/// Pure and total: folds over [`rules::CHAIN`], accumulating weighted
/// contributions and one reason string per triggered rule, then clamps the
/// sum to `[0, 100]` and derives the tier. Intermediate sums may leave that
/// range; only the final score is clamped.
pub fn score(app: &AppInfo) -> (f64, RiskLevel, Vec<String>) {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    for rule in rules::CHAIN {
        for hit in rule(app) {
            total += hit.delta;
            reasons.push(hit.reason);
        }
    }

    let clamped = total.clamp(0.0, 100.0);
    (clamped, RiskLevel::from_score(clamped), reasons)
}

/// Consume an [`AppInfo`] and attach its risk assessment.
pub fn assess(app: AppInfo) -> ScoredApp {
    let (risk_score, risk_level, risk_reasons) = score(&app);
    ScoredApp {
        app,
        risk_score,
        risk_level,
        risk_reasons,
    }
}
