//! Rank prober: walk alternative short-leg ranks looking for one that clears
//! the caller's thresholds.
//!
//! First match wins and stops the search. When nothing clears, the summary
//! reports the highest-scoring attempt instead.

use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::Recommendation;
use crate::domain::entities::term_point::TermPoint;
use crate::domain::ports::strategy::ProbeOutcome;
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::policy::ShortLegPolicy;

/// A scored candidate as produced by the strategy being probed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeAttempt {
    pub score: ScoreBreakdown,
    pub risk: RiskBreakdown,
    pub tag: String,
}

/// Probe `policy.probe_ranks()` over the eligible (dte >= `min_dte`) expiries
/// of `ctx`. `evaluate` is called with the rank, its term point and the edge
/// `point.iv / base_iv`, in rank order, and never again after a match.
pub fn probe_ranks<F>(ctx: &Context, policy: &ShortLegPolicy, min_score: i32, max_risk: i32, mut evaluate: F) -> ProbeOutcome
where
    F: FnMut(usize, &TermPoint, f64) -> ProbeAttempt,
{
    let eligible = ctx.eligible(policy.min_dte);
    if eligible.is_empty() {
        return ProbeOutcome::none();
    }

    let base_iv = ctx.features.base_iv;
    let mut best: Option<Recommendation> = None;

    for rank in policy.probe_ranks() {
        let Some(point) = eligible.get(rank).copied() else {
            continue;
        };
        let edge = if base_iv > 0.0 { point.iv / base_iv } else { 0.0 };
        let attempt = evaluate(rank, point, edge);

        let rec = Recommendation {
            rank,
            exp: point.exp.clone(),
            dte: point.dte,
            iv: point.iv,
            edge,
            score: attempt.score.total(),
            risk: attempt.risk.total(),
            tag: attempt.tag,
            score_breakdown: attempt.score,
            risk_breakdown: attempt.risk,
            squeeze_ratio: ctx.features.squeeze_ratio,
        };

        if rec.score >= min_score && rec.risk <= max_risk {
            let summary = rec.summary("ok");
            tracing::debug!(symbol = %ctx.symbol, rank, "probe matched");
            return ProbeOutcome {
                recommendation: Some(rec),
                summary,
            };
        }

        if best.as_ref().map_or(true, |b| rec.score > b.score) {
            best = Some(rec);
        }
    }

    ProbeOutcome {
        recommendation: None,
        summary: best.map_or_else(|| "-".to_string(), |b| b.summary("best")),
    }
}
