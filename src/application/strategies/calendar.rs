//! Plain ATM calendar: short the policy-ranked front expiry, long the month
//! anchor. Scored on regime, curvature and the short/base iv edge.

use std::sync::Arc;

use crate::application::blueprint;
use crate::application::probe::{probe_ranks, ProbeAttempt};
use crate::application::scoring::{RiskInputs, ScoringEngine};
use crate::config::AppConfig;
use crate::domain::entities::blueprint::Blueprint;
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::chain::OptionSide;
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::{Curvature, Regime};

use super::row_at;

pub struct CalendarStrategy {
    engine: ScoringEngine,
    policy: ShortLegPolicy,
}

impl CalendarStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self {
            engine: ScoringEngine::new(config.scoring.clone(), config.risk.clone()),
            policy,
        }
    }

    pub(crate) fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    /// Score the short anchor with `hv` in the hv slot.
    pub(crate) fn evaluate_with_hv(&self, ctx: &Context, hv: i32) -> ScanRow {
        let f = &ctx.features;
        let score = self.engine.score_calendar(f.regime, f.curvature, f.edge, hv);
        let risk = self
            .engine
            .risk(&RiskInputs::for_candidate(ctx, &self.policy, f.short.dte, f.short.gamma));

        let mut row = row_at(
            ctx,
            &f.short,
            tag(f.regime, f.curvature),
            score,
            risk,
            StrategyDetail::Calendar {
                squeeze_ratio: f.squeeze_ratio,
            },
        );
        row.blueprint = calendar_blueprint(ctx);
        row
    }

    /// Probe alternative short ranks, re-scoring each with `hv` in the hv slot.
    pub(crate) fn recommend_with_hv(&self, ctx: &Context, min_score: i32, max_risk: i32, hv: i32) -> ProbeOutcome {
        let f = &ctx.features;
        let label = tag(f.regime, f.curvature);
        probe_ranks(ctx, &self.policy, min_score, max_risk, |_, point, edge| ProbeAttempt {
            score: self.engine.score_calendar(f.regime, f.curvature, edge, hv),
            risk: self
                .engine
                .risk(&RiskInputs::for_candidate(ctx, &self.policy, point.dte, point.gamma)),
            tag: label.clone(),
        })
    }
}

impl Strategy for CalendarStrategy {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        self.evaluate_with_hv(ctx, 0)
    }

    fn recommend(&self, ctx: &Context, min_score: i32, max_risk: i32) -> ProbeOutcome {
        self.recommend_with_hv(ctx, min_score, max_risk, 0)
    }
}

/// Regime letter, plus `S` for a spiky front.
pub fn tag(regime: Regime, curvature: Curvature) -> String {
    let mut t = regime.letter().to_string();
    if curvature.is_spiky() {
        t.push('S');
    }
    t
}

/// Short anchor against month anchor. Skipped entirely without a chain.
fn calendar_blueprint(ctx: &Context) -> Option<Blueprint> {
    if ctx.chain.is_empty() {
        return None;
    }
    let f = &ctx.features;
    if f.month.dte <= f.short.dte {
        return Some(Blueprint::failed(
            &ctx.symbol,
            blueprint::CALENDAR,
            format!("long expiry {} does not follow short expiry {}", f.month.exp, f.short.exp),
        ));
    }
    Some(blueprint::calendar(
        &ctx.symbol,
        ctx.price,
        &ctx.chain,
        &f.short.exp,
        &f.month.exp,
        OptionSide::Call,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_letters() {
        assert_eq!(tag(Regime::Flat, Curvature::Normal), "F");
        assert_eq!(tag(Regime::Contango, Curvature::SpikyFront), "CS");
        assert_eq!(tag(Regime::Backwardation, Curvature::Normal), "B");
    }
}
