//! Call diagonal (poor man's covered call).
//!
//! The short leg is the policy short anchor. The long leg is picked from the
//! term by a dte window around ~38 days, keeping a minimum gap to the short
//! leg; without a candidate it falls back to the month anchor. The row is
//! scored on the trade edge `(long.iv - short.iv) / max(floor, short.iv)`
//! between the two legs actually traded.

use std::sync::Arc;

use crate::application::blueprint;
use crate::config::{AppConfig, DiagonalConfig};
use crate::domain::entities::context::{Anchor, Context};
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::entities::term_point::TermPoint;
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::chain::OptionSide;
use crate::domain::values::expiry::is_standard_monthly;
use crate::domain::values::policy::ShortLegPolicy;

use super::{failed_row, recommend_row, row_at};

pub const FAIL_TAG: &str = "DIAG-FAIL";

pub struct DiagonalStrategy {
    config: Arc<AppConfig>,
    policy: ShortLegPolicy,
}

impl DiagonalStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self { config, policy }
    }

    fn cfg(&self) -> &DiagonalConfig {
        &self.config.strategies.diagonal
    }

    /// Long expiry for a short leg at `short_dte`.
    pub(crate) fn pick_long<'a>(&self, term: &'a [TermPoint], short_dte: u32) -> Option<&'a TermPoint> {
        let cfg = self.cfg();
        let min_dte = cfg.long_min_dte.max(short_dte + cfg.long_min_gap_vs_short);
        let window = |hi: u32| -> Vec<&'a TermPoint> { term.iter().filter(|p| (min_dte..=hi).contains(&p.dte)).collect() };

        let mut pool = window(cfg.long_max_dte);
        if pool.is_empty() {
            pool = window(cfg.long_fallback_max_dte);
        }
        if pool.is_empty() {
            return term.iter().filter(|p| p.dte >= min_dte).max_by_key(|p| p.dte);
        }

        if cfg.long_prefer_monthly {
            let monthly: Vec<&TermPoint> = pool.iter().copied().filter(|p| is_standard_monthly(&p.exp)).collect();
            if !monthly.is_empty() {
                pool = monthly;
            }
        }

        let target = cfg.long_target_dte.max(1.0);
        let cost = |p: &TermPoint| cfg.long_lambda * (f64::from(p.dte) - cfg.long_target_dte).abs() / target;
        pool.into_iter()
            .min_by(|a, b| cost(a).partial_cmp(&cost(b)).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// (short strike, long strike): short is the first call strike above
    /// `spot * buffer`, long the last strike at or below spot, kept below the
    /// short strike.
    pub(crate) fn strikes(&self, ctx: &Context, short_exp: &str, long_exp: &str) -> Option<(f64, f64)> {
        let short_strikes = ctx.chain.strikes(OptionSide::Call, short_exp);
        let long_strikes = ctx.chain.strikes(OptionSide::Call, long_exp);
        if short_strikes.is_empty() || long_strikes.is_empty() {
            return None;
        }

        let floor = ctx.price * self.cfg().short_strike_buffer;
        let short_strike = short_strikes.iter().copied().find(|s| *s > floor)?;

        let mut long_strike = long_strikes
            .iter()
            .copied()
            .filter(|s| *s <= ctx.price)
            .last()
            .unwrap_or(long_strikes[0]);
        if long_strike >= short_strike {
            long_strike = long_strikes
                .iter()
                .copied()
                .filter(|s| *s < short_strike)
                .last()
                .unwrap_or(short_strike);
        }
        Some((short_strike, long_strike))
    }
}

impl Strategy for DiagonalStrategy {
    fn name(&self) -> &'static str {
        "diagonal"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let cfg = self.cfg();
        let f = &ctx.features;
        let short = &f.short;

        let (long, from_term) = match self.pick_long(&ctx.term, short.dte) {
            Some(p) => (Anchor::from(p), true),
            None => (f.month.clone(), false),
        };
        let long_iv = if long.iv > 0.0 { long.iv } else { f.month.iv };
        let denom = self.config.anchors.iv_floor.max(short.iv);
        let edge = (long_iv - short.iv) / denom;

        let Some((short_strike, long_strike)) = self.strikes(ctx, &short.exp, &long.exp) else {
            let mut row = failed_row(
                ctx,
                FAIL_TAG,
                blueprint::DIAGONAL,
                format!("no diagonal strikes for {} / {}", short.exp, long.exp),
            );
            row.edge = edge;
            return row;
        };

        let mut score = ScoreBreakdown::with_base(50 + cfg.structure_bonus);
        score.edge = (edge * cfg.edge_scale).clamp(f64::from(cfg.edge_min), f64::from(cfg.edge_max)) as i32;
        let mut risk = RiskBreakdown::with_base(cfg.risk_base);
        if edge < 0.0 {
            score.regime = cfg.negative_edge_penalty;
            risk.regime = cfg.negative_edge_risk;
        }
        let score = score.clamped(0, 100);
        let risk = risk.clamped();

        let bp = blueprint::diagonal(
            &ctx.symbol,
            &ctx.chain,
            &short.exp,
            short_strike,
            &long.exp,
            long_strike,
            OptionSide::Call,
        );
        let tag = if bp.error.is_some() {
            FAIL_TAG.to_string()
        } else if edge > cfg.rich_edge {
            "DIAG+".to_string()
        } else {
            "DIAG".to_string()
        };

        let detail = StrategyDetail::Diagonal {
            short_strike,
            long_exp: long.exp.clone(),
            long_dte: long.dte,
            long_iv,
            long_strike,
            long_from_term: from_term,
            anchor: f.month.clone(),
            anchor_edge_month: f.edge_month,
            micro: f.micro.clone(),
            edge_micro: f.edge_micro,
        };
        let mut row = row_at(ctx, short, tag, score, risk, detail);
        row.base_iv = long_iv;
        row.edge = edge;
        row.blueprint = Some(bp);
        row
    }

    fn recommend(&self, ctx: &Context, min_score: i32, max_risk: i32) -> ProbeOutcome {
        recommend_row(ctx, &self.policy, self.evaluate(ctx), min_score, max_risk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(f: impl FnOnce(&mut DiagonalConfig)) -> DiagonalStrategy {
        let mut cfg = AppConfig::default();
        f(&mut cfg.strategies.diagonal);
        DiagonalStrategy::new(Arc::new(cfg), ShortLegPolicy::default())
    }

    fn term() -> Vec<TermPoint> {
        vec![
            TermPoint::new("2025-01-10", 5, 40.0),
            TermPoint::new("2025-02-07", 33, 32.0),
            TermPoint::new("2025-02-14", 40, 31.0),
            TermPoint::new("2025-02-21", 47, 30.0),
            TermPoint::new("2025-04-17", 102, 29.0),
        ]
    }

    #[test]
    fn test_long_closest_to_target_inside_window() {
        let t = term();
        let p = strategy(|_| {}).pick_long(&t, 5).unwrap();
        assert_eq!(p.dte, 40);
    }

    #[test]
    fn test_long_respects_gap_vs_short() {
        // short at 20 => min 40
        let t = term();
        let p = strategy(|_| {}).pick_long(&t, 20).unwrap();
        assert_eq!(p.dte, 40);
        // short at 30 => min 50, main window empty, fallback <= 90 empty, farthest >= 50
        let p = strategy(|_| {}).pick_long(&t, 30).unwrap();
        assert_eq!(p.dte, 102);
    }

    #[test]
    fn test_long_prefers_monthly_when_asked() {
        let t = term();
        let p = strategy(|c| {
            c.long_prefer_monthly = true;
            c.long_max_dte = 50;
        })
        .pick_long(&t, 5)
        .unwrap();
        assert_eq!(p.exp, "2025-02-21");
    }

    #[test]
    fn test_long_none_when_term_too_short() {
        let t = vec![TermPoint::new("a", 5, 40.0), TermPoint::new("b", 12, 38.0)];
        assert!(strategy(|_| {}).pick_long(&t, 5).is_none());
    }
}
