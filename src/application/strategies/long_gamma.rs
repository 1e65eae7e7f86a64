//! Long ATM straddle at the short anchor: buy volatility when realised vol is
//! cheap and the curve is healthy, penalising heavy position gamma.

use std::sync::Arc;

use crate::application::blueprint;
use crate::config::{AppConfig, LongGammaConfig};
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::ports::strategy::Strategy;
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::Regime;

use super::{round2, row_at};

pub const FAIL_TAG: &str = "LG-FAIL";

pub struct LongGammaStrategy {
    config: Arc<AppConfig>,
}

impl LongGammaStrategy {
    pub fn new(config: Arc<AppConfig>, _policy: ShortLegPolicy) -> Self {
        Self { config }
    }

    fn cfg(&self) -> &LongGammaConfig {
        &self.config.strategies.long_gamma
    }

    pub(crate) fn score(&self, hv_rank: f64, regime: Regime, raw_edge: f64) -> ScoreBreakdown {
        let cfg = self.cfg();
        let mut bd = ScoreBreakdown::with_base(50);
        bd.hv = if hv_rank <= cfg.hv_cheap_rank {
            cfg.hv_cheap_bonus
        } else if hv_rank <= cfg.hv_fair_rank {
            cfg.hv_fair_bonus
        } else if hv_rank >= cfg.hv_extreme_rank {
            cfg.hv_extreme_penalty
        } else if hv_rank >= cfg.hv_rich_rank {
            cfg.hv_rich_penalty
        } else {
            0
        };
        bd.regime = match regime {
            Regime::Contango => cfg.contango_bonus,
            Regime::Backwardation => cfg.backwardation_penalty,
            Regime::Flat => 0,
        };
        if raw_edge > cfg.edge_threshold {
            bd.edge = cfg.edge_points;
        } else if raw_edge < -cfg.edge_threshold {
            bd.edge = -cfg.edge_points;
        }
        bd.clamped(0, 100)
    }

    pub(crate) fn risk(&self, dte: u32, est_gamma: f64, regime: Regime, hv_rank: f64) -> RiskBreakdown {
        let cfg = self.cfg();
        let mut bd = RiskBreakdown::with_base(cfg.risk_base);
        bd.dte = cfg
            .risk_dte_buckets
            .iter()
            .find(|b| dte < b.below)
            .map_or(0, |b| b.points);
        bd.gamma = cfg
            .gamma_buckets
            .iter()
            .find(|b| est_gamma >= b.at_least)
            .map_or(0, |b| b.points);
        if regime == Regime::Backwardation {
            bd.regime += cfg.backwardation_risk;
        }
        if hv_rank > cfg.rich_hv_rank {
            bd.regime += cfg.rich_hv_risk;
        }
        bd.clamped()
    }

    /// Straddle gamma: twice the per-leg gamma when the chain reports one,
    /// else a closed-form estimate from price, iv and time.
    pub(crate) fn est_gamma(&self, leg_gamma: f64, price: f64, iv: f64, dte: u32) -> f64 {
        if leg_gamma > 0.0 {
            return leg_gamma * 2.0;
        }
        let vol = if iv > 2.0 { iv / 100.0 } else { iv };
        let years = f64::from(dte.max(1)) / 365.0;
        if price > 0.0 && vol > 0.0 {
            self.cfg().gamma_fallback_coeff / (price * vol * years.sqrt())
        } else {
            0.0
        }
    }
}

impl Strategy for LongGammaStrategy {
    fn name(&self) -> &'static str {
        "long_gamma"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let f = &ctx.features;
        let short = &f.short;
        let raw_edge = if short.iv > 0.0 {
            (ctx.hv.current_hv - short.iv) / short.iv
        } else {
            0.0
        };
        let est_gamma = self.est_gamma(short.gamma, ctx.price, short.iv, short.dte);

        let score = self.score(ctx.hv.hv_rank, f.regime, raw_edge);
        let risk = self.risk(short.dte, est_gamma, f.regime, ctx.hv.hv_rank);

        let bp = blueprint::straddle(&ctx.symbol, ctx.price, &ctx.chain, &short.exp);
        let tag = if bp.error.is_some() {
            FAIL_TAG.to_string()
        } else if f.regime == Regime::Contango {
            "LG-C".to_string()
        } else {
            "LG".to_string()
        };

        let detail = StrategyDetail::LongGamma { est_gamma, raw_edge };
        let mut row = row_at(ctx, short, tag, score, risk, detail);
        row.edge = round2(raw_edge);
        row.blueprint = Some(bp);
        row
    }
}
