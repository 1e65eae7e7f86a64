//! Delta-targeted iron condor at the month anchor: a put credit spread and a
//! call credit spread around spot, with strict strike ordering
//! `long put < short put < spot < short call < long call`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::blueprint;
use crate::config::{AppConfig, IronCondorConfig};
use crate::domain::entities::blueprint::{Blueprint, OrderLeg};
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::chain::OptionSide;
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::Regime;

use super::vertical_credit::{credit_spread, max_loss};
use super::{failed_row, recommend_row, round2, row_at};

pub const FAIL_TAG: &str = "IC-FAIL";

pub struct IronCondorStrategy {
    config: Arc<AppConfig>,
    policy: ShortLegPolicy,
}

impl IronCondorStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self { config, policy }
    }

    fn cfg(&self) -> &IronCondorConfig {
        &self.config.strategies.iron_condor
    }

    pub(crate) fn score(&self, hv_rank: f64, ror: f64, regime: Regime) -> ScoreBreakdown {
        let cfg = self.cfg();
        let mut bd = ScoreBreakdown::with_base(50);
        if hv_rank > cfg.hv_high_rank {
            bd.hv += cfg.hv_high_bonus;
        }
        if hv_rank > cfg.hv_extreme_rank {
            bd.hv += cfg.hv_extreme_bonus;
        }
        if hv_rank < cfg.hv_low_rank {
            bd.hv += cfg.hv_low_penalty;
        }
        bd.edge = if ror > cfg.ror_rich {
            cfg.ror_rich_bonus
        } else if ror > cfg.ror_ok {
            cfg.ror_ok_bonus
        } else if ror < cfg.ror_poor {
            cfg.ror_poor_penalty
        } else {
            0
        };
        if regime == Regime::Backwardation {
            bd.regime = cfg.backwardation_penalty;
        }
        bd.clamped(0, 100)
    }
}

impl Strategy for IronCondorStrategy {
    fn name(&self) -> &'static str {
        "iron_condor"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let cfg = self.cfg();
        let month = &ctx.features.month;
        if month.exp.is_empty() || month.dte < cfg.min_dte {
            return failed_row(ctx, FAIL_TAG, FAIL_TAG, format!("DTE < {}", cfg.min_dte));
        }

        let put = credit_spread(ctx, &month.exp, OptionSide::Put, cfg.short_delta, cfg.long_delta);
        let call = credit_spread(ctx, &month.exp, OptionSide::Call, cfg.short_delta, cfg.long_delta);
        let (put, call) = match (put, call) {
            (Ok(p), Ok(c)) => (p, c),
            (Err(reason), _) | (_, Err(reason)) => return failed_row(ctx, FAIL_TAG, FAIL_TAG, reason),
        };

        let credit = put.credit + call.credit;
        let width = put.width.max(call.width);
        let loss = max_loss(width, credit);
        let ror = credit / loss;

        let score = self.score(ctx.hv.hv_rank, ror, ctx.features.regime);
        let risk = RiskBreakdown {
            base: 100,
            penalties: -score.total(),
            ..Default::default()
        }
        .clamped();
        let tag = if ror > cfg.rich_tag_ror { "IC-RICH" } else { "IC" };

        let legs = vec![
            OrderLeg::sell(&month.exp, put.short_strike, OptionSide::Put),
            OrderLeg::buy(&month.exp, put.long_strike, OptionSide::Put),
            OrderLeg::sell(&month.exp, call.short_strike, OptionSide::Call),
            OrderLeg::buy(&month.exp, call.long_strike, OptionSide::Call),
        ];
        let note = format!("Credit ${credit:.2} | Risk ${loss:.2} | RoR {:.1}%", ror * 100.0);
        let mut bp = Blueprint::new(&ctx.symbol, blueprint::IRON_CONDOR, legs, -round2(credit), note);
        bp.short_greeks = Some(BTreeMap::from([
            ("put_delta".to_string(), put.short_delta),
            ("call_delta".to_string(), call.short_delta),
        ]));

        let detail = StrategyDetail::IronCondor {
            credit,
            width,
            max_loss: loss,
            ror,
        };
        let mut row = row_at(ctx, month, tag.to_string(), score, risk, detail);
        row.base_iv = month.iv;
        row.edge = ctx.features.edge_month;
        row.blueprint = Some(bp);
        row
    }

    fn recommend(&self, ctx: &Context, min_score: i32, max_risk: i32) -> ProbeOutcome {
        recommend_row(ctx, &self.policy, self.evaluate(ctx), min_score, max_risk)
    }
}
