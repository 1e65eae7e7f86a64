//! Delta-targeted credit vertical at the month anchor: a bull put spread by
//! default, a bear call spread when configured for calls.
//!
//! Score is driven by hv rank and return on risk; risk mirrors it as
//! `100 - score`.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::blueprint::{self, leg_mark};
use crate::config::{AppConfig, VerticalConfig};
use crate::domain::entities::blueprint::{Blueprint, OrderLeg};
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::chain::OptionSide;
use crate::domain::values::policy::ShortLegPolicy;

use super::{failed_row, recommend_row, round2, row_at};

pub const FAIL_TAG: &str = "VERT-FAIL";

pub struct VerticalCreditStrategy {
    config: Arc<AppConfig>,
    policy: ShortLegPolicy,
}

/// Priced credit spread on one side.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CreditSpread {
    pub short_strike: f64,
    pub long_strike: f64,
    pub credit: f64,
    pub width: f64,
    pub short_delta: f64,
}

/// `max_loss` never drops below 0.1 so the return on risk stays finite.
pub(crate) fn max_loss(width: f64, credit: f64) -> f64 {
    let loss = width - credit;
    if loss <= 0.0 {
        0.1
    } else {
        loss
    }
}

impl VerticalCreditStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self { config, policy }
    }

    fn cfg(&self) -> &VerticalConfig {
        &self.config.strategies.vertical
    }

    fn score(&self, hv_rank: f64, ror: f64) -> ScoreBreakdown {
        let cfg = self.cfg();
        let mut bd = ScoreBreakdown::with_base(50);
        if hv_rank > cfg.hv_rank_above {
            bd.hv = cfg.hv_bonus;
        }
        bd.edge = if ror > cfg.ror_rich {
            cfg.ror_rich_bonus
        } else if ror > cfg.ror_ok {
            cfg.ror_ok_bonus
        } else {
            0
        };
        bd.clamped(0, 100)
    }
}

/// Find and price one credit spread: short strike at `short_delta`, long
/// strike at `long_delta`, both strictly out of the money on `side`.
pub(crate) fn credit_spread(
    ctx: &Context,
    exp: &str,
    side: OptionSide,
    short_delta: f64,
    long_delta: f64,
) -> Result<CreditSpread, String> {
    let short = ctx.chain.strike_by_delta(side, exp, short_delta);
    let long = ctx.chain.strike_by_delta(side, exp, long_delta);
    let (Some(short_strike), Some(long_strike)) = (short, long) else {
        return Err(format!("{side} legs missing at {exp} (no usable delta)"));
    };

    let ordered = match side {
        OptionSide::Put => long_strike < short_strike && short_strike < ctx.price,
        OptionSide::Call => ctx.price < short_strike && short_strike < long_strike,
    };
    if !ordered {
        return Err(format!("inverted {side} strikes {short_strike}/{long_strike} around {:.2}", ctx.price));
    }

    let (short_px, d_short) = leg_mark(&ctx.chain, side, exp, short_strike).unwrap_or((0.0, 0.0));
    let (long_px, _) = leg_mark(&ctx.chain, side, exp, long_strike).unwrap_or((0.0, 0.0));
    Ok(CreditSpread {
        short_strike,
        long_strike,
        credit: short_px - long_px,
        width: (short_strike - long_strike).abs(),
        short_delta: d_short,
    })
}

impl Strategy for VerticalCreditStrategy {
    fn name(&self) -> &'static str {
        "vertical"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let cfg = self.cfg();
        let month = &ctx.features.month;
        if month.exp.is_empty() || month.dte < cfg.min_dte {
            return failed_row(ctx, FAIL_TAG, FAIL_TAG, format!("DTE < {}", cfg.min_dte));
        }

        let spread = match credit_spread(ctx, &month.exp, cfg.side, cfg.short_delta, cfg.long_delta) {
            Ok(s) => s,
            Err(reason) => return failed_row(ctx, FAIL_TAG, FAIL_TAG, reason),
        };
        let loss = max_loss(spread.width, spread.credit);
        let ror = spread.credit / loss;

        let score = self.score(ctx.hv.hv_rank, ror);
        let risk = RiskBreakdown {
            base: 100,
            penalties: -score.total(),
            ..Default::default()
        }
        .clamped();

        let (tag, structure) = match cfg.side {
            OptionSide::Put => ("PCS", blueprint::BULL_PUT),
            OptionSide::Call => ("CCS", blueprint::BEAR_CALL),
        };
        let legs = vec![
            OrderLeg::sell(&month.exp, spread.short_strike, cfg.side),
            OrderLeg::buy(&month.exp, spread.long_strike, cfg.side),
        ];
        let note = format!("Credit ${:.2} | Risk ${:.2} | RoR {:.1}%", spread.credit, loss, ror * 100.0);
        let mut bp = Blueprint::new(&ctx.symbol, structure, legs, -round2(spread.credit), note);
        bp.short_greeks = Some(BTreeMap::from([("delta".to_string(), spread.short_delta)]));

        let detail = StrategyDetail::VerticalCredit {
            side: cfg.side,
            credit: spread.credit,
            width: spread.width,
            max_loss: loss,
            ror,
            short_delta: spread.short_delta,
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
