//! Priority-ordered router over the concrete variants. The first matching
//! rule picks the strategy:
//!
//! 1. backwardation: long gamma
//! 2. leveraged ETF: credit vertical
//! 3. `edge_month` above threshold: diagonal
//! 4. high hv rank or high short iv: credit vertical
//! 5. low hv rank: long gamma
//! 6. otherwise long gamma
//!
//! Rows and recommendations keep the routed strategy's tag with an `AUTO-`
//! prefix.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::ScanRow;
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::Regime;

use super::diagonal::DiagonalStrategy;
use super::long_gamma::LongGammaStrategy;
use super::vertical_credit::VerticalCreditStrategy;

const PREFIX: &str = "AUTO-";

pub struct AutoStrategy {
    config: Arc<AppConfig>,
    long_gamma: LongGammaStrategy,
    vertical: VerticalCreditStrategy,
    diagonal: DiagonalStrategy,
}

impl AutoStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self {
            long_gamma: LongGammaStrategy::new(config.clone(), policy),
            vertical: VerticalCreditStrategy::new(config.clone(), policy),
            diagonal: DiagonalStrategy::new(config.clone(), policy),
            config,
        }
    }

    /// The variant this context is routed to.
    pub fn route(&self, ctx: &Context) -> &dyn Strategy {
        let cfg = &self.config.strategies.auto;
        let f = &ctx.features;
        let hv_rank = ctx.hv.hv_rank;

        let chosen: &dyn Strategy = if f.regime == Regime::Backwardation {
            &self.long_gamma
        } else if cfg.is_leveraged(&ctx.symbol) {
            &self.vertical
        } else if f.edge_month > cfg.diagonal_edge {
            &self.diagonal
        } else if hv_rank >= cfg.high_hv_rank || f.short.iv >= cfg.high_iv {
            &self.vertical
        } else if hv_rank < cfg.low_hv_rank {
            &self.long_gamma
        } else {
            &self.long_gamma
        };
        tracing::debug!(symbol = %ctx.symbol, routed = chosen.name(), "auto route");
        chosen
    }
}

impl Strategy for AutoStrategy {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let mut row = self.route(ctx).evaluate(ctx);
        row.tag = format!("{PREFIX}{}", row.tag);
        row
    }

    fn recommend(&self, ctx: &Context, min_score: i32, max_risk: i32) -> ProbeOutcome {
        let mut outcome = self.route(ctx).recommend(ctx, min_score, max_risk);
        if let Some(rec) = outcome.recommendation.as_mut() {
            rec.tag = format!("{PREFIX}{}", rec.tag);
            outcome.summary = rec.summary("ok");
        }
        outcome
    }
}
