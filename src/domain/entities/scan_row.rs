use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::entities::blueprint::Blueprint;
use crate::domain::entities::context::Anchor;
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::chain::OptionSide;
use crate::domain::values::regime::{Curvature, Regime};

/// Strategy-specific payload of a row. Each variant declares exactly the
/// fields that are meaningful for that strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyDetail {
    Calendar {
        squeeze_ratio: f64,
    },
    HvCalendar {
        squeeze_ratio: f64,
        hv_adjust: i32,
    },
    Diagonal {
        short_strike: f64,
        long_exp: String,
        long_dte: u32,
        long_iv: f64,
        long_strike: f64,
        /// false when the long expiry fell back to the month anchor
        long_from_term: bool,
        anchor: Anchor,
        anchor_edge_month: f64,
        micro: Anchor,
        edge_micro: f64,
    },
    VerticalCredit {
        side: OptionSide,
        credit: f64,
        width: f64,
        max_loss: f64,
        ror: f64,
        short_delta: f64,
    },
    IronCondor {
        credit: f64,
        width: f64,
        max_loss: f64,
        ror: f64,
    },
    LongGamma {
        est_gamma: f64,
        raw_edge: f64,
    },
    Failed {
        reason: String,
    },
}

impl StrategyDetail {
    pub fn est_gamma(&self) -> f64 {
        match self {
            StrategyDetail::LongGamma { est_gamma, .. } => *est_gamma,
            _ => 0.0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StrategyDetail::Failed { .. })
    }
}

/// Output of the rank prober for a rescued symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rank: usize,
    pub exp: String,
    pub dte: u32,
    pub iv: f64,
    pub edge: f64,
    pub score: i32,
    pub risk: i32,
    pub tag: String,
    pub score_breakdown: ScoreBreakdown,
    pub risk_breakdown: RiskBreakdown,
    pub squeeze_ratio: f64,
}

impl Recommendation {
    /// `<prefix> rk<rank> <exp> d<dte> e<edge> s<score> r<risk> <tag>`
    pub fn summary(&self, prefix: &str) -> String {
        format!(
            "{prefix} rk{} {} d{} e{:.2} s{} r{} {}",
            self.rank, self.exp, self.dte, self.edge, self.score, self.risk, self.tag
        )
    }
}

/// One symbol's evaluation by one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRow {
    pub symbol: String,
    pub price: f64,
    pub short_exp: String,
    pub short_dte: u32,
    pub short_iv: f64,
    pub base_iv: f64,
    pub edge: f64,
    pub hv_rank: f64,
    pub regime: Regime,
    pub curvature: Curvature,
    pub tag: String,
    pub cal_score: i32,
    pub short_risk: i32,
    pub score_breakdown: ScoreBreakdown,
    pub risk_breakdown: RiskBreakdown,
    pub detail: StrategyDetail,
    #[serde(default)]
    pub blueprint: Option<Blueprint>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
    #[serde(default)]
    pub probe_summary: String,
}

impl ScanRow {
    pub fn passes(&self, min_score: i32, max_risk: i32) -> bool {
        self.cal_score >= min_score && self.short_risk <= max_risk
    }

    pub fn has_failed_structure(&self) -> bool {
        self.detail.is_failure() || self.blueprint.as_ref().is_some_and(|bp| bp.error.is_some())
    }

    /// One-line explanation of both breakdowns.
    pub fn explain(&self) -> String {
        let s = &self.score_breakdown;
        let r = &self.risk_breakdown;
        format!(
            "{:<6} {:<10} score {:>3} = base {} + regime {} + edge {} + hv {} + curv {} + pen {} | risk {:>3} = base {} + dte {} + gamma {} + curv {} + regime {} + pen {}",
            self.symbol,
            self.tag,
            self.cal_score,
            s.base,
            s.regime,
            s.edge,
            s.hv,
            s.curvature,
            s.penalties,
            self.short_risk,
            r.base,
            r.dte,
            r.gamma,
            r.curvature,
            r.regime,
            r.penalties
        )
    }
}

impl fmt::Display for ScanRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} d{} iv{:.1} e{:.2} s{} r{} {}",
            self.symbol, self.short_exp, self.short_dte, self.short_iv, self.edge, self.cal_score, self.short_risk, self.tag
        )
    }
}
