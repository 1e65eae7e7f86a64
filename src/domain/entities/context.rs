use serde::{Deserialize, Serialize};

use crate::domain::entities::hv_info::HvInfo;
use crate::domain::entities::term_point::TermPoint;
use crate::domain::values::chain::OptionChain;
use crate::domain::values::regime::{Curvature, Regime};

/// One named reference point picked from the term structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub exp: String,
    pub dte: u32,
    pub iv: f64,
    pub gamma: f64,
}

impl From<&TermPoint> for Anchor {
    fn from(p: &TermPoint) -> Self {
        Self {
            exp: p.exp.clone(),
            dte: p.dte,
            iv: p.iv,
            gamma: p.gamma,
        }
    }
}

/// Derived term-structure features for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsFeatures {
    pub regime: Regime,
    pub curvature: Curvature,
    /// First expiry with dte >= 1, independent of policy.
    pub nearest: Anchor,
    /// Policy-selected short leg.
    pub short: Anchor,
    /// Near-term volatility spike.
    pub micro: Anchor,
    /// Stable ~30-45 day reference.
    pub month: Anchor,
    /// Mean iv over the 30-90 dte band.
    pub base_iv: f64,
    /// short.iv / base_iv
    pub edge: f64,
    pub edge_micro: f64,
    pub edge_month: f64,
    /// micro.iv / base_iv
    pub squeeze_ratio: f64,
    pub front_rich: bool,
}

/// Complete input bundle for one scoring pass over one symbol.
///
/// Built once per scan cycle and never mutated afterwards; strategies that
/// need a different view work on local copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub symbol: String,
    pub price: f64,
    pub term: Vec<TermPoint>,
    pub hv: HvInfo,
    pub features: TsFeatures,
    #[serde(skip)]
    pub chain: OptionChain,
}

impl Context {
    /// The term in dte order, regardless of how `term` was assembled.
    pub fn ordered_term(&self) -> Vec<&TermPoint> {
        let mut ordered: Vec<&TermPoint> = self.term.iter().collect();
        ordered.sort_by_key(|p| p.dte);
        ordered
    }

    /// Points with dte >= `min_dte`, in dte order.
    pub fn eligible(&self, min_dte: u32) -> Vec<&TermPoint> {
        let mut eligible = self.ordered_term();
        eligible.retain(|p| p.dte >= min_dte);
        eligible
    }

    pub fn point_by_exp(&self, exp: &str) -> Option<&TermPoint> {
        self.term.iter().find(|p| p.exp == exp)
    }

    /// Largest gamma across the whole term; 0 when no point carries one.
    pub fn max_gamma(&self) -> f64 {
        self.term
            .iter()
            .map(|p| p.gamma)
            .filter(|g| g.is_finite())
            .fold(0.0, f64::max)
    }
}
