//! Additive, named decompositions of the attractiveness score and the
//! short-leg risk.
//!
//! Every reported score or risk is the plain sum of its breakdown fields.
//! When a strategy clamps a total, the clamp delta is absorbed by
//! `penalties` so the sum still matches what is shown.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: i32,
    pub regime: i32,
    pub edge: i32,
    pub hv: i32,
    pub curvature: i32,
    pub penalties: i32,
}

impl ScoreBreakdown {
    pub fn with_base(base: i32) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn total(&self) -> i32 {
        self.base + self.regime + self.edge + self.hv + self.curvature + self.penalties
    }

    /// Clamp the total into `[lo, hi]`, folding the difference into `penalties`.
    pub fn clamped(mut self, lo: i32, hi: i32) -> Self {
        let raw = self.total();
        self.penalties += raw.clamp(lo, hi) - raw;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub base: i32,
    pub dte: i32,
    pub gamma: i32,
    pub curvature: i32,
    pub regime: i32,
    pub penalties: i32,
}

impl RiskBreakdown {
    pub fn with_base(base: i32) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn total(&self) -> i32 {
        self.base + self.dte + self.gamma + self.curvature + self.regime + self.penalties
    }

    /// Risk is always reported inside 0..=100.
    pub fn clamped(mut self) -> Self {
        let raw = self.total();
        self.penalties += raw.clamp(0, 100) - raw;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_total_sums_fields() {
        let bd = ScoreBreakdown {
            base: 50,
            regime: -8,
            edge: 8,
            hv: 4,
            curvature: 6,
            penalties: 0,
        };
        assert_eq!(bd.total(), 60);
    }

    #[test]
    fn test_risk_clamp_folds_into_penalties() {
        let bd = RiskBreakdown {
            base: 35,
            dte: 30,
            gamma: 22,
            curvature: 10,
            regime: 4,
            penalties: 0,
        }
        .clamped();
        assert_eq!(bd.total(), 100);
        assert_eq!(bd.penalties, -1);
    }

    #[test]
    fn test_risk_clamp_floor() {
        let bd = RiskBreakdown {
            base: 10,
            penalties: -40,
            ..Default::default()
        }
        .clamped();
        assert_eq!(bd.total(), 0);
    }

    #[test]
    fn test_score_clamp_leaves_in_range_untouched() {
        let bd = ScoreBreakdown::with_base(50).clamped(0, 100);
        assert_eq!(bd.penalties, 0);
        assert_eq!(bd.total(), 50);
    }
}
