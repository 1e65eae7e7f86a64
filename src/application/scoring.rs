//! Explainable score and risk models shared by the calendar family.
//!
//! Both models are additive: every reported number is the sum of its
//! breakdown fields. Risk is always clamped to 0..=100.

use crate::config::{RiskConfig, ScoringConfig};
use crate::domain::entities::context::Context;
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::{Curvature, Regime};

/// Everything the risk model looks at for one short-leg candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskInputs {
    pub short_dte: u32,
    pub short_gamma: f64,
    /// Nearest eligible expiry.
    pub front_dte: u32,
    pub front_gamma: f64,
    /// Largest gamma across the whole term; used when `front_gamma` is 0.
    pub max_gamma: f64,
    pub regime: Regime,
    pub curvature: Curvature,
    pub squeeze_ratio: f64,
}

impl RiskInputs {
    /// Inputs for a short leg at (`dte`, `gamma`) inside `ctx`, with the
    /// front reference taken from the first eligible expiry.
    pub fn for_candidate(ctx: &Context, policy: &ShortLegPolicy, dte: u32, gamma: f64) -> Self {
        let front = ctx.eligible(policy.min_dte).first().copied();
        Self {
            short_dte: dte,
            short_gamma: gamma,
            front_dte: front.map_or(dte, |p| p.dte),
            front_gamma: front.map_or(0.0, |p| p.gamma),
            max_gamma: ctx.max_gamma(),
            regime: ctx.features.regime,
            curvature: ctx.features.curvature,
            squeeze_ratio: ctx.features.squeeze_ratio,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    scoring: ScoringConfig,
    risk: RiskConfig,
}

impl ScoringEngine {
    pub fn new(scoring: ScoringConfig, risk: RiskConfig) -> Self {
        Self { scoring, risk }
    }

    /// Calendar attractiveness. `hv` fills the reserved hv slot (0 for the
    /// plain calendar). The total is left unclamped.
    pub fn score_calendar(&self, regime: Regime, curvature: Curvature, edge: f64, hv: i32) -> ScoreBreakdown {
        let s = &self.scoring;
        let mut bd = ScoreBreakdown::with_base(s.base);
        bd.regime = match regime {
            Regime::Contango => s.contango,
            Regime::Backwardation => s.backwardation,
            Regime::Flat => 0,
        };
        bd.curvature = if curvature.is_spiky() { s.spiky_front } else { 0 };
        bd.edge = if edge >= s.min_edge {
            s.edge_strong
        } else if edge >= 1.0 {
            s.edge_weak
        } else {
            s.edge_poor
        };
        bd.hv = hv;
        bd
    }

    /// Bucketed hv_rank adjustment used by the HV-aware calendar.
    pub fn hv_points(&self, hv_rank: f64) -> i32 {
        self.scoring.hv.points(hv_rank)
    }

    /// Continuous short-leg risk, clamped to 0..=100.
    pub fn risk(&self, inputs: &RiskInputs) -> RiskBreakdown {
        let r = &self.risk;
        let mut bd = RiskBreakdown::with_base(r.base);

        let d = f64::from(inputs.short_dte);
        let decay = r.dte_scale / (1.0 + (d / r.dte_pivot).powf(r.dte_power));
        let front = if inputs.front_dte <= r.front_critical_dte {
            r.front_critical_penalty
        } else if inputs.front_dte <= r.front_near_dte {
            r.front_near_penalty
        } else {
            0.0
        };
        bd.dte = (decay + front).clamp(0.0, r.dte_cap).round() as i32;

        let denom = if inputs.front_gamma > 0.0 {
            inputs.front_gamma
        } else {
            inputs.max_gamma
        };
        let g_norm = if denom > 0.0 && inputs.short_gamma.is_finite() {
            (inputs.short_gamma / denom).clamp(0.0, r.gamma_ratio_cap)
        } else {
            0.0
        };
        bd.gamma = (r.gamma_scale * g_norm.powf(r.gamma_power))
            .clamp(0.0, r.gamma_scale)
            .round() as i32;

        if inputs.curvature.is_spiky() && r.squeeze_span > 0.0 {
            let ramp = ((inputs.squeeze_ratio - r.squeeze_floor) / r.squeeze_span).clamp(0.0, 1.0);
            bd.curvature = (r.curvature_scale * ramp).clamp(0.0, r.curvature_scale).round() as i32;
        }

        bd.regime = match inputs.regime {
            Regime::Backwardation => r.backwardation,
            Regime::Contango => r.contango,
            Regime::Flat => 0,
        };

        bd.clamped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default(), RiskConfig::default())
    }

    fn inputs() -> RiskInputs {
        RiskInputs {
            short_dte: 21,
            short_gamma: 0.0,
            front_dte: 21,
            front_gamma: 0.0,
            max_gamma: 0.0,
            regime: Regime::Flat,
            curvature: Curvature::Normal,
            squeeze_ratio: 1.0,
        }
    }

    #[test]
    fn test_calendar_components() {
        let bd = engine().score_calendar(Regime::Contango, Curvature::SpikyFront, 1.10, 0);
        assert_eq!((bd.base, bd.regime, bd.curvature, bd.edge, bd.hv), (50, -8, 6, 8, 0));
        assert_eq!(bd.total(), 56);

        let bd = engine().score_calendar(Regime::Backwardation, Curvature::Normal, 1.02, 0);
        assert_eq!(bd.edge, -8);
        assert_eq!(bd.total(), 46);

        let bd = engine().score_calendar(Regime::Flat, Curvature::Normal, 0.9, 4);
        assert_eq!(bd.edge, -14);
        assert_eq!(bd.total(), 40);
    }

    #[test]
    fn test_dte_curve_decays() {
        let e = engine();
        let near = e.risk(&RiskInputs {
            short_dte: 3,
            front_dte: 3,
            ..inputs()
        });
        let far = e.risk(&RiskInputs {
            short_dte: 30,
            front_dte: 30,
            ..inputs()
        });
        assert!(near.dte > far.dte);
        // 26 / (1 + (30/6.5)^1.25) ~= 3.35
        assert_eq!(far.dte, 3);
    }

    #[test]
    fn test_front_caution_adds() {
        let e = engine();
        let calm = e.risk(&RiskInputs {
            short_dte: 10,
            front_dte: 10,
            ..inputs()
        });
        let hot = e.risk(&RiskInputs {
            short_dte: 10,
            front_dte: 1,
            ..inputs()
        });
        assert_eq!(hot.dte - calm.dte, 6);
    }

    #[test]
    fn test_gamma_falls_back_to_max_gamma() {
        let bd = engine().risk(&RiskInputs {
            short_gamma: 0.05,
            front_gamma: 0.0,
            max_gamma: 0.05,
            ..inputs()
        });
        assert_eq!(bd.gamma, 22);
    }

    #[test]
    fn test_curvature_only_when_spiky() {
        let e = engine();
        let normal = e.risk(&RiskInputs {
            squeeze_ratio: 1.8,
            ..inputs()
        });
        assert_eq!(normal.curvature, 0);
        let spiky = e.risk(&RiskInputs {
            squeeze_ratio: 1.45,
            curvature: Curvature::SpikyFront,
            ..inputs()
        });
        assert_eq!(spiky.curvature, 5);
    }

    #[test]
    fn test_risk_sums_and_stays_in_range() {
        let e = engine();
        for dte in [0u32, 1, 2, 5, 9, 14, 30, 90] {
            for regime in [Regime::Contango, Regime::Backwardation, Regime::Flat] {
                for gamma in [0.0, 0.02, 0.1, 1.0] {
                    let bd = e.risk(&RiskInputs {
                        short_dte: dte,
                        short_gamma: gamma,
                        front_dte: dte.min(3),
                        front_gamma: 0.04,
                        max_gamma: 0.1,
                        regime,
                        curvature: Curvature::SpikyFront,
                        squeeze_ratio: 2.0,
                    });
                    let total = bd.total();
                    assert!((0..=100).contains(&total));
                    assert_eq!(total, bd.base + bd.dte + bd.gamma + bd.curvature + bd.regime + bd.penalties);
                }
            }
        }
    }
}
