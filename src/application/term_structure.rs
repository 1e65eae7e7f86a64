//! Anchor selection over an implied-volatility term structure.
//!
//! Picks four reference expiries from a dte-ordered [`TermPoint`] set:
//!
//! - **nearest**: first expiry with dte >= 1, independent of policy
//! - **short**: policy-ranked short leg inside the front window
//! - **micro**: the near-term volatility spike (local maximum, else momentum)
//! - **month**: a stable ~35 day reference chosen by local smoothness
//!
//! and derives regime, curvature and edge ratios from them. Everything here is
//! a pure function of the term set, the policy and [`AnchorConfig`].

use std::cmp::Ordering;

use crate::config::AnchorConfig;
use crate::domain::entities::context::{Anchor, TsFeatures};
use crate::domain::entities::term_point::TermPoint;
use crate::domain::error::TermStructureError;
use crate::domain::values::expiry::is_standard_monthly;
use crate::domain::values::policy::ShortLegPolicy;
use crate::domain::values::regime::{Curvature, Regime};

pub struct AnchorSelector {
    cfg: AnchorConfig,
}

impl AnchorSelector {
    pub fn new(cfg: AnchorConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &AnchorConfig {
        &self.cfg
    }

    /// Select all anchors and derive the feature set.
    ///
    /// Fails only when the term set is empty or no expiry reaches
    /// `policy.min_dte`; every other gap downgrades to a documented fallback.
    pub fn select(&self, term: &[TermPoint], policy: &ShortLegPolicy) -> Result<TsFeatures, TermStructureError> {
        if term.is_empty() {
            return Err(TermStructureError::EmptyTermStructure);
        }
        let mut ordered: Vec<&TermPoint> = term.iter().collect();
        ordered.sort_by_key(|p| p.dte);

        if !ordered.iter().any(|p| p.dte >= policy.min_dte) {
            return Err(TermStructureError::NoEligibleExpiries { min_dte: policy.min_dte });
        }

        let nearest = nearest_point(&ordered);
        let short = self.short_point(&ordered, policy).unwrap_or(nearest);
        let base_iv = self.base_iv(&ordered, short.iv);
        let micro = self.micro_point(&ordered, nearest).unwrap_or(short);
        let month = self.month_point(&ordered);

        let cfg = &self.cfg;
        let regime = Regime::classify(short.iv, month.iv, cfg.regime_ratio);
        let curvature = Curvature::classify(micro.iv, short.iv, cfg.spike_ratio);
        let denom = cfg.iv_floor.max(short.iv);

        Ok(TsFeatures {
            regime,
            curvature,
            nearest: Anchor::from(nearest),
            short: Anchor::from(short),
            micro: Anchor::from(micro),
            month: Anchor::from(month),
            base_iv,
            edge: ratio(short.iv, base_iv),
            edge_micro: (micro.iv - short.iv) / denom,
            edge_month: (month.iv - short.iv) / denom,
            squeeze_ratio: ratio(micro.iv, base_iv),
            front_rich: nearest.iv > short.iv * cfg.front_rich_ratio,
        })
    }

    /// Policy-ranked point inside the eligible front window; the last one when
    /// the window is shorter than the rank.
    fn short_point<'a>(&self, ordered: &[&'a TermPoint], policy: &ShortLegPolicy) -> Option<&'a TermPoint> {
        let pool: Vec<&TermPoint> = ordered
            .iter()
            .copied()
            .filter(|p| p.dte >= policy.min_dte)
            .filter(|p| (self.cfg.short_min_dte..=self.cfg.short_max_dte).contains(&p.dte))
            .collect();
        let last = pool.last().copied()?;
        Some(pool.get(policy.base_rank).copied().unwrap_or(last))
    }

    /// Mean iv over the base window, ignoring non-positive samples.
    fn base_iv(&self, ordered: &[&TermPoint], fallback: f64) -> f64 {
        let ivs: Vec<f64> = ordered
            .iter()
            .filter(|p| (self.cfg.base_iv_min_dte..=self.cfg.base_iv_max_dte).contains(&p.dte) && p.iv > 0.0)
            .map(|p| p.iv)
            .collect();
        if ivs.is_empty() {
            return fallback;
        }
        ivs.iter().sum::<f64>() / ivs.len() as f64
    }

    /// Highest strict local maximum in the micro window. Without one, the point
    /// with the best `(iv - nearest.iv) / sqrt(max(1, dte))`. `None` when the
    /// window holds fewer than two points.
    ///
    /// A local maximum always wins over the momentum pick, even when its
    /// momentum is lower.
    fn micro_point<'a>(&self, ordered: &[&'a TermPoint], nearest: &TermPoint) -> Option<&'a TermPoint> {
        let pool: Vec<&TermPoint> = ordered
            .iter()
            .copied()
            .filter(|p| (self.cfg.micro_min_dte..=self.cfg.micro_max_dte).contains(&p.dte))
            .collect();
        if pool.len() < 2 {
            return None;
        }

        let maxima = pool
            .windows(3)
            .filter(|w| w[1].iv > w[0].iv && w[1].iv > w[2].iv)
            .map(|w| w[1]);
        if let Some(best) = max_by_f64(maxima, |p| p.iv) {
            return Some(best);
        }

        let momentum = |p: &&TermPoint| (p.iv - nearest.iv) / f64::from(p.dte.max(1)).sqrt();
        max_by_f64(pool.iter().copied(), |p| momentum(&p))
    }

    /// Smoothest interior point of the month window, penalised by distance
    /// from the target dte. Standard monthlies win inside the top-N cut.
    fn month_point<'a>(&self, ordered: &[&'a TermPoint]) -> &'a TermPoint {
        let cfg = &self.cfg;
        let window = |hi: u32| -> Vec<&'a TermPoint> {
            ordered
                .iter()
                .copied()
                .filter(|p| (cfg.month_min_dte..=hi).contains(&p.dte))
                .collect()
        };

        let mut pool = window(cfg.month_max_dte);
        if pool.len() < cfg.month_min_pool {
            pool = window(cfg.month_wide_max_dte);
        }
        if pool.len() < cfg.month_min_pool.max(3) {
            return self.month_fallback(ordered);
        }

        let target = cfg.month_target_dte.max(1.0);
        let mut scored: Vec<(f64, &TermPoint)> = pool
            .windows(3)
            .map(|w| {
                let sd = population_std(&[w[0].iv, w[1].iv, w[2].iv]);
                let dist = (f64::from(w[1].dte) - cfg.month_target_dte).abs() / target;
                (sd + cfg.month_lambda * dist, w[1])
            })
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        scored.truncate(cfg.month_top_n.max(1));

        if cfg.prefer_monthly {
            if let Some((_, p)) = scored.iter().find(|(_, p)| is_standard_monthly(&p.exp)) {
                return *p;
            }
        }
        scored[0].1
    }

    /// Closest to the fallback target among points with dte >= the fallback
    /// minimum, else the last point of the whole set.
    fn month_fallback<'a>(&self, ordered: &[&'a TermPoint]) -> &'a TermPoint {
        let cfg = &self.cfg;
        ordered
            .iter()
            .copied()
            .filter(|p| p.dte >= cfg.month_fallback_min_dte)
            .min_by_key(|p| p.dte.abs_diff(cfg.month_fallback_target_dte))
            .unwrap_or_else(|| ordered[ordered.len() - 1])
    }
}

fn nearest_point<'a>(ordered: &[&'a TermPoint]) -> &'a TermPoint {
    ordered.iter().copied().find(|p| p.dte >= 1).unwrap_or(ordered[0])
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// First maximum wins on ties.
fn max_by_f64<'a, I, F>(items: I, key: F) -> Option<&'a TermPoint>
where
    I: Iterator<Item = &'a TermPoint>,
    F: Fn(&'a TermPoint) -> f64,
{
    let mut best: Option<(f64, &TermPoint)> = None;
    for p in items {
        let k = key(p);
        if best.map_or(true, |(bk, _)| k > bk) {
            best = Some((k, p));
        }
    }
    best.map(|(_, p)| p)
}

pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
