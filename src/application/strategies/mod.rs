//! Strategy variants and the name/alias registry.
//!
//! Every variant implements [`Strategy`]. Construct one through [`build`],
//! which accepts the canonical name or any alias.

pub mod auto;
pub mod calendar;
pub mod diagonal;
pub mod hv_calendar;
pub mod iron_condor;
pub mod long_gamma;
pub mod vertical_credit;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::entities::blueprint::Blueprint;
use crate::domain::entities::context::{Anchor, Context};
use crate::domain::entities::scan_row::{Recommendation, ScanRow, StrategyDetail};
use crate::domain::error::DomainError;
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
use crate::domain::values::policy::ShortLegPolicy;

/// Canonical names with their accepted aliases.
pub const REGISTRY: &[(&str, &[&str])] = &[
    ("calendar", &["cal"]),
    ("hv_calendar", &["hvcal", "hv"]),
    ("long_gamma", &["gamma", "straddle", "lg"]),
    ("diagonal", &["pmcc", "diag"]),
    ("iron_condor", &["ic", "condor"]),
    ("vertical", &["pcs", "ccs", "credit_spread"]),
    ("auto", &["smart", "default"]),
];

/// Resolve a name or alias (case-insensitive) to its canonical name.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    REGISTRY
        .iter()
        .find(|(canonical, aliases)| *canonical == key || aliases.contains(&key.as_str()))
        .map(|(canonical, _)| *canonical)
}

pub fn build(name: &str, config: Arc<AppConfig>, policy: ShortLegPolicy) -> Result<Box<dyn Strategy>, DomainError> {
    let Some(canonical) = canonical_name(name) else {
        let known: Vec<&str> = REGISTRY.iter().map(|(n, _)| *n).collect();
        return Err(DomainError::InvalidInput(format!(
            "Unknown strategy '{name}'. Available: {}",
            known.join(", ")
        )));
    };

    let strategy: Box<dyn Strategy> = match canonical {
        "calendar" => Box::new(calendar::CalendarStrategy::new(config, policy)),
        "hv_calendar" => Box::new(hv_calendar::HvCalendarStrategy::new(config, policy)),
        "long_gamma" => Box::new(long_gamma::LongGammaStrategy::new(config, policy)),
        "diagonal" => Box::new(diagonal::DiagonalStrategy::new(config, policy)),
        "iron_condor" => Box::new(iron_condor::IronCondorStrategy::new(config, policy)),
        "vertical" => Box::new(vertical_credit::VerticalCreditStrategy::new(config, policy)),
        _ => Box::new(auto::AutoStrategy::new(config, policy)),
    };
    Ok(strategy)
}

/// Row whose short leg sits on `anchor`; totals come from the breakdowns.
pub(crate) fn row_at(
    ctx: &Context,
    anchor: &Anchor,
    tag: String,
    score: ScoreBreakdown,
    risk: RiskBreakdown,
    detail: StrategyDetail,
) -> ScanRow {
    let f = &ctx.features;
    ScanRow {
        symbol: ctx.symbol.clone(),
        price: ctx.price,
        short_exp: anchor.exp.clone(),
        short_dte: anchor.dte,
        short_iv: anchor.iv,
        base_iv: f.base_iv,
        edge: f.edge,
        hv_rank: ctx.hv.hv_rank,
        regime: f.regime,
        curvature: f.curvature,
        tag,
        cal_score: score.total(),
        short_risk: risk.total(),
        score_breakdown: score,
        risk_breakdown: risk,
        detail,
        blueprint: None,
        recommendation: None,
        probe_summary: String::new(),
    }
}

/// A `*-FAIL` row: score 0, risk 99, and a failed blueprint carrying `reason`.
pub(crate) fn failed_row(ctx: &Context, tag: &str, structure: &str, reason: impl Into<String>) -> ScanRow {
    let reason = reason.into();
    let mut row = row_at(
        ctx,
        &ctx.features.short,
        tag.to_string(),
        ScoreBreakdown::default(),
        RiskBreakdown::with_base(99),
        StrategyDetail::Failed { reason: reason.clone() },
    );
    row.edge = 0.0;
    row.blueprint = Some(Blueprint::failed(&ctx.symbol, structure, reason));
    row
}

/// Recommendation for strategies that trade one fixed structure: the row
/// itself, when it clears both thresholds and its structure was built.
pub(crate) fn recommend_row(ctx: &Context, policy: &ShortLegPolicy, row: ScanRow, min_score: i32, max_risk: i32) -> ProbeOutcome {
    if row.cal_score < min_score {
        return ProbeOutcome {
            recommendation: None,
            summary: "Score too low".into(),
        };
    }
    if row.has_failed_structure() || row.blueprint.is_none() {
        return ProbeOutcome {
            recommendation: None,
            summary: "Structure build failed".into(),
        };
    }
    if row.short_risk > max_risk {
        return ProbeOutcome {
            recommendation: None,
            summary: "Risk too high".into(),
        };
    }

    let rank = ctx
        .eligible(policy.min_dte)
        .iter()
        .position(|p| p.exp == row.short_exp)
        .unwrap_or(0);
    let rec = Recommendation {
        rank,
        exp: row.short_exp,
        dte: row.short_dte,
        iv: row.short_iv,
        edge: row.edge,
        score: row.cal_score,
        risk: row.short_risk,
        tag: row.tag,
        score_breakdown: row.score_breakdown,
        risk_breakdown: row.risk_breakdown,
        squeeze_ratio: ctx.features.squeeze_ratio,
    };
    ProbeOutcome {
        summary: rec.summary("ok"),
        recommendation: Some(rec),
    }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
