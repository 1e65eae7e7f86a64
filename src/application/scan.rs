//! Scan use case: walk the ticker universe, build a context per symbol, score
//! it with one strategy, probe watch candidates and sort the survivors into
//! strict / auto-adjusted / watch buckets.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::application::context_builder::ContextBuilder;
use crate::application::hv::HvService;
use crate::application::strategies;
use crate::application::term_structure::AnchorSelector;
use crate::config::AppConfig;
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::ScanRow;
use crate::domain::error::DomainError;
use crate::domain::ports::hv_cache::HvCache;
use crate::domain::ports::market_data::MarketData;
use crate::domain::ports::scan_repository::{ScanBatch, ScanRecord, ScanRepository};
use crate::domain::values::gate::Gate;
use crate::domain::values::policy::ShortLegPolicy;

/// Parameters of one scan run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub strategy: String,
    pub days: u32,
    pub min_score: i32,
    pub max_risk: i32,
    /// Only the first `limit` tickers; 0 scans all.
    pub limit: usize,
    pub policy: ShortLegPolicy,
    pub save: bool,
    pub today: NaiveDate,
}

impl ScanOptions {
    /// Defaults taken from the loaded configuration.
    pub fn from_config(cfg: &AppConfig, strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            days: cfg.scan.days,
            min_score: cfg.scan.min_score,
            max_risk: cfg.scan.max_risk,
            limit: 0,
            policy: cfg.policy,
            save: true,
            today: chrono::Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SymbolError {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatedRow {
    pub gate: Gate,
    #[serde(flatten)]
    pub row: ScanRow,
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub strategy: String,
    pub scanned_at: chrono::DateTime<Utc>,
    pub days: u32,
    pub min_score: i32,
    pub max_risk: i32,
    pub universe_size: usize,
    pub market_vix: Option<f64>,
    pub avg_abs_edge: f64,
    pub cheap_vol_pct: f64,
    pub elapsed_secs: f64,
    pub batch_id: Option<i64>,
    pub strict: Vec<ScanRow>,
    pub auto_adjusted: Vec<ScanRow>,
    pub watch: Vec<ScanRow>,
    /// Every evaluated row, best first, with its gate.
    pub top: Vec<GatedRow>,
    pub errors: Vec<SymbolError>,
}

/// EXEC when the row clears both thresholds, LIMIT when the prober rescued
/// it, WAIT when only risk is over the cap. Failed structures and low scores
/// are FORBID.
pub fn gate_for(row: &ScanRow, min_score: i32, max_risk: i32) -> Gate {
    if row.has_failed_structure() || row.cal_score < min_score {
        Gate::Forbid
    } else if row.short_risk <= max_risk {
        Gate::Exec
    } else if row.recommendation.is_some() {
        Gate::Limit
    } else {
        Gate::Wait
    }
}

fn by_row(a: &ScanRow, b: &ScanRow) -> Ordering {
    b.cal_score
        .cmp(&a.cal_score)
        .then(b.edge.partial_cmp(&a.edge).unwrap_or(Ordering::Equal))
        .then(a.short_risk.cmp(&b.short_risk))
}

fn by_recommendation(a: &ScanRow, b: &ScanRow) -> Ordering {
    let key = |r: &ScanRow| {
        r.recommendation
            .as_ref()
            .map_or((0, 0.0, 100), |rec| (rec.score, rec.edge, rec.risk))
    };
    let (sa, ea, ra) = key(a);
    let (sb, eb, rb) = key(b);
    sb.cmp(&sa)
        .then(eb.partial_cmp(&ea).unwrap_or(Ordering::Equal))
        .then(ra.cmp(&rb))
}

/// Mean |edge| and the share (percent) of rows with edge below 1.0.
pub fn batch_stats(rows: &[ScanRow]) -> (f64, f64) {
    if rows.is_empty() {
        return (0.0, 0.0);
    }
    let n = rows.len() as f64;
    let avg = rows.iter().map(|r| r.edge.abs()).sum::<f64>() / n;
    let cheap = rows.iter().filter(|r| r.edge < 1.0).count() as f64 / n * 100.0;
    (avg, cheap)
}

pub struct ScanUseCase {
    market: Arc<dyn MarketData>,
    cache: Arc<dyn HvCache>,
    repo: Option<Arc<dyn ScanRepository>>,
    config: Arc<AppConfig>,
}

impl ScanUseCase {
    pub fn new(
        market: Arc<dyn MarketData>,
        cache: Arc<dyn HvCache>,
        repo: Option<Arc<dyn ScanRepository>>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            market,
            cache,
            repo,
            config,
        }
    }

    pub async fn execute(&self, symbols: &[String], opts: &ScanOptions) -> Result<ScanReport, DomainError> {
        let started = Instant::now();
        let strategy = strategies::build(&opts.strategy, self.config.clone(), opts.policy)?;

        let mut scan_cfg = self.config.scan.clone();
        scan_cfg.days = opts.days;
        let builder = ContextBuilder::new(
            self.market.clone(),
            HvService::new(self.market.clone(), self.cache.clone(), scan_cfg.hv_lookback_days),
            AnchorSelector::new(self.config.anchors.clone()),
            scan_cfg,
            opts.policy,
        );

        let universe: Vec<&String> = if opts.limit > 0 {
            symbols.iter().take(opts.limit).collect()
        } else {
            symbols.iter().collect()
        };
        tracing::info!(strategy = strategy.name(), symbols = universe.len(), days = opts.days, "scan started");

        let market_vix = self.market_vix().await;

        let mut evaluated: Vec<(ScanRow, Context)> = Vec::new();
        let mut errors = Vec::new();
        for symbol in universe {
            match builder.build(symbol, opts.today).await {
                Ok(ctx) => {
                    let row = strategy.evaluate(&ctx);
                    tracing::debug!(symbol = %symbol, row = %row, "evaluated");
                    evaluated.push((row, ctx));
                }
                Err(e) => {
                    tracing::warn!(symbol = %symbol, error = %e, "symbol skipped");
                    errors.push(SymbolError {
                        symbol: symbol.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        for (row, ctx) in evaluated.iter_mut() {
            let watch = row.cal_score >= opts.min_score && row.short_risk > opts.max_risk && !row.has_failed_structure();
            if watch {
                let outcome = strategy.recommend(ctx, opts.min_score, opts.max_risk);
                row.recommendation = outcome.recommendation;
                row.probe_summary = outcome.summary;
            }
        }

        let gates: Vec<Gate> = evaluated
            .iter()
            .map(|(row, _)| gate_for(row, opts.min_score, opts.max_risk))
            .collect();

        let rows: Vec<ScanRow> = evaluated.iter().map(|(r, _)| r.clone()).collect();
        let (avg_abs_edge, cheap_vol_pct) = batch_stats(&rows);
        let elapsed_secs = started.elapsed().as_secs_f64();
        let scanned_at = Utc::now();

        let batch_id = match (&self.repo, opts.save) {
            (Some(repo), true) => {
                let batch = ScanBatch {
                    id: 0,
                    timestamp: scanned_at,
                    strategy: strategy.name().to_string(),
                    market_vix,
                    universe_size: rows.len(),
                    avg_abs_edge,
                    cheap_vol_pct,
                    elapsed_secs,
                };
                let records: Vec<ScanRecord<'_>> = evaluated
                    .iter()
                    .zip(&gates)
                    .map(|((row, context), gate)| ScanRecord {
                        row,
                        context,
                        gate: *gate,
                    })
                    .collect();
                let id = repo.save_batch(&batch, &records)?;
                tracing::info!(batch_id = id, rows = records.len(), "scan batch saved");
                Some(id)
            }
            _ => None,
        };

        let mut strict = Vec::new();
        let mut auto_adjusted = Vec::new();
        let mut watch = Vec::new();
        for (row, gate) in rows.iter().zip(&gates) {
            match gate {
                Gate::Exec => strict.push(row.clone()),
                Gate::Limit => auto_adjusted.push(row.clone()),
                Gate::Wait => watch.push(row.clone()),
                Gate::Forbid => {}
            }
        }
        strict.sort_by(by_row);
        auto_adjusted.sort_by(by_recommendation);
        watch.sort_by(by_row);

        let mut top: Vec<GatedRow> = rows
            .into_iter()
            .zip(gates)
            .map(|(row, gate)| GatedRow { gate, row })
            .collect();
        top.sort_by(|a, b| by_row(&a.row, &b.row));

        tracing::info!(
            strict = strict.len(),
            auto_adjusted = auto_adjusted.len(),
            watch = watch.len(),
            errors = errors.len(),
            elapsed_secs,
            "scan finished"
        );

        Ok(ScanReport {
            strategy: strategy.name().to_string(),
            scanned_at,
            days: opts.days,
            min_score: opts.min_score,
            max_risk: opts.max_risk,
            universe_size: top.len(),
            market_vix,
            avg_abs_edge,
            cheap_vol_pct,
            elapsed_secs,
            batch_id,
            strict,
            auto_adjusted,
            watch,
            top,
            errors,
        })
    }

    async fn market_vix(&self) -> Option<f64> {
        let symbol = self.config.scan.vix_symbol.trim();
        if symbol.is_empty() {
            return None;
        }
        match self.market.quote_price(symbol).await {
            Ok(v) if v.is_finite() && v > 0.0 => Some(v),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(symbol, error = %e, "vix unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::blueprint::Blueprint;
    use crate::domain::entities::scan_row::{Recommendation, StrategyDetail};
    use crate::domain::values::breakdown::{RiskBreakdown, ScoreBreakdown};
    use crate::domain::values::regime::{Curvature, Regime};

    fn row(symbol: &str, score: i32, risk: i32, edge: f64) -> ScanRow {
        ScanRow {
            symbol: symbol.into(),
            price: 100.0,
            short_exp: "2025-01-17".into(),
            short_dte: 10,
            short_iv: 30.0,
            base_iv: 30.0,
            edge,
            hv_rank: 50.0,
            regime: Regime::Flat,
            curvature: Curvature::Normal,
            tag: "FN".into(),
            cal_score: score,
            short_risk: risk,
            score_breakdown: ScoreBreakdown::with_base(score),
            risk_breakdown: RiskBreakdown::with_base(risk),
            detail: StrategyDetail::Calendar { squeeze_ratio: 1.0 },
            blueprint: None,
            recommendation: None,
            probe_summary: String::new(),
        }
    }

    fn rec(score: i32, risk: i32) -> Recommendation {
        Recommendation {
            rank: 2,
            exp: "2025-01-24".into(),
            dte: 17,
            iv: 30.0,
            edge: 1.1,
            score,
            risk,
            tag: "FN".into(),
            score_breakdown: ScoreBreakdown::with_base(score),
            risk_breakdown: RiskBreakdown::with_base(risk),
            squeeze_ratio: 1.0,
        }
    }

    #[test]
    fn test_gate_ladder() {
        assert_eq!(gate_for(&row("A", 70, 50, 1.0), 60, 70), Gate::Exec);
        assert_eq!(gate_for(&row("A", 70, 70, 1.0), 60, 70), Gate::Exec);
        assert_eq!(gate_for(&row("A", 70, 71, 1.0), 60, 70), Gate::Wait);
        assert_eq!(gate_for(&row("A", 59, 10, 1.0), 60, 70), Gate::Forbid);

        let mut rescued = row("A", 70, 90, 1.0);
        rescued.recommendation = Some(rec(65, 60));
        assert_eq!(gate_for(&rescued, 60, 70), Gate::Limit);
    }

    #[test]
    fn test_failed_structure_is_forbidden() {
        let mut r = row("A", 90, 10, 1.0);
        r.blueprint = Some(Blueprint::failed("A", "DIAGONAL", "missing quotes"));
        assert_eq!(gate_for(&r, 60, 70), Gate::Forbid);
    }

    #[test]
    fn test_sort_by_score_then_edge_then_risk() {
        let mut rows = vec![
            row("LOW", 60, 10, 2.0),
            row("EDGE", 80, 50, 1.2),
            row("SAFE", 80, 20, 1.2),
            row("TOP", 90, 90, 0.5),
            row("RICH", 80, 10, 1.5),
        ];
        rows.sort_by(by_row);
        let order: Vec<&str> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["TOP", "RICH", "SAFE", "EDGE", "LOW"]);
    }

    #[test]
    fn test_recommendation_sort_uses_rec_values() {
        let mut a = row("A", 95, 95, 1.0);
        a.recommendation = Some(rec(62, 65));
        let mut b = row("B", 61, 95, 1.0);
        b.recommendation = Some(rec(75, 40));
        let mut rows = vec![a, b];
        rows.sort_by(by_recommendation);
        assert_eq!(rows[0].symbol, "B");
    }

    #[test]
    fn test_batch_stats() {
        let rows = vec![row("A", 1, 1, 0.8), row("B", 1, 1, 1.2), row("C", 1, 1, -0.5), row("D", 1, 1, 1.5)];
        let (avg, cheap) = batch_stats(&rows);
        assert!((avg - 1.0).abs() < 1e-9);
        assert!((cheap - 50.0).abs() < 1e-9);
        assert_eq!(batch_stats(&[]), (0.0, 0.0));
    }
}
