use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::entities::blueprint::Blueprint;
use crate::domain::error::DomainError;
use crate::domain::ports::scan_repository::*;
use crate::domain::values::gate::Gate;

pub struct SqliteScanRepo {
    conn: Mutex<Connection>,
}

impl SqliteScanRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn.lock().map_err(|e| DomainError::Database(e.to_string()))
    }
}

impl ScanRepository for SqliteScanRepo {
    fn save_batch(&self, batch: &ScanBatch, records: &[ScanRecord<'_>]) -> Result<i64, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO scan_batches (timestamp, strategy_name, market_vix, universe_size, avg_abs_edge, cheap_vol_pct, elapsed_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                batch.timestamp.to_rfc3339(),
                batch.strategy,
                batch.market_vix,
                batch.universe_size as i64,
                batch.avg_abs_edge,
                batch.cheap_vol_pct,
                batch.elapsed_secs,
            ],
        )
        .map_err(|e| DomainError::Database(format!("Failed to insert batch: {e}")))?;
        let batch_id = tx.last_insert_rowid();

        for rec in records {
            let row = rec.row;
            let context_json =
                serde_json::to_string(rec.context).map_err(|e| DomainError::Parse(format!("context json: {e}")))?;
            tx.execute(
                "INSERT INTO market_snapshots (batch_id, symbol, price, short_exp, short_dte, iv_short, iv_base, edge, hv_rank, regime, curvature, context_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    batch_id,
                    row.symbol,
                    row.price,
                    row.short_exp,
                    row.short_dte,
                    row.short_iv,
                    row.base_iv,
                    row.edge,
                    row.hv_rank,
                    row.regime.to_string(),
                    row.curvature.to_string(),
                    context_json,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to insert snapshot for {}: {e}", row.symbol)))?;
            let snapshot_id = tx.last_insert_rowid();

            let (strategy_type, est_debit, error_msg, blueprint_json) = match &row.blueprint {
                Some(bp) => (
                    bp.strategy.clone(),
                    bp.est_debit,
                    bp.error.clone(),
                    Some(serde_json::to_string(bp).map_err(|e| DomainError::Parse(format!("blueprint json: {e}")))?),
                ),
                None => ("NONE".to_string(), 0.0, None, None),
            };
            tx.execute(
                "INSERT INTO trade_plans (snapshot_id, strategy_type, tag, cal_score, short_risk, gate_status, total_gamma, est_debit, error_msg, blueprint_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    snapshot_id,
                    strategy_type,
                    row.tag,
                    row.cal_score,
                    row.short_risk,
                    rec.gate.to_string(),
                    row.detail.est_gamma(),
                    est_debit,
                    error_msg,
                    blueprint_json,
                ],
            )
            .map_err(|e| DomainError::Database(format!("Failed to insert plan for {}: {e}", row.symbol)))?;
        }

        tx.commit()?;
        Ok(batch_id)
    }

    fn iv_drift(&self, symbol: &str, lookback: usize) -> Result<Option<IvDrift>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT batch_id, iv_short FROM market_snapshots
             WHERE symbol = ?1 AND iv_short IS NOT NULL
             ORDER BY batch_id DESC, snapshot_id DESC
             LIMIT ?2",
        )?;
        let history: Vec<(i64, f64)> = stmt
            .query_map(params![symbol, (lookback + 1) as i64], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<_, _>>()?;

        let (Some(&(current_batch, current_iv)), Some(&(previous_batch, previous_iv))) =
            (history.first(), history.get(lookback))
        else {
            return Ok(None);
        };
        Ok(Some(IvDrift {
            symbol: symbol.to_string(),
            current_iv,
            previous_iv,
            drift: current_iv - previous_iv,
            current_batch,
            previous_batch,
        }))
    }

    fn latest_accepted_blueprint(&self, symbol: &str) -> Result<Option<(Blueprint, Gate)>, DomainError> {
        let conn = self.lock()?;
        let found: Option<(String, String)> = conn
            .query_row(
                "SELECT p.blueprint_json, p.gate_status
                 FROM trade_plans p JOIN market_snapshots s ON s.snapshot_id = p.snapshot_id
                 WHERE s.symbol = ?1
                   AND p.gate_status IN ('EXEC', 'LIMIT')
                   AND p.error_msg IS NULL
                   AND p.blueprint_json IS NOT NULL
                 ORDER BY p.id DESC
                 LIMIT 1",
                params![symbol],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let Some((json, gate)) = found else {
            return Ok(None);
        };
        let bp: Blueprint =
            serde_json::from_str(&json).map_err(|e| DomainError::Parse(format!("stored blueprint for {symbol}: {e}")))?;
        let gate: Gate = gate.parse().map_err(DomainError::Parse)?;
        Ok(Some((bp, gate)))
    }

    fn batch_count(&self) -> Result<usize, DomainError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM scan_batches", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}
