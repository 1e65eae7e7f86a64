use rusqlite::Connection;

use crate::domain::error::DomainError;

/// batches -> snapshots -> plans, one-to-many at each step.
pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scan_batches (
            batch_id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp TEXT NOT NULL,
            strategy_name TEXT NOT NULL,
            market_vix REAL,
            universe_size INTEGER NOT NULL DEFAULT 0,
            avg_abs_edge REAL NOT NULL DEFAULT 0,
            cheap_vol_pct REAL NOT NULL DEFAULT 0,
            elapsed_time REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS market_snapshots (
            snapshot_id INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_id INTEGER NOT NULL REFERENCES scan_batches(batch_id),
            symbol TEXT NOT NULL,
            price REAL NOT NULL,
            short_exp TEXT,
            short_dte INTEGER,
            iv_short REAL,
            iv_base REAL,
            edge REAL,
            hv_rank REAL,
            regime TEXT,
            curvature TEXT,
            context_json TEXT
        );

        CREATE TABLE IF NOT EXISTS trade_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            snapshot_id INTEGER NOT NULL REFERENCES market_snapshots(snapshot_id),
            strategy_type TEXT NOT NULL,
            tag TEXT,
            cal_score INTEGER NOT NULL,
            short_risk INTEGER NOT NULL,
            gate_status TEXT NOT NULL,
            total_gamma REAL NOT NULL DEFAULT 0,
            est_debit REAL NOT NULL DEFAULT 0,
            error_msg TEXT,
            blueprint_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_snapshots_symbol ON market_snapshots(symbol, batch_id);
        CREATE INDEX IF NOT EXISTS idx_plans_snapshot ON trade_plans(snapshot_id);
        CREATE INDEX IF NOT EXISTS idx_plans_gate ON trade_plans(gate_status);
        ",
    )
    .map_err(|e| DomainError::Database(format!("Migration failed: {e}")))
}
