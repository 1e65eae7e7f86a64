use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::blueprint::Blueprint;
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::ScanRow;
use crate::domain::error::DomainError;
use crate::domain::values::gate::Gate;

/// Header of one scan batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScanBatch {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub strategy: String,
    pub market_vix: Option<f64>,
    pub universe_size: usize,
    pub avg_abs_edge: f64,
    /// Percentage of rows with edge below 1.0.
    pub cheap_vol_pct: f64,
    pub elapsed_secs: f64,
}

/// Per-symbol payload persisted inside a batch: one snapshot plus at most one
/// plan.
pub struct ScanRecord<'a> {
    pub row: &'a ScanRow,
    pub context: &'a Context,
    pub gate: Gate,
}

/// Change of short-leg iv between the latest batch and an older one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvDrift {
    pub symbol: String,
    pub current_iv: f64,
    pub previous_iv: f64,
    pub drift: f64,
    pub current_batch: i64,
    pub previous_batch: i64,
}

pub trait ScanRepository: Send + Sync {
    /// Insert the batch header, then every record; returns the new batch id.
    fn save_batch(&self, batch: &ScanBatch, records: &[ScanRecord<'_>]) -> Result<i64, DomainError>;

    /// Drift of `symbol`'s short iv between its latest snapshot and the one
    /// `lookback` batches earlier. `None` when history is too short.
    fn iv_drift(&self, symbol: &str, lookback: usize) -> Result<Option<IvDrift>, DomainError>;

    /// Most recent EXEC/LIMIT plan without a build error.
    fn latest_accepted_blueprint(&self, symbol: &str) -> Result<Option<(Blueprint, Gate)>, DomainError>;

    fn batch_count(&self) -> Result<usize, DomainError>;
}
