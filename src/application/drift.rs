use std::sync::Arc;

use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::ports::scan_repository::{IvDrift, ScanRepository};

#[derive(Debug, Serialize)]
pub struct DriftReport {
    pub symbol: String,
    pub lookback: usize,
    pub batches_on_record: usize,
    pub drift: Option<IvDrift>,
}

/// Short-leg iv change across persisted scan batches.
pub struct DriftUseCase {
    repo: Arc<dyn ScanRepository>,
}

impl DriftUseCase {
    pub fn new(repo: Arc<dyn ScanRepository>) -> Self {
        Self { repo }
    }

    pub fn execute(&self, symbol: &str, lookback: usize) -> Result<DriftReport, DomainError> {
        if lookback == 0 {
            return Err(DomainError::InvalidInput("lookback must be at least 1".into()));
        }
        let symbol = symbol.trim().to_uppercase();
        let drift = self.repo.iv_drift(&symbol, lookback)?;
        if drift.is_none() {
            tracing::info!(symbol = %symbol, lookback, "not enough history for drift");
        }
        Ok(DriftReport {
            batches_on_record: self.repo.batch_count()?,
            symbol,
            lookback,
            drift,
        })
    }
}
