use chrono::NaiveDate;

use crate::domain::entities::hv_info::HvInfo;
use crate::domain::error::DomainError;

/// Per-symbol, per-calendar-day store of HV snapshots.
pub trait HvCache: Send + Sync {
    /// The cached value for `symbol`, only if it was stored on `today`.
    fn get(&self, symbol: &str, today: NaiveDate) -> Result<Option<HvInfo>, DomainError>;

    fn put(&self, symbol: &str, today: NaiveDate, info: &HvInfo) -> Result<(), DomainError>;
}
