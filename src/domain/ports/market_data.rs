use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::error::DomainError;
use crate::domain::values::chain::OptionChain;

/// One daily bar; only the close is consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Quote / chain / price-history collaborator.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Last traded (or mark) price of the underlying.
    async fn quote_price(&self, symbol: &str) -> Result<f64, DomainError>;

    /// Full option chain for expirations in `[from, to]`.
    async fn option_chain(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<OptionChain, DomainError>;

    /// Daily closes, oldest first, covering roughly `lookback_days`.
    async fn daily_closes(&self, symbol: &str, lookback_days: u32) -> Result<Vec<DailyClose>, DomainError>;
}
