//! Historical volatility: 20-session rolling standard deviation of daily log
//! returns, annualised, ranked inside its trailing one-year range.
//!
//! Results are cached per symbol for one calendar day.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::entities::hv_info::HvInfo;
use crate::domain::ports::hv_cache::HvCache;
use crate::domain::ports::market_data::MarketData;

pub const HV_WINDOW: usize = 20;
pub const TRADING_DAYS: usize = 252;

/// Rolling annualised HV series (percentage scale) over `closes`.
pub fn rolling_hv(closes: &[f64]) -> Vec<f64> {
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect();

    let annualise = (TRADING_DAYS as f64).sqrt() * 100.0;
    returns
        .windows(HV_WINDOW)
        .map(|w| sample_std(w) * annualise)
        .collect()
}

/// Current HV and its rank inside the last [`TRADING_DAYS`] values.
/// A flat range ranks 0.
pub fn compute_hv(closes: &[f64]) -> HvInfo {
    let series = rolling_hv(closes);
    let Some(&current) = series.last() else {
        return HvInfo::error(format!(
            "need at least {} closes, got {}",
            HV_WINDOW + 1,
            closes.len()
        ));
    };

    let recent = &series[series.len().saturating_sub(TRADING_DAYS)..];
    let low = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let high = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rank = if high > low {
        (current - low) / (high - low) * 100.0
    } else {
        0.0
    };
    HvInfo::success(current, rank, low, high)
}

fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Cache-first HV lookup.
pub struct HvService {
    market: Arc<dyn MarketData>,
    cache: Arc<dyn HvCache>,
    lookback_days: u32,
}

impl HvService {
    pub fn new(market: Arc<dyn MarketData>, cache: Arc<dyn HvCache>, lookback_days: u32) -> Self {
        Self {
            market,
            cache,
            lookback_days,
        }
    }

    /// HV for `symbol` as of `today`. Failures come back as an `Error`
    /// status and are cached too, so a bad symbol is not re-fetched all day.
    pub async fn get(&self, symbol: &str, today: NaiveDate) -> HvInfo {
        match self.cache.get(symbol, today) {
            Ok(Some(hit)) => return hit,
            Ok(None) => {}
            Err(e) => tracing::warn!(symbol, error = %e, "hv cache read failed"),
        }

        let info = match self.market.daily_closes(symbol, self.lookback_days).await {
            Ok(bars) => {
                let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
                compute_hv(&closes)
            }
            Err(e) => {
                tracing::warn!(symbol, error = %e, "price history unavailable");
                HvInfo::error(e.to_string())
            }
        };

        if let Err(e) = self.cache.put(symbol, today, &info) {
            tracing::warn!(symbol, error = %e, "hv cache write failed");
        }
        info
    }
}
