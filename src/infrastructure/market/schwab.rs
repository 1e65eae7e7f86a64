//! Schwab market-data REST adapter (quotes, option chains, daily history).
//!
//! Authentication is a bearer token read from `SCHWAB_ACCESS_TOKEN`; obtaining
//! and refreshing it is out of band. Requests are spaced at least
//! `throttle_ms` apart.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::ScanConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::market_data::{DailyClose, MarketData};
use crate::domain::values::chain::OptionChain;

pub const TOKEN_ENV: &str = "SCHWAB_ACCESS_TOKEN";
pub const DEFAULT_BASE_URL: &str = "https://api.schwabapi.com/marketdata/v1";

pub struct SchwabMarketData {
    client: reqwest::Client,
    base_url: String,
    token: String,
    throttle: Duration,
    last_request: Mutex<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteBody {
    #[serde(default)]
    last_price: Option<f64>,
    #[serde(default)]
    mark: Option<f64>,
    #[serde(default)]
    close_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(default)]
    quote: Option<QuoteBody>,
}

#[derive(Debug, Deserialize)]
struct Candle {
    close: f64,
    /// epoch millis
    datetime: i64,
}

#[derive(Debug, Deserialize)]
struct PriceHistory {
    #[serde(default)]
    candles: Vec<Candle>,
}

impl SchwabMarketData {
    pub fn new(token: String, scan: &ScanConfig) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), token, scan)
    }

    pub fn with_base_url(base_url: String, token: String, scan: &ScanConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(scan.request_timeout_secs.max(1)))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            throttle: Duration::from_millis(scan.throttle_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Token from the environment.
    pub fn from_env(scan: &ScanConfig) -> Result<Self, DomainError> {
        let token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DomainError::Config(format!("{TOKEN_ENV} is not set")))?;
        Ok(Self::new(token, scan))
    }

    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let ready = prev + self.throttle;
            if ready > Instant::now() {
                tokio::time::sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, DomainError> {
        self.wait_turn().await;
        let url = format!("{}/{path}", self.base_url);
        tracing::debug!(url = %url, "GET");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| DomainError::MarketData(format!("{path}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DomainError::MarketData(format!("{path} returned {status}")));
        }
        resp.json()
            .await
            .map_err(|e| DomainError::Parse(format!("{path}: {e}")))
    }
}

/// Years of history Schwab should return for `lookback_days` calendar days.
fn history_years(lookback_days: u32) -> u32 {
    match lookback_days {
        0..=365 => 1,
        366..=730 => 2,
        731..=1095 => 3,
        _ => 5,
    }
}

#[async_trait]
impl MarketData for SchwabMarketData {
    fn name(&self) -> &str {
        "schwab"
    }

    async fn quote_price(&self, symbol: &str) -> Result<f64, DomainError> {
        let data: std::collections::HashMap<String, QuoteEnvelope> = self
            .get_json("quotes", &[("symbols", symbol.to_string()), ("fields", "quote".to_string())])
            .await?;
        let quote = data
            .get(symbol)
            .or_else(|| data.values().next())
            .and_then(|env| env.quote.as_ref())
            .ok_or_else(|| DomainError::MarketData(format!("No quote for {symbol}")))?;

        [quote.last_price, quote.mark, quote.close_price]
            .into_iter()
            .flatten()
            .find(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| DomainError::MarketData(format!("No price for {symbol}")))
    }

    async fn option_chain(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<OptionChain, DomainError> {
        let mut chain: OptionChain = self
            .get_json(
                "chains",
                &[
                    ("symbol", symbol.to_string()),
                    ("contractType", "ALL".to_string()),
                    ("strategy", "SINGLE".to_string()),
                    ("range", "ALL".to_string()),
                    ("fromDate", from.format("%Y-%m-%d").to_string()),
                    ("toDate", to.format("%Y-%m-%d").to_string()),
                ],
            )
            .await?;
        if chain.symbol.is_empty() {
            chain.symbol = symbol.to_string();
        }
        if chain.is_empty() {
            return Err(DomainError::MarketData(format!("Empty option chain for {symbol}")));
        }
        Ok(chain)
    }

    async fn daily_closes(&self, symbol: &str, lookback_days: u32) -> Result<Vec<DailyClose>, DomainError> {
        let history: PriceHistory = self
            .get_json(
                "pricehistory",
                &[
                    ("symbol", symbol.to_string()),
                    ("periodType", "year".to_string()),
                    ("period", history_years(lookback_days).to_string()),
                    ("frequencyType", "daily".to_string()),
                    ("frequency", "1".to_string()),
                ],
            )
            .await?;
        if history.candles.is_empty() {
            return Err(DomainError::MarketData(format!("No price history for {symbol}")));
        }
        Ok(history
            .candles
            .into_iter()
            .filter_map(|c| {
                let date = DateTime::from_timestamp_millis(c.datetime)?.date_naive();
                Some(DailyClose { date, close: c.close })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_years() {
        assert_eq!(history_years(200), 1);
        assert_eq!(history_years(730), 2);
        assert_eq!(history_years(731), 3);
        assert_eq!(history_years(5000), 5);
    }

    #[test]
    fn test_quote_envelope_parses_partial_body() {
        let data: std::collections::HashMap<String, QuoteEnvelope> =
            serde_json::from_str(r#"{"$VIX": {"quote": {"lastPrice": 17.2}}, "X": {}}"#).unwrap();
        assert_eq!(data["$VIX"].quote.as_ref().unwrap().last_price, Some(17.2));
        assert!(data["X"].quote.is_none());
    }

    #[tokio::test]
    async fn test_throttle_spaces_requests() {
        let scan = ScanConfig {
            throttle_ms: 30,
            ..ScanConfig::default()
        };
        let md = SchwabMarketData::with_base_url("http://127.0.0.1:9".into(), "t".into(), &scan);
        let start = Instant::now();
        md.wait_turn().await;
        md.wait_turn().await;
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
