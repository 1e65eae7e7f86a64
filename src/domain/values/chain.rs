//! Raw option-chain payload as delivered by the quote collaborator.
//!
//! Shape: side map → expiration key (`YYYY-MM-DD:DTE`) → strike string →
//! list of quotes (the first quote is authoritative).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type StrikeMap = BTreeMap<String, Vec<OptionQuote>>;
pub type ExpiryMap = BTreeMap<String, StrikeMap>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    Call,
    Put,
}

impl fmt::Display for OptionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionSide::Call => write!(f, "CALL"),
            OptionSide::Put => write!(f, "PUT"),
        }
    }
}

impl FromStr for OptionSide {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CALL" | "C" => Ok(OptionSide::Call),
            "PUT" | "P" => Ok(OptionSide::Put),
            _ => Err(format!("Unknown option side: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionQuote {
    #[serde(deserialize_with = "lenient_f64")]
    pub bid: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub ask: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub mark: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub last: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub delta: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub gamma: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub theta: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub volatility: f64,
}

impl OptionQuote {
    /// Bid/ask midpoint, else last trade; `None` when neither is usable.
    pub fn mid(&self) -> Option<f64> {
        if self.bid > 0.0 && self.ask > 0.0 {
            return Some((self.bid + self.ask) / 2.0);
        }
        if self.last > 0.0 {
            return Some(self.last);
        }
        None
    }

    /// mark → mid → last → 0.
    pub fn mark_or_mid(&self) -> f64 {
        if self.mark > 0.0 {
            return self.mark;
        }
        self.mid().unwrap_or(0.0)
    }
}

/// Numbers, numeric strings, null and "NaN" all arrive from brokers; anything
/// unusable becomes 0.
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if parsed.is_finite() { parsed } else { 0.0 })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionChain {
    pub symbol: String,
    pub call_exp_date_map: ExpiryMap,
    pub put_exp_date_map: ExpiryMap,
}

/// Split an expiration key `2025-01-17:30` into its ISO date and dte.
pub fn parse_expiry_key(key: &str) -> Option<(String, u32)> {
    let (date, dte) = key.split_once(':')?;
    let dte = dte.trim().parse::<u32>().ok()?;
    Some((date.trim().to_string(), dte))
}

/// Strike closest to `target`.
pub fn nearest_strike(strikes: &[f64], target: f64) -> Option<f64> {
    strikes
        .iter()
        .copied()
        .min_by(|a, b| {
            (a - target)
                .abs()
                .partial_cmp(&(b - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

impl OptionChain {
    pub fn is_empty(&self) -> bool {
        self.call_exp_date_map.is_empty() && self.put_exp_date_map.is_empty()
    }

    pub fn side_map(&self, side: OptionSide) -> &ExpiryMap {
        match side {
            OptionSide::Call => &self.call_exp_date_map,
            OptionSide::Put => &self.put_exp_date_map,
        }
    }

    /// Strike map for the first expiration key that starts with `exp`.
    pub fn strike_map(&self, side: OptionSide, exp: &str) -> Option<&StrikeMap> {
        if exp.is_empty() {
            return None;
        }
        self.side_map(side)
            .iter()
            .find(|(k, _)| k.starts_with(exp))
            .map(|(_, v)| v)
    }

    /// Sorted, de-duplicated strikes listed for an expiration.
    pub fn strikes(&self, side: OptionSide, exp: &str) -> Vec<f64> {
        let mut out: Vec<f64> = self
            .strike_map(side, exp)
            .map(|m| m.keys().filter_map(|k| k.parse::<f64>().ok()).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        out
    }

    pub fn quote(&self, side: OptionSide, exp: &str, strike: f64) -> Option<&OptionQuote> {
        self.strike_map(side, exp)?
            .iter()
            .find(|(k, _)| {
                k.parse::<f64>()
                    .map(|s| (s - strike).abs() < 0.01)
                    .unwrap_or(false)
            })
            .and_then(|(_, quotes)| quotes.first())
    }

    /// Strike whose |delta| is closest to `target_delta`. Quotes with
    /// |delta| < 0.01 are ignored as stale.
    pub fn strike_by_delta(&self, side: OptionSide, exp: &str, target_delta: f64) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;
        for (strike_key, quotes) in self.strike_map(side, exp)? {
            let Ok(strike) = strike_key.parse::<f64>() else {
                continue;
            };
            let Some(q) = quotes.first() else {
                continue;
            };
            let d = q.delta.abs();
            if d < 0.01 {
                continue;
            }
            let diff = (d - target_delta).abs();
            if best.map_or(true, |(_, best_diff)| diff < best_diff) {
                best = Some((strike, diff));
            }
        }
        best.map(|(strike, _)| strike)
    }
}
