//! Advisory liquidity gate for a single quote or a combined spread quote.

use serde::Serialize;

use crate::config::ExecutionConfig;

/// Outcome of a liquidity check: a verdict plus the reason behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyCheck {
    pub passed: bool,
    pub reason: String,
    pub mid: f64,
    pub spread: f64,
}

impl SafetyCheck {
    fn reject(reason: String, mid: f64, spread: f64) -> Self {
        Self {
            passed: false,
            reason,
            mid,
            spread,
        }
    }
}

/// Check bid/ask health. `strict` selects the tighter spread ratio; cheap
/// contracts get a wider allowance regardless of mode.
pub fn check_liquidity(bid: f64, ask: f64, strict: bool, cfg: &ExecutionConfig) -> SafetyCheck {
    if bid <= 0.0 || ask <= 0.0 {
        return SafetyCheck::reject("Zero Liquidity (bid/ask is 0)".into(), 0.0, 0.0);
    }

    let mid = (bid + ask) / 2.0;
    let spread = ask - bid;
    if bid > ask {
        return SafetyCheck::reject(format!("Crossed Market (bid {bid} > ask {ask})"), mid, spread);
    }

    let threshold = if mid < cfg.cheap_mid {
        cfg.cheap_spread_ratio
    } else if mid < cfg.low_mid {
        cfg.low_spread_ratio
    } else if strict {
        cfg.strict_spread_ratio
    } else {
        cfg.loose_spread_ratio
    };

    let ratio = spread / mid;
    if ratio > threshold {
        return SafetyCheck::reject(
            format!(
                "Spread Too Wide: {spread:.2} ({:.1}%) > {:.0}%",
                ratio * 100.0,
                threshold * 100.0
            ),
            mid,
            spread,
        );
    }

    SafetyCheck {
        passed: true,
        reason: "OK".into(),
        mid,
        spread,
    }
}
