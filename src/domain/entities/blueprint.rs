use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::values::chain::OptionSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegAction {
    Buy,
    Sell,
}

impl fmt::Display for LegAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegAction::Buy => write!(f, "BUY"),
            LegAction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLeg {
    pub action: LegAction,
    pub ratio: u32,
    pub exp: String,
    pub strike: f64,
    pub side: OptionSide,
}

impl OrderLeg {
    pub fn buy(exp: &str, strike: f64, side: OptionSide) -> Self {
        Self {
            action: LegAction::Buy,
            ratio: 1,
            exp: exp.to_string(),
            strike,
            side,
        }
    }

    pub fn sell(exp: &str, strike: f64, side: OptionSide) -> Self {
        Self {
            action: LegAction::Sell,
            ratio: 1,
            exp: exp.to_string(),
            strike,
            side,
        }
    }
}

impl fmt::Display for OrderLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.action {
            LegAction::Buy => '+',
            LegAction::Sell => '-',
        };
        write!(f, "{sign}{} {} {} {}", self.ratio, self.exp, self.strike, self.side)
    }
}

/// A concrete tradeable structure.
///
/// When `error` is set the structure could not be built; `legs` and
/// `est_debit` must not be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub symbol: String,
    pub strategy: String,
    pub legs: Vec<OrderLeg>,
    /// Positive = debit paid, negative = credit received.
    pub est_debit: f64,
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_greeks: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_greeks: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl Blueprint {
    pub fn new(symbol: &str, strategy: &str, legs: Vec<OrderLeg>, est_debit: f64, note: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
            legs,
            est_debit,
            note,
            short_greeks: None,
            long_greeks: None,
            error: None,
        }
    }

    pub fn failed(symbol: &str, strategy: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
            legs: Vec::new(),
            est_debit: 0.0,
            note: reason.clone(),
            short_greeks: None,
            long_greeks: None,
            error: Some(reason),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.error.is_none() && !self.legs.is_empty()
    }

    pub fn is_credit(&self) -> bool {
        self.est_debit < 0.0
    }

    pub fn one_liner(&self) -> String {
        if let Some(err) = &self.error {
            return format!("{} {} FAILED: {err}", self.symbol, self.strategy);
        }
        let legs: Vec<String> = self.legs.iter().map(|l| l.to_string()).collect();
        format!(
            "{} {} [{}] est_debit={:.2}",
            self.symbol,
            self.strategy,
            legs.join(" / "),
            self.est_debit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leg_display_trims_whole_strikes() {
        let leg = OrderLeg::sell("2025-02-07", 100.0, OptionSide::Put);
        assert_eq!(leg.to_string(), "-1 2025-02-07 100 PUT");
        let leg = OrderLeg::buy("2025-02-07", 102.5, OptionSide::Call);
        assert_eq!(leg.to_string(), "+1 2025-02-07 102.5 CALL");
    }

    #[test]
    fn test_one_liner_lists_legs() {
        let bp = Blueprint::new(
            "AAA",
            "BULL_PUT",
            vec![
                OrderLeg::sell("2025-02-07", 95.0, OptionSide::Put),
                OrderLeg::buy("2025-02-07", 90.0, OptionSide::Put),
            ],
            -1.25,
            String::new(),
        );
        assert_eq!(
            bp.one_liner(),
            "AAA BULL_PUT [-1 2025-02-07 95 PUT / +1 2025-02-07 90 PUT] est_debit=-1.25"
        );
        assert!(bp.is_credit());
        assert!(Blueprint::failed("AAA", "BULL_PUT", "no chain").one_liner().contains("FAILED: no chain"));
    }
}
