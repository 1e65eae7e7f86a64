//! Builds the per-symbol [`Context`]: spot, chain, ATM term structure, HV and
//! anchor features. This is the only application step that touches the
//! network; everything downstream is pure.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::application::hv::HvService;
use crate::application::term_structure::AnchorSelector;
use crate::config::ScanConfig;
use crate::domain::entities::context::Context;
use crate::domain::entities::hv_info::HvInfo;
use crate::domain::entities::term_point::{normalize_term, TermPoint};
use crate::domain::error::DomainError;
use crate::domain::ports::market_data::MarketData;
use crate::domain::values::chain::{parse_expiry_key, OptionChain};
use crate::domain::values::policy::ShortLegPolicy;

/// Brokers report iv either as a fraction (0.32) or in percent (32.0).
pub fn normalize_iv(iv: f64) -> f64 {
    if iv > 0.0 && iv < 1.5 {
        iv * 100.0
    } else {
        iv
    }
}

/// One term point per call expiration: among the `probe_strikes` strikes
/// nearest spot, the first whose quote carries a positive iv.
pub fn extract_term_points(chain: &OptionChain, price: f64, probe_strikes: usize) -> Vec<TermPoint> {
    let mut term = Vec::new();
    for (key, strikes) in &chain.call_exp_date_map {
        let Some((exp, dte)) = parse_expiry_key(key) else {
            continue;
        };

        let mut by_distance: Vec<(f64, &str)> = strikes
            .keys()
            .map(|k| {
                let dist = k.parse::<f64>().map_or(f64::INFINITY, |s| (s - price).abs());
                (dist, k.as_str())
            })
            .collect();
        by_distance.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let picked = by_distance.iter().take(probe_strikes.max(1)).find_map(|(_, k)| {
            let q = strikes.get(*k)?.first()?;
            let strike = k.parse::<f64>().ok()?;
            (q.volatility > 0.0 && strike > 0.0).then_some((strike, q))
        });
        let Some((strike, q)) = picked else {
            continue;
        };

        let mut point = TermPoint::new(exp, dte, normalize_iv(q.volatility)).with_strike(strike, q.mark_or_mid());
        point.delta = q.delta;
        point.theta = q.theta;
        point.gamma = q.gamma;
        term.push(point);
    }
    normalize_term(term)
}

pub struct ContextBuilder {
    market: Arc<dyn MarketData>,
    hv: HvService,
    selector: AnchorSelector,
    scan: ScanConfig,
    policy: ShortLegPolicy,
}

impl ContextBuilder {
    pub fn new(
        market: Arc<dyn MarketData>,
        hv: HvService,
        selector: AnchorSelector,
        scan: ScanConfig,
        policy: ShortLegPolicy,
    ) -> Self {
        Self {
            market,
            hv,
            selector,
            scan,
            policy,
        }
    }

    /// Fetch and assemble one symbol. Any error means the symbol is skipped
    /// for this cycle.
    pub async fn build(&self, symbol: &str, today: NaiveDate) -> Result<Context, DomainError> {
        let price = self.market.quote_price(symbol).await?;
        if !price.is_finite() || price <= 0.0 {
            return Err(DomainError::MarketData(format!("No price for {symbol}")));
        }

        let to = today + Duration::days(i64::from(self.scan.days));
        let chain = self.market.option_chain(symbol, today, to).await?;
        let term = extract_term_points(&chain, price, self.scan.atm_probe_strikes);
        if term.len() < self.scan.min_term_points {
            return Err(DomainError::MarketData(format!(
                "{symbol}: {} usable expiries, need {}",
                term.len(),
                self.scan.min_term_points
            )));
        }

        let mut hv = self.hv.get(symbol, today).await;
        if !hv.is_ok() {
            tracing::debug!(symbol, reason = %hv.msg, "using neutral hv");
            hv = HvInfo::neutral();
        }

        let features = self.selector.select(&term, &self.policy)?;
        Ok(Context {
            symbol: symbol.to_string(),
            price,
            term,
            hv,
            features,
            chain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_iv_scale() {
        assert_eq!(normalize_iv(0.32), 32.0);
        assert_eq!(normalize_iv(32.0), 32.0);
        assert_eq!(normalize_iv(0.0), 0.0);
    }

    #[test]
    fn test_extract_skips_strikes_without_iv() {
        let chain: OptionChain = serde_json::from_value(serde_json::json!({
            "callExpDateMap": {
                "2025-01-17:30": {
                    "100.0": [{"bid": 3.0, "ask": 3.2, "volatility": "NaN"}],
                    "102.5": [{"bid": 2.0, "ask": 2.2, "volatility": 0.31, "gamma": 0.04}],
                    "150.0": [{"bid": 0.1, "ask": 0.2, "volatility": 90.0}]
                },
                "2025-01-03:16": {
                    "100.0": [{"mark": 1.5, "volatility": 40.0}]
                },
                "garbage": {}
            }
        }))
        .unwrap();

        let term = extract_term_points(&chain, 100.4, 2);
        assert_eq!(term.len(), 2);
        assert_eq!(term[0].dte, 16);
        assert_eq!(term[0].mark, 1.5);
        assert_eq!(term[1].strike, 102.5);
        assert!((term[1].iv - 31.0).abs() < 1e-9);
        assert!((term[1].mark - 2.1).abs() < 1e-9);
        assert_eq!(term[1].gamma, 0.04);
    }

    #[test]
    fn test_extract_respects_probe_depth() {
        let chain: OptionChain = serde_json::from_value(serde_json::json!({
            "callExpDateMap": {
                "2025-01-17:30": {
                    "100.0": [{"volatility": 0.0}],
                    "101.0": [{"volatility": 0.0}],
                    "120.0": [{"volatility": 35.0}]
                }
            }
        }))
        .unwrap();
        assert!(extract_term_points(&chain, 100.0, 2).is_empty());
        assert_eq!(extract_term_points(&chain, 100.0, 3).len(), 1);
    }
}
