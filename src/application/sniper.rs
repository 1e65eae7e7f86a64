//! Execution pricing ("sniper"): re-price an accepted blueprint against a
//! fresh chain and compute a tick-rounded limit price. No order is placed.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::blueprint::STRADDLE;
use crate::application::safety::{check_liquidity, SafetyCheck};
use crate::config::ExecutionConfig;
use crate::domain::entities::blueprint::{Blueprint, LegAction, OrderLeg};
use crate::domain::error::DomainError;
use crate::domain::ports::market_data::MarketData;
use crate::domain::ports::scan_repository::ScanRepository;
use crate::domain::values::chain::{nearest_strike, OptionChain, OptionSide};
use crate::domain::values::gate::Gate;

/// How hard to lean on the market when picking the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    /// Mid improved by at least one tick in our favour.
    Passive,
    Neutral,
    /// Cross to the natural price.
    Aggressive,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Passive => write!(f, "PASSIVE"),
            Urgency::Neutral => write!(f, "NEUTRAL"),
            Urgency::Aggressive => write!(f, "AGGRESSIVE"),
        }
    }
}

impl FromStr for Urgency {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PASSIVE" => Ok(Urgency::Passive),
            "NEUTRAL" | "MID" => Ok(Urgency::Neutral),
            "AGGRESSIVE" | "NATURAL" => Ok(Urgency::Aggressive),
            _ => Err(format!("Unknown urgency: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireSolution {
    pub symbol: String,
    pub strategy: String,
    pub urgency: Urgency,
    pub is_credit: bool,
    pub legs: Vec<OrderLeg>,
    /// Natural combo bid/ask and composite mid, quoted as a positive price.
    pub bid: f64,
    pub ask: f64,
    pub mid: f64,
    pub spread: f64,
    pub tick: f64,
    pub limit_price: f64,
    /// Per contract (x100).
    pub est_cost: f64,
    pub safety: SafetyCheck,
    /// (old strike, new strike) when a straddle was moved back to ATM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recentered: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum PricingOutcome {
    Ready(Box<FireSolution>),
    Rejected { reason: String },
}

impl PricingOutcome {
    fn rejected(reason: impl Into<String>) -> Self {
        PricingOutcome::Rejected { reason: reason.into() }
    }
}

/// 0.01 under the threshold price, else 0.05.
pub fn tick_size(price: f64, cfg: &ExecutionConfig) -> f64 {
    if price < cfg.tick_threshold {
        cfg.tick_small
    } else {
        cfg.tick_large
    }
}

pub fn round_to_tick(price: f64, tick: f64) -> f64 {
    let snapped = if tick > 0.0 { (price / tick).round() * tick } else { price };
    (snapped * 100.0).round() / 100.0
}

#[derive(Default)]
struct SideSum {
    bid: f64,
    ask: f64,
    mid: f64,
}

/// Price `bp` from `chain`. Straddles are first re-centred on the strike
/// nearest `spot`. A wide combo spread only warns; missing or dead leg
/// quotes reject.
pub fn price_blueprint(bp: &Blueprint, chain: &OptionChain, spot: f64, urgency: Urgency, cfg: &ExecutionConfig) -> PricingOutcome {
    if !bp.is_usable() {
        return PricingOutcome::rejected(format!("{} blueprint has no tradeable legs", bp.symbol));
    }

    let mut legs = bp.legs.clone();
    let mut recentered = None;
    if bp.strategy == STRADDLE {
        let Some(atm) = nearest_strike(&chain.strikes(OptionSide::Call, &legs[0].exp), spot) else {
            return PricingOutcome::rejected("No strikes (straddle)");
        };
        let old = legs[0].strike;
        if (atm - old).abs() > 0.01 {
            tracing::info!(symbol = %bp.symbol, from = old, to = atm, "straddle recentered");
            legs.iter_mut().for_each(|l| l.strike = atm);
            recentered = Some((old, atm));
        }
    }

    let mut sell = SideSum::default();
    let mut buy = SideSum::default();
    let mut missing = Vec::new();
    for leg in &legs {
        let Some(q) = chain.quote(leg.side, &leg.exp, leg.strike) else {
            missing.push(format!("{} {} {} {}", leg.action, leg.exp, leg.strike, leg.side));
            continue;
        };
        if q.bid <= 0.0 || q.ask <= 0.0 {
            return PricingOutcome::rejected(format!("Zero Liquidity ({} {} {})", leg.exp, leg.strike, leg.side));
        }
        let n = f64::from(leg.ratio.max(1));
        let side = match leg.action {
            LegAction::Sell => &mut sell,
            LegAction::Buy => &mut buy,
        };
        side.bid += q.bid * n;
        side.ask += q.ask * n;
        side.mid += q.mark_or_mid() * n;
    }
    if !missing.is_empty() {
        return PricingOutcome::rejected(format!("Missing quotes: {}", missing.join(", ")));
    }

    let is_credit = bp.is_credit();
    let (bid, ask, mut mid) = if is_credit {
        (sell.bid - buy.ask, sell.ask - buy.bid, sell.mid - buy.mid)
    } else {
        (buy.bid - sell.ask, buy.ask - sell.bid, buy.mid - sell.mid)
    };
    if mid <= 0.0 && bid > 0.0 && ask > 0.0 {
        mid = (bid + ask) / 2.0;
    }

    let safety = check_liquidity(bid, ask, false, cfg);
    if !safety.passed {
        tracing::warn!(symbol = %bp.symbol, reason = %safety.reason, "combo liquidity warning");
    }

    let tick = tick_size(mid, cfg);
    let target = match urgency {
        Urgency::Aggressive if is_credit => bid,
        Urgency::Aggressive => ask,
        Urgency::Neutral => mid,
        Urgency::Passive => {
            let improvement = tick.max(cfg.passive_min_improvement);
            if is_credit {
                mid + improvement
            } else {
                mid - improvement
            }
        }
    };
    let limit_price = round_to_tick(target, tick);

    PricingOutcome::Ready(Box::new(FireSolution {
        symbol: bp.symbol.clone(),
        strategy: bp.strategy.clone(),
        urgency,
        is_credit,
        legs,
        bid,
        ask,
        mid,
        spread: ask - bid,
        tick,
        limit_price,
        est_cost: limit_price * 100.0,
        safety,
        recentered,
    }))
}

#[derive(Debug, Clone, Serialize)]
pub struct SnipeReport {
    pub symbol: String,
    /// Gate the blueprint was accepted under.
    pub gate: Gate,
    pub spot: f64,
    pub outcome: PricingOutcome,
}

/// Loads the latest accepted blueprint for a symbol and prices it live.
pub struct SniperUseCase {
    market: Arc<dyn MarketData>,
    repo: Arc<dyn ScanRepository>,
    cfg: ExecutionConfig,
}

impl SniperUseCase {
    pub fn new(market: Arc<dyn MarketData>, repo: Arc<dyn ScanRepository>, cfg: ExecutionConfig) -> Self {
        Self { market, repo, cfg }
    }

    pub async fn execute(&self, symbol: &str, urgency: Urgency) -> Result<SnipeReport, DomainError> {
        let symbol = symbol.trim().to_uppercase();
        let (bp, gate) = self
            .repo
            .latest_accepted_blueprint(&symbol)?
            .ok_or_else(|| DomainError::NotFound(format!("No accepted blueprint for {symbol}")))?;

        let spot = self.market.quote_price(&symbol).await?;
        let report = |outcome| SnipeReport {
            symbol: symbol.clone(),
            gate,
            spot,
            outcome,
        };
        if !spot.is_finite() || spot <= 0.0 {
            return Ok(report(PricingOutcome::rejected("No spot price")));
        }

        let dates = bp
            .legs
            .iter()
            .map(|l| l.exp.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|exp| {
                NaiveDate::parse_from_str(exp, "%Y-%m-%d")
                    .map_err(|e| DomainError::Parse(format!("expiry '{exp}': {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (Some(from), Some(to)) = (dates.iter().min().copied(), dates.iter().max().copied()) else {
            return Ok(report(PricingOutcome::rejected("blueprint has no legs")));
        };

        let chain = self.market.option_chain(&symbol, from, to).await?;
        tracing::info!(symbol = %symbol, strategy = %bp.strategy, %gate, %urgency, "pricing blueprint");
        Ok(report(price_blueprint(&bp, &chain, spot, urgency, &self.cfg)))
    }
}
