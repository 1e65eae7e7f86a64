//! Shared test helpers: term/context builders, a Black-Scholes chain
//! generator and in-memory collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use ivradar::application::term_structure::AnchorSelector;
use ivradar::config::{AnchorConfig, AppConfig};
use ivradar::domain::entities::context::Context;
use ivradar::domain::entities::hv_info::HvInfo;
use ivradar::domain::entities::term_point::TermPoint;
use ivradar::domain::error::DomainError;
use ivradar::domain::ports::hv_cache::HvCache;
use ivradar::domain::ports::market_data::{DailyClose, MarketData};
use ivradar::domain::values::chain::OptionChain;
use ivradar::domain::values::policy::ShortLegPolicy;
use ivradar::IvRadar;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
}

pub fn exp_for(dte: u32) -> String {
    (today() + Duration::days(i64::from(dte))).format("%Y-%m-%d").to_string()
}

pub fn term(points: &[(u32, f64)]) -> Vec<TermPoint> {
    points.iter().map(|&(dte, iv)| TermPoint::new(exp_for(dte), dte, iv)).collect()
}

/// Weekly Friday expiries: contango, spiky front, short leg at dte 15.
pub const FIXTURE: &[(u32, f64)] = &[
    (1, 36.0),
    (8, 33.0),
    (15, 31.0),
    (22, 30.0),
    (29, 32.0),
    (36, 33.0),
    (43, 33.5),
    (50, 33.8),
    (78, 34.0),
];

pub fn policy(base_rank: usize) -> ShortLegPolicy {
    ShortLegPolicy {
        base_rank,
        ..ShortLegPolicy::default()
    }
}

pub fn hv(rank: f64) -> HvInfo {
    HvInfo::success(25.0, rank, 12.0, 40.0)
}

pub fn context(symbol: &str, term: Vec<TermPoint>, hv: HvInfo, policy: &ShortLegPolicy) -> Context {
    let features = AnchorSelector::new(AnchorConfig::default())
        .select(&term, policy)
        .unwrap();
    Context {
        symbol: symbol.to_string(),
        price: 100.0,
        term,
        hv,
        features,
        chain: OptionChain::default(),
    }
}

/// Fixture context with a full chain behind it.
pub fn chain_context(symbol: &str, hv_rank: f64) -> Context {
    let chain = bs_chain(symbol, 100.0, FIXTURE);
    let term = ivradar::application::context_builder::extract_term_points(&chain, 100.0, 6);
    let mut ctx = context(symbol, term, hv(hv_rank), &ShortLegPolicy::default());
    ctx.chain = chain;
    ctx
}

// ── Black-Scholes chain ─────────────────────────────────────────────────

fn erf(x: f64) -> f64 {
    // Abramowitz-Stegun 7.1.26
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let y = 1.0
        - (((((1.061405429 * t - 1.453152027) * t) + 1.421413741) * t - 0.284496736) * t + 0.254829592) * t * (-x * x).exp();
    sign * y
}

fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * std::f64::consts::PI).sqrt()
}

struct Greeks {
    call: f64,
    put: f64,
    call_delta: f64,
    gamma: f64,
    theta: f64,
}

fn black_scholes(spot: f64, strike: f64, dte: u32, iv_pct: f64) -> Greeks {
    let t = f64::from(dte.max(1)) / 365.0;
    let vol = iv_pct / 100.0;
    let sd = vol * t.sqrt();
    let d1 = ((spot / strike).ln() + 0.5 * vol * vol * t) / sd;
    let d2 = d1 - sd;
    let call = spot * norm_cdf(d1) - strike * norm_cdf(d2);
    Greeks {
        call,
        put: call - spot + strike,
        call_delta: norm_cdf(d1),
        gamma: norm_pdf(d1) / (spot * sd),
        theta: -spot * norm_pdf(d1) * vol / (2.0 * t.sqrt()) / 365.0,
    }
}

fn quote_json(px: f64, delta: f64, g: &Greeks, iv_pct: f64) -> serde_json::Value {
    let half = (px * 0.03).max(0.02);
    let bid = ((px - half) * 100.0).round() / 100.0;
    let ask = ((px + half) * 100.0).round() / 100.0;
    serde_json::json!([{
        "bid": bid.max(0.01),
        "ask": ask.max(0.02),
        "mark": (px * 100.0).round() / 100.0,
        "last": (px * 100.0).round() / 100.0,
        "delta": delta,
        "gamma": g.gamma,
        "theta": g.theta,
        "volatility": iv_pct
    }])
}

/// Chain with strikes 70..=130 step 2.5 for every `(dte, iv)` expiry.
pub fn bs_chain(symbol: &str, spot: f64, expiries: &[(u32, f64)]) -> OptionChain {
    let mut calls = serde_json::Map::new();
    let mut puts = serde_json::Map::new();
    for &(dte, iv) in expiries {
        let key = format!("{}:{dte}", exp_for(dte));
        let mut call_strikes = serde_json::Map::new();
        let mut put_strikes = serde_json::Map::new();
        for i in 0..=24 {
            let strike = 70.0 + 2.5 * f64::from(i);
            let g = black_scholes(spot, strike, dte, iv);
            let sk = format!("{strike:.1}");
            call_strikes.insert(sk.clone(), quote_json(g.call, g.call_delta, &g, iv));
            put_strikes.insert(sk, quote_json(g.put, g.call_delta - 1.0, &g, iv));
        }
        calls.insert(key.clone(), serde_json::Value::Object(call_strikes));
        puts.insert(key, serde_json::Value::Object(put_strikes));
    }
    serde_json::from_value(serde_json::json!({
        "symbol": symbol,
        "callExpDateMap": calls,
        "putExpDateMap": puts,
    }))
    .unwrap()
}

/// 60 closes of a gently oscillating series.
pub fn closes() -> Vec<f64> {
    let mut px = 100.0;
    (0..60)
        .map(|i| {
            px *= if i % 3 == 0 { 1.012 } else { 0.995 };
            px
        })
        .collect()
}

// ── in-memory collaborators ─────────────────────────────────────────────

#[derive(Default)]
pub struct FakeMarketData {
    prices: HashMap<String, f64>,
    chains: HashMap<String, OptionChain>,
    history: HashMap<String, Vec<f64>>,
    pub history_calls: AtomicUsize,
}

impl FakeMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_symbol(mut self, symbol: &str, price: f64, expiries: &[(u32, f64)]) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self.chains.insert(symbol.to_string(), bs_chain(symbol, price, expiries));
        self
    }

    pub fn with_history(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.history.insert(symbol.to_string(), closes);
        self
    }
}

#[async_trait]
impl MarketData for FakeMarketData {
    fn name(&self) -> &str {
        "fake"
    }

    async fn quote_price(&self, symbol: &str) -> Result<f64, DomainError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| DomainError::MarketData(format!("No quote for {symbol}")))
    }

    async fn option_chain(&self, symbol: &str, _from: NaiveDate, _to: NaiveDate) -> Result<OptionChain, DomainError> {
        self.chains
            .get(symbol)
            .cloned()
            .ok_or_else(|| DomainError::MarketData(format!("Empty option chain for {symbol}")))
    }

    async fn daily_closes(&self, symbol: &str, _lookback_days: u32) -> Result<Vec<DailyClose>, DomainError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        let closes = self
            .history
            .get(symbol)
            .ok_or_else(|| DomainError::MarketData(format!("No price history for {symbol}")))?;
        Ok(closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyClose {
                date: today() - Duration::days((closes.len() - i) as i64),
                close,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCache {
    items: Mutex<HashMap<String, (NaiveDate, HvInfo)>>,
}

impl HvCache for MemoryCache {
    fn get(&self, symbol: &str, today: NaiveDate) -> Result<Option<HvInfo>, DomainError> {
        let items = self.items.lock().unwrap();
        Ok(items
            .get(symbol)
            .filter(|(day, _)| *day == today)
            .map(|(_, info)| info.clone()))
    }

    fn put(&self, symbol: &str, today: NaiveDate, info: &HvInfo) -> Result<(), DomainError> {
        self.items
            .lock()
            .unwrap()
            .insert(symbol.to_string(), (today, info.clone()));
        Ok(())
    }
}

pub fn radar(market: FakeMarketData) -> IvRadar {
    IvRadar::with_providers(
        AppConfig::default(),
        Connection::open_in_memory().unwrap(),
        Arc::new(market),
        Arc::new(MemoryCache::default()),
    )
    .unwrap()
}
