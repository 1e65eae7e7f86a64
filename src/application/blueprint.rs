//! Builders turning chosen expiries and strikes into concrete [`Blueprint`]s.
//!
//! A builder never fails with `Err`: a structure that cannot be priced comes
//! back as [`Blueprint::failed`] with the reason.

use std::collections::BTreeMap;

use crate::domain::entities::blueprint::{Blueprint, OrderLeg};
use crate::domain::values::chain::{nearest_strike, OptionChain, OptionQuote, OptionSide};

pub const CALENDAR: &str = "CALENDAR";
pub const DIAGONAL: &str = "DIAGONAL";
pub const STRADDLE: &str = "STRADDLE";
pub const IRON_CONDOR: &str = "IRON_CONDOR";
pub const BULL_PUT: &str = "BULL_PUT";
pub const BEAR_CALL: &str = "BEAR_CALL";

/// Bid/ask midpoint (else last) of one listed contract.
pub fn leg_mid(chain: &OptionChain, side: OptionSide, exp: &str, strike: f64) -> Option<f64> {
    chain.quote(side, exp, strike)?.mid()
}

/// Mark-first price and delta of one listed contract; `None` when unpriced.
pub fn leg_mark(chain: &OptionChain, side: OptionSide, exp: &str, strike: f64) -> Option<(f64, f64)> {
    let q = chain.quote(side, exp, strike)?;
    let px = q.mark_or_mid();
    (px > 0.0).then_some((px, q.delta))
}

pub fn greeks(q: &OptionQuote) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("delta".to_string(), q.delta),
        ("gamma".to_string(), q.gamma),
        ("theta".to_string(), q.theta),
        ("iv".to_string(), q.volatility),
    ])
}

/// ATM calendar: sell `short_exp`, buy `long_exp` at the strike nearest spot.
/// When the long expiry does not list that strike with a usable mid, the
/// nearest listed long strike is used instead.
pub fn calendar(symbol: &str, price: f64, chain: &OptionChain, short_exp: &str, long_exp: &str, side: OptionSide) -> Blueprint {
    let Some(strike) = nearest_strike(&chain.strikes(side, short_exp), price) else {
        return Blueprint::failed(symbol, CALENDAR, format!("no strikes listed for {short_exp}"));
    };
    let short_mid = leg_mid(chain, side, short_exp, strike);

    let mut long_strike = strike;
    let mut long_mid = leg_mid(chain, side, long_exp, strike);
    let mut note = String::from("ATM strike chosen");
    if long_mid.is_none() {
        if let Some(alt) = nearest_strike(&chain.strikes(side, long_exp), strike) {
            long_strike = alt;
            long_mid = leg_mid(chain, side, long_exp, alt);
            note.push_str(&format!(" (long leg at {alt})"));
        }
    }

    let (Some(s), Some(l)) = (short_mid, long_mid) else {
        return Blueprint::failed(symbol, CALENDAR, "missing bid/ask mid");
    };
    let legs = vec![OrderLeg::sell(short_exp, strike, side), OrderLeg::buy(long_exp, long_strike, side)];
    let mut bp = Blueprint::new(symbol, CALENDAR, legs, l - s, note);
    bp.short_greeks = chain.quote(side, short_exp, strike).map(greeks);
    bp.long_greeks = chain.quote(side, long_exp, long_strike).map(greeks);
    bp
}

/// Diagonal debit spread: sell the near strike, buy the far expiry's strike.
pub fn diagonal(
    symbol: &str,
    chain: &OptionChain,
    short_exp: &str,
    short_strike: f64,
    long_exp: &str,
    long_strike: f64,
    side: OptionSide,
) -> Blueprint {
    let short_mid = leg_mid(chain, side, short_exp, short_strike);
    let long_mid = leg_mid(chain, side, long_exp, long_strike);
    let (Some(s), Some(l)) = (short_mid, long_mid) else {
        let mut missing = Vec::new();
        if short_mid.is_none() {
            missing.push(format!("short {short_exp} {short_strike}"));
        }
        if long_mid.is_none() {
            missing.push(format!("long {long_exp} {long_strike}"));
        }
        return Blueprint::failed(symbol, DIAGONAL, format!("missing quotes: {}", missing.join(", ")));
    };

    let legs = vec![
        OrderLeg::buy(long_exp, long_strike, side),
        OrderLeg::sell(short_exp, short_strike, side),
    ];
    let note = format!("long {long_exp} {long_strike} / short {short_exp} {short_strike}");
    let mut bp = Blueprint::new(symbol, DIAGONAL, legs, l - s, note);
    bp.short_greeks = chain.quote(side, short_exp, short_strike).map(greeks);
    bp.long_greeks = chain.quote(side, long_exp, long_strike).map(greeks);
    bp
}

/// Long ATM straddle at `exp`.
pub fn straddle(symbol: &str, price: f64, chain: &OptionChain, exp: &str) -> Blueprint {
    let Some(strike) = nearest_strike(&chain.strikes(OptionSide::Call, exp), price) else {
        return Blueprint::failed(symbol, STRADDLE, format!("no strikes listed for {exp}"));
    };
    let call = leg_mid(chain, OptionSide::Call, exp, strike);
    let put = leg_mid(chain, OptionSide::Put, exp, strike);
    let (Some(c), Some(p)) = (call, put) else {
        return Blueprint::failed(symbol, STRADDLE, format!("missing call/put quotes at {strike}"));
    };

    let legs = vec![
        OrderLeg::buy(exp, strike, OptionSide::Call),
        OrderLeg::buy(exp, strike, OptionSide::Put),
    ];
    let mut bp = Blueprint::new(symbol, STRADDLE, legs, c + p, format!("ATM {strike}"));
    bp.long_greeks = chain.quote(OptionSide::Call, exp, strike).map(greeks);
    bp
}
