use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of the implied-volatility curve between the short leg and the month anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Contango,
    Backwardation,
    Flat,
}

impl Regime {
    /// `ratio` is the multiplicative band (1.03 by default) either side of parity.
    pub fn classify(short_iv: f64, month_iv: f64, ratio: f64) -> Self {
        if short_iv > month_iv * ratio {
            Regime::Backwardation
        } else if month_iv > short_iv * ratio {
            Regime::Contango
        } else {
            Regime::Flat
        }
    }

    /// Single-letter code used in row tags.
    pub fn letter(&self) -> &'static str {
        match self {
            Regime::Contango => "C",
            Regime::Backwardation => "B",
            Regime::Flat => "F",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regime::Contango => write!(f, "CONTANGO"),
            Regime::Backwardation => write!(f, "BACKWARDATION"),
            Regime::Flat => write!(f, "FLAT"),
        }
    }
}

impl FromStr for Regime {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CONTANGO" => Ok(Regime::Contango),
            "BACKWARDATION" => Ok(Regime::Backwardation),
            "FLAT" => Ok(Regime::Flat),
            _ => Err(format!("Unknown regime: {s}")),
        }
    }
}

/// Whether the front of the curve carries an abnormal spike relative to the short leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Curvature {
    SpikyFront,
    Normal,
}

impl Curvature {
    pub fn classify(micro_iv: f64, short_iv: f64, spike_ratio: f64) -> Self {
        if micro_iv > short_iv * spike_ratio {
            Curvature::SpikyFront
        } else {
            Curvature::Normal
        }
    }

    pub fn is_spiky(&self) -> bool {
        matches!(self, Curvature::SpikyFront)
    }
}

impl fmt::Display for Curvature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curvature::SpikyFront => write!(f, "SPIKY_FRONT"),
            Curvature::Normal => write!(f, "NORMAL"),
        }
    }
}

impl FromStr for Curvature {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SPIKY_FRONT" => Ok(Curvature::SpikyFront),
            "NORMAL" => Ok(Curvature::Normal),
            _ => Err(format!("Unknown curvature: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regime_bands() {
        assert_eq!(Regime::classify(40.0, 30.0, 1.03), Regime::Backwardation);
        assert_eq!(Regime::classify(30.0, 40.0, 1.03), Regime::Contango);
        assert_eq!(Regime::classify(30.5, 30.0, 1.03), Regime::Flat);
    }

    #[test]
    fn test_regime_band_edge_is_flat() {
        // exactly on the band is not strictly greater
        assert_eq!(Regime::classify(30.9, 30.0, 1.03), Regime::Flat);
    }

    #[test]
    fn test_curvature_spike() {
        assert_eq!(Curvature::classify(56.0, 50.0, 1.10), Curvature::SpikyFront);
        assert_eq!(Curvature::classify(55.0, 50.0, 1.10), Curvature::Normal);
    }

    #[test]
    fn test_round_trip_display() {
        for r in [Regime::Contango, Regime::Backwardation, Regime::Flat] {
            assert_eq!(r.to_string().parse::<Regime>().unwrap(), r);
        }
        assert_eq!("spiky_front".parse::<Curvature>().unwrap(), Curvature::SpikyFront);
    }
}
