use serde::{Deserialize, Serialize};

/// Representative near-the-money sample for one expiration.
///
/// `iv` is on the percentage scale (35.2 means 35.2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermPoint {
    pub exp: String,
    pub dte: u32,
    pub strike: f64,
    pub mark: f64,
    pub iv: f64,
    #[serde(default)]
    pub delta: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub gamma: f64,
}

impl TermPoint {
    pub fn new(exp: impl Into<String>, dte: u32, iv: f64) -> Self {
        Self {
            exp: exp.into(),
            dte,
            strike: 0.0,
            mark: 0.0,
            iv,
            delta: 0.0,
            theta: 0.0,
            gamma: 0.0,
        }
    }

    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_strike(mut self, strike: f64, mark: f64) -> Self {
        self.strike = strike;
        self.mark = mark;
        self
    }
}

/// Order by dte and drop repeated (exp, dte) samples.
pub fn normalize_term(mut term: Vec<TermPoint>) -> Vec<TermPoint> {
    term.sort_by(|a, b| a.dte.cmp(&b.dte).then_with(|| a.exp.cmp(&b.exp)));
    term.dedup_by(|a, b| a.dte == b.dte && a.exp == b.exp);
    term
}
