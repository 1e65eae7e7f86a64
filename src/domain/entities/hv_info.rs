use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HvStatus {
    Success,
    Error,
}

/// Historical-volatility snapshot for one underlying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HvInfo {
    pub status: HvStatus,
    /// Annualised, percentage scale.
    pub current_hv: f64,
    /// Position of `current_hv` inside the trailing window, 0..=100.
    pub hv_rank: f64,
    pub hv_low: f64,
    pub hv_high: f64,
    #[serde(default)]
    pub msg: String,
}

impl HvInfo {
    pub fn success(current_hv: f64, hv_rank: f64, hv_low: f64, hv_high: f64) -> Self {
        Self {
            status: HvStatus::Success,
            current_hv,
            hv_rank: hv_rank.clamp(0.0, 100.0),
            hv_low,
            hv_high,
            msg: String::new(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: HvStatus::Error,
            current_hv: 0.0,
            hv_rank: 0.0,
            hv_low: 0.0,
            hv_high: 0.0,
            msg: msg.into(),
        }
    }

    /// Neutral stand-in used when history is unavailable: mid rank, no HV.
    pub fn neutral() -> Self {
        Self {
            status: HvStatus::Error,
            current_hv: 0.0,
            hv_rank: 50.0,
            hv_low: 0.0,
            hv_high: 0.0,
            msg: "historical volatility unavailable".into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == HvStatus::Success
    }
}
