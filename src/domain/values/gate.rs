use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Downstream execution decision attached to every persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gate {
    /// Passed thresholds at the policy rank.
    Exec,
    /// Passed after the prober moved the short leg.
    Limit,
    /// Scored well but the risk cap could not be met.
    Wait,
    Forbid,
}

impl Gate {
    /// Gates whose blueprint may be re-priced for execution.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Gate::Exec | Gate::Limit)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Exec => write!(f, "EXEC"),
            Gate::Limit => write!(f, "LIMIT"),
            Gate::Wait => write!(f, "WAIT"),
            Gate::Forbid => write!(f, "FORBID"),
        }
    }
}

impl FromStr for Gate {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EXEC" => Ok(Gate::Exec),
            "LIMIT" => Ok(Gate::Limit),
            "WAIT" => Ok(Gate::Wait),
            "FORBID" => Ok(Gate::Forbid),
            _ => Err(format!("Unknown gate: {s}")),
        }
    }
}
