use thiserror::Error;

/// Reasons the anchor selector refuses a term structure. Either one means the
/// symbol is skipped for the current cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TermStructureError {
    #[error("Empty term structure")]
    EmptyTermStructure,

    #[error("No eligible expiries (min_dte={min_dte})")]
    NoEligibleExpiries { min_dte: u32 },
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Term structure error: {0}")]
    TermStructure(#[from] TermStructureError),
}

impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self {
        DomainError::Database(e.to_string())
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}
