pub mod cache;
pub mod market;
pub mod sqlite;
pub mod tickers;
