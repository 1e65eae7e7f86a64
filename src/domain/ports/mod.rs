pub mod hv_cache;
pub mod market_data;
pub mod scan_repository;
pub mod strategy;
