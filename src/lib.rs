pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;

use crate::application::drift::{DriftReport, DriftUseCase};
use crate::application::scan::{ScanOptions, ScanReport, ScanUseCase};
use crate::application::sniper::{SnipeReport, SniperUseCase, Urgency};
use crate::application::strategies::REGISTRY;
use crate::config::AppConfig;
use crate::domain::error::DomainError;
use crate::domain::ports::hv_cache::HvCache;
use crate::domain::ports::market_data::MarketData;
use crate::domain::ports::scan_repository::ScanRepository;
use crate::infrastructure::cache::daily::JsonDailyCache;
use crate::infrastructure::market::schwab::SchwabMarketData;
use crate::infrastructure::sqlite::migrations::run_migrations;
use crate::infrastructure::sqlite::scan_repo::SqliteScanRepo;
use crate::infrastructure::tickers::load_tickers_csv;

#[derive(Debug, Clone, Serialize)]
pub struct StrategyInfo {
    pub name: &'static str,
    pub aliases: Vec<&'static str>,
}

pub struct IvRadar {
    config: Arc<AppConfig>,
    repo: Arc<dyn ScanRepository>,
    cache: Arc<dyn HvCache>,
    /// None until first needed; built from `SCHWAB_ACCESS_TOKEN`.
    market: Option<Arc<dyn MarketData>>,
}

impl IvRadar {
    pub fn new(config: AppConfig) -> Result<Self, DomainError> {
        let db_path = &config.paths.db_path;
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Database(format!("create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;

        let cache: Arc<dyn HvCache> = Arc::new(JsonDailyCache::in_dir(&config.paths.cache_dir));
        Self::build(config, conn, cache, None)
    }

    /// Explicit collaborators, for tests and embedding.
    pub fn with_providers(
        config: AppConfig,
        conn: Connection,
        market: Arc<dyn MarketData>,
        cache: Arc<dyn HvCache>,
    ) -> Result<Self, DomainError> {
        Self::build(config, conn, cache, Some(market))
    }

    fn build(
        config: AppConfig,
        conn: Connection,
        cache: Arc<dyn HvCache>,
        market: Option<Arc<dyn MarketData>>,
    ) -> Result<Self, DomainError> {
        run_migrations(&conn)?;
        Ok(Self {
            config: Arc::new(config),
            repo: Arc::new(SqliteScanRepo::new(conn)),
            cache,
            market,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn market(&self) -> Result<Arc<dyn MarketData>, DomainError> {
        match &self.market {
            Some(m) => Ok(m.clone()),
            None => Ok(Arc::new(SchwabMarketData::from_env(&self.config.scan)?)),
        }
    }

    /// Ticker universe from `csv`, or `paths.tickers_csv` when omitted.
    pub fn load_tickers(&self, csv: Option<&Path>) -> Result<Vec<String>, DomainError> {
        load_tickers_csv(csv.unwrap_or(self.config.paths.tickers_csv.as_path()))
    }

    pub async fn scan(&self, symbols: &[String], opts: &ScanOptions) -> Result<ScanReport, DomainError> {
        let uc = ScanUseCase::new(self.market()?, self.cache.clone(), Some(self.repo.clone()), self.config.clone());
        uc.execute(symbols, opts).await
    }

    pub fn drift(&self, symbol: &str, lookback: usize) -> Result<DriftReport, DomainError> {
        DriftUseCase::new(self.repo.clone()).execute(symbol, lookback)
    }

    pub async fn snipe(&self, symbol: &str, urgency: Urgency) -> Result<SnipeReport, DomainError> {
        let uc = SniperUseCase::new(self.market()?, self.repo.clone(), self.config.execution.clone());
        uc.execute(symbol, urgency).await
    }

    pub fn strategies() -> Vec<StrategyInfo> {
        REGISTRY
            .iter()
            .map(|(name, aliases)| StrategyInfo {
                name: *name,
                aliases: aliases.to_vec(),
            })
            .collect()
    }
}
