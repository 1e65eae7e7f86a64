//! Immutable runtime configuration.
//!
//! Loaded once per run from a TOML file. Every section and field carries a
//! default, so a partial file only overrides what it names and a missing file
//! yields the defaults. The resulting value is shared behind an `Arc` and never
//! mutated.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::values::chain::OptionSide;
use crate::domain::values::policy::ShortLegPolicy;

pub const CONFIG_ENV: &str = "IVRADAR_CONFIG";
pub const DB_ENV: &str = "IVRADAR_DB";
pub const DEFAULT_CONFIG_PATH: &str = "ivradar.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub scan: ScanConfig,
    pub policy: ShortLegPolicy,
    pub anchors: AnchorConfig,
    pub scoring: ScoringConfig,
    pub risk: RiskConfig,
    pub strategies: StrategiesConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub tickers_csv: PathBuf,
    pub cache_dir: PathBuf,
    pub db_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tickers_csv: PathBuf::from("data/tickers.csv"),
            cache_dir: PathBuf::from("cache"),
            db_path: PathBuf::from("db/ivradar.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Calendar days of expirations requested per chain.
    pub days: u32,
    pub throttle_ms: u64,
    /// Strikes nearest to spot probed per expiry when sampling iv.
    pub atm_probe_strikes: usize,
    pub min_term_points: usize,
    pub request_timeout_secs: u64,
    pub min_score: i32,
    pub max_risk: i32,
    /// Symbol queried for the market volatility index; empty disables it.
    pub vix_symbol: String,
    /// Trading sessions of price history requested for HV.
    pub hv_lookback_days: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            days: 120,
            throttle_ms: 250,
            atm_probe_strikes: 6,
            min_term_points: 3,
            request_timeout_secs: 30,
            min_score: 60,
            max_risk: 70,
            vix_symbol: "$VIX".to_string(),
            hv_lookback_days: 730,
        }
    }
}

/// Constants of the anchor selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    pub short_min_dte: u32,
    pub short_max_dte: u32,
    pub micro_min_dte: u32,
    pub micro_max_dte: u32,
    pub month_min_dte: u32,
    pub month_max_dte: u32,
    /// Upper bound of the widened month pool.
    pub month_wide_max_dte: u32,
    pub month_target_dte: f64,
    /// Weight of the distance-from-target penalty.
    pub month_lambda: f64,
    pub month_top_n: usize,
    pub month_min_pool: usize,
    pub prefer_monthly: bool,
    pub month_fallback_min_dte: u32,
    pub month_fallback_target_dte: u32,
    pub base_iv_min_dte: u32,
    pub base_iv_max_dte: u32,
    pub regime_ratio: f64,
    pub spike_ratio: f64,
    pub front_rich_ratio: f64,
    /// Denominator floor for edge ratios, percentage points.
    pub iv_floor: f64,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            short_min_dte: 1,
            short_max_dte: 15,
            micro_min_dte: 1,
            micro_max_dte: 15,
            month_min_dte: 25,
            month_max_dte: 45,
            month_wide_max_dte: 90,
            month_target_dte: 35.0,
            month_lambda: 0.35,
            month_top_n: 5,
            month_min_pool: 3,
            prefer_monthly: true,
            month_fallback_min_dte: 20,
            month_fallback_target_dte: 30,
            base_iv_min_dte: 30,
            base_iv_max_dte: 90,
            regime_ratio: 1.03,
            spike_ratio: 1.10,
            front_rich_ratio: 1.20,
            iv_floor: 12.0,
        }
    }
}

/// Calendar-family score constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub base: i32,
    pub contango: i32,
    pub backwardation: i32,
    pub spiky_front: i32,
    pub min_edge: f64,
    pub edge_strong: i32,
    pub edge_weak: i32,
    pub edge_poor: i32,
    pub hv: HvBuckets,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base: 50,
            contango: -8,
            backwardation: 4,
            spiky_front: 6,
            min_edge: 1.05,
            edge_strong: 8,
            edge_weak: -8,
            edge_poor: -14,
            hv: HvBuckets::default(),
        }
    }
}

/// Step function of hv_rank used by the HV-aware calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HvBuckets {
    pub low_rank: f64,
    pub mid_rank: f64,
    pub high_rank: f64,
    pub extreme_rank: f64,
    pub low_bonus: i32,
    pub mid_bonus: i32,
    pub high_penalty: i32,
    pub extreme_penalty: i32,
}

impl Default for HvBuckets {
    fn default() -> Self {
        Self {
            low_rank: 20.0,
            mid_rank: 50.0,
            high_rank: 70.0,
            extreme_rank: 90.0,
            low_bonus: 10,
            mid_bonus: 4,
            high_penalty: -4,
            extreme_penalty: -10,
        }
    }
}

impl HvBuckets {
    /// `<=low: low_bonus, <=mid: mid_bonus, <=high: 0, <=extreme: high_penalty, else extreme_penalty`
    pub fn points(&self, hv_rank: f64) -> i32 {
        if hv_rank <= self.low_rank {
            self.low_bonus
        } else if hv_rank <= self.mid_rank {
            self.mid_bonus
        } else if hv_rank <= self.high_rank {
            0
        } else if hv_rank <= self.extreme_rank {
            self.high_penalty
        } else {
            self.extreme_penalty
        }
    }
}

/// Continuous short-leg risk model constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub base: i32,
    pub dte_scale: f64,
    pub dte_pivot: f64,
    pub dte_power: f64,
    pub dte_cap: f64,
    pub front_critical_dte: u32,
    pub front_critical_penalty: f64,
    pub front_near_dte: u32,
    pub front_near_penalty: f64,
    pub gamma_scale: f64,
    pub gamma_power: f64,
    pub gamma_ratio_cap: f64,
    pub curvature_scale: f64,
    pub squeeze_floor: f64,
    pub squeeze_span: f64,
    pub backwardation: i32,
    pub contango: i32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            base: 35,
            dte_scale: 26.0,
            dte_pivot: 6.5,
            dte_power: 1.25,
            dte_cap: 30.0,
            front_critical_dte: 1,
            front_critical_penalty: 6.0,
            front_near_dte: 3,
            front_near_penalty: 3.0,
            gamma_scale: 22.0,
            gamma_power: 0.75,
            gamma_ratio_cap: 2.0,
            curvature_scale: 10.0,
            squeeze_floor: 1.10,
            squeeze_span: 0.70,
            backwardation: 4,
            contango: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    pub diagonal: DiagonalConfig,
    pub vertical: VerticalConfig,
    pub iron_condor: IronCondorConfig,
    pub long_gamma: LongGammaConfig,
    pub auto: AutoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagonalConfig {
    pub long_min_dte: u32,
    pub long_max_dte: u32,
    pub long_fallback_max_dte: u32,
    pub long_target_dte: f64,
    pub long_lambda: f64,
    pub long_prefer_monthly: bool,
    pub long_min_gap_vs_short: u32,
    /// Short strike is the first listed strike above spot times this.
    pub short_strike_buffer: f64,
    pub edge_scale: f64,
    pub edge_min: i32,
    pub edge_max: i32,
    pub structure_bonus: i32,
    pub negative_edge_penalty: i32,
    pub rich_edge: f64,
    pub risk_base: i32,
    pub negative_edge_risk: i32,
}

impl Default for DiagonalConfig {
    fn default() -> Self {
        Self {
            long_min_dte: 30,
            long_max_dte: 45,
            long_fallback_max_dte: 90,
            long_target_dte: 38.0,
            long_lambda: 0.25,
            long_prefer_monthly: false,
            long_min_gap_vs_short: 20,
            short_strike_buffer: 1.005,
            edge_scale: 80.0,
            edge_min: -20,
            edge_max: 40,
            structure_bonus: 10,
            negative_edge_penalty: -30,
            rich_edge: 0.15,
            risk_base: 30,
            negative_edge_risk: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerticalConfig {
    /// PUT sells a bull put spread, CALL a bear call spread.
    pub side: OptionSide,
    pub short_delta: f64,
    pub long_delta: f64,
    pub min_dte: u32,
    pub hv_rank_above: f64,
    pub hv_bonus: i32,
    pub ror_rich: f64,
    pub ror_rich_bonus: i32,
    pub ror_ok: f64,
    pub ror_ok_bonus: i32,
}

impl Default for VerticalConfig {
    fn default() -> Self {
        Self {
            side: OptionSide::Put,
            short_delta: 0.30,
            long_delta: 0.10,
            min_dte: 15,
            hv_rank_above: 50.0,
            hv_bonus: 10,
            ror_rich: 0.25,
            ror_rich_bonus: 15,
            ror_ok: 0.15,
            ror_ok_bonus: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IronCondorConfig {
    pub short_delta: f64,
    pub long_delta: f64,
    pub min_dte: u32,
    pub hv_high_rank: f64,
    pub hv_high_bonus: i32,
    pub hv_extreme_rank: f64,
    pub hv_extreme_bonus: i32,
    pub hv_low_rank: f64,
    pub hv_low_penalty: i32,
    pub ror_rich: f64,
    pub ror_rich_bonus: i32,
    pub ror_ok: f64,
    pub ror_ok_bonus: i32,
    pub ror_poor: f64,
    pub ror_poor_penalty: i32,
    pub backwardation_penalty: i32,
    /// Return-on-risk above which the row is tagged `IC-RICH`.
    pub rich_tag_ror: f64,
}

impl Default for IronCondorConfig {
    fn default() -> Self {
        Self {
            short_delta: 0.20,
            long_delta: 0.10,
            min_dte: 20,
            hv_high_rank: 50.0,
            hv_high_bonus: 10,
            hv_extreme_rank: 80.0,
            hv_extreme_bonus: 10,
            hv_low_rank: 30.0,
            hv_low_penalty: -20,
            ror_rich: 0.30,
            ror_rich_bonus: 15,
            ror_ok: 0.20,
            ror_ok_bonus: 5,
            ror_poor: 0.15,
            ror_poor_penalty: -10,
            backwardation_penalty: -30,
            rich_tag_ror: 0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongGammaConfig {
    pub hv_cheap_rank: f64,
    pub hv_cheap_bonus: i32,
    pub hv_fair_rank: f64,
    pub hv_fair_bonus: i32,
    pub hv_rich_rank: f64,
    pub hv_rich_penalty: i32,
    pub hv_extreme_rank: f64,
    pub hv_extreme_penalty: i32,
    pub contango_bonus: i32,
    pub backwardation_penalty: i32,
    pub edge_threshold: f64,
    pub edge_points: i32,
    pub risk_base: i32,
    pub backwardation_risk: i32,
    pub rich_hv_rank: f64,
    pub rich_hv_risk: i32,
    /// Straddle gamma estimate `coeff / (price * vol * sqrt(years))` when the
    /// chain carries no gamma.
    pub gamma_fallback_coeff: f64,
    pub risk_dte_buckets: Vec<DteBucket>,
    pub gamma_buckets: Vec<GammaBucket>,
}

/// `dte < below` adds `points`; first matching bucket wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DteBucket {
    pub below: u32,
    pub points: i32,
}

/// `gamma >= at_least` adds `points`; first matching bucket wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GammaBucket {
    pub at_least: f64,
    pub points: i32,
}

impl Default for LongGammaConfig {
    fn default() -> Self {
        Self {
            hv_cheap_rank: 20.0,
            hv_cheap_bonus: 15,
            hv_fair_rank: 40.0,
            hv_fair_bonus: 5,
            hv_rich_rank: 60.0,
            hv_rich_penalty: -10,
            hv_extreme_rank: 80.0,
            hv_extreme_penalty: -20,
            contango_bonus: 5,
            backwardation_penalty: -15,
            edge_threshold: 0.10,
            edge_points: 10,
            risk_base: 20,
            backwardation_risk: 10,
            rich_hv_rank: 60.0,
            rich_hv_risk: 10,
            gamma_fallback_coeff: 0.8,
            risk_dte_buckets: vec![
                DteBucket { below: 7, points: 30 },
                DteBucket { below: 14, points: 20 },
                DteBucket { below: 21, points: 10 },
            ],
            gamma_buckets: vec![
                GammaBucket { at_least: 0.20, points: 50 },
                GammaBucket { at_least: 0.12, points: 30 },
                GammaBucket { at_least: 0.08, points: 15 },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoConfig {
    /// Symbols routed straight to the credit vertical.
    pub leveraged_etfs: Vec<String>,
    /// `edge_month` above which the diagonal is preferred.
    pub diagonal_edge: f64,
    pub high_hv_rank: f64,
    /// Short-leg iv (percentage points) treated as expensive.
    pub high_iv: f64,
    pub low_hv_rank: f64,
}

impl Default for AutoConfig {
    fn default() -> Self {
        let leveraged = [
            "TQQQ", "SQQQ", "SOXL", "SOXS", "UPRO", "SPXU", "SPXL", "TNA", "TZA", "LABU", "LABD", "TSLL", "NVDL",
            "FNGU", "TECL", "UVXY",
        ];
        Self {
            leveraged_etfs: leveraged.iter().map(|s| s.to_string()).collect(),
            diagonal_edge: 0.15,
            high_hv_rank: 60.0,
            high_iv: 60.0,
            low_hv_rank: 35.0,
        }
    }
}

impl AutoConfig {
    pub fn is_leveraged(&self, symbol: &str) -> bool {
        self.leveraged_etfs.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

/// Liquidity gate and limit-price constants used by the sniper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub strict_spread_ratio: f64,
    pub loose_spread_ratio: f64,
    pub cheap_mid: f64,
    pub cheap_spread_ratio: f64,
    pub low_mid: f64,
    pub low_spread_ratio: f64,
    pub tick_threshold: f64,
    pub tick_small: f64,
    pub tick_large: f64,
    pub passive_min_improvement: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            strict_spread_ratio: 0.15,
            loose_spread_ratio: 0.25,
            cheap_mid: 0.50,
            cheap_spread_ratio: 0.50,
            low_mid: 1.00,
            low_spread_ratio: 0.30,
            tick_threshold: 3.0,
            tick_small: 0.01,
            tick_large: 0.05,
            passive_min_improvement: 0.03,
        }
    }
}

impl AppConfig {
    /// Parse `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DomainError> {
        let cfg: Self = toml::from_str(content).map_err(|e| DomainError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the config path from `IVRADAR_CONFIG`, load it, then apply the
    /// `IVRADAR_DB` override.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::resolve(None)
    }

    /// Like [`AppConfig::from_env`], but an explicit path wins over
    /// `IVRADAR_CONFIG`.
    pub fn resolve(path: Option<&Path>) -> Result<Self, DomainError> {
        let path = path.map_or_else(Self::path_from_env, Path::to_path_buf);
        let mut cfg = Self::load(&path)?;
        if let Ok(db) = std::env::var(DB_ENV) {
            if !db.trim().is_empty() {
                cfg.paths.db_path = PathBuf::from(db);
            }
        }
        Ok(cfg)
    }

    pub fn path_from_env() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Default configuration rendered as TOML.
    pub fn template() -> Result<String, DomainError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| DomainError::Config(e.to_string()))
    }

    /// Write the default template; refuses to clobber an existing file unless
    /// `force` is set.
    pub fn write_template(path: &Path, force: bool) -> Result<(), DomainError> {
        if path.exists() && !force {
            return Err(DomainError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::Config(e.to_string()))?;
        }
        std::fs::write(path, Self::template()?).map_err(|e| DomainError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), DomainError> {
        let a = &self.anchors;
        if a.short_min_dte > a.short_max_dte {
            return Err(DomainError::Config("anchors.short_min_dte > anchors.short_max_dte".into()));
        }
        if a.micro_min_dte > a.micro_max_dte {
            return Err(DomainError::Config("anchors.micro_min_dte > anchors.micro_max_dte".into()));
        }
        if a.month_min_dte > a.month_max_dte || a.month_max_dte > a.month_wide_max_dte {
            return Err(DomainError::Config("anchors month window must satisfy min <= max <= wide_max".into()));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(a.iv_floor) {
            return Err(DomainError::Config("anchors.iv_floor must be positive".into()));
        }
        if !positive(self.risk.dte_pivot) {
            return Err(DomainError::Config("risk.dte_pivot must be positive".into()));
        }
        if !positive(self.risk.squeeze_span) {
            return Err(DomainError::Config("risk.squeeze_span must be positive".into()));
        }
        if self.scan.atm_probe_strikes == 0 {
            return Err(DomainError::Config("scan.atm_probe_strikes must be at least 1".into()));
        }
        Ok(())
    }
}
