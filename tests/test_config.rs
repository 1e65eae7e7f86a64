use ivradar::config::AppConfig;
use ivradar::domain::error::DomainError;
use ivradar::IvRadar;

#[test]
fn test_template_written_then_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf/ivradar.toml");

    AppConfig::write_template(&path, false).unwrap();
    assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());

    let err = AppConfig::write_template(&path, false).unwrap_err();
    assert!(matches!(err, DomainError::Config(_)));
    AppConfig::write_template(&path, true).unwrap();
}

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg, AppConfig::default());
}

#[test]
fn test_explicit_path_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[scan]\nmin_score = 72\n\n[strategies.vertical]\nside = \"CALL\"\n").unwrap();

    let cfg = AppConfig::resolve(Some(&path)).unwrap();
    assert_eq!(cfg.scan.min_score, 72);
    assert_eq!(cfg.scan.max_risk, 70);
    assert_eq!(
        cfg.strategies.vertical.side,
        ivradar::domain::values::chain::OptionSide::Call
    );
}

#[test]
fn test_malformed_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[scan\nmin_score = ").unwrap();
    assert!(matches!(AppConfig::load(&path), Err(DomainError::Config(_))));
}

#[test]
fn test_radar_creates_database_and_reads_tickers() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = AppConfig::default();
    cfg.paths.db_path = dir.path().join("db/ivradar.db");
    cfg.paths.cache_dir = dir.path().join("cache");
    cfg.paths.tickers_csv = dir.path().join("tickers.csv");
    std::fs::write(&cfg.paths.tickers_csv, "Symbol\naapl\n# skip\nMSFT\nAAPL\n").unwrap();

    let radar = IvRadar::new(cfg).unwrap();
    assert!(dir.path().join("db/ivradar.db").exists());
    assert_eq!(radar.load_tickers(None).unwrap(), vec!["AAPL", "MSFT"]);
    assert_eq!(radar.drift("AAPL", 1).unwrap().batches_on_record, 0);

    let missing = radar.load_tickers(Some(dir.path().join("nope.csv").as_path()));
    assert!(matches!(missing, Err(DomainError::NotFound(_))));
}

#[test]
fn test_strategy_listing_includes_aliases() {
    let list = IvRadar::strategies();
    assert_eq!(list.len(), 7);
    let diag = list.iter().find(|s| s.name == "diagonal").unwrap();
    assert!(diag.aliases.contains(&"pmcc"));
}
