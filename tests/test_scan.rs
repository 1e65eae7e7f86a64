//! Full pipeline through the facade: fake market data, in-memory SQLite.

mod common;

use common::{closes, radar, today, FakeMarketData, FIXTURE};
use ivradar::application::scan::{gate_for, ScanOptions};
use ivradar::application::sniper::{PricingOutcome, Urgency};
use ivradar::domain::values::gate::Gate;
use ivradar::IvRadar;

fn market() -> FakeMarketData {
    FakeMarketData::new()
        .with_symbol("AAA", 100.0, FIXTURE)
        .with_symbol("BBB", 50.0, &[(8, 30.0), (36, 32.0)])
        .with_symbol("TQQQ", 100.0, FIXTURE)
        .with_price("$VIX", 17.5)
        .with_history("AAA", closes())
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn opts(radar: &IvRadar, strategy: &str) -> ScanOptions {
    let mut o = ScanOptions::from_config(radar.config(), strategy);
    o.today = today();
    o
}

#[tokio::test]
async fn test_scan_skips_bad_symbols_and_saves_batch() {
    let radar = radar(market());
    let report = radar
        .scan(&symbols(&["AAA", "BBB", "CCC"]), &opts(&radar, "auto"))
        .await
        .unwrap();

    assert_eq!(report.strategy, "auto");
    assert_eq!(report.market_vix, Some(17.5));
    assert_eq!(report.universe_size, 1);
    assert_eq!(report.top.len(), 1);
    assert_eq!(report.top[0].row.symbol, "AAA");
    assert!(report.top[0].row.tag.starts_with("AUTO-"));

    let failed: Vec<&str> = report.errors.iter().map(|e| e.symbol.as_str()).collect();
    assert_eq!(failed, vec!["BBB", "CCC"]);
    assert!(report.errors[0].error.contains("usable expiries"));

    assert_eq!(report.batch_id, Some(1));
}

#[tokio::test]
async fn test_scan_without_save_leaves_no_batch() {
    let radar = radar(market());
    let mut o = opts(&radar, "calendar");
    o.save = false;
    let report = radar.scan(&symbols(&["AAA"]), &o).await.unwrap();
    assert_eq!(report.batch_id, None);

    let drift = radar.drift("AAA", 1).unwrap();
    assert_eq!(drift.batches_on_record, 0);
    assert!(drift.drift.is_none());
}

#[tokio::test]
async fn test_limit_truncates_universe() {
    let radar = radar(market());
    let mut o = opts(&radar, "calendar");
    o.limit = 1;
    let report = radar.scan(&symbols(&["TQQQ", "AAA"]), &o).await.unwrap();
    assert_eq!(report.top.len(), 1);
    assert_eq!(report.top[0].row.symbol, "TQQQ");
}

#[tokio::test]
async fn test_gates_partition_rows_into_buckets() {
    let radar = radar(market());
    for strategy in ["calendar", "vertical", "long_gamma", "diagonal", "auto"] {
        for (min_score, max_risk) in [(60, 70), (0, 100), (0, 10)] {
            let mut o = opts(&radar, strategy);
            o.min_score = min_score;
            o.max_risk = max_risk;
            o.save = false;
            let report = radar.scan(&symbols(&["AAA", "TQQQ"]), &o).await.unwrap();

            let count = |g: Gate| report.top.iter().filter(|r| r.gate == g).count();
            for gated in &report.top {
                assert_eq!(gated.gate, gate_for(&gated.row, min_score, max_risk), "{strategy}");
            }
            assert_eq!(report.strict.len(), count(Gate::Exec));
            assert_eq!(report.auto_adjusted.len(), count(Gate::Limit));
            assert_eq!(report.watch.len(), count(Gate::Wait));
            for row in &report.strict {
                assert!(row.passes(min_score, max_risk));
            }
        }
    }
}

#[tokio::test]
async fn test_repeat_scan_reports_zero_drift() {
    let radar = radar(market());
    let o = opts(&radar, "calendar");
    radar.scan(&symbols(&["AAA"]), &o).await.unwrap();
    let second = radar.scan(&symbols(&["AAA"]), &o).await.unwrap();
    assert_eq!(second.batch_id, Some(2));

    let report = radar.drift("aaa", 1).unwrap();
    assert_eq!(report.symbol, "AAA");
    assert_eq!(report.batches_on_record, 2);
    let drift = report.drift.unwrap();
    assert_eq!(drift.current_batch, 2);
    assert_eq!(drift.previous_batch, 1);
    assert!(drift.drift.abs() < 1e-9);

    assert!(radar.drift("AAA", 2).unwrap().drift.is_none());
    assert!(radar.drift("AAA", 0).is_err());
}

#[tokio::test]
async fn test_accepted_vertical_can_be_sniped() {
    let radar = radar(market());
    let mut o = opts(&radar, "vertical");
    o.min_score = 0;
    o.max_risk = 100;
    let report = radar.scan(&symbols(&["AAA"]), &o).await.unwrap();
    assert_eq!(report.top[0].gate, Gate::Exec);

    let snipe = radar.snipe("AAA", Urgency::Neutral).await.unwrap();
    assert_eq!(snipe.gate, Gate::Exec);
    assert_eq!(snipe.spot, 100.0);
    match snipe.outcome {
        PricingOutcome::Ready(fs) => {
            assert!(fs.is_credit);
            assert_eq!(fs.strategy, "BULL_PUT");
            assert_eq!(fs.legs.len(), 2);
            assert!(fs.limit_price > 0.0);
            assert!(fs.bid <= fs.ask);
        }
        PricingOutcome::Rejected { reason } => panic!("rejected: {reason}"),
    }
}

#[tokio::test]
async fn test_snipe_without_accepted_plan_is_not_found() {
    let radar = radar(market());
    let err = radar.snipe("AAA", Urgency::Passive).await.unwrap_err();
    assert!(err.to_string().contains("No accepted blueprint"));
}

#[tokio::test]
async fn test_unknown_strategy_is_rejected_before_fetching() {
    let radar = radar(market());
    let err = radar
        .scan(&symbols(&["AAA"]), &opts(&radar, "butterfly"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Unknown strategy"));
}
