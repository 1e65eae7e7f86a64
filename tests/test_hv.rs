mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Duration;

use common::{closes, today, FakeMarketData, MemoryCache};
use ivradar::application::hv::HvService;
use ivradar::domain::entities::hv_info::HvStatus;

#[tokio::test]
async fn test_hv_is_fetched_once_per_day() {
    let market = Arc::new(FakeMarketData::new().with_history("AAA", closes()));
    let service = HvService::new(market.clone(), Arc::new(MemoryCache::default()), 730);

    let first = service.get("AAA", today()).await;
    let second = service.get("AAA", today()).await;
    assert_eq!(first.status, HvStatus::Success);
    assert!((0.0..=100.0).contains(&first.hv_rank));
    assert_eq!(first, second);
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 1);

    service.get("AAA", today() + Duration::days(1)).await;
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_history_is_cached_as_error() {
    let market = Arc::new(FakeMarketData::new());
    let service = HvService::new(market.clone(), Arc::new(MemoryCache::default()), 730);

    let info = service.get("ZZZ", today()).await;
    assert_eq!(info.status, HvStatus::Error);
    assert!(!info.is_ok());
    service.get("ZZZ", today()).await;
    assert_eq!(market.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_short_history_is_an_error() {
    let market = Arc::new(FakeMarketData::new().with_history("AAA", vec![100.0; 10]));
    let service = HvService::new(market, Arc::new(MemoryCache::default()), 730);
    assert_eq!(service.get("AAA", today()).await.status, HvStatus::Error);
}
