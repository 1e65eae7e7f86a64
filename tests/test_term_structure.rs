mod common;

use common::{policy, term, FIXTURE};
use ivradar::application::term_structure::AnchorSelector;
use ivradar::config::AnchorConfig;
use ivradar::domain::error::TermStructureError;
use ivradar::domain::values::policy::ShortLegPolicy;
use ivradar::domain::values::regime::{Curvature, Regime};

fn selector() -> AnchorSelector {
    AnchorSelector::new(AnchorConfig::default())
}

fn front_policy() -> ShortLegPolicy {
    ShortLegPolicy {
        base_rank: 0,
        min_dte: 3,
        probe_count: 3,
    }
}

#[test]
fn test_backwardation_with_local_max_short() {
    let t = term(&[(1, 45.0), (5, 50.0), (10, 38.0), (35, 30.0), (60, 31.0)]);
    let f = selector().select(&t, &front_policy()).unwrap();

    assert_eq!(f.nearest.dte, 1);
    assert_eq!(f.short.dte, 5);
    assert_eq!(f.micro.dte, 5);
    assert_eq!(f.month.dte, 35);
    assert_eq!(f.regime, Regime::Backwardation);
    assert_eq!(f.curvature, Curvature::Normal);
    assert!((f.base_iv - 30.5).abs() < 1e-9);
    assert!((f.edge - 50.0 / 30.5).abs() < 1e-9);
}

#[test]
fn test_fixture_contango_spiky_front() {
    let t = term(FIXTURE);
    let f = selector().select(&t, &ShortLegPolicy::default()).unwrap();

    assert_eq!(f.nearest.dte, 1);
    assert_eq!(f.short.dte, 15);
    assert_eq!(f.micro.dte, 1);
    assert_eq!(f.month.dte, 36);
    assert_eq!(f.regime, Regime::Contango);
    assert_eq!(f.curvature, Curvature::SpikyFront);

    let base = (33.0 + 33.5 + 33.8 + 34.0) / 4.0;
    assert!((f.base_iv - base).abs() < 1e-9);
    assert!((f.edge - 31.0 / base).abs() < 1e-9);
    assert!((f.squeeze_ratio - 36.0 / base).abs() < 1e-9);
    assert!((f.edge_month - 2.0 / 31.0).abs() < 1e-9);
}

#[test]
fn test_short_rank_past_window_takes_last() {
    let t = term(FIXTURE);
    let f = selector().select(&t, &policy(9)).unwrap();
    assert_eq!(f.short.dte, 15);
}

#[test]
fn test_micro_falls_back_to_short_with_thin_window() {
    let t = term(&[(7, 30.0), (30, 28.0), (40, 29.0), (50, 30.0)]);
    let f = selector().select(&t, &front_policy()).unwrap();
    assert_eq!(f.short.dte, 7);
    assert_eq!(f.micro, f.short);
}

#[test]
fn test_edge_month_uses_iv_floor() {
    // short iv 5 is below the floor of 12
    let a = term(&[(5, 5.0), (30, 20.0), (35, 20.0), (40, 20.0)]);
    let f = selector().select(&a, &front_policy()).unwrap();
    assert!((f.edge_month - 15.0 / 12.0).abs() < 1e-9);

    let b = term(&[(5, 20.0), (30, 35.0), (35, 35.0), (40, 35.0)]);
    let f = selector().select(&b, &front_policy()).unwrap();
    assert!((f.edge_month - 0.75).abs() < 1e-9);
}

#[test]
fn test_anchors_are_members_of_term() {
    let t = term(FIXTURE);
    for rank in 0..4 {
        let f = selector().select(&t, &policy(rank)).unwrap();
        for anchor in [&f.nearest, &f.short, &f.micro, &f.month] {
            assert!(t.iter().any(|p| p.exp == anchor.exp && p.dte == anchor.dte));
        }
    }
}

#[test]
fn test_empty_term_is_an_error() {
    let err = selector().select(&[], &ShortLegPolicy::default()).unwrap_err();
    assert_eq!(err, TermStructureError::EmptyTermStructure);
}

#[test]
fn test_no_eligible_expiries() {
    let t = term(&[(1, 30.0), (2, 31.0)]);
    let err = selector().select(&t, &front_policy()).unwrap_err();
    assert_eq!(err, TermStructureError::NoEligibleExpiries { min_dte: 3 });
}
