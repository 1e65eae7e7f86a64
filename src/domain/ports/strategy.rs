//! Strategy port for scoring option structures.
//!
//! Defines the [`Strategy`] trait every variant implements. A strategy turns
//! one fully built [`Context`] into a scored [`ScanRow`], and may optionally
//! probe alternative short-leg ranks to rescue a symbol that misses the
//! caller's thresholds.
//!
//! # Overview
//!
//! - [`Strategy::evaluate`] is pure over its context: no network I/O, no
//!   panics for ordinary "cannot build a structure" conditions. Such rows
//!   carry a `*-FAIL` tag and a [`Blueprint`](crate::domain::entities::blueprint::Blueprint)
//!   with its `error` set.
//! - [`Strategy::recommend`] defaults to "nothing to probe".

use serde::Serialize;

use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{Recommendation, ScanRow};

/// Result of a rank probe: the first passing candidate (if any) and a short
/// summary string for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeOutcome {
    pub recommendation: Option<Recommendation>,
    pub summary: String,
}

impl ProbeOutcome {
    /// Outcome of a strategy that has nothing to probe.
    pub fn none() -> Self {
        Self {
            recommendation: None,
            summary: "-".to_string(),
        }
    }
}

/// Trait for strategy variants.
///
/// # Example
///
/// ```ignore
/// struct MyStrategy;
///
/// impl Strategy for MyStrategy {
///     fn name(&self) -> &'static str { "my_strategy" }
///
///     fn evaluate(&self, ctx: &Context) -> ScanRow {
///         // score ctx.features, attach a blueprint
///         todo!()
///     }
/// }
/// ```
pub trait Strategy: Send + Sync {
    /// Registry name of this strategy.
    fn name(&self) -> &'static str;

    /// Score one symbol.
    fn evaluate(&self, ctx: &Context) -> ScanRow;

    /// Search alternative short-leg ranks for one clearing
    /// `score >= min_score && risk <= max_risk`.
    fn recommend(&self, _ctx: &Context, _min_score: i32, _max_risk: i32) -> ProbeOutcome {
        ProbeOutcome::none()
    }
}
