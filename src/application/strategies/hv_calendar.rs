//! Calendar with a historical-volatility adjustment: cheap realised vol adds
//! to the score, rich realised vol subtracts. Risk is the calendar's.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::entities::context::Context;
use crate::domain::entities::scan_row::{ScanRow, StrategyDetail};
use crate::domain::ports::strategy::{ProbeOutcome, Strategy};
use crate::domain::values::policy::ShortLegPolicy;

use super::calendar::CalendarStrategy;

pub struct HvCalendarStrategy {
    calendar: CalendarStrategy,
}

impl HvCalendarStrategy {
    pub fn new(config: Arc<AppConfig>, policy: ShortLegPolicy) -> Self {
        Self {
            calendar: CalendarStrategy::new(config, policy),
        }
    }

    fn hv_adjust(&self, ctx: &Context) -> i32 {
        self.calendar.engine().hv_points(ctx.hv.hv_rank)
    }
}

impl Strategy for HvCalendarStrategy {
    fn name(&self) -> &'static str {
        "hv_calendar"
    }

    fn evaluate(&self, ctx: &Context) -> ScanRow {
        let hv_adjust = self.hv_adjust(ctx);
        let mut row = self.calendar.evaluate_with_hv(ctx, hv_adjust);
        row.detail = StrategyDetail::HvCalendar {
            squeeze_ratio: ctx.features.squeeze_ratio,
            hv_adjust,
        };
        row
    }

    fn recommend(&self, ctx: &Context, min_score: i32, max_risk: i32) -> ProbeOutcome {
        self.calendar
            .recommend_with_hv(ctx, min_score, max_risk, self.hv_adjust(ctx))
    }
}
