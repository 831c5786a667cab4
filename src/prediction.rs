use chrono::Duration;
use tracing::debug;

use crate::models::{CycleRecord, DateRange, Prediction};
use crate::settings::{Settings, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};

/// Ovulation is assumed this many days before the next period.
pub const LUTEAL_DAYS: i64 = 14;
/// Half-width of the ovulation window around the ovulation date.
pub const OVULATION_MARGIN: u32 = 3;
/// Half-width of the fertile window around the ovulation date.
pub const FERTILE_MARGIN: u32 = 5;

const OBSERVED_CONFIDENCE: f32 = 0.7;
const DEFAULTED_CONFIDENCE: f32 = 0.5;

/// Predict the next period from a history ordered most recent first.
///
/// Only the latest cycle is used. With `auto_calculate_cycle` its observed
/// lengths win over the configured defaults; without settings the
/// defaults are 28 and 5 days. Returns `None` when there is no history.
pub fn predict(cycles: &[CycleRecord], settings: Option<&Settings>) -> Option<Prediction> {
    let latest = cycles.first()?;

    let auto = settings.is_some_and(|s| s.auto_calculate_cycle);
    let default_cycle = settings.map_or(DEFAULT_CYCLE_LENGTH, |s| s.cycle_length_default);
    let default_period = settings.map_or(DEFAULT_PERIOD_LENGTH, |s| s.period_length_default);

    let (cycle_length, period_length) = if auto {
        (
            latest.cycle_length.unwrap_or(default_cycle),
            latest.period_length.unwrap_or(default_period),
        )
    } else {
        (default_cycle, default_period)
    };

    let next_period_start = latest.start_date + Duration::days(cycle_length);
    let next_period_end = next_period_start + Duration::days(period_length);
    let ovulation_date = next_period_start - Duration::days(LUTEAL_DAYS);

    let confidence = if latest.cycle_length.is_some() && latest.period_length.is_some() {
        OBSERVED_CONFIDENCE
    } else {
        DEFAULTED_CONFIDENCE
    };

    debug!(
        latest_start = %latest.start_date,
        cycle_length,
        period_length,
        %next_period_start,
        confidence,
        "built prediction"
    );

    Some(Prediction {
        next_period_start,
        next_period_end,
        ovulation_date,
        ovulation_window: DateRange::around(ovulation_date, OVULATION_MARGIN, OVULATION_MARGIN),
        fertile_window: DateRange::around(ovulation_date, FERTILE_MARGIN, FERTILE_MARGIN),
        confidence,
        predicted_cycle_length: cycle_length,
        predicted_period_length: period_length,
    })
}
