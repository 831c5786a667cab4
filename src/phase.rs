//! Phase classification.
//!
//! Two rules exist side by side. [`classify`] labels arbitrary dates (the
//! calendar) from a 0-based day offset or from prediction windows.
//! [`phase_for_cycle_day`] labels the current day of an ongoing cycle (the
//! home summary) from a 1-based day number and adds a FERTILE band after
//! ovulation. They disagree on some days; each caller keeps its own rule.

use tracing::debug;

use crate::models::{CycleRecord, Phase, Prediction};
use crate::settings::{DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH};

fn lengths(cycle: &CycleRecord) -> (i64, i64) {
    (
        cycle.period_length.unwrap_or(DEFAULT_PERIOD_LENGTH),
        cycle.cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH),
    )
}

/// Classify `date` against an ongoing cycle, or else a prediction.
///
/// A completed cycle passed as `active_cycle` is ignored. Prediction
/// windows are checked period first, then the ovulation window, then the
/// wider fertile window.
pub fn classify(
    date: chrono::NaiveDate,
    active_cycle: Option<&CycleRecord>,
    prediction: Option<&Prediction>,
) -> Phase {
    if let Some(cycle) = active_cycle.filter(|c| c.is_active()) {
        let cycle_day = (date - cycle.start_date).num_days();
        let (period_length, cycle_length) = lengths(cycle);
        let phase = if cycle_day < period_length {
            Phase::Menstruation
        } else if cycle_day < cycle_length - 17 {
            Phase::Follicular
        } else if cycle_day < cycle_length - 11 {
            Phase::Ovulation
        } else {
            Phase::Luteal
        };
        debug!(%date, cycle_day, ?phase, "classified against active cycle");
        return phase;
    }

    match prediction {
        Some(p) if p.is_in_period_window(date) => Phase::Menstruation,
        Some(p) if p.is_in_ovulation_window(date) => Phase::Ovulation,
        Some(p) if p.is_in_fertile_window(date) => Phase::Fertile,
        _ => Phase::Safe,
    }
}

/// Phase for the 1-based `day_in_cycle` of an ongoing cycle.
pub fn phase_for_cycle_day(cycle: &CycleRecord, day_in_cycle: i64) -> Phase {
    let (period_length, cycle_length) = lengths(cycle);
    if day_in_cycle <= period_length {
        Phase::Menstruation
    } else if day_in_cycle <= cycle_length - 17 {
        Phase::Follicular
    } else if day_in_cycle <= cycle_length - 11 {
        Phase::Ovulation
    } else if day_in_cycle <= cycle_length - 8 {
        Phase::Fertile
    } else {
        Phase::Luteal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::predict;
    use crate::settings::Settings;
    use chrono::{Duration, NaiveDate};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn active(start: &str) -> CycleRecord {
        CycleRecord::started(d(start))
    }

    #[test]
    fn nothing_known_is_safe() {
        assert_eq!(classify(d("2024-05-01"), None, None), Phase::Safe);
    }

    #[test]
    fn active_cycle_day_three_is_menstruation() {
        let today = d("2024-05-10");
        let cycle = active("2024-05-07");
        assert_eq!(classify(today, Some(&cycle), None), Phase::Menstruation);
    }

    #[test]
    fn active_cycle_boundaries_with_defaults() {
        let cycle = active("2024-01-01");
        let on = |day: i64| classify(cycle.start_date + Duration::days(day), Some(&cycle), None);
        assert_eq!(on(4), Phase::Menstruation);
        assert_eq!(on(5), Phase::Follicular);
        assert_eq!(on(10), Phase::Follicular);
        assert_eq!(on(11), Phase::Ovulation);
        assert_eq!(on(16), Phase::Ovulation);
        assert_eq!(on(17), Phase::Luteal);
        // no clamping on either side
        assert_eq!(on(-3), Phase::Menstruation);
        assert_eq!(on(90), Phase::Luteal);
    }

    #[test]
    fn active_cycle_wins_over_prediction() {
        let cycle = active("2024-01-01");
        let pred = predict(std::slice::from_ref(&cycle), Some(&Settings::default())).unwrap();
        // day 28 falls in the predicted period, but the active cycle says luteal
        assert_eq!(
            classify(d("2024-01-29"), Some(&cycle), Some(&pred)),
            Phase::Luteal
        );
    }

    #[test]
    fn completed_cycle_is_not_treated_as_active() {
        let cycle = active("2024-01-01").complete(d("2024-01-29"));
        assert_eq!(classify(d("2024-01-02"), Some(&cycle), None), Phase::Safe);
    }

    #[test]
    fn prediction_windows_ordered_narrow_first() {
        let mut c = active("2024-01-01");
        c.cycle_length = Some(28);
        c.period_length = Some(5);
        let pred = predict(&[c], Some(&Settings::default())).unwrap();
        // ovulation window 01-12..01-18, fertile 01-10..01-20
        assert_eq!(classify(d("2024-01-15"), None, Some(&pred)), Phase::Ovulation);
        assert_eq!(classify(d("2024-01-12"), None, Some(&pred)), Phase::Ovulation);
        assert_eq!(classify(d("2024-01-11"), None, Some(&pred)), Phase::Fertile);
        assert_eq!(classify(d("2024-01-20"), None, Some(&pred)), Phase::Fertile);
        assert_eq!(classify(d("2024-01-21"), None, Some(&pred)), Phase::Safe);
        assert_eq!(classify(d("2024-01-29"), None, Some(&pred)), Phase::Menstruation);
        assert_eq!(classify(d("2024-02-03"), None, Some(&pred)), Phase::Menstruation);
        assert_eq!(classify(d("2024-02-04"), None, Some(&pred)), Phase::Safe);
    }

    #[test]
    fn home_rule_bands_with_defaults() {
        let cycle = active("2024-01-01");
        assert_eq!(phase_for_cycle_day(&cycle, 1), Phase::Menstruation);
        assert_eq!(phase_for_cycle_day(&cycle, 5), Phase::Menstruation);
        assert_eq!(phase_for_cycle_day(&cycle, 6), Phase::Follicular);
        assert_eq!(phase_for_cycle_day(&cycle, 11), Phase::Follicular);
        assert_eq!(phase_for_cycle_day(&cycle, 12), Phase::Ovulation);
        assert_eq!(phase_for_cycle_day(&cycle, 17), Phase::Ovulation);
        assert_eq!(phase_for_cycle_day(&cycle, 18), Phase::Fertile);
        assert_eq!(phase_for_cycle_day(&cycle, 20), Phase::Fertile);
        assert_eq!(phase_for_cycle_day(&cycle, 21), Phase::Luteal);
    }

    #[test]
    fn rules_differ_after_ovulation() {
        let cycle = active("2024-01-01");
        // 0-based offset 17 is 1-based day 18
        let date = cycle.start_date + Duration::days(17);
        assert_eq!(classify(date, Some(&cycle), None), Phase::Luteal);
        assert_eq!(phase_for_cycle_day(&cycle, 18), Phase::Fertile);
    }

    #[test]
    fn observed_lengths_shift_bands() {
        let mut cycle = active("2024-01-01");
        cycle.period_length = Some(3);
        cycle.cycle_length = Some(35);
        let on = |day: i64| classify(cycle.start_date + Duration::days(day), Some(&cycle), None);
        assert_eq!(on(3), Phase::Follicular);
        assert_eq!(on(17), Phase::Follicular);
        assert_eq!(on(18), Phase::Ovulation);
        assert_eq!(on(24), Phase::Luteal);
    }
}
