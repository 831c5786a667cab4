//! Property tests for the predictor, classifier and statistics.

use chrono::{Duration, NaiveDate};
use cyclecore::stats::{coefficient_of_variation, mean, standard_deviation, variance};
use cyclecore::{classify, predict, CycleRecord, Phase, RegularityScore, Settings};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn cycle(offset: i64, cycle_length: Option<i64>, period_length: Option<i64>, completed: bool) -> CycleRecord {
    let mut c = CycleRecord::started(base() + Duration::days(offset));
    c.cycle_length = cycle_length;
    c.period_length = period_length;
    c.is_completed = completed;
    c
}

prop_compose! {
    fn arb_cycle()(
        offset in 0i64..2000,
        cycle_length in proptest::option::of(15i64..60),
        period_length in proptest::option::of(1i64..10),
        completed in any::<bool>(),
    ) -> CycleRecord {
        cycle(offset, cycle_length, period_length, completed)
    }
}

prop_compose! {
    fn arb_settings()(
        cycle_length_default in 21i64..=35,
        period_length_default in 3i64..=7,
        auto_calculate_cycle in any::<bool>(),
    ) -> Settings {
        Settings {
            cycle_length_default,
            period_length_default,
            auto_calculate_cycle,
            ..Settings::default()
        }
    }
}

proptest! {
    #[test]
    fn predict_is_idempotent(cycles in proptest::collection::vec(arb_cycle(), 0..6), settings in arb_settings()) {
        let a = predict(&cycles, Some(&settings));
        let b = predict(&cycles, Some(&settings));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn classify_is_idempotent(c in arb_cycle(), settings in arb_settings(), day in -40i64..120) {
        let date = c.start_date + Duration::days(day);
        let prediction = predict(std::slice::from_ref(&c), Some(&settings));
        let a = classify(date, Some(&c), prediction.as_ref());
        let b = classify(date, Some(&c), prediction.as_ref());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn no_history_no_prediction(settings in proptest::option::of(arb_settings())) {
        prop_assert!(predict(&[], settings.as_ref()).is_none());
    }

    #[test]
    fn windows_nest(c in arb_cycle(), settings in arb_settings()) {
        let p = predict(&[c], Some(&settings)).unwrap();
        prop_assert!(p.ovulation_window.contains(p.ovulation_date));
        prop_assert!(p.fertile_window.contains_range(&p.ovulation_window));
        prop_assert_eq!(p.ovulation_date, p.next_period_start - Duration::days(14));
        prop_assert_eq!(p.fertile_window.start(), p.next_period_start - Duration::days(19));
        prop_assert_eq!(p.fertile_window.end(), p.next_period_start - Duration::days(9));
    }

    #[test]
    fn confidence_tracks_observed_lengths(c in arb_cycle(), settings in proptest::option::of(arb_settings())) {
        let observed = c.cycle_length.is_some() && c.period_length.is_some();
        let p = predict(&[c], settings.as_ref()).unwrap();
        let expected = if observed { 0.7 } else { 0.5 };
        prop_assert_eq!(p.confidence, expected);
    }

    #[test]
    fn menstruation_for_first_days_of_active_cycle(
        period_length in proptest::option::of(1i64..10),
        day in 0i64..10,
    ) {
        let c = cycle(0, None, period_length, false);
        let phase = classify(c.start_date + Duration::days(day), Some(&c), None);
        let in_period = day < period_length.unwrap_or(5);
        prop_assert_eq!(phase == Phase::Menstruation, in_period);
    }

    #[test]
    fn prediction_only_labels_are_window_labels(c in arb_cycle(), day in -60i64..120) {
        let p = predict(&[c.clone()], None).unwrap();
        let phase = classify(c.start_date + Duration::days(day), None, Some(&p));
        prop_assert!(matches!(
            phase,
            Phase::Menstruation | Phase::Ovulation | Phase::Fertile | Phase::Safe
        ));
    }

    #[test]
    fn variance_is_population_variance(values in proptest::collection::vec(1.0f64..100.0, 1..20)) {
        let n = values.len() as f64;
        let avg = mean(&values).unwrap();
        let manual = values.iter().map(|v| (v - avg) * (v - avg)).sum::<f64>() / n;
        prop_assert!((variance(&values) - manual).abs() < 1e-9);
        prop_assert!((standard_deviation(&values) - manual.sqrt()).abs() < 1e-9);
        prop_assert!(variance(&values) >= 0.0);
    }

    #[test]
    fn constant_lengths_are_very_regular(len in 15i64..60, n in 1usize..12) {
        let values = vec![len as f64; n];
        let cv = coefficient_of_variation(&values).unwrap();
        prop_assert_eq!(RegularityScore::from_cv(cv), RegularityScore::VeryRegular);
    }
}
