use serde::{Deserialize, Serialize};

use crate::models::{CycleRecord, DailyRecord};

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`). Empty input gives 0.0.
pub fn variance(values: &[f64]) -> f64 {
    let Some(avg) = mean(values) else {
        return 0.0;
    };
    values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn standard_deviation(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `stddev / mean`; `None` when empty or the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    if avg == 0.0 {
        return None;
    }
    Some(standard_deviation(values) / avg)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegularityScore {
    VeryRegular,
    Regular,
    SomewhatRegular,
    Irregular,
    VeryIrregular,
}

impl RegularityScore {
    /// Buckets are half-open: a cv of exactly 0.10 is REGULAR.
    pub fn from_cv(cv: f64) -> Self {
        if cv < 0.10 {
            RegularityScore::VeryRegular
        } else if cv < 0.20 {
            RegularityScore::Regular
        } else if cv < 0.30 {
            RegularityScore::SomewhatRegular
        } else if cv < 0.40 {
            RegularityScore::Irregular
        } else {
            RegularityScore::VeryIrregular
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegularityScore::VeryRegular => "Very regular",
            RegularityScore::Regular => "Regular",
            RegularityScore::SomewhatRegular => "Somewhat regular",
            RegularityScore::Irregular => "Irregular",
            RegularityScore::VeryIrregular => "Very irregular",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RegularityScore::VeryRegular => "#4CAF50",
            RegularityScore::Regular => "#8BC34A",
            RegularityScore::SomewhatRegular => "#FFC107",
            RegularityScore::Irregular => "#FF9800",
            RegularityScore::VeryIrregular => "#F44336",
        }
    }
}

/// Summary over the recorded history, for the stats view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStatistics {
    pub total_cycles: usize,
    pub average_cycle_length: Option<f64>,
    pub average_period_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
    pub shortest_period: Option<i64>,
    pub longest_period: Option<i64>,
    pub regularity_score: RegularityScore,
    pub total_record_days: usize,
    pub cycle_lengths: Vec<i64>,
    pub period_lengths: Vec<i64>,
}

fn as_f64(values: &[i64]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}

impl CycleStatistics {
    /// Cycle lengths come from completed cycles; period lengths from any
    /// cycle that has one recorded. Fewer than two cycle lengths scores
    /// as very regular.
    pub fn from_history(cycles: &[CycleRecord], records: &[DailyRecord]) -> Self {
        let cycle_lengths: Vec<i64> = cycles
            .iter()
            .filter(|c| c.is_completed)
            .filter_map(|c| c.cycle_length)
            .collect();
        let period_lengths: Vec<i64> = cycles
            .iter()
            .filter_map(|c| c.period_length)
            .filter(|&p| p > 0)
            .collect();

        let cycle_f = as_f64(&cycle_lengths);
        let regularity_score = if cycle_lengths.len() < 2 {
            RegularityScore::VeryRegular
        } else {
            coefficient_of_variation(&cycle_f)
                .map_or(RegularityScore::VeryRegular, RegularityScore::from_cv)
        };

        let mut days: Vec<_> = records.iter().map(|r| r.date).collect();
        days.sort();
        days.dedup();

        Self {
            total_cycles: cycles.len(),
            average_cycle_length: mean(&cycle_f),
            average_period_length: mean(&as_f64(&period_lengths)),
            shortest_cycle: cycle_lengths.iter().copied().min(),
            longest_cycle: cycle_lengths.iter().copied().max(),
            shortest_period: period_lengths.iter().copied().min(),
            longest_period: period_lengths.iter().copied().max(),
            regularity_score,
            total_record_days: days.len(),
            cycle_lengths,
            period_lengths,
        }
    }

    pub fn cycle_length_variance(&self) -> f64 {
        variance(&as_f64(&self.cycle_lengths))
    }

    pub fn period_length_variance(&self) -> f64 {
        variance(&as_f64(&self.period_lengths))
    }

    pub fn cycle_length_standard_deviation(&self) -> f64 {
        self.cycle_length_variance().sqrt()
    }

    pub fn period_length_standard_deviation(&self) -> f64 {
        self.period_length_variance().sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn completed(start: &str, end: &str, period: Option<i64>) -> CycleRecord {
        let mut c = CycleRecord::started(d(start)).complete(d(end));
        c.period_length = period;
        c
    }

    #[test]
    fn population_variance() {
        let v = [28.0, 30.0, 26.0, 28.0];
        assert_eq!(mean(&v), Some(28.0));
        assert!((variance(&v) - 2.0).abs() < 1e-12);
        assert!((standard_deviation(&v) - 2f64.sqrt()).abs() < 1e-12);
        let cv = coefficient_of_variation(&v).unwrap();
        assert!((cv - 0.0505).abs() < 1e-3);
        assert_eq!(RegularityScore::from_cv(cv), RegularityScore::VeryRegular);
    }

    #[test]
    fn empty_input() {
        assert_eq!(mean(&[]), None);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(standard_deviation(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), None);
    }

    #[test]
    fn regularity_boundaries_take_stricter_bucket() {
        assert_eq!(RegularityScore::from_cv(0.0), RegularityScore::VeryRegular);
        assert_eq!(RegularityScore::from_cv(0.0999), RegularityScore::VeryRegular);
        assert_eq!(RegularityScore::from_cv(0.10), RegularityScore::Regular);
        assert_eq!(RegularityScore::from_cv(0.20), RegularityScore::SomewhatRegular);
        assert_eq!(RegularityScore::from_cv(0.30), RegularityScore::Irregular);
        assert_eq!(RegularityScore::from_cv(0.40), RegularityScore::VeryIrregular);
        assert_eq!(RegularityScore::from_cv(2.5), RegularityScore::VeryIrregular);
        assert_eq!(RegularityScore::Regular.label(), "Regular");
        assert_eq!(RegularityScore::VeryIrregular.color(), "#F44336");
    }

    #[test]
    fn summary_from_history() {
        let cycles = vec![
            CycleRecord::started(d("2024-03-25")),
            completed("2024-02-27", "2024-03-25", Some(4)),
            completed("2024-01-29", "2024-02-27", Some(6)),
            completed("2024-01-01", "2024-01-29", Some(5)),
        ];
        let stats = CycleStatistics::from_history(&cycles, &[]);
        assert_eq!(stats.total_cycles, 4);
        assert_eq!(stats.cycle_lengths, vec![27, 29, 28]);
        assert_eq!(stats.average_cycle_length, Some(28.0));
        assert_eq!(stats.shortest_cycle, Some(27));
        assert_eq!(stats.longest_cycle, Some(29));
        assert_eq!(stats.average_period_length, Some(5.0));
        assert_eq!(stats.shortest_period, Some(4));
        assert_eq!(stats.longest_period, Some(6));
        assert_eq!(stats.regularity_score, RegularityScore::VeryRegular);
        assert!((stats.cycle_length_variance() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn summary_empty_history() {
        let stats = CycleStatistics::from_history(&[], &[]);
        assert_eq!(stats.total_cycles, 0);
        assert_eq!(stats.average_cycle_length, None);
        assert_eq!(stats.cycle_length_variance(), 0.0);
        assert_eq!(stats.regularity_score, RegularityScore::VeryRegular);
    }

    #[test]
    fn irregular_history_scores_low() {
        let cycles = vec![
            completed("2024-03-10", "2024-04-30", None),
            completed("2024-02-20", "2024-03-10", None),
            completed("2024-01-01", "2024-02-20", None),
        ];
        // lengths 51, 19, 50
        let stats = CycleStatistics::from_history(&cycles, &[]);
        assert!(stats.regularity_score >= RegularityScore::Irregular);
    }

    #[test]
    fn record_days_are_distinct_dates() {
        let records = vec![
            DailyRecord::new(d("2024-01-01"), None),
            DailyRecord::new(d("2024-01-02"), None),
        ];
        let stats = CycleStatistics::from_history(&[], &records);
        assert_eq!(stats.total_record_days, 2);
    }
}
