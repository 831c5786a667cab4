//! Views derived from the history for the home, calendar and history screens.
//!
//! Every function here is pure: the caller passes `today` and a snapshot of
//! the store, and gets plain data back.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::RangeError;
use crate::models::{CycleRecord, DailyRecord, DateRange, FlowLevel, Phase, Prediction, Symptom};
use crate::phase::{classify, phase_for_cycle_day};
use crate::prediction::predict;
use crate::settings::{Settings, DEFAULT_CYCLE_LENGTH};

/// Where the user is in their cycle today.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleInfo {
    pub cycle: CycleRecord,
    pub phase: Phase,
    /// 1-based day since the cycle started.
    pub day_in_cycle: i64,
    /// Only set while the next period is still ahead.
    pub days_until_next_period: Option<i64>,
    pub prediction: Option<Prediction>,
}

impl CycleInfo {
    pub fn is_period(&self) -> bool {
        self.phase == Phase::Menstruation
    }

    pub fn is_ovulation(&self) -> bool {
        self.phase == Phase::Ovulation
    }

    pub fn is_fertile(&self) -> bool {
        self.phase == Phase::Fertile
    }

    /// Short day-count line for the summary card.
    pub fn day_label(&self) -> Option<String> {
        match self.days_until_next_period {
            Some(1) => Some("1 day until period".to_owned()),
            Some(n) => Some(format!("{n} days until period")),
            None if self.day_in_cycle > 0 => Some(format!("Day {}", self.day_in_cycle)),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeData {
    pub cycle_info: Option<CycleInfo>,
    pub total_cycles: usize,
    pub has_data: bool,
}

/// Home summary. An ongoing cycle is labelled by day number; otherwise the
/// latest cycle's prediction drives the phase.
pub fn home_data(cycles: &[CycleRecord], settings: Option<&Settings>, today: NaiveDate) -> HomeData {
    let cycle_info = match cycles.iter().find(|c| c.is_active()) {
        Some(active) => Some(active_cycle_info(active, today)),
        None => cycles
            .first()
            .and_then(|latest| predicted_cycle_info(cycles, latest, settings, today)),
    };
    HomeData {
        cycle_info,
        total_cycles: cycles.len(),
        has_data: !cycles.is_empty(),
    }
}

fn active_cycle_info(cycle: &CycleRecord, today: NaiveDate) -> CycleInfo {
    let day_in_cycle = (today - cycle.start_date).num_days() + 1;
    let cycle_length = cycle.cycle_length.unwrap_or(DEFAULT_CYCLE_LENGTH);
    let remaining = cycle_length - day_in_cycle;
    CycleInfo {
        cycle: cycle.clone(),
        phase: phase_for_cycle_day(cycle, day_in_cycle),
        day_in_cycle,
        days_until_next_period: (remaining > 0).then_some(remaining),
        prediction: None,
    }
}

fn predicted_cycle_info(
    cycles: &[CycleRecord],
    latest: &CycleRecord,
    settings: Option<&Settings>,
    today: NaiveDate,
) -> Option<CycleInfo> {
    let prediction = predict(cycles, settings)?;
    let remaining = prediction.days_until_period(today);
    Some(CycleInfo {
        cycle: latest.clone(),
        phase: classify(today, None, Some(&prediction)),
        day_in_cycle: (today - latest.start_date).num_days() + 1,
        days_until_next_period: (remaining > 0).then_some(remaining),
        prediction: Some(prediction),
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarDayType {
    Normal,
    Period,
    PredictedPeriod,
    Ovulation,
    Fertile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarDay {
    /// Padding before the 1st or after the last day of the month.
    Empty,
    Day(CalendarCell),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub record: Option<DailyRecord>,
    pub phase: Phase,
    pub day_type: CalendarDayType,
    pub is_today: bool,
    pub is_predicted_period: bool,
    pub is_predicted_ovulation: bool,
    pub is_predicted_fertile: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Sunday-first grid, a multiple of seven cells long.
    pub days: Vec<CalendarDay>,
    pub prediction: Option<Prediction>,
    pub has_data: bool,
}

fn day_type(date: NaiveDate, record: Option<&DailyRecord>, prediction: Option<&Prediction>) -> CalendarDayType {
    if record.is_some_and(|r| r.is_period) {
        return CalendarDayType::Period;
    }
    match prediction {
        Some(p) if p.is_in_period_window(date) => CalendarDayType::PredictedPeriod,
        Some(p) if p.is_in_ovulation_window(date) => CalendarDayType::Ovulation,
        Some(p) if p.is_in_fertile_window(date) => CalendarDayType::Fertile,
        _ => CalendarDayType::Normal,
    }
}

/// Month grid for the calendar screen.
pub fn calendar_month(
    year: i32,
    month: u32,
    cycles: &[CycleRecord],
    records: &[DailyRecord],
    settings: Option<&Settings>,
    today: NaiveDate,
) -> Result<CalendarMonth, RangeError> {
    let range = DateRange::month(year, month)?;
    let prediction = predict(cycles, settings);
    let active = cycles.iter().find(|c| c.is_active());
    let by_date: HashMap<NaiveDate, &DailyRecord> = records
        .iter()
        .filter(|r| range.contains(r.date))
        .map(|r| (r.date, r))
        .collect();

    let leading = range.start().weekday().num_days_from_sunday() as usize;
    let mut days = vec![CalendarDay::Empty; leading];

    for date in range.dates() {
        let record = by_date.get(&date).copied();
        let p = prediction.as_ref();
        days.push(CalendarDay::Day(CalendarCell {
            date,
            day_of_month: date.day(),
            record: record.cloned(),
            phase: classify(date, active, p),
            day_type: day_type(date, record, p),
            is_today: date == today,
            is_predicted_period: p.is_some_and(|p| p.is_in_period_window(date)),
            is_predicted_ovulation: p.is_some_and(|p| p.is_in_ovulation_window(date)),
            is_predicted_fertile: p.is_some_and(|p| p.is_in_fertile_window(date)),
        }));
    }

    let trailing = (7 - days.len() % 7) % 7;
    days.extend(std::iter::repeat(CalendarDay::Empty).take(trailing));

    debug!(year, month, cells = days.len(), "built calendar month");
    Ok(CalendarMonth {
        year,
        month,
        days,
        prediction,
        has_data: !cycles.is_empty(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleWithRecords {
    pub cycle: CycleRecord,
    pub records: Vec<DailyRecord>,
}

impl CycleWithRecords {
    pub fn period_days(&self) -> usize {
        self.records.iter().filter(|r| r.is_period).count()
    }

    pub fn average_flow(&self) -> Option<FlowLevel> {
        FlowLevel::average(self.records.iter().filter_map(|r| r.flow_level))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryData {
    pub cycles: Vec<CycleWithRecords>,
    pub total_cycles: usize,
    pub has_data: bool,
    pub unassociated_records: Vec<DailyRecord>,
}

fn sorted_by_date(mut records: Vec<DailyRecord>) -> Vec<DailyRecord> {
    records.sort_by_key(|r| r.date);
    records
}

/// Cycles newest first, each with its own records oldest first.
pub fn history_data(cycles: &[CycleRecord], records: &[DailyRecord]) -> HistoryData {
    let mut grouped: Vec<CycleWithRecords> = cycles
        .iter()
        .map(|cycle| CycleWithRecords {
            cycle: cycle.clone(),
            records: sorted_by_date(
                records
                    .iter()
                    .filter(|r| r.cycle_id == Some(cycle.id))
                    .cloned()
                    .collect(),
            ),
        })
        .collect();
    grouped.sort_by(|a, b| b.cycle.start_date.cmp(&a.cycle.start_date));

    let unassociated_records =
        sorted_by_date(records.iter().filter(|r| r.cycle_id.is_none()).cloned().collect());

    HistoryData {
        total_cycles: cycles.len(),
        has_data: !cycles.is_empty() || !unassociated_records.is_empty(),
        cycles: grouped,
        unassociated_records,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleDetails {
    pub cycle: CycleRecord,
    pub records: Vec<DailyRecord>,
    pub period_days: usize,
    pub average_flow: Option<FlowLevel>,
    /// Up to three, most frequent first.
    pub common_symptoms: Vec<Symptom>,
}

pub fn cycle_details(cycles: &[CycleRecord], records: &[DailyRecord], id: Uuid) -> Option<CycleDetails> {
    let cycle = cycles.iter().find(|c| c.id == id)?.clone();
    let records = sorted_by_date(
        records
            .iter()
            .filter(|r| r.cycle_id == Some(id))
            .cloned()
            .collect(),
    );

    let mut counts: HashMap<Symptom, usize> = HashMap::new();
    for symptom in records.iter().flat_map(|r| r.symptoms.iter().copied()) {
        *counts.entry(symptom).or_default() += 1;
    }
    let mut ranked: Vec<(Symptom, usize)> = counts.into_iter().collect();
    // ties broken by symptom order so the result is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let with_records = CycleWithRecords { cycle, records };
    Some(CycleDetails {
        period_days: with_records.period_days(),
        average_flow: with_records.average_flow(),
        common_symptoms: ranked.into_iter().take(3).map(|(s, _)| s).collect(),
        cycle: with_records.cycle,
        records: with_records.records,
    })
}
