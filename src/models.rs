use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RangeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowLevel {
    Light,
    Medium,
    Heavy,
}

impl FlowLevel {
    /// Ordinal value: LIGHT=1, MEDIUM=2, HEAVY=3.
    pub fn value(self) -> u8 {
        match self {
            FlowLevel::Light => 1,
            FlowLevel::Medium => 2,
            FlowLevel::Heavy => 3,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(FlowLevel::Light),
            2 => Some(FlowLevel::Medium),
            3 => Some(FlowLevel::Heavy),
            _ => None,
        }
    }

    /// Mean flow over a set of levels, truncated toward the lighter level.
    pub fn average<I: IntoIterator<Item = FlowLevel>>(levels: I) -> Option<Self> {
        let (sum, count) = levels
            .into_iter()
            .fold((0u32, 0u32), |(s, c), l| (s + u32::from(l.value()), c + 1));
        if count == 0 {
            return None;
        }
        Self::from_value((sum / count) as u8)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SymptomCategory {
    Physical,
    Emotional,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Symptom {
    AbdominalPain,
    LowerBackPain,
    BreastTenderness,
    Headache,
    Fatigue,
    MoodSwings,
    Irritability,
    Anxiety,
    Bloating,
    Nausea,
    Acne,
    Insomnia,
    AppetiteChanges,
    Other,
}

impl Symptom {
    pub const ALL: [Symptom; 14] = [
        Symptom::AbdominalPain,
        Symptom::LowerBackPain,
        Symptom::BreastTenderness,
        Symptom::Headache,
        Symptom::Fatigue,
        Symptom::MoodSwings,
        Symptom::Irritability,
        Symptom::Anxiety,
        Symptom::Bloating,
        Symptom::Nausea,
        Symptom::Acne,
        Symptom::Insomnia,
        Symptom::AppetiteChanges,
        Symptom::Other,
    ];

    pub fn category(self) -> SymptomCategory {
        match self {
            Symptom::MoodSwings | Symptom::Irritability | Symptom::Anxiety | Symptom::Insomnia => {
                SymptomCategory::Emotional
            }
            Symptom::Other => SymptomCategory::Other,
            _ => SymptomCategory::Physical,
        }
    }
}

/// One menstrual cycle, from a logged period start to the next one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub cycle_length: Option<i64>,
    pub period_length: Option<i64>,
    #[serde(default)]
    pub average_flow: Option<FlowLevel>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CycleRecord {
    /// A fresh, ongoing cycle with no observed lengths.
    pub fn started(start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            cycle_length: None,
            period_length: None,
            average_flow: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_completed
    }

    /// Days from start to end, or to `today` while the cycle is ongoing.
    pub fn duration(&self, today: NaiveDate) -> i64 {
        (self.end_date.unwrap_or(today) - self.start_date).num_days()
    }

    pub fn complete(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self.cycle_length = Some((end_date - self.start_date).num_days());
        self.is_completed = true;
        self.updated_at = Utc::now();
        self
    }

    pub fn with_period_length(mut self, period_length: i64) -> Self {
        self.period_length = Some(period_length);
        self.updated_at = Utc::now();
        self
    }
}

/// Observations for a single calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub cycle_id: Option<Uuid>,
    pub is_period: bool,
    pub flow_level: Option<FlowLevel>,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, cycle_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            date,
            cycle_id,
            is_period: false,
            flow_level: None,
            symptoms: BTreeSet::new(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_symptoms(&self) -> bool {
        !self.symptoms.is_empty()
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Turning the period flag on defaults the flow to light; turning it off clears it.
    pub fn set_period(&mut self, is_period: bool) {
        self.is_period = is_period;
        self.flow_level = if is_period {
            Some(self.flow_level.unwrap_or(FlowLevel::Light))
        } else {
            None
        };
        self.updated_at = Utc::now();
    }

    pub fn set_flow(&mut self, flow: FlowLevel) {
        self.flow_level = Some(flow);
        self.is_period = true;
        self.updated_at = Utc::now();
    }

    pub fn add_symptom(&mut self, symptom: Symptom) {
        self.symptoms.insert(symptom);
        self.updated_at = Utc::now();
    }

    pub fn remove_symptom(&mut self, symptom: Symptom) {
        self.symptoms.remove(&symptom);
        self.updated_at = Utc::now();
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self.updated_at = Utc::now();
    }
}

/// Closed range of calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::StartAfterEnd { start, end });
        }
        Ok(Self { start, end })
    }

    /// `before` days before `center` through `after` days after it.
    pub fn around(center: NaiveDate, before: u32, after: u32) -> Self {
        Self {
            start: center - Duration::days(i64::from(before)),
            end: center + Duration::days(i64::from(after)),
        }
    }

    pub fn month(year: i32, month: u32) -> Result<Self, RangeError> {
        let invalid = RangeError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(invalid.clone())?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or(invalid)?;
        Ok(Self {
            start,
            end: next - Duration::days(1),
        })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn expand(&self, days: u32) -> Self {
        let days = Duration::days(i64::from(days));
        Self {
            start: self.start - days,
            end: self.end + days,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

/// Forward estimate for the next period, recomputed on every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub next_period_start: NaiveDate,
    pub next_period_end: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub ovulation_window: DateRange,
    pub fertile_window: DateRange,
    pub confidence: f32,
    pub predicted_cycle_length: i64,
    pub predicted_period_length: i64,
}

impl Prediction {
    pub fn confidence_level(&self) -> ConfidenceLevel {
        if self.confidence >= 0.8 {
            ConfidenceLevel::High
        } else if self.confidence >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn days_until_period(&self, today: NaiveDate) -> i64 {
        (self.next_period_start - today).num_days()
    }

    pub fn days_until_ovulation(&self, today: NaiveDate) -> i64 {
        (self.ovulation_date - today).num_days()
    }

    pub fn is_in_period_window(&self, date: NaiveDate) -> bool {
        self.next_period_start <= date && date <= self.next_period_end
    }

    pub fn is_in_ovulation_window(&self, date: NaiveDate) -> bool {
        self.ovulation_window.contains(date)
    }

    pub fn is_in_fertile_window(&self, date: NaiveDate) -> bool {
        self.fertile_window.contains(date)
    }
}

/// Cycle phase. Day-counting labels (FOLLICULAR, LUTEAL) and
/// window-based labels (FERTILE, SAFE) share this one type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
    Fertile,
    Safe,
}

/// Fixed display constants for a [`Phase`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PhaseInfo {
    pub label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Menstruation,
        Phase::Follicular,
        Phase::Ovulation,
        Phase::Luteal,
        Phase::Fertile,
        Phase::Safe,
    ];

    pub fn info(self) -> PhaseInfo {
        let (label, color, description) = match self {
            Phase::Menstruation => ("Period", "#FF6B6B", "Menstruation"),
            Phase::Follicular => ("Follicular", "#95E1D3", "Follicle development"),
            Phase::Ovulation => ("Ovulation", "#4ECDC4", "Days around ovulation"),
            Phase::Luteal => ("Luteal", "#FFB6C1", "Corpus luteum phase"),
            Phase::Fertile => ("Fertile", "#FFB6C1", "Conception more likely"),
            Phase::Safe => ("Low fertility", "#95E1D3", "Conception less likely"),
        };
        PhaseInfo {
            label,
            color,
            description,
        }
    }
}
