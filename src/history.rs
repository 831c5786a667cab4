use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::HistoryError;
use crate::models::{CycleRecord, DailyRecord, FlowLevel, Symptom};

/// Read side of the cycle store, as the predictor and views consume it.
pub trait CycleHistory {
    /// All cycles, most recent start first.
    fn cycles_desc(&self) -> Vec<CycleRecord>;
    fn records_for_cycle(&self, cycle_id: Uuid) -> Vec<DailyRecord>;
    /// The single ongoing cycle, if any.
    fn active_cycle(&self) -> Option<CycleRecord>;
    fn all_records(&self) -> Vec<DailyRecord>;
    fn record_on(&self, date: NaiveDate) -> Option<DailyRecord>;
}

/// How a logged day attaches to cycles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordMode {
    /// Period day for the ongoing cycle, starting one if none is open.
    #[default]
    Auto,
    /// Period day that opens a new cycle.
    NewCycle,
    /// Symptoms or notes only, not tied to a cycle.
    SymptomOnly,
}

/// Input for [`MemoryHistory::save_record`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayEntry {
    pub flow_level: Option<FlowLevel>,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    pub notes: Option<String>,
}

/// In-memory cycle store. Serializes as a plain snapshot; deserializing
/// goes through [`MemoryHistory::from_parts`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawHistory")]
pub struct MemoryHistory {
    cycles: Vec<CycleRecord>,
    records: Vec<DailyRecord>,
}

#[derive(Deserialize)]
struct RawHistory {
    #[serde(default)]
    cycles: Vec<CycleRecord>,
    #[serde(default)]
    records: Vec<DailyRecord>,
}

impl TryFrom<RawHistory> for MemoryHistory {
    type Error = HistoryError;

    fn try_from(raw: RawHistory) -> Result<Self, Self::Error> {
        Self::from_parts(raw.cycles, raw.records)
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from loaded data, checking its invariants.
    pub fn from_parts(
        mut cycles: Vec<CycleRecord>,
        mut records: Vec<DailyRecord>,
    ) -> Result<Self, HistoryError> {
        let active = cycles.iter().filter(|c| c.is_active()).count();
        if active > 1 {
            return Err(HistoryError::MultipleActive(active));
        }
        records.sort_by_key(|r| r.date);
        if let Some(w) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(HistoryError::DuplicateRecord(w[0].date));
        }
        cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(Self { cycles, records })
    }

    /// Re-check invariants, e.g. after deserializing a snapshot.
    pub fn validated(self) -> Result<Self, HistoryError> {
        Self::from_parts(self.cycles, self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty() && self.records.is_empty()
    }

    pub fn cycles(&self) -> &[CycleRecord] {
        &self.cycles
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    fn active_index(&self) -> Option<usize> {
        self.cycles.iter().position(|c| c.is_active())
    }

    fn insert_cycle(&mut self, cycle: CycleRecord) {
        let at = self
            .cycles
            .iter()
            .position(|c| c.start_date < cycle.start_date)
            .unwrap_or(self.cycles.len());
        self.cycles.insert(at, cycle);
    }

    /// Period-day count and mean flow over the records owned by `cycle_id`.
    fn period_summary(&self, cycle_id: Uuid) -> (i64, Option<FlowLevel>) {
        let owned = self.records.iter().filter(|r| r.cycle_id == Some(cycle_id));
        let period_days = owned.clone().filter(|r| r.is_period).count() as i64;
        let flow = FlowLevel::average(owned.filter_map(|r| r.flow_level));
        (period_days, flow)
    }

    fn close_out(&mut self, idx: usize, end: NaiveDate) -> Result<CycleRecord, HistoryError> {
        let current = &self.cycles[idx];
        if end < current.start_date {
            return Err(HistoryError::EndBeforeStart {
                start: current.start_date,
                end,
            });
        }
        let (period_days, flow) = self.period_summary(current.id);
        let mut done = current.clone().complete(end).with_period_length(period_days);
        done.average_flow = flow;
        self.cycles[idx] = done.clone();
        Ok(done)
    }

    /// Onboarding: record the last period start the user remembers.
    pub fn create_initial_cycle(&mut self, start: NaiveDate) -> Result<CycleRecord, HistoryError> {
        self.start_new_cycle(start)
    }

    /// Open a new ongoing cycle at `start`.
    ///
    /// An open cycle is completed at `start` first, with its period length
    /// taken from its period-day records. Starting on the same day as the
    /// open cycle returns that cycle unchanged.
    pub fn start_new_cycle(&mut self, start: NaiveDate) -> Result<CycleRecord, HistoryError> {
        if let Some(idx) = self.active_index() {
            if self.cycles[idx].start_date == start {
                return Ok(self.cycles[idx].clone());
            }
            let closed = self.close_out(idx, start)?;
            info!(cycle = %closed.id, length = ?closed.cycle_length, "closed previous cycle");
        }
        let cycle = CycleRecord::started(start);
        info!(cycle = %cycle.id, %start, "started cycle");
        self.insert_cycle(cycle.clone());
        Ok(cycle)
    }

    /// Complete the ongoing cycle at `end`. `Ok(None)` when nothing is open.
    pub fn end_current_cycle(&mut self, end: NaiveDate) -> Result<Option<CycleRecord>, HistoryError> {
        let Some(idx) = self.active_index() else {
            debug!(%end, "no ongoing cycle to end");
            return Ok(None);
        };
        let done = self.close_out(idx, end)?;
        info!(cycle = %done.id, %end, period_length = ?done.period_length, "ended cycle");
        Ok(Some(done))
    }

    /// Log or overwrite the record for `date`.
    ///
    /// The entry's flow replaces any stored one. Symptom-only entries
    /// never carry a flow level.
    pub fn save_record(
        &mut self,
        date: NaiveDate,
        mode: RecordMode,
        entry: DayEntry,
    ) -> Result<DailyRecord, HistoryError> {
        let target = match mode {
            RecordMode::NewCycle => Some(self.start_new_cycle(date)?.id),
            RecordMode::SymptomOnly => None,
            RecordMode::Auto => match self.active_index() {
                Some(idx) => Some(self.cycles[idx].id),
                None => Some(self.start_new_cycle(date)?.id),
            },
        };
        let is_period = mode != RecordMode::SymptomOnly;

        let idx = match self.records.binary_search_by_key(&date, |r| r.date) {
            Ok(idx) => idx,
            Err(idx) => {
                self.records.insert(idx, DailyRecord::new(date, None));
                idx
            }
        };
        let record = &mut self.records[idx];
        record.cycle_id = target.or(record.cycle_id);
        record.is_period = is_period;
        record.flow_level = entry.flow_level.filter(|_| is_period);
        record.updated_at = Utc::now();
        record.symptoms = entry.symptoms;
        record.set_notes(entry.notes);

        debug!(%date, ?mode, is_period, cycle = ?record.cycle_id, "saved daily record");
        Ok(record.clone())
    }

    /// Delete a cycle and the records it owns.
    pub fn delete_cycle(&mut self, id: Uuid) -> Result<CycleRecord, HistoryError> {
        let idx = self
            .cycles
            .iter()
            .position(|c| c.id == id)
            .ok_or(HistoryError::CycleNotFound(id))?;
        let removed = self.cycles.remove(idx);
        self.records.retain(|r| r.cycle_id != Some(id));
        info!(cycle = %id, "deleted cycle");
        Ok(removed)
    }

    pub fn delete_record(&mut self, date: NaiveDate) -> Result<DailyRecord, HistoryError> {
        let idx = self
            .records
            .binary_search_by_key(&date, |r| r.date)
            .map_err(|_| HistoryError::RecordNotFound(date))?;
        Ok(self.records.remove(idx))
    }

    pub fn clear(&mut self) {
        self.cycles.clear();
        self.records.clear();
        info!("cleared history");
    }
}

impl CycleHistory for MemoryHistory {
    fn cycles_desc(&self) -> Vec<CycleRecord> {
        self.cycles.clone()
    }

    fn records_for_cycle(&self, cycle_id: Uuid) -> Vec<DailyRecord> {
        self.records
            .iter()
            .filter(|r| r.cycle_id == Some(cycle_id))
            .cloned()
            .collect()
    }

    fn active_cycle(&self) -> Option<CycleRecord> {
        self.active_index().map(|i| self.cycles[i].clone())
    }

    fn all_records(&self) -> Vec<DailyRecord> {
        self.records.clone()
    }

    fn record_on(&self, date: NaiveDate) -> Option<DailyRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| self.records[i].clone())
    }
}
