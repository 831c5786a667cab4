use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::backup::{self, Snapshot};
use crate::error::TrackerError;
use crate::history::{CycleHistory, DayEntry, MemoryHistory, RecordMode};
use crate::models::{CycleRecord, DailyRecord, Phase, Prediction};
use crate::overview::{self, CalendarMonth, CycleDetails, HistoryData, HomeData};
use crate::phase;
use crate::prediction;
use crate::settings::Settings;
use crate::stats::CycleStatistics;

/// Shared tracker state: settings plus the cycle store.
///
/// Every query recomputes its view from the current state, so callers
/// just re-query after a change. Locks are always taken settings first.
#[derive(Debug, Default)]
pub struct Tracker {
    settings: Mutex<Settings>,
    history: Mutex<MemoryHistory>,
}

fn guard<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, TrackerError> {
    m.lock().map_err(|_| TrackerError::Poisoned)
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Result<Self, TrackerError> {
        settings.validate()?;
        Ok(Self {
            settings: Mutex::new(settings),
            history: Mutex::new(MemoryHistory::new()),
        })
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, TrackerError> {
        snapshot.settings.validate()?;
        Ok(Self {
            settings: Mutex::new(snapshot.settings),
            history: Mutex::new(snapshot.history.validated()?),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Settings, &MemoryHistory) -> T) -> Result<T, TrackerError> {
        let settings = guard(&self.settings)?;
        let history = guard(&self.history)?;
        Ok(f(&*settings, &*history))
    }

    /// First-run setup: store the user's typical lengths and, if known,
    /// open a cycle at the last period start.
    pub fn setup(
        &self,
        last_period_start: Option<NaiveDate>,
        cycle_length: i64,
        period_length: i64,
    ) -> Result<Option<CycleRecord>, TrackerError> {
        let mut settings = guard(&self.settings)?;
        let updated = Settings {
            auto_calculate_cycle: true,
            ..settings.with_cycle_parameters(cycle_length, period_length)?
        };
        *settings = updated;
        drop(settings);

        let Some(start) = last_period_start else {
            return Ok(None);
        };
        let cycle = guard(&self.history)?.create_initial_cycle(start)?;
        info!(%start, cycle_length, period_length, "completed initial setup");
        Ok(Some(cycle))
    }

    pub fn settings(&self) -> Result<Settings, TrackerError> {
        Ok(guard(&self.settings)?.clone())
    }

    pub fn update_cycle_parameters(
        &self,
        cycle_length: i64,
        period_length: i64,
    ) -> Result<Settings, TrackerError> {
        let mut settings = guard(&self.settings)?;
        let updated = settings.with_cycle_parameters(cycle_length, period_length)?;
        *settings = updated.clone();
        Ok(updated)
    }

    pub fn set_auto_calculate(&self, enabled: bool) -> Result<(), TrackerError> {
        guard(&self.settings)?.auto_calculate_cycle = enabled;
        Ok(())
    }

    pub fn log_day(
        &self,
        date: NaiveDate,
        mode: RecordMode,
        entry: DayEntry,
    ) -> Result<DailyRecord, TrackerError> {
        Ok(guard(&self.history)?.save_record(date, mode, entry)?)
    }

    pub fn start_cycle(&self, start: NaiveDate) -> Result<CycleRecord, TrackerError> {
        Ok(guard(&self.history)?.start_new_cycle(start)?)
    }

    pub fn end_cycle(&self, end: NaiveDate) -> Result<Option<CycleRecord>, TrackerError> {
        Ok(guard(&self.history)?.end_current_cycle(end)?)
    }

    pub fn delete_cycle(&self, id: Uuid) -> Result<CycleRecord, TrackerError> {
        Ok(guard(&self.history)?.delete_cycle(id)?)
    }

    pub fn delete_record(&self, date: NaiveDate) -> Result<DailyRecord, TrackerError> {
        Ok(guard(&self.history)?.delete_record(date)?)
    }

    pub fn home(&self, today: NaiveDate) -> Result<HomeData, TrackerError> {
        self.read(|s, h| overview::home_data(h.cycles(), Some(s), today))
    }

    pub fn month(&self, year: i32, month: u32, today: NaiveDate) -> Result<CalendarMonth, TrackerError> {
        Ok(self.read(|s, h| {
            overview::calendar_month(year, month, h.cycles(), h.records(), Some(s), today)
        })??)
    }

    pub fn history(&self) -> Result<HistoryData, TrackerError> {
        self.read(|_, h| overview::history_data(h.cycles(), h.records()))
    }

    pub fn cycle_details(&self, id: Uuid) -> Result<Option<CycleDetails>, TrackerError> {
        self.read(|_, h| overview::cycle_details(h.cycles(), h.records(), id))
    }

    pub fn prediction(&self) -> Result<Option<Prediction>, TrackerError> {
        self.read(|s, h| prediction::predict(h.cycles(), Some(s)))
    }

    /// Calendar-rule phase for any date.
    pub fn phase_on(&self, date: NaiveDate) -> Result<Phase, TrackerError> {
        self.read(|s, h| {
            let predicted = prediction::predict(h.cycles(), Some(s));
            phase::classify(date, h.active_cycle().as_ref(), predicted.as_ref())
        })
    }

    pub fn stats(&self) -> Result<CycleStatistics, TrackerError> {
        self.read(|_, h| CycleStatistics::from_history(h.cycles(), h.records()))
    }

    pub fn snapshot(&self) -> Result<Snapshot, TrackerError> {
        self.read(|s, h| Snapshot::new(s.clone(), h.clone()))
    }

    pub fn export_json(&self) -> Result<String, TrackerError> {
        Ok(serde_json::to_string_pretty(&self.snapshot()?)?)
    }

    pub fn seal_backup(&self, passphrase: &str) -> Result<Vec<u8>, TrackerError> {
        Ok(backup::seal(passphrase, &self.snapshot()?)?)
    }

    /// Replace all state with a sealed backup's contents.
    pub fn restore_backup(&self, passphrase: &str, sealed: &[u8]) -> Result<(), TrackerError> {
        let snapshot = backup::open(passphrase, sealed)?;
        let mut settings = guard(&self.settings)?;
        let mut history = guard(&self.history)?;
        *settings = snapshot.settings;
        *history = snapshot.history;
        info!(cycles = history.cycles().len(), "restored backup");
        Ok(())
    }

    pub fn wipe_all_data(&self) -> Result<(), TrackerError> {
        guard(&self.history)?.clear();
        *guard(&self.settings)? = Settings::default();
        Ok(())
    }
}
