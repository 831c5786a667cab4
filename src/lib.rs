//! On-device cycle tracking core.
//!
//! Predicts the next period and the ovulation and fertile windows from the
//! latest logged cycle, labels dates with a cycle phase, and summarises
//! cycle regularity. The predictor, classifier and statistics are pure
//! functions; [`tracker::Tracker`] wraps them around an in-memory store for
//! host applications.

pub mod backup;
pub mod error;
pub mod history;
pub mod logging;
pub mod models;
pub mod overview;
pub mod phase;
pub mod prediction;
pub mod settings;
pub mod stats;
pub mod tracker;

pub use error::{BackupError, HistoryError, RangeError, SettingsError, TrackerError};
pub use history::{CycleHistory, DayEntry, MemoryHistory, RecordMode};
pub use models::{CycleRecord, DailyRecord, DateRange, FlowLevel, Phase, Prediction, Symptom};
pub use phase::{classify, phase_for_cycle_day};
pub use prediction::predict;
pub use settings::{Settings, ThemeMode};
pub use stats::{CycleStatistics, RegularityScore};
pub use tracker::Tracker;
