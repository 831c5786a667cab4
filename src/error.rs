use chrono::NaiveDate;
use uuid::Uuid;

/// A closed date range was built with its bounds the wrong way round.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range start {start} is after range end {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    #[error("no such month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("cycle length {0} is outside 21..=35 days")]
    CycleLengthOutOfRange(i64),
    #[error("period length {0} is outside 3..=7 days")]
    PeriodLengthOutOfRange(i64),
    #[error("invalid settings document: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("cycle {0} not found")]
    CycleNotFound(Uuid),
    #[error("no daily record on {0}")]
    RecordNotFound(NaiveDate),
    #[error("end date {end} is before cycle start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("{0} cycles are marked ongoing, at most one is allowed")]
    MultipleActive(usize),
    #[error("more than one daily record on {0}")]
    DuplicateRecord(NaiveDate),
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed, wrong passphrase or corrupted backup")]
    Decryption,
    #[error("not a backup file or unsupported version")]
    Format,
    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backup contents invalid: {0}")]
    Invalid(#[from] HistoryError),
    #[error("backup settings invalid: {0}")]
    InvalidSettings(#[from] SettingsError),
}

/// Errors surfaced by the [`Tracker`](crate::tracker::Tracker) façade.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("tracker state lock poisoned")]
    Poisoned,
}
