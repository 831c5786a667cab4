use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SettingsError;

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
pub const CYCLE_LENGTH_RANGE: std::ops::RangeInclusive<i64> = 21..=35;
pub const PERIOD_LENGTH_RANGE: std::ops::RangeInclusive<i64> = 3..=7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

/// User preferences.
///
/// Missing fields deserialize to the defaults (28, 5, auto-calculate on).
/// Ranges are checked when values are entered, not when predicting. The
/// notification, theme, lock and language fields are stored for the host
/// app and never read by the predictor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cycle_length_default: i64,
    pub period_length_default: i64,
    pub auto_calculate_cycle: bool,
    pub notification_enabled: bool,
    pub notification_days_before: u32,
    pub notification_time: NaiveTime,
    pub theme_mode: ThemeMode,
    pub app_lock_enabled: bool,
    pub privacy_mode_enabled: bool,
    pub language: String,
    pub onboarding_version: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cycle_length_default: DEFAULT_CYCLE_LENGTH,
            period_length_default: DEFAULT_PERIOD_LENGTH,
            auto_calculate_cycle: true,
            notification_enabled: true,
            notification_days_before: 3,
            notification_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            theme_mode: ThemeMode::System,
            app_lock_enabled: false,
            privacy_mode_enabled: false,
            language: "zh".to_string(),
            onboarding_version: 0,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !CYCLE_LENGTH_RANGE.contains(&self.cycle_length_default) {
            return Err(SettingsError::CycleLengthOutOfRange(self.cycle_length_default));
        }
        if !PERIOD_LENGTH_RANGE.contains(&self.period_length_default) {
            return Err(SettingsError::PeriodLengthOutOfRange(self.period_length_default));
        }
        Ok(())
    }

    /// Replace both length defaults, rejecting out-of-range input.
    pub fn with_cycle_parameters(
        &self,
        cycle_length: i64,
        period_length: i64,
    ) -> Result<Self, SettingsError> {
        let updated = Self {
            cycle_length_default: cycle_length,
            period_length_default: period_length,
            ..self.clone()
        };
        if let Err(e) = updated.validate() {
            warn!(cycle_length, period_length, error = %e, "rejected cycle parameters");
            return Err(e);
        }
        Ok(updated)
    }

    pub fn with_notifications(&self, enabled: bool, days_before: u32, time: NaiveTime) -> Self {
        Self {
            notification_enabled: enabled,
            notification_days_before: days_before,
            notification_time: time,
            ..self.clone()
        }
    }

    pub fn with_theme(&self, theme_mode: ThemeMode) -> Self {
        Self {
            theme_mode,
            ..self.clone()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            serde_json::from_str(json).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}
