use crate::{DayNumber, ReadError, WriteError};

pub trait SettingsService {
    fn get_settings(&self) -> Result<UserSettings, ReadError>;
    fn update_settings(&self, update: SettingsUpdate) -> Result<UserSettings, WriteError>;
}

pub trait SettingsRepository {
    fn read_settings(&self) -> Result<UserSettings, ReadError>;
    fn write_settings(&self, settings: &UserSettings) -> Result<(), WriteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSettings {
    pub rest_timer_seconds: u32,
    pub time_per_rep_seconds: u32,
    pub last_completed_day: Option<DayNumber>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            rest_timer_seconds: 90,
            time_per_rep_seconds: 3,
            last_completed_day: None,
        }
    }
}

impl UserSettings {
    #[must_use]
    pub fn merge(self, update: SettingsUpdate) -> Self {
        Self {
            rest_timer_seconds: update
                .rest_timer_seconds
                .unwrap_or(self.rest_timer_seconds),
            time_per_rep_seconds: update
                .time_per_rep_seconds
                .unwrap_or(self.time_per_rep_seconds),
            last_completed_day: update
                .last_completed_day
                .unwrap_or(self.last_completed_day),
        }
    }
}

/// Partial update of the user settings. Fields set to `None` keep their current value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub rest_timer_seconds: Option<u32>,
    pub time_per_rep_seconds: Option<u32>,
    pub last_completed_day: Option<Option<DayNumber>>,
}
