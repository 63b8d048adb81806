//! Local storage
//!
//! All local data is kept as JSON in the `localStorage` of the browser. Reads and writes are
//! synchronous, so the local state is always updated before any remote request is started.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use ::log::warn;
use gloo_storage::Storage as _;
use liftr_domain as domain;
use liftr_web_app::log;
use strum::AsRefStr;

use crate::model;

#[derive(Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn get<T>(key: Key) -> Result<Option<T>, domain::ReadError>
    where
        T: for<'de> serde::Deserialize<'de>,
    {
        match gloo_storage::LocalStorage::get(key.as_ref()) {
            Ok(value) => Ok(Some(value)),
            Err(gloo_storage::errors::StorageError::KeyNotFound(_)) => Ok(None),
            Err(err) => Err(domain::ReadError::Other(err.into())),
        }
    }

    fn set<T: serde::Serialize>(key: Key, value: &T) -> Result<(), domain::WriteError> {
        gloo_storage::LocalStorage::set(key.as_ref(), value)
            .map_err(|err| domain::WriteError::Other(err.into()))
    }

    fn delete(key: Key) {
        gloo_storage::LocalStorage::delete(key.as_ref());
    }

    fn credential_at(
        now: DateTime<Utc>,
    ) -> Result<Option<domain::SheetsCredential>, domain::ReadError> {
        let (Some(access_token), Some(expiry)) = (
            Self::get::<String>(Key::AccessToken)?,
            Self::get::<i64>(Key::TokenExpiry)?,
        ) else {
            return Ok(None);
        };

        let credential = DateTime::from_timestamp_millis(expiry).map(|expires_at| {
            domain::SheetsCredential {
                access_token,
                expires_at,
            }
        });

        match credential {
            Some(credential) if !credential.is_expired(now) => Ok(Some(credential)),
            _ => {
                Self::delete(Key::AccessToken);
                Self::delete(Key::TokenExpiry);
                Ok(None)
            }
        }
    }
}

impl domain::WorkoutRepository for LocalStorage {
    fn read_workouts(&self) -> Result<Vec<domain::Workout>, domain::ReadError> {
        Ok(Self::get::<Vec<model::Workout>>(Key::WorkoutHistory)?
            .unwrap_or_default()
            .into_iter()
            .filter_map(|workout| {
                let id = workout.id.clone();
                domain::Workout::try_from(workout)
                    .inspect_err(|err| warn!("ignored invalid workout {id}: {err}"))
                    .ok()
            })
            .collect())
    }

    fn write_workouts(&self, workouts: &[domain::Workout]) -> Result<(), domain::WriteError> {
        Self::set(
            Key::WorkoutHistory,
            &workouts.iter().map(model::Workout::from).collect::<Vec<_>>(),
        )
    }
}

impl domain::SettingsRepository for LocalStorage {
    fn read_settings(&self) -> Result<domain::UserSettings, domain::ReadError> {
        match Self::get::<model::UserSettings>(Key::UserSettings)? {
            Some(settings) => domain::UserSettings::try_from(settings)
                .map_err(|err| domain::ReadError::Other(Box::new(err))),
            None => Ok(domain::UserSettings::default()),
        }
    }

    fn write_settings(&self, settings: &domain::UserSettings) -> Result<(), domain::WriteError> {
        Self::set(Key::UserSettings, &model::UserSettings::from(settings))
    }
}

impl domain::ExerciseWeightsRepository for LocalStorage {
    fn read_exercise_weights(&self) -> Result<domain::ExerciseWeights, domain::ReadError> {
        match Self::get::<model::ExerciseWeights>(Key::ExerciseWeights)? {
            Some(weights) => domain::ExerciseWeights::try_from(weights)
                .map_err(|err| domain::ReadError::Other(Box::new(err))),
            None => Ok(domain::ExerciseWeights::new()),
        }
    }

    fn write_exercise_weights(
        &self,
        weights: &domain::ExerciseWeights,
    ) -> Result<(), domain::WriteError> {
        Self::set(Key::ExerciseWeights, &model::ExerciseWeights::from(weights))
    }
}

impl domain::ProfileRepository for LocalStorage {
    fn read_cached_profile(&self) -> Result<Option<domain::UserProfile>, domain::ReadError> {
        Self::get::<model::UserProfile>(Key::UserProfile)?
            .map(|profile| {
                domain::UserProfile::try_from(profile)
                    .map_err(|err| domain::ReadError::Other(Box::new(err)))
            })
            .transpose()
    }

    fn write_cached_profile(&self, profile: &domain::UserProfile) -> Result<(), domain::WriteError> {
        Self::set(Key::UserProfile, &model::UserProfile::from(profile))
    }

    fn delete_cached_profile(&self) -> Result<(), domain::WriteError> {
        Self::delete(Key::UserProfile);
        Ok(())
    }
}

impl domain::IdentityProvider for LocalStorage {
    fn current_user(&self) -> Option<domain::UserID> {
        domain::ProfileRepository::read_cached_profile(self)
            .ok()
            .flatten()
            .map(|profile| profile.user_id)
    }
}

impl domain::SpreadsheetLinkRepository for LocalStorage {
    fn read_spreadsheet_id(&self) -> Result<Option<domain::SpreadsheetID>, domain::ReadError> {
        Ok(Self::get::<String>(Key::SpreadsheetID)?
            .and_then(|id| domain::SpreadsheetID::new(&id).ok()))
    }

    fn write_spreadsheet_id(&self, id: &domain::SpreadsheetID) -> Result<(), domain::WriteError> {
        Self::set(Key::SpreadsheetID, &id.to_string())
    }
}

impl domain::CredentialRepository for LocalStorage {
    fn read_credential(&self) -> Result<Option<domain::SheetsCredential>, domain::ReadError> {
        Self::credential_at(Utc::now())
    }

    fn write_credential(
        &self,
        credential: &domain::SheetsCredential,
    ) -> Result<(), domain::WriteError> {
        Self::set(Key::AccessToken, &credential.access_token)?;
        Self::set(Key::TokenExpiry, &credential.expires_at.timestamp_millis())
    }

    fn delete_credential(&self) -> Result<(), domain::WriteError> {
        Self::delete(Key::AccessToken);
        Self::delete(Key::TokenExpiry);
        Ok(())
    }
}

pub struct Log;

const MAX_LOG_ENTRIES: usize = 100;

impl log::Repository for Log {
    fn read_entries(&self) -> Result<VecDeque<log::Entry>, log::Error> {
        LocalStorage::get(Key::Log)
            .map(Option::unwrap_or_default)
            .map_err(|err| log::Error::Unknown(err.to_string()))
    }

    fn write_entry(&self, entry: log::Entry) -> Result<(), log::Error> {
        let mut entries = self.read_entries()?;
        entries.push_front(entry);
        entries.truncate(MAX_LOG_ENTRIES);
        LocalStorage::set(Key::Log, &entries).map_err(|err| log::Error::Unknown(err.to_string()))
    }
}

#[derive(AsRefStr, Clone, Copy)]
enum Key {
    #[strum(serialize = "liftr_workout_history")]
    WorkoutHistory,
    #[strum(serialize = "liftr_user_settings")]
    UserSettings,
    #[strum(serialize = "liftr_exercise_weights")]
    ExerciseWeights,
    #[strum(serialize = "liftr_spreadsheet_id")]
    SpreadsheetID,
    #[strum(serialize = "google_access_token")]
    AccessToken,
    #[strum(serialize = "google_token_expiry")]
    TokenExpiry,
    #[strum(serialize = "liftr_user_profile")]
    UserProfile,
    #[strum(serialize = "liftr_log")]
    Log,
}
