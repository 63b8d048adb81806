//! JSON representation shared by the local storage and the document store
//!
//! Field names are camelCase. Values read from storage are validated into the domain types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use liftr_domain as domain;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: DateTime<Utc>,
    pub day_number: u8,
    pub day_name: String,
    pub duration: u32,
    pub exercises: Vec<ExerciseLog>,
}

impl From<&domain::Workout> for Workout {
    fn from(value: &domain::Workout) -> Self {
        Self {
            id: value.id.to_string(),
            date: value.date,
            day_number: u8::from(value.day),
            day_name: value.day_name.clone(),
            duration: value.duration,
            exercises: value.exercises.iter().map(ExerciseLog::from).collect(),
        }
    }
}

impl TryFrom<Workout> for domain::Workout {
    type Error = WorkoutError;

    fn try_from(value: Workout) -> Result<Self, Self::Error> {
        Ok(Self {
            id: domain::WorkoutID::new(&value.id)?,
            date: value.date,
            day: domain::DayNumber::new(value.day_number)?,
            day_name: value.day_name,
            duration: value.duration,
            exercises: value
                .exercises
                .into_iter()
                .map(domain::ExerciseLog::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub name: String,
    pub tier: String,
    pub sets: Vec<SetLog>,
}

impl From<&domain::ExerciseLog> for ExerciseLog {
    fn from(value: &domain::ExerciseLog) -> Self {
        Self {
            name: value.name.clone(),
            tier: value.tier.to_string(),
            sets: value.sets.iter().map(SetLog::from).collect(),
        }
    }
}

impl TryFrom<ExerciseLog> for domain::ExerciseLog {
    type Error = WorkoutError;

    fn try_from(value: ExerciseLog) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name,
            tier: domain::Tier::try_from(value.tier.as_str())?,
            sets: value
                .sets
                .into_iter()
                .map(domain::SetLog::try_from)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub set_number: u32,
    pub target_reps: u32,
    pub actual_reps: u32,
    pub weight: f32,
    pub completed: bool,
}

impl From<&domain::SetLog> for SetLog {
    fn from(value: &domain::SetLog) -> Self {
        Self {
            set_number: value.set_number,
            target_reps: value.target_reps,
            actual_reps: value.actual_reps,
            weight: f32::from(value.weight),
            completed: value.completed,
        }
    }
}

impl TryFrom<SetLog> for domain::SetLog {
    type Error = WorkoutError;

    fn try_from(value: SetLog) -> Result<Self, Self::Error> {
        Ok(Self {
            set_number: value.set_number,
            target_reps: value.target_reps,
            actual_reps: value.actual_reps,
            weight: domain::Weight::new(value.weight)?,
            completed: value.completed,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WorkoutError {
    #[error(transparent)]
    InvalidID(#[from] domain::WorkoutIDError),
    #[error(transparent)]
    InvalidDay(#[from] domain::DayNumberError),
    #[error(transparent)]
    InvalidTier(#[from] domain::TierError),
    #[error(transparent)]
    InvalidWeight(#[from] domain::WeightError),
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub rest_timer_seconds: u32,
    pub time_per_rep_seconds: u32,
    #[serde(default)]
    pub last_completed_day: Option<u8>,
}

impl From<&domain::UserSettings> for UserSettings {
    fn from(value: &domain::UserSettings) -> Self {
        Self {
            rest_timer_seconds: value.rest_timer_seconds,
            time_per_rep_seconds: value.time_per_rep_seconds,
            last_completed_day: value.last_completed_day.map(u8::from),
        }
    }
}

impl TryFrom<UserSettings> for domain::UserSettings {
    type Error = domain::DayNumberError;

    fn try_from(value: UserSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            rest_timer_seconds: value.rest_timer_seconds,
            time_per_rep_seconds: value.time_per_rep_seconds,
            last_completed_day: value
                .last_completed_day
                .map(domain::DayNumber::new)
                .transpose()?,
        })
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ExerciseWeights(pub BTreeMap<String, f32>);

impl From<&domain::ExerciseWeights> for ExerciseWeights {
    fn from(value: &domain::ExerciseWeights) -> Self {
        Self(
            value
                .iter()
                .map(|(name, weight)| (name.clone(), f32::from(*weight)))
                .collect(),
        )
    }
}

impl TryFrom<ExerciseWeights> for domain::ExerciseWeights {
    type Error = domain::WeightError;

    fn try_from(value: ExerciseWeights) -> Result<Self, Self::Error> {
        value
            .0
            .into_iter()
            .map(|(name, weight)| domain::Weight::new(weight).map(|weight| (name, weight)))
            .collect()
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
}

impl From<&domain::UserProfile> for UserProfile {
    fn from(value: &domain::UserProfile) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            email: value.email.clone(),
            display_name: value.display_name.clone(),
            spreadsheet_id: value.spreadsheet_id.as_ref().map(ToString::to_string),
        }
    }
}

impl TryFrom<UserProfile> for domain::UserProfile {
    type Error = ProfileError;

    fn try_from(value: UserProfile) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: domain::UserID::new(&value.user_id)?,
            email: value.email,
            display_name: value.display_name,
            spreadsheet_id: value
                .spreadsheet_id
                .filter(|id| !id.trim().is_empty())
                .map(|id| domain::SpreadsheetID::new(&id))
                .transpose()?,
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ProfileError {
    #[error(transparent)]
    InvalidUserID(#[from] domain::UserIDError),
    #[error(transparent)]
    InvalidSpreadsheetID(#[from] domain::SpreadsheetIDError),
}
