use chrono::{DateTime, Utc};
use derive_more::{Display, Into};
use uuid::Uuid;

use crate::{DayNumber, ReadError, Tier, UserSettings, WriteError};

pub trait WorkoutService {
    /// Most recent workouts first.
    fn get_workouts(&self) -> Result<Vec<Workout>, ReadError>;
    fn get_recent_workouts(&self, limit: usize) -> Result<Vec<Workout>, ReadError> {
        let mut workouts = self.get_workouts()?;
        workouts.truncate(limit);
        Ok(workouts)
    }
    /// Add a finished workout to the front of the history and record its day as the last
    /// completed day. Returns the updated settings.
    fn save_workout(&self, workout: &Workout) -> Result<UserSettings, WriteError>;
}

pub trait WorkoutRepository {
    fn read_workouts(&self) -> Result<Vec<Workout>, ReadError>;
    fn write_workouts(&self, workouts: &[Workout]) -> Result<(), WriteError>;
}

/// A finished workout as stored in the history.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    pub id: WorkoutID,
    pub date: DateTime<Utc>,
    pub day: DayNumber,
    pub day_name: String,
    pub duration: u32,
    pub exercises: Vec<ExerciseLog>,
}

impl Workout {
    #[must_use]
    pub fn num_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    #[must_use]
    pub fn num_completed_sets(&self) -> usize {
        self.exercises.iter().map(ExerciseLog::num_completed_sets).sum()
    }

    #[must_use]
    pub fn total_reps(&self) -> u32 {
        self.completed_sets().map(|(_, s)| s.actual_reps).sum()
    }

    /// Sum of reps times weight over all completed sets.
    #[must_use]
    pub fn volume(&self) -> f32 {
        self.exercises.iter().map(ExerciseLog::volume).sum()
    }

    pub fn completed_sets(&self) -> impl Iterator<Item = (&ExerciseLog, &SetLog)> {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter().filter(|s| s.completed).map(move |s| (e, s)))
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkoutID(String);

impl AsRef<str> for WorkoutID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl WorkoutID {
    /// Generate an id of the form `workout_<unix millis>_<random suffix>`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("workout_{}_{}", now.timestamp_millis(), &suffix[..9]))
    }

    pub fn new(id: &str) -> Result<Self, WorkoutIDError> {
        let trimmed_id = id.trim();

        if trimmed_id.is_empty() {
            return Err(WorkoutIDError::Empty);
        }

        Ok(Self(trimmed_id.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WorkoutIDError {
    #[error("Workout ID must not be empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseLog {
    pub name: String,
    pub tier: Tier,
    pub sets: Vec<SetLog>,
}

impl ExerciseLog {
    #[must_use]
    pub fn num_completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        self.sets
            .iter()
            .filter(|s| s.completed)
            .map(SetLog::volume)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetLog {
    pub set_number: u32,
    pub target_reps: u32,
    pub actual_reps: u32,
    pub weight: Weight,
    pub completed: bool,
}

impl SetLog {
    #[must_use]
    pub fn volume(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let reps = self.actual_reps as f32;
        reps * f32::from(self.weight)
    }
}

#[derive(Debug, Default, Display, Clone, Copy, Into, PartialEq, PartialOrd)]
pub struct Weight(f32);

impl Weight {
    pub const ZERO: Weight = Weight(0.0);

    pub fn new(value: f32) -> Result<Self, WeightError> {
        if !value.is_finite() {
            return Err(WeightError::NotFinite);
        }

        if value < 0.0 {
            return Err(WeightError::Negative);
        }

        Ok(Self(value))
    }

    /// Clamp user input to the valid range instead of rejecting it.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self::ZERO
        }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }
}

impl TryFrom<&str> for Weight {
    type Error = WeightError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().parse::<f32>() {
            Ok(parsed_value) => Weight::new(parsed_value),
            Err(_) => Err(WeightError::ParseError),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum WeightError {
    #[error("Weight must not be negative")]
    Negative,
    #[error("Weight must be a finite number")]
    NotFinite,
    #[error("Weight must be a decimal")]
    ParseError,
}

/// Sort workouts so that the most recent one comes first.
pub fn sort_by_date_descending(workouts: &mut [Workout]) {
    workouts.sort_by(|a, b| b.date.cmp(&a.date));
}
