//! Workout session
//!
//! The `SessionEngine` owns the one workout that may be in progress. A session is created from the
//! program catalog, ticks once per second while running and is finally sealed into a `Workout`
//! history record or discarded.
//!
//! The shape of a session (number of exercises and number of sets per exercise) is fixed when the
//! session is started. Later operations only change reps, weight and completion of single sets.

use chrono::{DateTime, Utc};

use crate::{
    DayNumber, ExerciseLog, ExerciseWeights, SetLog, Weight, Workout, WorkoutID, workout_day,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub day: DayNumber,
    pub day_name: String,
    pub exercise_logs: Vec<ExerciseLog>,
    pub elapsed_seconds: u32,
    pub is_paused: bool,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    fn new(day: DayNumber, weights: &ExerciseWeights, started_at: DateTime<Utc>) -> Self {
        let workout_day = workout_day(day);
        Self {
            day,
            day_name: workout_day.name.to_string(),
            exercise_logs: workout_day
                .exercises
                .iter()
                .map(|exercise| ExerciseLog {
                    name: exercise.name.to_string(),
                    tier: exercise.tier,
                    sets: (1..=exercise.target_sets)
                        .map(|set_number| SetLog {
                            set_number,
                            target_reps: exercise.target_reps,
                            actual_reps: 0,
                            weight: weights.get(exercise.name),
                            completed: false,
                        })
                        .collect(),
                })
                .collect(),
            elapsed_seconds: 0,
            is_paused: false,
            started_at,
        }
    }

    #[must_use]
    pub fn completed_set_count(&self) -> usize {
        self.exercise_logs
            .iter()
            .map(ExerciseLog::num_completed_sets)
            .sum()
    }

    #[must_use]
    pub fn total_set_count(&self) -> usize {
        self.exercise_logs.iter().map(|e| e.sets.len()).sum()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        let total = self.total_set_count();
        total > 0 && self.completed_set_count() == total
    }

    #[must_use]
    pub fn set(&self, position: Position) -> Option<&SetLog> {
        self.exercise_logs
            .get(position.exercise_idx)
            .and_then(|e| e.sets.get(position.set_idx))
    }

    fn set_mut(&mut self, position: Position) -> Option<(&str, &mut SetLog)> {
        self.exercise_logs
            .get_mut(position.exercise_idx)
            .and_then(|e| {
                e.sets
                    .get_mut(position.set_idx)
                    .map(|s| (e.name.as_str(), s))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub exercise_idx: usize,
    pub set_idx: usize,
}

impl Position {
    #[must_use]
    pub fn new(exercise_idx: usize, set_idx: usize) -> Self {
        Self {
            exercise_idx,
            set_idx,
        }
    }
}

/// Identifies the ticker belonging to one running phase of a session.
///
/// A new generation begins whenever a session starts or resumes. Ticks of any older generation are
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerGeneration(u64);

/// New default weight of an exercise resulting from a session operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultWeight {
    pub exercise_name: String,
    pub weight: Weight,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("a workout is already in progress")]
    AlreadyActive,
    #[error("no workout in progress")]
    NoActiveSession,
}

#[derive(Debug, Default)]
pub struct SessionEngine {
    session: Option<ActiveSession>,
    generation: u64,
}

impl SessionEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.session {
            None => SessionState::Idle,
            Some(session) if session.is_paused => SessionState::Paused,
            Some(_) => SessionState::Running,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start a session for the given day.
    ///
    /// Starting while another session is in progress is rejected and leaves the existing session
    /// unchanged.
    pub fn start_workout(
        &mut self,
        day: DayNumber,
        weights: &ExerciseWeights,
        now: DateTime<Utc>,
    ) -> Result<TickerGeneration, SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyActive);
        }
        self.session = Some(ActiveSession::new(day, weights, now));
        Ok(self.next_generation())
    }

    /// Switch between running and paused. Returns the resulting state.
    pub fn toggle_pause(&mut self) -> SessionState {
        let resumed = match &mut self.session {
            None => return SessionState::Idle,
            Some(session) => {
                session.is_paused = !session.is_paused;
                !session.is_paused
            }
        };
        if resumed {
            self.next_generation();
        }
        self.state()
    }

    /// The generation a ticker has to present, if the session is running.
    #[must_use]
    pub fn ticker_generation(&self) -> Option<TickerGeneration> {
        (self.state() == SessionState::Running).then_some(TickerGeneration(self.generation))
    }

    /// Advance the elapsed time by one second. Returns whether the tick was applied.
    pub fn tick(&mut self, generation: TickerGeneration) -> bool {
        if self.ticker_generation() != Some(generation) {
            return false;
        }
        match &mut self.session {
            Some(session) => {
                session.elapsed_seconds = session.elapsed_seconds.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Complete a set.
    ///
    /// Invalid positions and sets that are already completed are ignored. On success, the new
    /// default weight of the exercise is returned.
    pub fn record_set(
        &mut self,
        position: Position,
        actual_reps: u32,
        weight: Weight,
    ) -> Option<DefaultWeight> {
        let (exercise_name, set) = self.session.as_mut()?.set_mut(position)?;
        if set.completed {
            return None;
        }
        set.actual_reps = actual_reps;
        set.weight = weight;
        set.completed = true;
        Some(DefaultWeight {
            exercise_name: exercise_name.to_string(),
            weight,
        })
    }

    /// Change the weight of a set which has not been completed yet.
    pub fn update_weight(&mut self, position: Position, weight: Weight) -> Option<DefaultWeight> {
        let (exercise_name, set) = self.session.as_mut()?.set_mut(position)?;
        if set.completed {
            return None;
        }
        set.weight = weight;
        Some(DefaultWeight {
            exercise_name: exercise_name.to_string(),
            weight,
        })
    }

    /// Mark a completed set as not completed again. Reps and weight are kept.
    pub fn undo_set(&mut self, position: Position) -> bool {
        let Some((_, set)) = self
            .session
            .as_mut()
            .and_then(|session| session.set_mut(position))
        else {
            return false;
        };
        if !set.completed {
            return false;
        }
        set.completed = false;
        true
    }

    /// Build the history record of the active session without ending it.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Result<Workout, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoActiveSession)?;
        Ok(Workout {
            id: WorkoutID::generate(now),
            date: now,
            day: session.day,
            day_name: session.day_name.clone(),
            duration: session.elapsed_seconds,
            exercises: session.exercise_logs.clone(),
        })
    }

    /// Seal the session into a history record and return to idle.
    pub fn finish_workout(&mut self, now: DateTime<Utc>) -> Result<Workout, SessionError> {
        let workout = self.snapshot(now)?;
        self.end_session()?;
        Ok(workout)
    }

    /// Discard the session without creating a history record.
    pub fn cancel_workout(&mut self) -> Result<(), SessionError> {
        self.end_session()
    }

    fn end_session(&mut self) -> Result<(), SessionError> {
        self.session.take().ok_or(SessionError::NoActiveSession)?;
        self.next_generation();
        Ok(())
    }

    #[must_use]
    pub fn completed_set_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, ActiveSession::completed_set_count)
    }

    #[must_use]
    pub fn total_set_count(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, ActiveSession::total_set_count)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.as_ref().is_some_and(ActiveSession::is_complete)
    }

    #[must_use]
    pub fn current_position(&self) -> Option<Position> {
        self.session
            .as_ref()
            .and_then(|s| current_position(&s.exercise_logs))
    }

    #[must_use]
    pub fn previous_position(&self) -> Option<Position> {
        self.session
            .as_ref()
            .and_then(|s| previous_position(&s.exercise_logs))
    }

    /// Weight to propose for the current set in the guided flow.
    ///
    /// Prefers the weight already entered for the set, then the latest completed set of the same
    /// exercise with a weight, then the stored default.
    #[must_use]
    pub fn suggested_weight(&self, weights: &ExerciseWeights) -> Option<Weight> {
        let session = self.session.as_ref()?;
        let position = current_position(&session.exercise_logs)?;
        let exercise = session.exercise_logs.get(position.exercise_idx)?;
        let set = exercise.sets.get(position.set_idx)?;

        if !set.weight.is_zero() {
            return Some(set.weight);
        }

        Some(
            exercise.sets[..position.set_idx]
                .iter()
                .rev()
                .find(|s| s.completed && !s.weight.is_zero())
                .map_or_else(|| weights.get(&exercise.name), |s| s.weight),
        )
    }

    fn next_generation(&mut self) -> TickerGeneration {
        self.generation = self.generation.wrapping_add(1);
        TickerGeneration(self.generation)
    }
}

/// The first set in program order which is not completed yet.
#[must_use]
pub fn current_position(exercise_logs: &[ExerciseLog]) -> Option<Position> {
    positions(exercise_logs)
        .find(|(_, set)| !set.completed)
        .map(|(position, _)| position)
}

/// The last completed set in program order.
#[must_use]
pub fn previous_position(exercise_logs: &[ExerciseLog]) -> Option<Position> {
    positions(exercise_logs)
        .filter(|(_, set)| set.completed)
        .last()
        .map(|(position, _)| position)
}

fn positions(exercise_logs: &[ExerciseLog]) -> impl Iterator<Item = (Position, &SetLog)> {
    exercise_logs
        .iter()
        .enumerate()
        .flat_map(|(exercise_idx, exercise)| {
            exercise
                .sets
                .iter()
                .enumerate()
                .map(move |(set_idx, set)| (Position::new(exercise_idx, set_idx), set))
        })
}
