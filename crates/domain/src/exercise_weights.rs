use std::collections::BTreeMap;

use crate::{ReadError, Weight, WriteError};

pub trait ExerciseWeightsService {
    fn get_exercise_weights(&self) -> Result<ExerciseWeights, ReadError>;
    /// Store the default weight of an exercise. Returns all weights after the update.
    fn set_exercise_weight(
        &self,
        exercise_name: &str,
        weight: Weight,
    ) -> Result<ExerciseWeights, WriteError>;
}

pub trait ExerciseWeightsRepository {
    fn read_exercise_weights(&self) -> Result<ExerciseWeights, ReadError>;
    fn write_exercise_weights(&self, weights: &ExerciseWeights) -> Result<(), WriteError>;
}

/// Last used weight per exercise name, used to prefill new sessions.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExerciseWeights(BTreeMap<String, Weight>);

impl ExerciseWeights {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, exercise_name: &str) -> Weight {
        self.0.get(exercise_name).copied().unwrap_or_default()
    }

    pub fn set(&mut self, exercise_name: &str, weight: Weight) {
        self.0.insert(exercise_name.to_string(), weight);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Weight)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Weight)> for ExerciseWeights {
    fn from_iter<T: IntoIterator<Item = (String, Weight)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
