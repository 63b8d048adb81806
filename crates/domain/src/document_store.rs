use crate::{
    ExerciseWeights, ReadError, SpreadsheetID, UserID, UserProfile, UserSettings, Workout,
    WriteError,
};

/// Remote per-user document store that mirrors the local data across devices.
///
/// Singleton documents which do not exist yet are reported as `None`, a missing profile as
/// `ReadError::NotFound`. The number of fetched workouts is limited by the store.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn fetch_profile(&self, user_id: &UserID) -> Result<UserProfile, ReadError>;
    async fn store_profile(&self, profile: &UserProfile) -> Result<(), WriteError>;
    /// Store the spreadsheet id in the profile, keeping all other profile fields.
    async fn store_profile_spreadsheet_id(
        &self,
        user_id: &UserID,
        spreadsheet_id: &SpreadsheetID,
    ) -> Result<(), WriteError>;

    /// Most recent workouts first.
    async fn fetch_workouts(&self, user_id: &UserID) -> Result<Vec<Workout>, ReadError>;
    async fn store_workout(&self, user_id: &UserID, workout: &Workout) -> Result<(), WriteError>;

    async fn fetch_settings(&self, user_id: &UserID) -> Result<Option<UserSettings>, ReadError>;
    async fn store_settings(
        &self,
        user_id: &UserID,
        settings: &UserSettings,
    ) -> Result<(), WriteError>;

    async fn fetch_exercise_weights(
        &self,
        user_id: &UserID,
    ) -> Result<Option<ExerciseWeights>, ReadError>;
    async fn store_exercise_weights(
        &self,
        user_id: &UserID,
        weights: &ExerciseWeights,
    ) -> Result<(), WriteError>;
}
