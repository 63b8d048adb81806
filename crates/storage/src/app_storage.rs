//! App storage
//!
//! The local storage is the source of truth of the app. The document store and the spreadsheet
//! are remote mirrors which are only reachable while online.

use liftr_domain as domain;

use crate::{
    Config,
    local_storage::LocalStorage,
    rest::{GlooNetSendRequest, REST, SendRequest},
    sheets::Sheets,
};

macro_rules! delegate {
    ($target: ident, $self: ident, $method: ident, $($arg: expr),*) => {
        $self.$target.$method($($arg),*)
    };
}

#[derive(Clone)]
pub struct AppStorage<S: SendRequest> {
    pub local: LocalStorage,
    pub rest: REST<S>,
    pub sheets: Sheets<S>,
}

impl AppStorage<GlooNetSendRequest> {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            local: LocalStorage,
            rest: REST::new(config.clone()),
            sheets: Sheets::new(config.clone()),
        }
    }
}

impl Default for AppStorage<GlooNetSendRequest> {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl<S: SendRequest> domain::WorkoutRepository for AppStorage<S> {
    fn read_workouts(&self) -> Result<Vec<domain::Workout>, domain::ReadError> {
        delegate!(local, self, read_workouts,)
    }

    fn write_workouts(&self, workouts: &[domain::Workout]) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_workouts, workouts)
    }
}

impl<S: SendRequest> domain::SettingsRepository for AppStorage<S> {
    fn read_settings(&self) -> Result<domain::UserSettings, domain::ReadError> {
        delegate!(local, self, read_settings,)
    }

    fn write_settings(&self, settings: &domain::UserSettings) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_settings, settings)
    }
}

impl<S: SendRequest> domain::ExerciseWeightsRepository for AppStorage<S> {
    fn read_exercise_weights(&self) -> Result<domain::ExerciseWeights, domain::ReadError> {
        delegate!(local, self, read_exercise_weights,)
    }

    fn write_exercise_weights(
        &self,
        weights: &domain::ExerciseWeights,
    ) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_exercise_weights, weights)
    }
}

impl<S: SendRequest> domain::ProfileRepository for AppStorage<S> {
    fn read_cached_profile(&self) -> Result<Option<domain::UserProfile>, domain::ReadError> {
        delegate!(local, self, read_cached_profile,)
    }

    fn write_cached_profile(&self, profile: &domain::UserProfile) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_cached_profile, profile)
    }

    fn delete_cached_profile(&self) -> Result<(), domain::WriteError> {
        delegate!(local, self, delete_cached_profile,)
    }
}

impl<S: SendRequest> domain::IdentityProvider for AppStorage<S> {
    fn current_user(&self) -> Option<domain::UserID> {
        delegate!(local, self, current_user,)
    }
}

impl<S: SendRequest> domain::SpreadsheetLinkRepository for AppStorage<S> {
    fn read_spreadsheet_id(&self) -> Result<Option<domain::SpreadsheetID>, domain::ReadError> {
        delegate!(local, self, read_spreadsheet_id,)
    }

    fn write_spreadsheet_id(&self, id: &domain::SpreadsheetID) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_spreadsheet_id, id)
    }
}

impl<S: SendRequest> domain::CredentialRepository for AppStorage<S> {
    fn read_credential(&self) -> Result<Option<domain::SheetsCredential>, domain::ReadError> {
        delegate!(local, self, read_credential,)
    }

    fn write_credential(
        &self,
        credential: &domain::SheetsCredential,
    ) -> Result<(), domain::WriteError> {
        delegate!(local, self, write_credential, credential)
    }

    fn delete_credential(&self) -> Result<(), domain::WriteError> {
        delegate!(local, self, delete_credential,)
    }
}

impl<S: SendRequest> domain::DocumentStore for AppStorage<S> {
    async fn fetch_profile(
        &self,
        user_id: &domain::UserID,
    ) -> Result<domain::UserProfile, domain::ReadError> {
        delegate!(rest, self, fetch_profile, user_id).await
    }

    async fn store_profile(&self, profile: &domain::UserProfile) -> Result<(), domain::WriteError> {
        delegate!(rest, self, store_profile, profile).await
    }

    async fn store_profile_spreadsheet_id(
        &self,
        user_id: &domain::UserID,
        spreadsheet_id: &domain::SpreadsheetID,
    ) -> Result<(), domain::WriteError> {
        delegate!(rest, self, store_profile_spreadsheet_id, user_id, spreadsheet_id).await
    }

    async fn fetch_workouts(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        delegate!(rest, self, fetch_workouts, user_id).await
    }

    async fn store_workout(
        &self,
        user_id: &domain::UserID,
        workout: &domain::Workout,
    ) -> Result<(), domain::WriteError> {
        delegate!(rest, self, store_workout, user_id, workout).await
    }

    async fn fetch_settings(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Option<domain::UserSettings>, domain::ReadError> {
        delegate!(rest, self, fetch_settings, user_id).await
    }

    async fn store_settings(
        &self,
        user_id: &domain::UserID,
        settings: &domain::UserSettings,
    ) -> Result<(), domain::WriteError> {
        delegate!(rest, self, store_settings, user_id, settings).await
    }

    async fn fetch_exercise_weights(
        &self,
        user_id: &domain::UserID,
    ) -> Result<Option<domain::ExerciseWeights>, domain::ReadError> {
        delegate!(rest, self, fetch_exercise_weights, user_id).await
    }

    async fn store_exercise_weights(
        &self,
        user_id: &domain::UserID,
        weights: &domain::ExerciseWeights,
    ) -> Result<(), domain::WriteError> {
        delegate!(rest, self, store_exercise_weights, user_id, weights).await
    }
}

impl<S: SendRequest> domain::SpreadsheetStore for AppStorage<S> {
    async fn is_spreadsheet_reachable(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
    ) -> bool {
        delegate!(sheets, self, is_spreadsheet_reachable, credential, id).await
    }

    async fn create_spreadsheet(
        &self,
        credential: &domain::SheetsCredential,
    ) -> Result<domain::SpreadsheetID, domain::WriteError> {
        delegate!(sheets, self, create_spreadsheet, credential).await
    }

    async fn append_workout_rows(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        workouts: &[domain::Workout],
    ) -> Result<(), domain::WriteError> {
        delegate!(sheets, self, append_workout_rows, credential, id, workouts).await
    }

    async fn read_workout_rows(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
    ) -> Result<Vec<domain::Workout>, domain::ReadError> {
        delegate!(sheets, self, read_workout_rows, credential, id).await
    }

    async fn write_statistics_sheets(
        &self,
        credential: &domain::SheetsCredential,
        id: &domain::SpreadsheetID,
        statistics: &domain::SpreadsheetStatistics,
    ) -> Result<(), domain::WriteError> {
        delegate!(sheets, self, write_statistics_sheets, credential, id, statistics).await
    }
}
