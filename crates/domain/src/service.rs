use log::{debug, error};

use crate::{
    CredentialRepository, DocumentStore, ExerciseWeights, ExerciseWeightsRepository,
    ExerciseWeightsService, IdentityProvider, ProfileRepository, ReadError, SettingsRepository,
    SettingsService, SettingsUpdate, SheetsCredential, SpreadsheetID, SpreadsheetLinkRepository,
    SpreadsheetService, SpreadsheetStore, StorageError, SyncError, SyncReport, SyncService,
    UserID, UserProfile, UserService, UserSettings, Weight, Workout, WorkoutRepository,
    WorkoutService, WriteError, spreadsheet_statistics,
    sync::{Fix, Issue, MESSAGE_NO_CREDENTIAL, MESSAGE_NO_SPREADSHEET, MESSAGE_NOT_SIGNED_IN},
    workout::sort_by_date_descending,
};

pub struct Service<R> {
    pub(crate) repository: R,
}

impl<R> Service<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

macro_rules! log_on_error {
    ($func: expr, $error: ident, $action: literal, $entity: literal) => {{
        let result = $func;
        match result {
            Ok(_) => {}
            Err(ref err) => match err {
                $error::Storage(storage) if storage.is_expected() => {
                    debug!("failed to {} {}: {err}", $action, $entity);
                }
                _ => {
                    error!("failed to {} {}: {err}", $action, $entity);
                }
            },
        }
        result
    }};
}

impl<R: WorkoutRepository + SettingsRepository> WorkoutService for Service<R> {
    fn get_workouts(&self) -> Result<Vec<Workout>, ReadError> {
        log_on_error!(
            self.repository.read_workouts(),
            ReadError,
            "get",
            "workouts"
        )
    }

    /// An error is returned only if the workout was not added to the history. Failing to store
    /// the last completed day is logged, and the updated settings are returned regardless.
    fn save_workout(&self, workout: &Workout) -> Result<UserSettings, WriteError> {
        let settings = log_on_error!(
            (|| -> Result<UserSettings, WriteError> {
                let settings = self
                    .repository
                    .read_settings()
                    .map_err(read_to_write)?
                    .merge(SettingsUpdate {
                        last_completed_day: Some(Some(workout.day)),
                        ..SettingsUpdate::default()
                    });
                let mut workouts = self.repository.read_workouts().map_err(read_to_write)?;
                workouts.insert(0, workout.clone());
                self.repository.write_workouts(&workouts)?;
                Ok(settings)
            })(),
            WriteError,
            "save",
            "workout"
        )?;
        let _ = log_on_error!(
            self.repository.write_settings(&settings),
            WriteError,
            "store",
            "last completed day"
        );
        Ok(settings)
    }
}

impl<R: SettingsRepository> SettingsService for Service<R> {
    fn get_settings(&self) -> Result<UserSettings, ReadError> {
        log_on_error!(
            self.repository.read_settings(),
            ReadError,
            "get",
            "settings"
        )
    }

    fn update_settings(&self, update: SettingsUpdate) -> Result<UserSettings, WriteError> {
        log_on_error!(
            (|| -> Result<UserSettings, WriteError> {
                let settings = self
                    .repository
                    .read_settings()
                    .map_err(read_to_write)?
                    .merge(update);
                self.repository.write_settings(&settings)?;
                Ok(settings)
            })(),
            WriteError,
            "update",
            "settings"
        )
    }
}

impl<R: ExerciseWeightsRepository> ExerciseWeightsService for Service<R> {
    fn get_exercise_weights(&self) -> Result<ExerciseWeights, ReadError> {
        log_on_error!(
            self.repository.read_exercise_weights(),
            ReadError,
            "get",
            "exercise weights"
        )
    }

    fn set_exercise_weight(
        &self,
        exercise_name: &str,
        weight: Weight,
    ) -> Result<ExerciseWeights, WriteError> {
        log_on_error!(
            (|| -> Result<ExerciseWeights, WriteError> {
                let mut weights = self
                    .repository
                    .read_exercise_weights()
                    .map_err(read_to_write)?;
                weights.set(exercise_name, weight);
                self.repository.write_exercise_weights(&weights)?;
                Ok(weights)
            })(),
            WriteError,
            "set",
            "exercise weight"
        )
    }
}

impl<R: ProfileRepository + DocumentStore> UserService for Service<R> {
    fn get_profile(&self) -> Result<Option<UserProfile>, ReadError> {
        log_on_error!(
            self.repository.read_cached_profile(),
            ReadError,
            "get",
            "profile"
        )
    }

    async fn sign_in(&self, profile: UserProfile) -> Result<UserProfile, SyncError> {
        let cached = self
            .repository
            .read_cached_profile()
            .ok()
            .flatten()
            .filter(|p| p.user_id == profile.user_id);
        let profile = UserProfile {
            spreadsheet_id: cached.and_then(|p| p.spreadsheet_id),
            ..profile
        };
        self.repository.write_cached_profile(&profile)?;

        let profile = match self.repository.fetch_profile(&profile.user_id).await {
            Ok(remote) => UserProfile {
                spreadsheet_id: remote.spreadsheet_id.or(profile.spreadsheet_id),
                ..profile
            },
            Err(ReadError::NotFound) => {
                log_on_error!(
                    self.repository.store_profile(&profile).await,
                    WriteError,
                    "create",
                    "profile"
                )?;
                profile
            }
            Err(err) => {
                return log_on_error!(Err(err), ReadError, "fetch", "profile")
                    .map_err(SyncError::from);
            }
        };
        self.repository.write_cached_profile(&profile)?;

        Ok(profile)
    }

    fn sign_out(&self) -> Result<(), WriteError> {
        log_on_error!(
            self.repository.delete_cached_profile(),
            WriteError,
            "delete",
            "profile"
        )
    }
}

impl<R> SyncService for Service<R>
where
    R: IdentityProvider
        + DocumentStore
        + ProfileRepository
        + WorkoutRepository
        + SettingsRepository
        + ExerciseWeightsRepository
        + SpreadsheetLinkRepository
        + CredentialRepository
        + SpreadsheetStore,
{
    async fn pull_remote_to_local(&self) -> Result<(), SyncError> {
        let user_id = self.user_id()?;

        let result = async {
            let remote_workouts = self.repository.fetch_workouts(&user_id).await?;
            let settings = self.repository.fetch_settings(&user_id).await?;
            let weights = self.repository.fetch_exercise_weights(&user_id).await?;

            let mut local_only = vec![];
            if !remote_workouts.is_empty() {
                local_only = self
                    .repository
                    .read_workouts()?
                    .into_iter()
                    .filter(|workout| remote_workouts.iter().all(|w| w.id != workout.id))
                    .collect::<Vec<_>>();
                let mut merged = remote_workouts;
                merged.extend(local_only.iter().cloned());
                sort_by_date_descending(&mut merged);
                self.repository.write_workouts(&merged)?;
            }

            if let Some(settings) = settings {
                self.repository.write_settings(&settings)?;
            }

            if let Some(weights) = weights {
                self.repository.write_exercise_weights(&weights)?;
            }

            for workout in &local_only {
                self.push_workout(workout).await;
            }

            Ok::<(), SyncError>(())
        }
        .await;

        log_on_error!(result, SyncError, "pull", "remote data")
    }

    async fn push_workout(&self, workout: &Workout) {
        if let Some(user_id) = self.repository.current_user() {
            let _ = log_on_error!(
                self.repository.store_workout(&user_id, workout).await,
                WriteError,
                "push",
                "workout"
            );
        }
    }

    async fn push_settings(&self, settings: &UserSettings) {
        if let Some(user_id) = self.repository.current_user() {
            let _ = log_on_error!(
                self.repository.store_settings(&user_id, settings).await,
                WriteError,
                "push",
                "settings"
            );
        }
    }

    async fn push_exercise_weights(&self, weights: &ExerciseWeights) {
        if let Some(user_id) = self.repository.current_user() {
            let _ = log_on_error!(
                self.repository
                    .store_exercise_weights(&user_id, weights)
                    .await,
                WriteError,
                "push",
                "exercise weights"
            );
        }
    }

    async fn publish_workout(&self, workout: &Workout, settings: &UserSettings) {
        self.push_workout(workout).await;
        self.push_settings(settings).await;
        self.mirror_workout_to_spreadsheet(workout).await;
    }

    async fn verify_and_reconcile_spreadsheet_link(&self) -> SyncReport {
        let Some(user_id) = self.repository.current_user() else {
            return SyncReport::failure(MESSAGE_NOT_SIGNED_IN);
        };
        let Some(profile) = self.profile(&user_id).await else {
            return SyncReport::failure(MESSAGE_NOT_SIGNED_IN);
        };
        let Some(credential) = self.credential() else {
            return SyncReport::failure(MESSAGE_NO_CREDENTIAL);
        };

        let local_id = self.repository.read_spreadsheet_id().ok().flatten();
        let profile_id = profile.spreadsheet_id.clone();

        if local_id.is_none() && profile_id.is_none() {
            return SyncReport::failure(MESSAGE_NO_SPREADSHEET);
        }

        let mut issues = vec![];
        let mut fixes = vec![];

        let local_reachable = match &local_id {
            Some(id) => self.is_reachable(&credential, id).await,
            None => false,
        };
        if local_id.is_some() && !local_reachable {
            issues.push(Issue::LocalNotReachable);
        }

        let profile_reachable = match &profile_id {
            Some(id) => self.is_reachable(&credential, id).await,
            None => false,
        };
        if profile_id.is_some() && !profile_reachable {
            issues.push(Issue::ProfileNotReachable);
        }

        let result = async {
            match (&local_id, &profile_id) {
                (Some(local), Some(remote)) if local != remote => {
                    issues.push(Issue::Mismatch);
                    if profile_reachable {
                        self.store_local_spreadsheet_id(remote)?;
                        fixes.push(Fix::LocalUpdatedFromProfile);
                    } else if local_reachable {
                        self.store_profile_spreadsheet_id(&user_id, local).await?;
                        fixes.push(Fix::ProfileUpdatedFromLocal);
                    }
                }
                (Some(local), None) if local_reachable => {
                    self.store_profile_spreadsheet_id(&user_id, local).await?;
                    fixes.push(Fix::SavedToProfile);
                }
                (None, Some(remote)) if profile_reachable => {
                    self.store_local_spreadsheet_id(remote)?;
                    fixes.push(Fix::RestoredFromProfile);
                }
                _ => {}
            }

            self.pull_remote_to_local().await?;
            fixes.push(Fix::Pulled);

            Ok::<(), SyncError>(())
        }
        .await;

        match result {
            Ok(()) => SyncReport::from_fixes(&issues, &fixes),
            Err(err) => SyncReport::failure(err.to_string()),
        }
    }
}

impl<R> SpreadsheetService for Service<R>
where
    R: IdentityProvider
        + DocumentStore
        + ProfileRepository
        + WorkoutRepository
        + SettingsRepository
        + ExerciseWeightsRepository
        + SpreadsheetLinkRepository
        + CredentialRepository
        + SpreadsheetStore,
{
    async fn connect_spreadsheet(&self) -> Result<SpreadsheetID, SyncError> {
        let result = async {
            let credential = self
                .credential()
                .ok_or(SyncError::Storage(StorageError::NoCredential))?;

            if let Some(local_id) = self.repository.read_spreadsheet_id()? {
                if self.is_reachable(&credential, &local_id).await {
                    return Ok(local_id);
                }
            }

            let user_id = self.repository.current_user();
            let profile = match &user_id {
                Some(user_id) => self.profile(user_id).await,
                None => None,
            };

            if let Some(profile_id) = profile.and_then(|p| p.spreadsheet_id) {
                if self.is_reachable(&credential, &profile_id).await {
                    self.store_local_spreadsheet_id(&profile_id)?;
                    return Ok(profile_id);
                }
            }

            let id = self.repository.create_spreadsheet(&credential).await?;
            self.store_local_spreadsheet_id(&id)?;
            if let Some(user_id) = user_id {
                let _ = log_on_error!(
                    self.store_profile_spreadsheet_id(&user_id, &id).await,
                    WriteError,
                    "store",
                    "spreadsheet id in profile"
                );
            }

            Ok::<SpreadsheetID, SyncError>(id)
        }
        .await;

        log_on_error!(result, SyncError, "connect", "spreadsheet")
    }

    async fn mirror_workout_to_spreadsheet(&self, workout: &Workout) {
        let Some(credential) = self.credential() else {
            debug!("skipped mirroring workout {}: no credential", workout.id);
            return;
        };

        let result = async {
            let id = self.connect_spreadsheet().await?;
            self.repository
                .append_workout_rows(&credential, &id, std::slice::from_ref(workout))
                .await?;
            self.regenerate_charts().await
        }
        .await;

        let _ = log_on_error!(result, SyncError, "mirror", "workout to spreadsheet");
    }

    async fn regenerate_charts(&self) -> Result<(), SyncError> {
        let result = async {
            let (credential, id) = self.connected_spreadsheet()?;
            let workouts = self.repository.read_workout_rows(&credential, &id).await?;
            self.repository
                .write_statistics_sheets(&credential, &id, &spreadsheet_statistics(&workouts))
                .await?;
            Ok::<(), SyncError>(())
        }
        .await;

        log_on_error!(result, SyncError, "regenerate", "charts")
    }

    async fn reset_and_populate_spreadsheet(&self) -> Result<SpreadsheetID, SyncError> {
        let result = async {
            let credential = self
                .credential()
                .ok_or(SyncError::Storage(StorageError::NoCredential))?;
            let workouts = self.repository.read_workouts()?;
            let id = self.repository.create_spreadsheet(&credential).await?;
            if !workouts.is_empty() {
                self.repository
                    .append_workout_rows(&credential, &id, &workouts)
                    .await?;
            }
            self.store_local_spreadsheet_id(&id)?;
            if let Some(user_id) = self.repository.current_user() {
                self.store_profile_spreadsheet_id(&user_id, &id).await?;
            }
            Ok::<SpreadsheetID, SyncError>(id)
        }
        .await;

        log_on_error!(result, SyncError, "reset", "spreadsheet")
    }

    async fn read_workouts_from_spreadsheet(&self) -> Result<Vec<Workout>, SyncError> {
        let result = async {
            let (credential, id) = self.connected_spreadsheet()?;
            let mut workouts = self.repository.read_workout_rows(&credential, &id).await?;
            sort_by_date_descending(&mut workouts);
            Ok::<Vec<Workout>, SyncError>(workouts)
        }
        .await;

        log_on_error!(result, SyncError, "read", "workouts from spreadsheet")
    }
}

impl<R> Service<R>
where
    R: IdentityProvider
        + DocumentStore
        + ProfileRepository
        + SpreadsheetLinkRepository
        + CredentialRepository
        + SpreadsheetStore,
{
    fn user_id(&self) -> Result<UserID, SyncError> {
        self.repository
            .current_user()
            .ok_or(SyncError::Storage(StorageError::NoSession))
    }

    fn credential(&self) -> Option<SheetsCredential> {
        self.repository.read_credential().ok().flatten()
    }

    fn connected_spreadsheet(&self) -> Result<(SheetsCredential, SpreadsheetID), SyncError> {
        let credential = self
            .credential()
            .ok_or(SyncError::Storage(StorageError::NoCredential))?;
        let id = self
            .repository
            .read_spreadsheet_id()?
            .ok_or_else(|| SyncError::Other("no spreadsheet connected".into()))?;
        Ok((credential, id))
    }

    async fn is_reachable(&self, credential: &SheetsCredential, id: &SpreadsheetID) -> bool {
        self.repository
            .is_spreadsheet_reachable(credential, id)
            .await
    }

    /// The profile from the document store, or the cached profile if the store is unavailable.
    async fn profile(&self, user_id: &UserID) -> Option<UserProfile> {
        match self.repository.fetch_profile(user_id).await {
            Ok(profile) => {
                let _ = self.repository.write_cached_profile(&profile);
                Some(profile)
            }
            Err(err) => {
                debug!("failed to fetch profile: {err}");
                self.repository
                    .read_cached_profile()
                    .ok()
                    .flatten()
                    .filter(|p| p.user_id == *user_id)
            }
        }
    }

    fn store_local_spreadsheet_id(&self, id: &SpreadsheetID) -> Result<(), WriteError> {
        self.repository.write_spreadsheet_id(id)?;
        if let Ok(Some(profile)) = self.repository.read_cached_profile() {
            self.repository.write_cached_profile(&UserProfile {
                spreadsheet_id: Some(id.clone()),
                ..profile
            })?;
        }
        Ok(())
    }

    async fn store_profile_spreadsheet_id(
        &self,
        user_id: &UserID,
        id: &SpreadsheetID,
    ) -> Result<(), WriteError> {
        self.repository
            .store_profile_spreadsheet_id(user_id, id)
            .await?;
        if let Ok(Some(profile)) = self.repository.read_cached_profile() {
            self.repository.write_cached_profile(&UserProfile {
                spreadsheet_id: Some(id.clone()),
                ..profile
            })?;
        }
        Ok(())
    }
}

fn read_to_write(err: ReadError) -> WriteError {
    match err {
        ReadError::NotFound => WriteError::Other("not found".into()),
        ReadError::Storage(storage) => WriteError::Storage(storage),
        ReadError::Other(other) => WriteError::Other(other),
    }
}
