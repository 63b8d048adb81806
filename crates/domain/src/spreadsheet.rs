use chrono::{DateTime, Utc};
use derive_more::{Deref, Display};

use crate::{ReadError, SpreadsheetStatistics, SyncError, Workout, WriteError};

#[allow(async_fn_in_trait)]
pub trait SpreadsheetService {
    /// Resolve the spreadsheet to mirror into.
    ///
    /// A reachable locally cached spreadsheet is preferred, followed by a reachable spreadsheet
    /// from the profile. Otherwise a new spreadsheet is created. The resolved id is stored locally
    /// and, if signed in, in the profile.
    async fn connect_spreadsheet(&self) -> Result<SpreadsheetID, SyncError>;
    /// Append the workout and its completed sets and regenerate the derived sheets.
    ///
    /// Nothing happens without a credential. Failures are logged and not returned.
    async fn mirror_workout_to_spreadsheet(&self, workout: &Workout);
    async fn regenerate_charts(&self) -> Result<(), SyncError>;
    /// Replace the connected spreadsheet by a new one containing the complete local history.
    async fn reset_and_populate_spreadsheet(&self) -> Result<SpreadsheetID, SyncError>;
    async fn read_workouts_from_spreadsheet(&self) -> Result<Vec<Workout>, SyncError>;
}

/// Local cache of the id of the connected spreadsheet.
pub trait SpreadsheetLinkRepository {
    fn read_spreadsheet_id(&self) -> Result<Option<SpreadsheetID>, ReadError>;
    fn write_spreadsheet_id(&self, id: &SpreadsheetID) -> Result<(), WriteError>;
}

/// Local store of the access token for the spreadsheet service.
///
/// Implementations must treat an expired credential as absent and remove it.
pub trait CredentialRepository {
    fn read_credential(&self) -> Result<Option<SheetsCredential>, ReadError>;
    fn write_credential(&self, credential: &SheetsCredential) -> Result<(), WriteError>;
    fn delete_credential(&self) -> Result<(), WriteError>;
}

/// Remote tabular store that mirrors the workout history.
///
/// The store contains a summary sheet with one row per workout, a detail sheet with one row per
/// completed set and derived sheets holding statistics and charts.
#[allow(async_fn_in_trait)]
pub trait SpreadsheetStore {
    async fn is_spreadsheet_reachable(
        &self,
        credential: &SheetsCredential,
        id: &SpreadsheetID,
    ) -> bool;
    async fn create_spreadsheet(
        &self,
        credential: &SheetsCredential,
    ) -> Result<SpreadsheetID, WriteError>;
    async fn append_workout_rows(
        &self,
        credential: &SheetsCredential,
        id: &SpreadsheetID,
        workouts: &[Workout],
    ) -> Result<(), WriteError>;
    async fn read_workout_rows(
        &self,
        credential: &SheetsCredential,
        id: &SpreadsheetID,
    ) -> Result<Vec<Workout>, ReadError>;
    async fn write_statistics_sheets(
        &self,
        credential: &SheetsCredential,
        id: &SpreadsheetID,
        statistics: &SpreadsheetStatistics,
    ) -> Result<(), WriteError>;
}

#[derive(Deref, Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct SpreadsheetID(String);

impl SpreadsheetID {
    pub fn new(id: &str) -> Result<Self, SpreadsheetIDError> {
        let trimmed_id = id.trim();

        if trimmed_id.is_empty() {
            return Err(SpreadsheetIDError::Empty);
        }

        Ok(Self(trimmed_id.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SpreadsheetIDError {
    #[error("Spreadsheet ID must not be empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsCredential {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SheetsCredential {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
