//! Reconciliation of the local data with the remote mirrors
//!
//! The local store is always written first. Remote writes are best effort: failures are logged,
//! but never undo or block local changes and are not retried.

use std::fmt;

use crate::{ExerciseWeights, SyncError, UserSettings, Workout};

#[allow(async_fn_in_trait)]
pub trait SyncService {
    /// Merge the data of the document store into the local store.
    ///
    /// Remote workouts replace local workouts with the same id. Workouts only known locally are
    /// kept and uploaded. If the remote history is empty, the local history is left untouched.
    /// Remote settings and exercise weights replace the local values if present. If reading any
    /// remote data fails, the local store is not changed.
    async fn pull_remote_to_local(&self) -> Result<(), SyncError>;

    async fn push_workout(&self, workout: &Workout);
    async fn push_settings(&self, settings: &UserSettings);
    async fn push_exercise_weights(&self, weights: &ExerciseWeights);

    /// Mirror a finished workout which has already been saved locally.
    async fn publish_workout(&self, workout: &Workout, settings: &UserSettings);

    /// Check that the locally cached spreadsheet id and the id in the profile agree and are
    /// reachable, repair the link if possible and pull the remote data.
    async fn verify_and_reconcile_spreadsheet_link(&self) -> SyncReport;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
}

impl SyncReport {
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub(crate) fn from_fixes(issues: &[Issue], fixes: &[Fix]) -> Self {
        let message = if (issues.is_empty() && fixes.len() == 1) || fixes.is_empty() {
            "Everything is in sync!".to_string()
        } else {
            format!(
                "Fixed: {}",
                fixes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        };
        Self {
            success: true,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Issue {
    LocalNotReachable,
    ProfileNotReachable,
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fix {
    LocalUpdatedFromProfile,
    ProfileUpdatedFromLocal,
    SavedToProfile,
    RestoredFromProfile,
    Pulled,
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Fix::LocalUpdatedFromProfile => "Updated local storage to match Firebase",
                Fix::ProfileUpdatedFromLocal => "Updated Firebase to match local storage",
                Fix::SavedToProfile => "Saved spreadsheet ID to Firebase",
                Fix::RestoredFromProfile => "Restored spreadsheet ID from Firebase",
                Fix::Pulled => "Synced workout data from cloud",
            }
        )
    }
}

pub(crate) const MESSAGE_NOT_SIGNED_IN: &str = "Please sign in to your account first.";
pub(crate) const MESSAGE_NO_CREDENTIAL: &str = "Please connect Google Sheets first.";
pub(crate) const MESSAGE_NO_SPREADSHEET: &str =
    "No spreadsheet found. Please connect Google Sheets to create one.";

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::in_sync(&[], &[Fix::Pulled], "Everything is in sync!")]
    #[case::nothing_fixed(&[Issue::LocalNotReachable], &[], "Everything is in sync!")]
    #[case::issue_without_fix(
        &[Issue::ProfileNotReachable],
        &[Fix::Pulled],
        "Fixed: Synced workout data from cloud"
    )]
    #[case::mismatch(
        &[Issue::Mismatch],
        &[Fix::LocalUpdatedFromProfile, Fix::Pulled],
        "Fixed: Updated local storage to match Firebase, Synced workout data from cloud"
    )]
    #[case::restored(
        &[],
        &[Fix::RestoredFromProfile, Fix::Pulled],
        "Fixed: Restored spreadsheet ID from Firebase, Synced workout data from cloud"
    )]
    fn test_sync_report_from_fixes(
        #[case] issues: &[Issue],
        #[case] fixes: &[Fix],
        #[case] message: &str,
    ) {
        assert_eq!(
            SyncReport::from_fixes(issues, fixes),
            SyncReport {
                success: true,
                message: message.to_string()
            }
        );
    }
}
