use derive_more::{Deref, Display};

use crate::{ReadError, SpreadsheetID, SyncError, WriteError};

#[allow(async_fn_in_trait)]
pub trait UserService {
    fn get_profile(&self) -> Result<Option<UserProfile>, ReadError>;
    /// Cache the profile reported by the identity provider and complete it from the document
    /// store, creating the remote profile on first sign-in.
    async fn sign_in(&self, profile: UserProfile) -> Result<UserProfile, SyncError>;
    fn sign_out(&self) -> Result<(), WriteError>;
}

/// Source of the identity of the signed-in user.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserID>;
}

/// Local cache of the profile of the signed-in user.
pub trait ProfileRepository {
    fn read_cached_profile(&self) -> Result<Option<UserProfile>, ReadError>;
    fn write_cached_profile(&self, profile: &UserProfile) -> Result<(), WriteError>;
    fn delete_cached_profile(&self) -> Result<(), WriteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserID,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub spreadsheet_id: Option<SpreadsheetID>,
}

impl UserProfile {
    #[must_use]
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            email: None,
            display_name: None,
            spreadsheet_id: None,
        }
    }
}

/// Opaque user id assigned by the identity provider.
#[derive(Deref, Debug, Display, Clone, PartialEq, Eq, Hash)]
pub struct UserID(String);

impl UserID {
    pub fn new(id: &str) -> Result<Self, UserIDError> {
        let trimmed_id = id.trim();

        if trimmed_id.is_empty() {
            return Err(UserIDError::Empty);
        }

        Ok(Self(trimmed_id.to_string()))
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum UserIDError {
    #[error("User ID must not be empty")]
    Empty,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("abc123", Ok(UserID("abc123".to_string())))]
    #[case(" abc123\n", Ok(UserID("abc123".to_string())))]
    #[case("", Err(UserIDError::Empty))]
    fn test_user_id_new(#[case] id: &str, #[case] expected: Result<UserID, UserIDError>) {
        assert_eq!(UserID::new(id), expected);
    }
}
