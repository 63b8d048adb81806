#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl From<ReadError> for SyncError {
    fn from(value: ReadError) -> Self {
        match value {
            ReadError::NotFound => SyncError::Other("not found".into()),
            ReadError::Storage(storage) => SyncError::Storage(storage),
            ReadError::Other(other) => SyncError::Other(other),
        }
    }
}

impl From<WriteError> for SyncError {
    fn from(value: WriteError) -> Self {
        match value {
            WriteError::Storage(storage) => SyncError::Storage(storage),
            WriteError::Other(other) => SyncError::Other(other),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("no connection")]
    NoConnection,
    #[error("no session")]
    NoSession,
    #[error("no credential")]
    NoCredential,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error>),
}

impl StorageError {
    /// Failures which are expected while offline or signed out and should not be reported loudly.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            StorageError::NoConnection | StorageError::NoSession | StorageError::NoCredential
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_error_from_read_error() {
        assert!(matches!(
            SyncError::from(ReadError::Storage(StorageError::NoSession)),
            SyncError::Storage(StorageError::NoSession)
        ));
        assert!(matches!(
            SyncError::from(ReadError::Other("foo".into())),
            SyncError::Other(error) if error.to_string() == "foo"
        ));
        assert!(matches!(
            SyncError::from(ReadError::NotFound),
            SyncError::Other(error) if error.to_string() == "not found"
        ));
    }

    #[test]
    fn test_sync_error_from_write_error() {
        assert!(matches!(
            SyncError::from(WriteError::Storage(StorageError::NoConnection)),
            SyncError::Storage(StorageError::NoConnection)
        ));
        assert!(matches!(
            SyncError::from(WriteError::Other("bar".into())),
            SyncError::Other(error) if error.to_string() == "bar"
        ));
    }

    #[test]
    fn test_storage_error_is_expected() {
        assert!(StorageError::NoConnection.is_expected());
        assert!(StorageError::NoSession.is_expected());
        assert!(StorageError::NoCredential.is_expected());
        assert!(!StorageError::Other("quota exceeded".into()).is_expected());
    }
}
