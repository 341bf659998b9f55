use crate::domain::DomainError;
use crate::ports::StorageError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Stored complaints could not be read: {0}")]
    CorruptState(String),

    #[error("Persistence task has stopped")]
    PersisterStopped,
}

impl AppError {
    /// True for lookups of a complaint or comment that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::Domain(DomainError::ComplaintNotFound(_))
                | AppError::Domain(DomainError::CommentNotFound { .. })
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_records_count_as_not_found() {
        let missing: AppError = DomainError::ComplaintNotFound("KA01".into()).into();
        let storage: AppError = StorageError::Write("disk full".into()).into();

        assert!(missing.is_not_found());
        assert!(!storage.is_not_found());
        assert!(!AppError::PersisterStopped.is_not_found());
        assert_eq!(storage.to_string(), "Storage error: Failed to write to storage: disk full");
    }
}
