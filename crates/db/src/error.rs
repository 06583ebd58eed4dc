use std::time::Duration;

use sqlx::error::ErrorKind as DbErrorKind;

/// Failure of a store operation, classified once at the store boundary.
///
/// Callers match on the variant; they never inspect the driver's error text.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matched.
    #[error("Record not found")]
    NotFound,

    /// A unique constraint rejected the write.
    #[error("Duplicate value violates unique constraint: {constraint}")]
    Duplicate { constraint: String },

    /// A foreign key pointed at a row that does not exist (e.g. a deleted user).
    #[error("Referenced row does not exist: {constraint}")]
    MissingReference { constraint: String },

    /// A check constraint rejected the write (e.g. wrong token digest size).
    #[error("Check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    /// The operation did not finish before its deadline.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Connectivity or any other driver failure.
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.kind() {
                    DbErrorKind::UniqueViolation => StoreError::Duplicate { constraint },
                    DbErrorKind::ForeignKeyViolation => StoreError::MissingReference { constraint },
                    DbErrorKind::CheckViolation => StoreError::CheckViolation { constraint },
                    _ => StoreError::Database(sqlx::Error::Database(db_err)),
                }
            }
            other => StoreError::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert_matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn pool_timeout_is_a_database_fault() {
        assert_matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Database(sqlx::Error::PoolTimedOut)
        );
    }

    #[test]
    fn timeout_display_mentions_duration() {
        let err = StoreError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Store operation timed out after 5s");
    }
}
