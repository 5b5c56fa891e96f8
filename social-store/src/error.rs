//! Error types for social-store
//!
//! Repositories never swallow errors. A known store signal (unique
//! violation, missing row) becomes `NotFound`/`Conflict`; everything else
//! passes through and classifies as [`ErrorKind::Unclassified`].

use std::time::Duration;

use thiserror::Error;

use crate::models::ValidationError;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Coarse classification callers map onto their own policy (404/409/500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Unclassified,
}

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Referenced entity is absent
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Uniqueness invariant violated
    #[error("conflict: {resource} with this {field} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },

    /// A referenced row does not exist (in-memory equivalent of a foreign key violation)
    #[error("{resource} references missing {reference} '{id}'")]
    MissingReference {
        resource: &'static str,
        reference: &'static str,
        id: i64,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    Password(String),

    #[error("invalid query: {0}")]
    Invalid(#[from] ValidationError),

    #[error("query timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("query cancelled")]
    Cancelled,

    /// A transaction handle from one backend was handed to another
    #[error("transaction handle belongs to a different backend")]
    BackendMismatch,
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(resource: &'static str, field: &'static str) -> Self {
        Self::Conflict { resource, field }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            _ => ErrorKind::Unclassified,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Map a unique violation onto `Conflict`, pass everything else through.
    ///
    /// The field name is recovered from the Postgres constraint name.
    pub(crate) fn from_insert(err: sqlx::Error, resource: &'static str) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some("users_email_key") => "email",
                    Some("users_username_key") => "username",
                    Some("followers_pkey") => "edge",
                    Some("user_invitations_pkey") => "token",
                    _ => "key",
                };
                return Self::Conflict { resource, field };
            }
        }
        Self::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(StoreError::not_found("post", 7).kind(), ErrorKind::NotFound);
        assert_eq!(
            StoreError::conflict("follower", "edge").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(StoreError::Cancelled.kind(), ErrorKind::Unclassified);
        assert_eq!(
            StoreError::Timeout {
                after: Duration::from_secs(5)
            }
            .kind(),
            ErrorKind::Unclassified
        );
        assert_eq!(
            StoreError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Unclassified
        );
    }

    #[test]
    fn display() {
        let err = StoreError::not_found("user", 42);
        assert_eq!(err.to_string(), "not found: user '42'");

        let err = StoreError::conflict("user", "email");
        assert_eq!(
            err.to_string(),
            "conflict: user with this email already exists"
        );
    }

    #[test]
    fn non_database_errors_pass_through_insert_mapping() {
        let err = StoreError::from_insert(sqlx::Error::PoolTimedOut, "user");
        assert!(matches!(err, StoreError::Database(sqlx::Error::PoolTimedOut)));
    }
}
