//! Domain error types for server operations.

use std::fmt;

/// User store errors.
#[derive(Debug)]
pub enum StoreError {
    /// Another account already uses this email.
    DuplicateEmail { email: String },
    /// A stored row could not be turned back into a user.
    Corrupt { details: String },
    /// The database rejected or failed the query.
    Database { details: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEmail { email } => {
                write!(f, "a user with email '{}' already exists", email)
            }
            Self::Corrupt { details } => write!(f, "corrupt user record: {}", details),
            Self::Database { details } => write!(f, "user database error: {}", details),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            details: err.to_string(),
        }
    }
}
