//! Classification of Diesel failures shared by every repository.
//!
//! Repositories first reduce a [`diesel::result::Error`] to a [`DbFailure`]
//! and then pick the port error variant for each class, so constraint
//! handling lives in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

/// Coarse outcome of a failed Diesel call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The connection dropped mid-call.
    Connection(&'static str),
    /// A unique constraint rejected the row; carries the offending column.
    UniqueViolation(UniqueColumn),
    /// A foreign key pointed at a missing row.
    ForeignKeyViolation,
    /// Anything else.
    Query(&'static str),
}

/// Column named by a unique violation on `users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniqueColumn {
    Username,
    Email,
    Other,
}

impl UniqueColumn {
    fn from_constraint(constraint: Option<&str>, message: &str) -> Self {
        let haystack = constraint.unwrap_or(message).to_lowercase();
        if haystack.contains("email") {
            Self::Email
        } else if haystack.contains("username") {
            Self::Username
        } else {
            Self::Other
        }
    }

    /// Field name reported to clients.
    pub(crate) const fn field(self) -> &'static str {
        match self {
            Self::Username | Self::Other => "username",
            Self::Email => "email",
        }
    }
}

/// Reduce a Diesel error to a [`DbFailure`], logging the detail at debug.
pub(crate) fn classify(error: DieselError) -> DbFailure {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DbFailure::Query("record not found"),
        DieselError::QueryBuilderError(_) => DbFailure::Query("database query error"),
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => DbFailure::UniqueViolation(
                UniqueColumn::from_constraint(info.constraint_name(), info.message()),
            ),
            DatabaseErrorKind::ForeignKeyViolation => DbFailure::ForeignKeyViolation,
            DatabaseErrorKind::ClosedConnection => {
                DbFailure::Connection("database connection error")
            }
            _ => DbFailure::Query("database error"),
        },
        DieselError::BrokenTransactionManager => {
            DbFailure::Connection("database transaction state lost")
        }
        _ => DbFailure::Query("database error"),
    }
}
