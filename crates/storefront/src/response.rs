//! The uniform response envelope for remote operations.
//!
//! Every public operation that talks to the user-record store resolves to an
//! [`Envelope`] instead of a raw `Result`, so callers branch on a status flag
//! and never see transport errors. All failures funnel through a single
//! conversion point: application errors keep their message with status 400,
//! write conflicts map to 409, and anything unexpected collapses to a generic
//! status 500 message with the detail logged, not exposed.

use crate::error::{ErrorClass, StoreError};

/// Generic failure message for infrastructure errors.
const GENERIC_FAILURE: &str = "Something went wrong";

/// A discriminated success/failure result carrying a status code and a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    /// Operation succeeded; carries the resulting data.
    Success {
        /// The operation's result, typically the authoritative post-write
        /// sub-collection.
        data: T,
        /// 2xx-equivalent status code.
        status_code: u16,
        /// Human-readable outcome description.
        message: String,
    },
    /// Operation failed; no data.
    Failure {
        /// 400 for business rejections, 409 for write conflicts, 500 for
        /// everything unexpected.
        status_code: u16,
        /// Human-readable failure description.
        message: String,
    },
}

impl<T> Envelope<T> {
    /// Build a success envelope.
    pub fn success(data: T, status_code: u16, message: impl Into<String>) -> Self {
        Self::Success {
            data,
            status_code,
            message: message.into(),
        }
    }

    /// Build a failure envelope.
    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            status_code,
            message: message.into(),
        }
    }

    /// The status flag callers branch on.
    #[must_use]
    pub const fn status(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status()
    }

    /// The status code carried by either case.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. } | Self::Failure { status_code, .. } => *status_code,
        }
    }

    /// The message carried by either case.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. } | Self::Failure { message, .. } => message,
        }
    }

    /// The data, when the operation succeeded.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// Consume the envelope and return the data, when present.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    /// The single conversion point from internal results to envelopes.
    ///
    /// Application errors surface their own message with status 400,
    /// conflicts map to 409, and infrastructure errors are logged and
    /// replaced by a generic 500 message.
    pub(crate) fn from_result(result: Result<Completed<T>, StoreError>) -> Self {
        match result {
            Ok(completed) => Self::Success {
                data: completed.data,
                status_code: completed.status_code,
                message: completed.message,
            },
            Err(err) => match err.class() {
                ErrorClass::Application => Self::failure(400, err.to_string()),
                ErrorClass::Conflict => Self::failure(409, err.to_string()),
                ErrorClass::Infrastructure => {
                    tracing::error!(error = %err, "Record store operation failed");
                    Self::failure(500, GENERIC_FAILURE)
                }
            },
        }
    }
}

/// A successfully completed operation, before envelope wrapping.
pub(crate) struct Completed<T> {
    pub data: T,
    pub status_code: u16,
    pub message: String,
}

impl<T> Completed<T> {
    /// A 200-class completion.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            status_code: 200,
            message: message.into(),
        }
    }

    /// A 201-class completion (resource created).
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            status_code: 201,
            message: message.into(),
        }
    }
}
