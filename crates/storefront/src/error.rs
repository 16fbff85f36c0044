//! Unified error handling for the commerce state core.
//!
//! Errors split into three classes with distinct envelope mappings:
//! application errors (business-rule rejections, status 400), write
//! conflicts (lost optimistic-concurrency races, status 409, retryable), and
//! infrastructure errors (transport/parse failures, masked behind a generic
//! status 500 message).

use thiserror::Error;

/// Errors produced by the user-record store and its merge operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The remote record could not be fetched.
    #[error("{0}")]
    NotFound(String),

    /// The item already exists in a uniqueness-constrained collection.
    #[error("{0}")]
    Duplicate(String),

    /// The write-back PATCH was rejected by the remote store.
    #[error("{0}")]
    WriteFailed(String),

    /// Caller input failed boundary validation.
    #[error("{0}")]
    InvalidInput(String),

    /// The record's version moved between read and write.
    #[error("User record changed since it was read; retry the operation")]
    Conflict,

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Envelope status class of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Explicit business-rule violation; message is safe to surface.
    Application,
    /// Lost write race; retryable by re-fetch-and-reapply.
    Conflict,
    /// Unexpected failure; detail is hidden from callers.
    Infrastructure,
}

impl StoreError {
    /// Classify this error for envelope mapping.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_)
            | Self::Duplicate(_)
            | Self::WriteFailed(_)
            | Self::InvalidInput(_) => ErrorClass::Application,
            Self::Conflict => ErrorClass::Conflict,
            Self::Http(_) | Self::Parse(_) => ErrorClass::Infrastructure,
        }
    }
}
