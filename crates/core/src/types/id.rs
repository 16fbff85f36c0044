//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Ord`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use tidepool_core::define_id;
/// define_id!(EntryId);
/// define_id!(ProductId);
///
/// let entry_id = EntryId::new(1);
/// let product_id = ProductId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: EntryId = product_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(EntryId);
define_id!(ProductId);

/// Errors that can occur when parsing a [`UserId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum UserIdError {
    /// The input string is empty.
    #[error("user id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("user id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("user id cannot contain whitespace or control characters")]
    InvalidCharacter,
}

/// The identity key a user record is stored under.
///
/// Record stores key user documents by an opaque string (numeric strings and
/// UUIDs are both common), so this is a validated string rather than an
/// integer newtype.
///
/// ## Constraints
///
/// - Length: 1-128 characters
/// - No whitespace or control characters (the id is embedded in URL paths)
///
/// ## Examples
///
/// ```
/// use tidepool_core::UserId;
///
/// assert!(UserId::parse("42").is_ok());
/// assert!(UserId::parse("d9428888-122b-11e1-b85c-61cd3cbb3210").is_ok());
///
/// assert!(UserId::parse("").is_err());
/// assert!(UserId::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Maximum length of a user id.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `UserId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 128 characters,
    /// or contains whitespace/control characters.
    pub fn parse(s: &str) -> Result<Self, UserIdError> {
        if s.is_empty() {
            return Err(UserIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(UserIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(UserIdError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the user id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `UserId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
