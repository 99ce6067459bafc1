//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds since the Unix epoch.
///
/// Every timestamp in the core is supplied by the caller; nothing here reads
/// a clock.
pub type EpochMillis = i64;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The planned session length must be positive.
    #[error("planned duration must be positive, got {seconds}s")]
    InvalidPlannedDuration { seconds: i64 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValidationError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated activity identifier.
    ///
    /// Activity IDs must be non-empty and unique within one session.
    ActivityId, "activity ID"
);

define_string_id!(
    /// A validated timeline entry identifier.
    EntryId, "entry ID"
);

impl EntryId {
    /// Generates a fresh random entry ID.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Converts a millisecond delta to whole seconds, rounding half up.
///
/// `1_499` becomes 1, `1_500` becomes 2 and `-1_500` becomes -1. Saturates
/// at the ends of the `i64` range.
pub const fn millis_to_secs(ms: i64) -> i64 {
    ms.saturating_add(500).div_euclid(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_id_rejects_empty() {
        assert!(ActivityId::new("").is_err());
        assert!(ActivityId::new("write-report").is_ok());
    }

    #[test]
    fn entry_id_rejects_empty() {
        assert_eq!(
            EntryId::new("").unwrap_err(),
            ValidationError::Empty { field: "entry ID" }
        );
    }

    #[test]
    fn generated_entry_ids_are_distinct() {
        assert_ne!(EntryId::generate(), EntryId::generate());
    }

    #[test]
    fn activity_id_serde_roundtrip() {
        let id = ActivityId::new("a-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a-1\"");
        let parsed: ActivityId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn activity_id_serde_rejects_empty() {
        let result: Result<ActivityId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn millis_to_secs_rounds_half_up() {
        assert_eq!(millis_to_secs(0), 0);
        assert_eq!(millis_to_secs(499), 0);
        assert_eq!(millis_to_secs(500), 1);
        assert_eq!(millis_to_secs(1_499), 1);
        assert_eq!(millis_to_secs(1_500), 2);
        assert_eq!(millis_to_secs(60_000), 60);
        assert_eq!(millis_to_secs(-1_500), -1);
        assert_eq!(millis_to_secs(i64::MAX), i64::MAX / 1000);
        assert_eq!(millis_to_secs(-1_501), -2);
    }
}
