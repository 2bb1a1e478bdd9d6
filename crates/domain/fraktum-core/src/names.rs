//! Identifiers that end up as a single filesystem path segment.
//!
//! Slot ids, profile names, game ids used for build downloads and build versions are all
//! joined onto a directory owned by the launcher. They are validated once at the edge and
//! carried as newtypes afterwards, so the store never sees a raw caller string.

use std::fmt;

use fraktum_config::MAX_SEGMENT_LEN;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Validates `value` as a path segment that cannot escape its parent directory.
///
/// Accepts 1..=`MAX_SEGMENT_LEN` characters from `[A-Za-z0-9_.-]` that do not start with
/// a dot (which also rules out `.` and `..`).
pub fn validate_segment(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > MAX_SEGMENT_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_SEGMENT_LEN,
        });
    }
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !allowed || value.starts_with('.') {
        return Err(ValidationError::UnsafeSegment {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

macro_rules! segment_newtype {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                validate_segment($field, value)?;
                Ok(Self(value.to_owned()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                validate_segment($field, &value)?;
                Ok(Self(value))
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

segment_newtype!(
    /// Save slot identifier; names the `<slot>.zip` file under the saves directory.
    SlotId,
    "slot"
);

segment_newtype!(
    /// Launcher profile selected with `--profile=<name>`.
    ProfileName,
    "profile"
);

segment_newtype!(
    /// Any other single path segment (game id or build version for downloads).
    SafeSegment,
    "segment"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_slot_names() {
        for ok in ["slot1", "autosave_2", "chapter-3.final", "A"] {
            assert!(SlotId::parse(ok).is_ok(), "{ok} should be accepted");
        }
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for bad in ["", ".", "..", "../x", "a/b", "a\\b", ".hidden", "C:", "slot 1"] {
            assert!(SlotId::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong_segment() {
        let long = "a".repeat(MAX_SEGMENT_LEN + 1);
        assert_eq!(
            SlotId::parse(&long),
            Err(ValidationError::TooLong {
                field: "slot",
                max: MAX_SEGMENT_LEN
            })
        );
    }

    #[test]
    fn deserializing_validates() {
        let ok: Result<SlotId, _> = serde_json::from_str("\"slot1\"");
        assert!(ok.is_ok());
        let bad: Result<SlotId, _> = serde_json::from_str("\"../etc\"");
        assert!(bad.is_err());
    }
}
