//! # Identity Newtypes
//!
//! [`WormId`] is UUID-based and always valid by construction. [`WormName`]
//! validates at construction: once built it is trimmed, 2–30 characters long,
//! and drawn only from `[A-Za-z0-9 ]`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Minimum length of a trimmed worm name.
pub const NAME_MIN_LEN: usize = 2;

/// Maximum length of a trimmed worm name.
pub const NAME_MAX_LEN: usize = 30;

// ---------------------------------------------------------------------------
// WormId
// ---------------------------------------------------------------------------

/// Opaque identifier assigned by the store when a worm is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WormId(Uuid);

impl WormId {
    /// Create a new random worm identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a worm identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse an identifier from its textual form.
    ///
    /// Returns `None` for anything that is not a UUID: no record can carry
    /// such an identifier, so callers treat it as "not found".
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for WormId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for WormId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// WormName
// ---------------------------------------------------------------------------

/// Harvester-given label of a worm.
///
/// # Validation
///
/// - Surrounding whitespace is trimmed before any check.
/// - Trimmed length must be within `[NAME_MIN_LEN, NAME_MAX_LEN]`.
/// - Only ASCII letters, ASCII digits and the space character are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct WormName(String);

impl WormName {
    /// Create a validated worm name from raw input.
    pub fn new(s: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = s.as_ref().trim();
        let actual = trimmed.chars().count();
        if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&actual) {
            return Err(ValidationError::NameLength {
                min: NAME_MIN_LEN,
                max: NAME_MAX_LEN,
                actual,
            });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ')
        {
            return Err(ValidationError::NameCharset(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WormName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for WormName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn name_is_trimmed() {
        let name = WormName::new("  Shai Hulud  ").unwrap();
        assert_eq!(name.as_str(), "Shai Hulud");
    }

    #[test]
    fn name_length_bounds_are_inclusive() {
        assert!(WormName::new("ab").is_ok());
        assert!(WormName::new("a".repeat(30)).is_ok());
        assert!(matches!(
            WormName::new("a"),
            Err(ValidationError::NameLength { actual: 1, .. })
        ));
        assert!(matches!(
            WormName::new("a".repeat(31)),
            Err(ValidationError::NameLength { actual: 31, .. })
        ));
    }

    #[test]
    fn whitespace_only_name_is_too_short() {
        assert!(matches!(
            WormName::new("     "),
            Err(ValidationError::NameLength { actual: 0, .. })
        ));
    }

    #[test]
    fn punctuation_and_unicode_rejected() {
        assert!(matches!(
            WormName::new("Shai-Hulud"),
            Err(ValidationError::NameCharset(_))
        ));
        assert!(matches!(
            WormName::new("Muad'Dib"),
            Err(ValidationError::NameCharset(_))
        ));
        assert!(matches!(
            WormName::new("Arrakïs"),
            Err(ValidationError::NameCharset(_))
        ));
        assert!(matches!(
            WormName::new("tab\there"),
            Err(ValidationError::NameCharset(_))
        ));
    }

    #[test]
    fn name_deserialize_validates() {
        let ok: WormName = serde_json::from_str("\" Usul \"").unwrap();
        assert_eq!(ok.as_str(), "Usul");
        assert!(serde_json::from_str::<WormName>("\"x\"").is_err());
    }

    #[test]
    fn worm_id_parse() {
        let id = WormId::new();
        assert_eq!(WormId::parse(&id.to_string()), Some(id));
        assert_eq!(WormId::parse("not-a-uuid"), None);
        assert_eq!(WormId::parse("65a1f0c2e4b0a1b2c3d4e5f6"), None);
    }

    proptest! {
        #[test]
        fn valid_names_accepted(name in "[A-Za-z0-9][A-Za-z0-9 ]{0,28}[A-Za-z0-9]") {
            let parsed = WormName::new(&name).unwrap();
            prop_assert_eq!(parsed.as_str(), name.as_str());
        }

        #[test]
        fn surrounding_spaces_do_not_count(name in "[A-Za-z0-9]{2,30}", pad in 0usize..5) {
            let padded = format!("{}{}{}", " ".repeat(pad), name, " ".repeat(pad));
            let parsed = WormName::new(padded).unwrap();
            prop_assert_eq!(parsed.as_str(), name.as_str());
        }

        #[test]
        fn foreign_characters_rejected(
            prefix in "[A-Za-z0-9]{1,10}",
            bad in "[!-/:-@\\[-`{-~]",
        ) {
            let name = format!("{prefix}{bad}");
            prop_assert!(matches!(
                WormName::new(&name),
                Err(ValidationError::NameCharset(_))
            ));
        }
    }
}
