//! # Error Hierarchy
//!
//! Every way a worm can be refused, built with `thiserror`.
//!
//! Variants carry the offending input so that the message returned to the
//! caller identifies the failing field without further lookup. Messages name
//! fields by their wire spelling (`name`, `timeReference`, `credential`).

use thiserror::Error;

use crate::credential::Credential;

/// Rejection raised by structural or temporal validation.
///
/// Always recoverable and always reported to the caller. Validation is
/// fail-fast: a payload produces exactly one of these, for the first field
/// that breaks a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The payload is not a JSON object.
    #[error("request body must be a JSON object")]
    NotAnObject,

    /// A required field is absent or null.
    #[error("{field} is required")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A field is present with the wrong JSON type.
    #[error("{field} must be {expected}")]
    WrongType {
        /// Wire name of the field.
        field: &'static str,
        /// Description of the accepted type.
        expected: &'static str,
    },

    /// The trimmed name is too short or too long.
    #[error("name must be between {min} and {max} characters after trimming (got {actual})")]
    NameLength {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
        /// Length of the trimmed input.
        actual: usize,
    },

    /// The name contains something other than ASCII letters, digits and spaces.
    #[error("name may only contain letters, digits and spaces: \"{0}\"")]
    NameCharset(String),

    /// The time reference cannot be converted to an integer without rounding.
    #[error("timeReference must be an integer value: {0}")]
    TimeReferenceNotIntegral(String),

    /// The time reference is an integer beyond the 128-bit range.
    #[error("timeReference {0} is outside the supported integer range")]
    TimeReferenceOutOfRange(String),

    /// The credential text is not a decimal integer in the supported range.
    #[error("credential is not a valid integer: \"{0}\"")]
    MalformedCredential(String),

    /// `SACRED_CONSTANT + timeReference` does not fit the credential range.
    #[error("timeReference {0} is out of range for credential computation")]
    AlignmentOverflow(i128),

    /// The credential does not equal the expected value.
    #[error("temporal desynchronization: you offered {offered}, the timeline requires {expected}")]
    TemporalDesync {
        /// The credential submitted by the caller.
        offered: Credential,
        /// The value computed from the time reference.
        expected: Credential,
    },

    /// A pagination parameter is outside its accepted range.
    #[error("{param} must be between 1 and {max}")]
    PageOutOfRange {
        /// Name of the query parameter.
        param: &'static str,
        /// Largest accepted value.
        max: u32,
    },
}

impl ValidationError {
    /// Whether this rejection came from the temporal stage rather than the
    /// structural one. Used to label admission metrics.
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::TimeReferenceNotIntegral(_)
                | Self::TimeReferenceOutOfRange(_)
                | Self::MalformedCredential(_)
                | Self::AlignmentOverflow(_)
                | Self::TemporalDesync { .. }
        )
    }
}
