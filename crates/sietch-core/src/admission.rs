//! # Admission Pipeline
//!
//! Two stages stand between a raw payload and the record store.
//!
//! ## Structural validation
//!
//! [`validate_structure`] inspects the raw JSON and fails on the first field
//! that breaks a rule, checking `name`, then `timeReference`, then
//! `credential`. The time reference is mandatory at this stage even though a
//! [`CandidateWorm`] can be built without one: the wire contract is stricter
//! than the domain.
//!
//! ## Temporal alignment
//!
//! [`TemporalValidator`] requires
//!
//! ```text
//! credential == SACRED_CONSTANT + effectiveTimeReference
//! ```
//!
//! where `effectiveTimeReference` is the caller's time reference when given,
//! else the clock's current Unix milliseconds. All arithmetic is checked
//! `i128`. The formula is public; this is a protocol conformance check, not
//! an authentication mechanism. A stale time reference or clock skew fails.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::credential::{Credential, TimeReference};
use crate::error::ValidationError;
use crate::identity::WormName;

/// Constant term of the alignment formula: ten trillion.
pub const SACRED_CONSTANT: i128 = 10_000_000_000_000;

/// Payload that passed structural validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateWorm {
    /// Trimmed, validated name.
    pub name: WormName,
    /// Time reference as received; converted to an integer by the temporal stage.
    pub time_reference: Option<serde_json::Number>,
    /// Credential text as received, trimmed.
    pub credential: String,
}

/// Where the effective time reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// The caller supplied `timeReference`.
    Supplied,
    /// The validator read its clock.
    Clock,
}

impl TimeSource {
    /// Lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supplied => "supplied",
            Self::Clock => "clock",
        }
    }
}

/// The facts a successful alignment check established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// Origin of the time reference.
    pub source: TimeSource,
    /// Time reference the expected value was computed from.
    pub effective_time_reference: TimeReference,
    /// `SACRED_CONSTANT + effective_time_reference`.
    pub expected: Credential,
}

/// A worm that passed both stages and may be written to the store.
///
/// The time reference is not carried forward: it is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedWorm {
    /// Validated name.
    pub name: WormName,
    /// Credential, equal to `alignment.expected`.
    pub credential: Credential,
    /// How the credential was judged.
    pub alignment: Alignment,
}

// ── Structural stage ────────────────────────────────────────────────────────

/// Check shape and types of a raw creation payload.
pub fn validate_structure(payload: &Value) -> Result<CandidateWorm, ValidationError> {
    let fields = payload.as_object().ok_or(ValidationError::NotAnObject)?;

    let name = match required(fields, "name")? {
        Value::String(s) => WormName::new(s)?,
        _ => {
            return Err(ValidationError::WrongType {
                field: "name",
                expected: "a string",
            })
        }
    };

    let time_reference = match required(fields, "timeReference")? {
        Value::Number(n) => n.clone(),
        _ => {
            return Err(ValidationError::WrongType {
                field: "timeReference",
                expected: "a number",
            })
        }
    };

    let credential = match required(fields, "credential")? {
        Value::String(s) => s.trim().to_string(),
        _ => {
            return Err(ValidationError::WrongType {
                field: "credential",
                expected: "a string of decimal digits",
            })
        }
    };

    Ok(CandidateWorm {
        name,
        time_reference: Some(time_reference),
        credential,
    })
}

/// Absent and `null` are both "missing".
fn required<'a>(
    fields: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    match fields.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field }),
        Some(v) => Ok(v),
    }
}

// ── Temporal stage ──────────────────────────────────────────────────────────

/// Compute `SACRED_CONSTANT + time_reference`, rejecting overflow.
pub fn expected_credential(time_reference: TimeReference) -> Result<Credential, ValidationError> {
    SACRED_CONSTANT
        .checked_add(time_reference.value())
        .map(Credential::new)
        .ok_or(ValidationError::AlignmentOverflow(time_reference.value()))
}

/// Judges candidates against the alignment formula.
///
/// Holds only a clock; cloning is cheap and validations share no state.
#[derive(Debug, Clone)]
pub struct TemporalValidator {
    clock: Arc<dyn Clock>,
}

impl TemporalValidator {
    /// Create a validator reading "now" from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Run the temporal stage on a structurally valid candidate.
    ///
    /// The clock is consulted at most once, and only when the candidate has
    /// no time reference.
    pub fn validate(&self, candidate: CandidateWorm) -> Result<AdmittedWorm, ValidationError> {
        let (source, effective) = match &candidate.time_reference {
            Some(n) => {
                tracing::debug!("time reference supplied; space is folded");
                (TimeSource::Supplied, TimeReference::from_json_number(n)?)
            }
            None => {
                let now = self.clock.now_millis();
                tracing::debug!(now_millis = now, "no time reference; using the clock");
                (TimeSource::Clock, TimeReference::new(i128::from(now)))
            }
        };

        let expected = expected_credential(effective)?;
        let offered: Credential = candidate.credential.parse()?;

        tracing::debug!(
            offered = %offered,
            required = %expected,
            source = source.as_str(),
            "judging temporal alignment"
        );

        if offered != expected {
            return Err(ValidationError::TemporalDesync { offered, expected });
        }

        Ok(AdmittedWorm {
            name: candidate.name,
            credential: offered,
            alignment: Alignment {
                source,
                effective_time_reference: effective,
                expected,
            },
        })
    }

    /// Run both stages on a raw payload.
    pub fn admit(&self, payload: &Value) -> Result<AdmittedWorm, ValidationError> {
        let candidate = validate_structure(payload)?;
        self.validate(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn validator_at(millis: i64) -> (Arc<ManualClock>, TemporalValidator) {
        let clock = Arc::new(ManualClock::new(millis));
        let validator = TemporalValidator::new(clock.clone());
        (clock, validator)
    }

    fn candidate(time_reference: Option<serde_json::Value>, credential: &str) -> CandidateWorm {
        CandidateWorm {
            name: WormName::new("Shai Hulud").unwrap(),
            time_reference: time_reference.map(|v| match v {
                Value::Number(n) => n,
                other => panic!("not a number: {other}"),
            }),
            credential: credential.to_string(),
        }
    }

    // ── Structural ──────────────────────────────────────────────

    #[test]
    fn structure_accepts_and_trims() {
        let c = validate_structure(&json!({
            "name": "  Shai Hulud ",
            "timeReference": 5,
            "credential": " 10000000000005 "
        }))
        .unwrap();
        assert_eq!(c.name.as_str(), "Shai Hulud");
        assert_eq!(c.credential, "10000000000005");
        assert_eq!(c.time_reference, Some(serde_json::Number::from(5)));
    }

    #[test]
    fn structure_rejects_non_object() {
        assert_eq!(
            validate_structure(&json!(["name"])),
            Err(ValidationError::NotAnObject)
        );
    }

    #[test]
    fn structure_fails_fast_on_first_field() {
        // Everything is wrong; only the name is reported.
        let err = validate_structure(&json!({
            "name": 7,
            "timeReference": "soon",
            "credential": 10
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::WrongType {
                field: "name",
                expected: "a string"
            }
        );
    }

    #[test]
    fn structure_requires_time_reference() {
        let err = validate_structure(&json!({"name": "Usul", "credential": "1"})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "timeReference"
            }
        );

        let err = validate_structure(&json!({
            "name": "Usul",
            "timeReference": null,
            "credential": "1"
        }))
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "timeReference"
            }
        );
    }

    #[test]
    fn structure_rejects_string_time_reference() {
        let err = validate_structure(&json!({
            "name": "Usul",
            "timeReference": "1700000000000",
            "credential": "1"
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("timeReference"));
    }

    #[test]
    fn structure_accepts_float_time_reference() {
        let c = validate_structure(&json!({
            "name": "Usul",
            "timeReference": 12.5,
            "credential": "1"
        }))
        .unwrap();
        assert!(c.time_reference.is_some());
    }

    #[test]
    fn structure_rejects_numeric_credential() {
        let err = validate_structure(&json!({
            "name": "Usul",
            "timeReference": 1,
            "credential": 10000000000001u64
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("credential"));
    }

    #[test]
    fn structure_reports_bad_name_before_missing_fields() {
        let err = validate_structure(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, ValidationError::NameLength { actual: 1, .. }));
    }

    // ── Temporal ────────────────────────────────────────────────

    #[test]
    fn supplied_time_reference_aligns() {
        let (_, v) = validator_at(0);
        let admitted = v
            .validate(candidate(Some(json!(99)), "10000000000099"))
            .unwrap();
        assert_eq!(admitted.credential, Credential::new(10_000_000_000_099));
        assert_eq!(admitted.alignment.source, TimeSource::Supplied);
        assert_eq!(
            admitted.alignment.effective_time_reference,
            TimeReference::new(99)
        );
    }

    #[test]
    fn supplied_time_reference_ignores_clock() {
        let (clock, v) = validator_at(NOW);
        clock.advance(123_456);
        assert!(v
            .validate(candidate(Some(json!(NOW)), &(SACRED_CONSTANT + NOW as i128).to_string()))
            .is_ok());
    }

    #[test]
    fn clock_used_when_time_reference_absent() {
        let (_, v) = validator_at(NOW);
        let expected = (SACRED_CONSTANT + i128::from(NOW)).to_string();
        let admitted = v.validate(candidate(None, &expected)).unwrap();
        assert_eq!(admitted.alignment.source, TimeSource::Clock);
        assert_eq!(admitted.credential.to_string(), expected);
    }

    #[test]
    fn clock_drift_fails() {
        let (clock, v) = validator_at(NOW);
        let expected = (SACRED_CONSTANT + i128::from(NOW)).to_string();
        clock.advance(1);
        let err = v.validate(candidate(None, &expected)).unwrap_err();
        assert!(matches!(err, ValidationError::TemporalDesync { .. }));
    }

    #[test]
    fn desync_reports_both_values() {
        let (_, v) = validator_at(0);
        let err = v
            .validate(candidate(Some(json!(1)), "10000000000002"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::TemporalDesync {
                offered: Credential::new(10_000_000_000_002),
                expected: Credential::new(10_000_000_000_001),
            }
        );
    }

    #[test]
    fn fractional_time_reference_rejected() {
        let (_, v) = validator_at(0);
        let err = v
            .validate(candidate(Some(json!(0.5)), "10000000000000"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TimeReferenceNotIntegral(_)));
    }

    #[test]
    fn integral_float_time_reference_aligns() {
        let (_, v) = validator_at(0);
        assert!(v
            .validate(candidate(Some(json!(1700000000000.0)), "11700000000000"))
            .is_ok());
    }

    #[test]
    fn malformed_credential_rejected() {
        let (_, v) = validator_at(0);
        let err = v
            .validate(candidate(Some(json!(1)), "ten trillion"))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MalformedCredential(_)));
    }

    #[test]
    fn credential_beyond_u64_compares_exactly() {
        let t = i128::from(u64::MAX);
        let (_, v) = validator_at(0);
        let aligned = (SACRED_CONSTANT + t).to_string();
        assert_eq!(aligned, "18446754073709551615");
        assert!(v
            .validate(candidate(Some(json!(u64::MAX)), &aligned))
            .is_ok());

        let one_more = (SACRED_CONSTANT + t + 1).to_string();
        assert!(matches!(
            v.validate(candidate(Some(json!(u64::MAX)), &one_more)),
            Err(ValidationError::TemporalDesync { .. })
        ));
    }

    #[test]
    fn overflow_is_a_validation_error() {
        assert_eq!(
            expected_credential(TimeReference::new(i128::MAX)),
            Err(ValidationError::AlignmentOverflow(i128::MAX))
        );
    }

    #[test]
    fn admit_runs_both_stages() {
        let (_, v) = validator_at(0);
        let admitted = v
            .admit(&json!({
                "name": "Little Maker",
                "timeReference": 42,
                "credential": "10000000000042"
            }))
            .unwrap();
        assert_eq!(admitted.name.as_str(), "Little Maker");

        let err = v
            .admit(&json!({
                "name": "Little Maker",
                "timeReference": 42,
                "credential": "10000000000043"
            }))
            .unwrap_err();
        assert!(err.is_temporal());
    }

    #[test]
    fn admit_reads_integer_literals_beyond_64_bits_exactly() {
        let (_, v) = validator_at(0);
        let payload: Value = serde_json::from_str(
            r#"{"name":"Leviathan","timeReference":100000000000000000000,"credential":"100000010000000000000"}"#,
        )
        .unwrap();
        let admitted = v.admit(&payload).unwrap();
        assert_eq!(admitted.credential.value(), 100_000_010_000_000_000_000);
        assert_eq!(
            admitted.alignment.effective_time_reference.value(),
            100_000_000_000_000_000_000
        );

        let payload: Value = serde_json::from_str(
            r#"{"name":"Leviathan","timeReference":-100000000000000000000,"credential":"-99999990000000000000"}"#,
        )
        .unwrap();
        let admitted = v.admit(&payload).unwrap();
        assert_eq!(admitted.credential.value(), -99_999_990_000_000_000_000);

        let payload: Value = serde_json::from_str(
            r#"{"name":"Leviathan","timeReference":100000000000000000000,"credential":"100000010000000000001"}"#,
        )
        .unwrap();
        assert!(matches!(
            v.admit(&payload),
            Err(ValidationError::TemporalDesync { .. })
        ));
    }

    proptest! {
        #[test]
        fn aligned_credentials_pass(t in -1_000_000_000_000_000i64..1_000_000_000_000_000i64) {
            let (_, v) = validator_at(0);
            let credential = (SACRED_CONSTANT + i128::from(t)).to_string();
            let admitted = v.validate(candidate(Some(json!(t)), &credential)).unwrap();
            prop_assert_eq!(admitted.credential.value(), SACRED_CONSTANT + i128::from(t));
        }

        #[test]
        fn off_by_one_fails(t in -1_000_000_000_000_000i64..1_000_000_000_000_000i64) {
            let (_, v) = validator_at(0);
            let credential = (SACRED_CONSTANT + i128::from(t) + 1).to_string();
            let is_desync = matches!(
                v.validate(candidate(Some(json!(t)), &credential)),
                Err(ValidationError::TemporalDesync { .. })
            );
            prop_assert!(is_desync);
        }

        #[test]
        fn clock_path_matches_any_instant(now in 0i64..4_102_444_800_000i64) {
            let (_, v) = validator_at(now);
            let credential = (SACRED_CONSTANT + i128::from(now)).to_string();
            prop_assert!(v.validate(candidate(None, &credential)).is_ok());
        }
    }
}
