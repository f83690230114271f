//! Proof option validation: identifier checks and structural rules.

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::proof::ProofOptions;

/// Validate proof options against the suite that is about to process them.
///
/// This performs:
/// - `type` and `cryptosuite` match
/// - Required fields present (`verificationMethod`, `proofPurpose`)
/// - `created` / `expires` parse as RFC 3339 date-times
pub fn validate_proof_options(
    options: &ProofOptions,
    expected_type: &str,
    expected_cryptosuite: &str,
) -> Result<(), ValidationError> {
    // 1. Suite identifiers
    if options.type_ != expected_type {
        return Err(ValidationError::TypeMismatch {
            expected: expected_type.to_string(),
            got: options.type_.clone(),
        });
    }
    if options.cryptosuite != expected_cryptosuite {
        return Err(ValidationError::CryptosuiteMismatch {
            expected: expected_cryptosuite.to_string(),
            got: options.cryptosuite.clone(),
        });
    }

    // 2. Required fields
    if options.verification_method.is_empty() {
        return Err(ValidationError::MissingField("verificationMethod"));
    }
    if options.proof_purpose.is_empty() {
        return Err(ValidationError::MissingField("proofPurpose"));
    }

    // 3. Timestamps
    if let Some(created) = &options.created {
        parse_timestamp("created", created)?;
    }
    if let Some(expires) = &options.expires {
        parse_timestamp("expires", expires)?;
    }

    Ok(())
}

/// Check that a proof has not expired as of `now`.
pub fn check_expiry(options: &ProofOptions, now: DateTime<Utc>) -> Result<(), ValidationError> {
    if let Some(expires) = &options.expires {
        if parse_timestamp("expires", expires)? < now {
            return Err(ValidationError::Expired(expires.clone()));
        }
    }
    Ok(())
}

fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidTimestamp {
            field,
            value: value.to_string(),
        })
}
