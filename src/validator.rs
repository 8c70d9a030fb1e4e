// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! XPlatformId validator.
//!
//! An XPlatformId is a composite identifier `<platform>-<accountId>`.
//! Splitting on the last hyphen must yield a platform from the configured
//! allow-list (tokens may themselves contain hyphens) and an account id
//! that parses as an arbitrary-precision integer literal.

use crate::config::ValidationConfig;
use num_bigint::BigInt;
use thiserror::Error;
use tracing::debug;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown platform {0:?}")]
    UnknownPlatform(String),

    #[error("account id {0:?} is not an integer")]
    InvalidAccountId(String),

    #[error("account id {0:?} carries a sign")]
    SignedAccountId(String),
}

/// Result of validation.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    /// Identifier is valid
    Valid,
    /// Identifier is invalid
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(e) => Some(e),
        }
    }
}

/// XPlatformId validator.
pub struct XPlatformIdValidator {
    config: ValidationConfig,
}

impl XPlatformIdValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a candidate XPlatformId.
    ///
    /// Pure and total over all strings: no side effects, never panics.
    pub fn validate(&self, id: &str) -> ValidationResult {
        // A single-segment id has an empty platform, which never matches
        // the allow-list. Since the account id is everything after the last
        // hyphen, it can only carry a `+` sign; a `-` would shift the split.
        let (platform, account_id) = id.rsplit_once('-').unwrap_or(("", id));

        if !self.config.platforms.iter().any(|p| p == platform) {
            debug!(platform, "unknown platform");
            return ValidationResult::Invalid(ValidationError::UnknownPlatform(
                platform.to_string(),
            ));
        }

        if account_id.parse::<BigInt>().is_err() {
            debug!(account_id, "account id is not an integer");
            return ValidationResult::Invalid(ValidationError::InvalidAccountId(
                account_id.to_string(),
            ));
        }

        if !self.config.allow_signed_account_ids && account_id.starts_with(['+', '-']) {
            debug!(account_id, "signed account id rejected");
            return ValidationResult::Invalid(ValidationError::SignedAccountId(
                account_id.to_string(),
            ));
        }

        ValidationResult::Valid
    }
}
