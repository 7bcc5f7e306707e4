//! Shared types used across the Sirene engine.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::SireneError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for batch identifiers with validation.
///
/// Batch IDs must be valid UUIDs (v4 format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(String);

impl BatchId {
    /// Create a new `BatchId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not a valid UUID v4.
    pub fn new(id: impl Into<String>) -> Result<Self, SireneError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Create a new random `BatchId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that a string is a valid UUID v4.
    fn validate(id: &str) -> Result<(), SireneError> {
        static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = UUID_REGEX.get_or_init(|| {
            Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
                .expect("valid regex")
        });

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(SireneError::Validation(format!(
                "invalid batch ID: must be a valid UUID v4, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal outcome of resolving one site.
///
/// A negative result (`NoData`) is deliberately distinct from `Error`, and
/// anti-automation blocks are kept out of both so statistics do not conflate
/// "the site hides behind a challenge" with "the site carries no identifiers".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// At least one validated identifier was found
    Success,
    /// The page budget was exhausted without finding anything
    NoData,
    /// Fetching failed (after retries, or immediately for permanent failures)
    Error,
    /// An anti-automation challenge blocked the site
    Blocked,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NoData => write!(f, "no_data"),
            Self::Error => write!(f, "error"),
            Self::Blocked => write!(f, "blocked"),
        }
    }
}
