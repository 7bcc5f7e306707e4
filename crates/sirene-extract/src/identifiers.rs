//! Validated newtypes for the identifiers and the combined result set.

use crate::validate::{strip_separators, validate_siren, validate_siret, validate_vat};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A checksum-validated, canonical (separator-free) SIRET.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Siret(String);

impl Siret {
    /// Parse raw text into a validated SIRET, or `None` if the
    /// checksum fails. Separators are stripped; the stored form is
    /// always the bare 14 digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        validate_siret(raw).then(|| Self(strip_separators(raw)))
    }

    /// The canonical 14-digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the parent company's SIREN (the first 9 digits).
    ///
    /// The derived number is not re-checked: every SIREN allocated by
    /// INSEE carries its own valid checksum, and a SIRET prefix that
    /// fails it would mean the registry itself is inconsistent.
    #[must_use]
    pub fn siren(&self) -> Siren {
        Siren(self.0[..9].to_string())
    }
}

impl fmt::Display for Siret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A checksum-validated, canonical (separator-free) SIREN.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Siren(String);

impl Siren {
    /// Parse raw text into a validated SIREN, or `None` if the
    /// checksum fails.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        validate_siren(raw).then(|| Self(strip_separators(raw)))
    }

    /// The canonical 9-digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Siren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A checksum-validated French intracommunity VAT number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vat(String);

impl Vat {
    /// Parse raw text into a validated VAT number, or `None` if the
    /// check digits or the embedded SIREN fail. The stored form is
    /// uppercase with separators removed (`FRcc#########`).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        validate_vat(raw).then(|| Self(strip_separators(raw).to_uppercase()))
    }

    /// The canonical string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The SIREN embedded in the last 9 digits.
    #[must_use]
    pub fn siren(&self) -> Siren {
        Siren(self.0[4..].to_string())
    }
}

impl fmt::Display for Vat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything extraction found on one piece of text.
///
/// Fields stay independent: a page may disclose only a VAT number, or
/// a SIRET without ever spelling out the SIREN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierSet {
    /// Establishment number, if disclosed
    pub siret: Option<Siret>,
    /// Company number (possibly derived from the SIRET)
    pub siren: Option<Siren>,
    /// Intracommunity VAT number, if disclosed
    pub vat: Option<Vat>,
}

impl IdentifierSet {
    /// True when nothing at all was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.siret.is_none() && self.siren.is_none() && self.vat.is_none()
    }
}
