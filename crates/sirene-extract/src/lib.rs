//! Sirene Extract - French business identifier validation and extraction.
//!
//! This crate implements the checksum validation rules for the three
//! identifiers published in French statutory disclosures, plus the
//! free-text extraction pipeline that finds them on web pages:
//!
//! - SIRET: 14-digit establishment number (Luhn-checked)
//! - SIREN: 9-digit company number (Luhn-checked)
//! - TVA intracommunautaire: `FR` + 2 check digits + the SIREN
//!
//! # Modules
//!
//! - [`validate`] - Checksum algorithms for each identifier kind
//! - [`identifiers`] - Validated newtypes and the combined [`IdentifierSet`]
//! - [`denylist`] - Hosting-provider SIRENs that must never be attributed
//! - [`extract`] - Regex-driven extraction with fixed precedence
//! - [`regions`] - Prioritized-region text assembly
//!
//! # Example
//!
//! ```rust
//! use sirene_extract::{Denylist, Extractor};
//!
//! let extractor = Extractor::new(Denylist::default());
//! let found = extractor.extract("SIRET : 732 829 320 00074 - RCS Paris");
//! assert!(found.siret.is_some());
//! assert_eq!(found.siren.as_ref().map(|s| s.as_str()), Some("732829320"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod denylist;
pub mod extract;
pub mod identifiers;
pub mod regions;
pub mod validate;

// Re-export the main entry points
pub use denylist::Denylist;
pub use extract::Extractor;
pub use identifiers::{IdentifierSet, Siren, Siret, Vat};
pub use regions::extract_prioritized;
pub use validate::{validate_siren, validate_siret, validate_vat};
