//! Hosting-provider SIRENs that must never be attributed to a scanned
//! site.
//!
//! Agencies and hosters print their own registration numbers in the
//! legal pages of every site they operate, so these values are
//! checksum-valid but always wrong as an answer.

use std::collections::HashSet;

/// Known hosting and agency SIRENs, suppressed everywhere.
const DEFAULT_DENYLIST: [&str; 4] = [
    "797876562", // Gestixi
    "423646512", // OVH
    "537407926", // Gandi
    "443061841", // O2Switch
];

/// Set of SIRENs to suppress during extraction.
///
/// Applies to bare SIRENs, to the SIREN prefix of a SIRET, and to the
/// SIREN embedded in a VAT number.
#[derive(Debug, Clone)]
pub struct Denylist {
    sirens: HashSet<String>,
}

impl Default for Denylist {
    fn default() -> Self {
        Self {
            sirens: DEFAULT_DENYLIST.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Denylist {
    /// Built-in denylist extended with operator-supplied SIRENs.
    #[must_use]
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        list.sirens.extend(extra.into_iter().map(Into::into));
        list
    }

    /// True if this SIREN belongs to a known hoster.
    #[must_use]
    pub fn contains(&self, siren: &str) -> bool {
        self.sirens.contains(siren)
    }
}
