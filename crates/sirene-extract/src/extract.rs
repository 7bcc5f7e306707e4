//! Regex-driven identifier extraction with fixed precedence.
//!
//! Candidates are located by shape, then gated through checksum
//! validation and the hoster denylist. The precedence order is:
//!
//! 1. SIRET (most specific, also yields the SIREN)
//! 2. VAT number, only while no SIREN is known yet
//! 3. Bare SIREN, skipping digit runs that sit inside a SIRET-shaped
//!    match (the first 9 digits of a spaced SIRET look like a SIREN)
//! 4. `RCS <city> <number>` mentions, the loosest signal
//!
//! Within each step the first valid, non-denylisted candidate wins.

use crate::denylist::Denylist;
use crate::identifiers::{IdentifierSet, Siren, Siret, Vat};
use once_cell::sync::Lazy;
use regex::Regex;

static SIRET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{3}[\s.-]*[0-9]{3}[\s.-]*[0-9]{3}[\s.-]*[0-9]{5}\b")
        .expect("valid regex")
});

static SIREN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9]{3}[\s.-]*[0-9]{3}[\s.-]*[0-9]{3}\b").expect("valid regex")
});

static VAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bFR[\s.-]*[0-9]{2}[\s.-]*[0-9]{3}[\s.-]*[0-9]{3}[\s.-]*[0-9]{3}\b")
        .expect("valid regex")
});

static RCS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bRCS\b[\s:]*(?:[A-Za-zÀ-ÿ'-]+\s+){1,4}([0-9]{3}[\s.-]*[0-9]{3}[\s.-]*[0-9]{3})\b",
    )
    .expect("valid regex")
});

/// Finds French business identifiers in free text.
#[derive(Debug, Clone)]
pub struct Extractor {
    denylist: Denylist,
}

impl Extractor {
    /// Build an extractor around the given denylist.
    #[must_use]
    pub fn new(denylist: Denylist) -> Self {
        Self { denylist }
    }

    /// Extract identifiers from one block of text.
    ///
    /// Always returns a set; an empty set means nothing valid was
    /// found. Denylisted candidates are skipped in favor of the next
    /// match, not treated as terminal.
    #[must_use]
    pub fn extract(&self, text: &str) -> IdentifierSet {
        let mut found = IdentifierSet::default();

        // SIRET-shaped spans are remembered even when they fail the
        // checksum, so the SIREN pass below never reads a 9-digit
        // prefix out of a 14-digit run.
        let siret_spans: Vec<(usize, usize)> = SIRET_RE
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        for m in SIRET_RE.find_iter(text) {
            if let Some(siret) = Siret::parse(m.as_str()) {
                let siren = siret.siren();
                if self.denylist.contains(siren.as_str()) {
                    tracing::debug!(siret = %siret, "skipping denylisted SIRET");
                    continue;
                }
                tracing::debug!(siret = %siret, "found SIRET");
                found.siren = Some(siren);
                found.siret = Some(siret);
                break;
            }
        }

        if found.siren.is_none() {
            for m in VAT_RE.find_iter(text) {
                if let Some(vat) = Vat::parse(m.as_str()) {
                    let siren = vat.siren();
                    if self.denylist.contains(siren.as_str()) {
                        tracing::debug!(vat = %vat, "skipping denylisted VAT");
                        continue;
                    }
                    tracing::debug!(vat = %vat, "found VAT");
                    found.siren = Some(siren);
                    found.vat = Some(vat);
                    break;
                }
            }
        }

        if found.siren.is_none() {
            for m in SIREN_RE.find_iter(text) {
                let inside_siret = siret_spans
                    .iter()
                    .any(|&(start, end)| m.start() >= start && m.end() <= end);
                if inside_siret {
                    continue;
                }
                if let Some(siren) = Siren::parse(m.as_str()) {
                    if self.denylist.contains(siren.as_str()) {
                        tracing::debug!(siren = %siren, "skipping denylisted SIREN");
                        continue;
                    }
                    tracing::debug!(siren = %siren, "found SIREN");
                    found.siren = Some(siren);
                    break;
                }
            }
        }

        if found.siren.is_none() {
            for cap in RCS_RE.captures_iter(text) {
                if let Some(siren) = Siren::parse(&cap[1]) {
                    if self.denylist.contains(siren.as_str()) {
                        continue;
                    }
                    tracing::debug!(siren = %siren, "found SIREN via RCS mention");
                    found.siren = Some(siren);
                    break;
                }
            }
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(Denylist::default())
    }

    #[test]
    fn test_extract_siret_yields_siren() {
        let found = extractor().extract("SIRET : 732 829 320 00074");
        assert_eq!(found.siret.as_ref().map(Siret::as_str), Some("73282932000074"));
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
        assert!(found.vat.is_none());
    }

    #[test]
    fn test_extract_siret_nbsp_formatting() {
        let found = extractor().extract("N° SIRET\u{a0}: 732\u{a0}829\u{a0}320\u{a0}00074");
        assert_eq!(found.siret.as_ref().map(Siret::as_str), Some("73282932000074"));
    }

    #[test]
    fn test_invalid_checksum_skipped_for_next_match() {
        // First candidate fails Luhn, second one passes
        let text = "SIRET 73282932000075 ou 73282932000074";
        let found = extractor().extract(text);
        assert_eq!(found.siret.as_ref().map(Siret::as_str), Some("73282932000074"));
    }

    #[test]
    fn test_denylisted_siret_skipped_for_next_match() {
        // 42364651200008 is OVH's SIREN with a valid establishment suffix
        let text = "Hébergeur : SIRET 423 646 512 00008. Éditeur : SIRET 732 829 320 00074.";
        let found = extractor().extract(text);
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }

    #[test]
    fn test_vat_only_when_siren_unknown() {
        let found = extractor().extract("TVA intracommunautaire : FR44732829320");
        assert!(found.siret.is_none());
        assert_eq!(found.vat.as_ref().map(Vat::as_str), Some("FR44732829320"));
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));

        // With a SIRET present, the SIREN is already known and the VAT
        // pass does not run.
        let found = extractor().extract("SIRET 73282932000074 - TVA FR44732829320");
        assert!(found.siret.is_some());
        assert!(found.vat.is_none());
    }

    #[test]
    fn test_denylisted_vat_skipped() {
        // 423646512 mod 97 = 79, check digits 55
        let text = "TVA : FR55423646512 / TVA : FR44732829320";
        let found = extractor().extract(text);
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }

    #[test]
    fn test_bare_siren() {
        let found = extractor().extract("SIREN : 732 829 320, capital de 1 000 €");
        assert!(found.siret.is_none());
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }

    #[test]
    fn test_siren_not_read_out_of_siret_shape() {
        // The leading 9 digits of this spaced 14-digit run form a valid
        // SIREN, but the run is SIRET-shaped (invalid checksum), so no
        // SIREN may be extracted from inside it.
        let text = "numéro 732 829 320 00075 au registre";
        assert!(!crate::validate::validate_siret("73282932000075"));
        let found = extractor().extract(text);
        assert!(found.is_empty());
    }

    #[test]
    fn test_rcs_mention() {
        let found = extractor().extract("Immatriculée au RCS Paris 388 318 313");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("388318313"));
    }

    #[test]
    fn test_rcs_multiword_city() {
        let found = extractor().extract("RCS La Rochelle 388 318 313");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("388318313"));
    }

    #[test]
    fn test_denylisted_siren_everywhere() {
        let found = extractor().extract("SIREN 423 646 512 - RCS Roubaix 423 646 512");
        assert!(found.is_empty());
    }

    #[test]
    fn test_nothing_found() {
        let found = extractor().extract("Bienvenue sur notre boutique en ligne !");
        assert!(found.is_empty());
    }

    #[test]
    fn test_extra_denylist_entries() {
        let ex = Extractor::new(Denylist::with_extra(["732829320"]));
        let found = ex.extract("SIRET 73282932000074");
        assert!(found.is_empty());
    }
}
