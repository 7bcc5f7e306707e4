//! Prioritized-region extraction.
//!
//! Legal identifiers usually live in the footer or a legal-notice
//! block, and those regions are far less noisy than the whole page
//! (phone numbers and order totals also look like digit runs). Region
//! text is therefore tried first, the full page only as a fallback.

use crate::extract::Extractor;
use crate::identifiers::IdentifierSet;

/// Run extraction over each prioritized region in order, falling back
/// to the full page text only when no region yields anything.
///
/// Regions are searched one at a time so a hit in a higher-priority
/// region wins even when a lower one carries a more specific
/// identifier kind.
#[must_use]
pub fn extract_prioritized(
    extractor: &Extractor,
    regions: &[String],
    full_text: &str,
) -> IdentifierSet {
    for region in regions {
        let found = extractor.extract(region);
        if !found.is_empty() {
            return found;
        }
    }
    extractor.extract(full_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::denylist::Denylist;
    use crate::identifiers::Siren;

    #[test]
    fn test_region_hit_wins() {
        let extractor = Extractor::new(Denylist::default());
        let regions = vec!["Mentions légales - SIREN 732 829 320".to_string()];
        // Full text carries a different (also valid) SIREN; the region
        // one must win.
        let found = extract_prioritized(&extractor, &regions, "SIREN 388 318 313");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }

    #[test]
    fn test_fallback_to_full_text() {
        let extractor = Extractor::new(Denylist::default());
        let regions = vec!["© 2026 Tous droits réservés".to_string()];
        let found = extract_prioritized(&extractor, &regions, "SIRET 73282932000074");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }

    #[test]
    fn test_no_regions() {
        let extractor = Extractor::new(Denylist::default());
        let found = extract_prioritized(&extractor, &[], "SIREN 732829320");
        assert!(!found.is_empty());
    }

    #[test]
    fn test_region_priority_beats_kind_precedence() {
        let extractor = Extractor::new(Denylist::default());
        // The first region only has a SIREN, the second a full SIRET;
        // the first region still wins.
        let regions = vec![
            "SIREN 388 318 313".to_string(),
            "SIRET 732 829 320 00074".to_string(),
        ];
        let found = extract_prioritized(&extractor, &regions, "");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("388318313"));
        assert!(found.siret.is_none());
    }

    #[test]
    fn test_denylisted_region_falls_through() {
        let extractor = Extractor::new(Denylist::default());
        // Footer only names the hoster; the page body has the real one.
        let regions = vec!["Hébergé par OVH, SIREN 423 646 512".to_string()];
        let found = extract_prioritized(&extractor, &regions, "Éditeur : SIREN 732 829 320");
        assert_eq!(found.siren.as_ref().map(Siren::as_str), Some("732829320"));
    }
}
