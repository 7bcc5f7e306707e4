//! Checksum validation for French business identifiers.
//!
//! SIRET and SIREN both use the Luhn algorithm, but the doubled digit
//! positions differ because the two numbers have different lengths and
//! the doubling parity is anchored at the rightmost digit. The TVA
//! number embeds a SIREN and carries its own modulo-97 check.

/// SIREN prefix of La Poste, whose establishments predate the Luhn
/// scheme and use a digit-sum rule instead.
const LA_POSTE_SIREN: &str = "356000000";

/// Remove the separators tolerated inside a formatted identifier.
///
/// French disclosures format numbers with spaces, non-breaking spaces,
/// dots or hyphens ("732 829 320", "732.829.320").
#[must_use]
pub fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect()
}

/// Luhn checksum over a digit string.
///
/// Digits whose 0-based index has the given parity are doubled, with
/// doubled values above 9 reduced by 9. Returns `None` when a
/// non-digit slips through.
fn luhn_sum(digits: &str, double_parity: usize) -> Option<u32> {
    let mut total = 0u32;
    for (i, c) in digits.chars().enumerate() {
        let mut d = c.to_digit(10)?;
        if i % 2 == double_parity {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        total += d;
    }
    Some(total)
}

/// Validate a SIRET (14-digit establishment number).
///
/// Accepts formatted input; separators are stripped before checking.
/// La Poste establishments (SIREN 356 000 000) do not satisfy Luhn and
/// are instead valid when their digit sum is a multiple of 5.
#[must_use]
pub fn validate_siret(raw: &str) -> bool {
    let digits = strip_separators(raw);
    if digits.len() != 14 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    if digits.starts_with(LA_POSTE_SIREN) {
        let sum: u32 = digits.chars().filter_map(|c| c.to_digit(10)).sum();
        return sum % 5 == 0;
    }

    matches!(luhn_sum(&digits, 0), Some(sum) if sum % 10 == 0)
}

/// Validate a SIREN (9-digit company number).
///
/// Accepts formatted input; separators are stripped before checking.
#[must_use]
pub fn validate_siren(raw: &str) -> bool {
    let digits = strip_separators(raw);
    if digits.len() != 9 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    matches!(luhn_sum(&digits, 1), Some(sum) if sum % 10 == 0)
}

/// Validate a French intracommunity VAT number (`FR` + 2 check digits
/// + 9-digit SIREN).
///
/// The check digits must equal `(12 + 3 * (siren mod 97)) mod 97` and
/// the embedded SIREN must itself be Luhn-valid.
#[must_use]
pub fn validate_vat(raw: &str) -> bool {
    let cleaned = strip_separators(raw).to_uppercase();
    if cleaned.len() != 13 || !cleaned.starts_with("FR") {
        return false;
    }

    let digits = &cleaned[2..];
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let (check, siren) = digits.split_at(2);
    if !validate_siren(siren) {
        return false;
    }

    let (Ok(check), Ok(siren_num)) = (check.parse::<u64>(), siren.parse::<u64>()) else {
        return false;
    };
    check == (12 + 3 * (siren_num % 97)) % 97
}
