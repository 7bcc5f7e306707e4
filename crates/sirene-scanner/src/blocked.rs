//! Anti-automation challenge detection.
//!
//! A challenge interstitial (Cloudflare, DataDome, CAPTCHAs) renders
//! instead of the real page, so the fetch succeeds but the content is
//! the bot wall. Detection is text-signature based.

/// Lowercase signatures that mark a challenge page.
const CHALLENGE_SIGNATURES: [&str; 10] = [
    "checking your browser",
    "just a moment",
    "cloudflare ray id",
    "attention required",
    "access denied",
    "verify you are human",
    "vérifier que vous êtes",
    "ddos protection",
    "recaptcha",
    "hcaptcha",
];

/// True when the title or the page text carries a challenge signature.
#[must_use]
pub fn is_challenge(title: &str, text: &str) -> bool {
    let title = title.to_lowercase();
    let text = text.to_lowercase();
    CHALLENGE_SIGNATURES
        .iter()
        .any(|sig| title.contains(sig) || text.contains(sig))
}
