use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One anchor collected from the page's navigation chrome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorLink {
    /// Absolute href as resolved by the browser
    pub href: String,
    /// Visible link text, trimmed
    pub text: String,
}

/// Everything the fetcher hands back for one rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    /// Document title
    pub title: String,
    /// Visible text of the whole page
    pub full_text: String,
    /// Text of footer/legal/contact regions, in priority order
    pub regions: Vec<String>,
    /// Anchors found in footer, header and nav elements
    pub links: Vec<AnchorLink>,
}

/// Per-fetch knobs.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hard limit on navigation; exceeding it fails the fetch
    pub navigation_timeout: Duration,
    /// Extra wait for late content; expiring is tolerated
    pub settle_timeout: Duration,
    /// Proxy endpoint for this fetch, if any
    pub proxy: Option<String>,
    /// Run with a visible window instead of headless
    pub visible: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(20),
            settle_timeout: Duration::from_secs(5),
            proxy: None,
            visible: false,
        }
    }
}

/// Renders a URL and returns its visible content.
///
/// The trait seam lets the scanner run against a scripted fetcher in
/// tests without a browser.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Navigate to `url` and snapshot the rendered page.
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<FetchedPage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = FetchOptions::default();
        assert_eq!(opts.navigation_timeout, Duration::from_secs(20));
        assert!(!opts.visible);
        assert!(opts.proxy.is_none());
    }

    #[test]
    fn test_fetched_page_serialization() {
        let page = FetchedPage {
            final_url: "https://example.fr/".to_string(),
            title: "Accueil".to_string(),
            full_text: "Bienvenue".to_string(),
            regions: vec!["SIREN 732 829 320".to_string()],
            links: vec![AnchorLink {
                href: "https://example.fr/mentions-legales".to_string(),
                text: "Mentions légales".to_string(),
            }],
        };
        let json = serde_json::to_string(&page).expect("serialize page");
        assert!(json.contains("mentions-legales"));
    }
}
