//! Per-site resolution.
//!
//! One site is resolved by walking it in a fixed order until an
//! identifier turns up or the page budget runs out: home page first,
//! then the conventional statutory-disclosure paths fetched in
//! parallel, then same-host links discovered in the page chrome. A
//! challenge anywhere aborts the pass; the whole site is then retried
//! once with a visible browser before giving up as blocked.

use crate::blocked::is_challenge;
use crate::error::{Result, ScanError};
use sirene_browser::{FetchError, FetchOptions, FetchedPage, PageFetcher};
use sirene_extract::{extract_prioritized, Extractor, IdentifierSet};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Substrings that mark a navigation link as legal/contact material.
const LINK_KEYWORDS: [&str; 11] = [
    "mention",
    "légal",
    "legal",
    "siret",
    "cgv",
    "cgu",
    "condition",
    "confidentialité",
    "propos",
    "about",
    "contact",
];

/// Result of resolving one site.
#[derive(Debug, Clone)]
pub struct SiteVisit {
    /// What was found; empty on a negative result
    pub identifiers: IdentifierSet,
    /// URL of the page the identifiers came from
    pub found_on: Option<String>,
    /// Pages fetched during the winning pass
    pub pages_checked: usize,
    /// Whether the visible-browser fallback was needed
    pub used_visible: bool,
}

/// Walks one site looking for identifiers.
pub struct SiteNavigator {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Extractor,
    legal_paths: Vec<String>,
    max_pages: usize,
    fallback_to_visible: bool,
}

impl SiteNavigator {
    /// Build a navigator.
    ///
    /// `max_pages` caps fetches per site, home page included.
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Extractor,
        legal_paths: Vec<String>,
        max_pages: usize,
        fallback_to_visible: bool,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            legal_paths,
            max_pages: max_pages.max(1),
            fallback_to_visible,
        }
    }

    /// Resolve one site.
    ///
    /// On a challenge the site is retried once, whole, with a visible
    /// browser. A still-blocked site surfaces as [`ScanError::Blocked`].
    pub async fn resolve(&self, url: &str, opts: &FetchOptions) -> Result<SiteVisit> {
        match self.resolve_pass(url, opts).await {
            Err(ScanError::Blocked { .. }) if self.fallback_to_visible && !opts.visible => {
                tracing::info!(%url, "challenge detected, retrying site with visible browser");
                let mut visible_opts = opts.clone();
                visible_opts.visible = true;
                let mut visit = self.resolve_pass(url, &visible_opts).await?;
                visit.used_visible = true;
                Ok(visit)
            }
            other => other,
        }
    }

    async fn resolve_pass(&self, url: &str, opts: &FetchOptions) -> Result<SiteVisit> {
        let submitted = Url::parse(url)
            .map_err(|e| ScanError::InvalidInput(format!("invalid URL '{url}': {e}")))?;

        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(normalize(url));

        // Home page failure fails the whole site
        let home = self.fetch_checked(url, opts).await?;
        let mut pages_checked = 1;
        visited.insert(normalize(&home.final_url));

        // Follow the redirect target for path joins and host checks,
        // e.g. example.fr redirecting to www.example.fr
        let base = Url::parse(&home.final_url).unwrap_or(submitted);

        if is_not_found(&home) {
            return Err(ScanError::Fetch(FetchError::NotFound(url.to_string())));
        }
        if let Some(found) = self.extract_from(&home) {
            return Ok(SiteVisit {
                identifiers: found,
                found_on: Some(home.final_url.clone()),
                pages_checked,
                used_visible: opts.visible,
            });
        }

        // Statutory paths: fetched in parallel, evaluated in priority
        // order so the most conventional page wins ties.
        let mut candidates: Vec<String> = Vec::new();
        for path in &self.legal_paths {
            if pages_checked + candidates.len() >= self.max_pages {
                break;
            }
            if let Ok(joined) = base.join(path) {
                if visited.insert(normalize(joined.as_str())) {
                    candidates.push(joined.into());
                }
            }
        }

        let fetches = candidates.iter().map(|u| self.fetch_checked(u, opts));
        let outcomes = futures::future::join_all(fetches).await;
        pages_checked += candidates.len();

        for (candidate, outcome) in candidates.iter().zip(outcomes) {
            match outcome {
                Ok(page) => {
                    if is_not_found(&page) {
                        continue;
                    }
                    if let Some(found) = self.extract_from(&page) {
                        return Ok(SiteVisit {
                            identifiers: found,
                            found_on: Some(candidate.clone()),
                            pages_checked,
                            used_visible: opts.visible,
                        });
                    }
                }
                Err(e @ ScanError::Blocked { .. }) => return Err(e),
                Err(e) => {
                    tracing::debug!(url = %candidate, "legal path fetch failed: {}", e);
                }
            }
        }

        // Links discovered in the home page chrome, same host only
        let host = base.host_str().map(str::to_lowercase);
        for link in &home.links {
            if pages_checked >= self.max_pages {
                break;
            }
            let Ok(target) = Url::parse(&link.href) else {
                continue;
            };
            if target.host_str().map(str::to_lowercase) != host {
                continue;
            }
            let haystack = format!("{} {}", link.text.to_lowercase(), target.path().to_lowercase());
            if !LINK_KEYWORDS.iter().any(|kw| haystack.contains(kw)) {
                continue;
            }
            if !visited.insert(normalize(target.as_str())) {
                continue;
            }

            pages_checked += 1;
            match self.fetch_checked(target.as_str(), opts).await {
                Ok(page) => {
                    if is_not_found(&page) {
                        continue;
                    }
                    if let Some(found) = self.extract_from(&page) {
                        return Ok(SiteVisit {
                            identifiers: found,
                            found_on: Some(target.to_string()),
                            pages_checked,
                            used_visible: opts.visible,
                        });
                    }
                }
                Err(e @ ScanError::Blocked { .. }) => return Err(e),
                Err(e) => {
                    tracing::debug!(url = %target, "discovered link fetch failed: {}", e);
                }
            }
        }

        Ok(SiteVisit {
            identifiers: IdentifierSet::default(),
            found_on: None,
            pages_checked,
            used_visible: opts.visible,
        })
    }

    /// Fetch a page and turn challenge interstitials into errors.
    async fn fetch_checked(&self, url: &str, opts: &FetchOptions) -> Result<FetchedPage> {
        let page = self.fetcher.fetch(url, opts).await?;
        if is_challenge(&page.title, &page.full_text) {
            return Err(ScanError::Blocked {
                url: url.to_string(),
            });
        }
        Ok(page)
    }

    fn extract_from(&self, page: &FetchedPage) -> Option<IdentifierSet> {
        let found = extract_prioritized(&self.extractor, &page.regions, &page.full_text);
        (!found.is_empty()).then_some(found)
    }
}

/// Soft-404 detection: many sites return a styled error page with a
/// 200 status, visible only through the title.
fn is_not_found(page: &FetchedPage) -> bool {
    let title = page.title.to_lowercase();
    title.contains("404") || title.contains("not found") || title.contains("introuvable")
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sirene_extract::Denylist;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Scripted {
        Page(FetchedPage),
        ChallengeUnlessVisible(FetchedPage),
        NavError(String),
    }

    struct ScriptedFetcher {
        routes: HashMap<String, Scripted>,
        calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedFetcher {
        fn new(routes: Vec<(&str, Scripted)>) -> Self {
            Self {
                routes: routes
                    .into_iter()
                    .map(|(u, s)| (u.trim_end_matches('/').to_string(), s))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn page(url: &str, title: &str, text: &str) -> FetchedPage {
        FetchedPage {
            final_url: url.to_string(),
            title: title.to_string(),
            full_text: text.to_string(),
            regions: Vec::new(),
            links: Vec::new(),
        }
    }

    #[async_trait::async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            url: &str,
            opts: &FetchOptions,
        ) -> sirene_browser::Result<FetchedPage> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), opts.visible));
            match self.routes.get(url.trim_end_matches('/')) {
                Some(Scripted::Page(p)) => Ok(p.clone()),
                Some(Scripted::ChallengeUnlessVisible(p)) => {
                    if opts.visible {
                        Ok(p.clone())
                    } else {
                        Ok(page(url, "Just a moment...", "Checking your browser"))
                    }
                }
                Some(Scripted::NavError(msg)) => Err(FetchError::Navigation(msg.clone())),
                None => Ok(page(url, "Accueil", "Rien à voir ici")),
            }
        }
    }

    fn navigator(fetcher: ScriptedFetcher, fallback: bool) -> SiteNavigator {
        SiteNavigator::new(
            Arc::new(fetcher),
            Extractor::new(Denylist::default()),
            vec!["/mentions-legales".to_string(), "/cgv".to_string()],
            7,
            fallback,
        )
    }

    #[tokio::test]
    async fn test_home_page_hit() {
        let fetcher = ScriptedFetcher::new(vec![(
            "https://example.fr",
            Scripted::Page(page(
                "https://example.fr/",
                "Accueil",
                "SIRET 732 829 320 00074",
            )),
        )]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert!(!visit.identifiers.is_empty());
        assert_eq!(visit.pages_checked, 1);
        assert_eq!(visit.found_on.as_deref(), Some("https://example.fr/"));
        assert!(!visit.used_visible);
    }

    #[tokio::test]
    async fn test_legal_page_attribution() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "https://example.fr",
                Scripted::Page(page("https://example.fr/", "Accueil", "Bienvenue")),
            ),
            (
                "https://example.fr/mentions-legales",
                Scripted::Page(page(
                    "https://example.fr/mentions-legales",
                    "Mentions légales",
                    "SIREN 732 829 320",
                )),
            ),
        ]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert_eq!(
            visit.found_on.as_deref(),
            Some("https://example.fr/mentions-legales")
        );
        assert_eq!(visit.pages_checked, 3); // home + 2 legal paths
    }

    #[tokio::test]
    async fn test_soft_404_legal_page_skipped() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "https://example.fr",
                Scripted::Page(page("https://example.fr/", "Accueil", "Bienvenue")),
            ),
            (
                "https://example.fr/mentions-legales",
                // Looks like a hit but it's an error page
                Scripted::Page(page(
                    "https://example.fr/mentions-legales",
                    "404 - Page introuvable",
                    "SIREN 732 829 320",
                )),
            ),
            (
                "https://example.fr/cgv",
                Scripted::Page(page(
                    "https://example.fr/cgv",
                    "CGV",
                    "SIREN 388 318 313",
                )),
            ),
        ]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert_eq!(visit.found_on.as_deref(), Some("https://example.fr/cgv"));
    }

    #[tokio::test]
    async fn test_home_404_is_an_error() {
        let fetcher = ScriptedFetcher::new(vec![(
            "https://example.fr",
            Scripted::Page(page("https://example.fr/", "404 Not Found", "")),
        )]);
        let nav = navigator(fetcher, true);

        let err = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect_err("home 404 fails the site");
        assert!(matches!(err, ScanError::Fetch(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_blocked_then_visible_fallback() {
        let fetcher = ScriptedFetcher::new(vec![(
            "https://example.fr",
            Scripted::ChallengeUnlessVisible(page(
                "https://example.fr/",
                "Accueil",
                "SIREN 732 829 320",
            )),
        )]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("visible pass succeeds");
        assert!(visit.used_visible);
        assert!(!visit.identifiers.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_without_fallback() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![(
            "https://example.fr",
            Scripted::ChallengeUnlessVisible(page("https://example.fr/", "Accueil", "ok")),
        )]));
        let nav = SiteNavigator::new(
            Arc::clone(&fetcher) as Arc<dyn PageFetcher>,
            Extractor::new(Denylist::default()),
            vec!["/mentions-legales".to_string()],
            7,
            false,
        );

        let err = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect_err("stays blocked");
        assert!(matches!(err, ScanError::Blocked { .. }));
        // No visible pass, no legal paths probed
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_discovered_link_followed() {
        let mut home = page("https://example.fr/", "Accueil", "Bienvenue");
        home.links = vec![
            sirene_browser::AnchorLink {
                href: "https://autre-site.fr/mentions-legales".to_string(),
                text: "Mentions légales".to_string(),
            },
            sirene_browser::AnchorLink {
                href: "https://example.fr/infos-legales".to_string(),
                text: "Informations légales".to_string(),
            },
        ];
        let fetcher = ScriptedFetcher::new(vec![
            ("https://example.fr", Scripted::Page(home)),
            (
                "https://example.fr/infos-legales",
                Scripted::Page(page(
                    "https://example.fr/infos-legales",
                    "Informations légales",
                    "TVA intracommunautaire : FR44732829320",
                )),
            ),
            // The cross-host link must never be fetched
            (
                "https://autre-site.fr/mentions-legales",
                Scripted::NavError("should not be fetched".to_string()),
            ),
        ]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert_eq!(
            visit.found_on.as_deref(),
            Some("https://example.fr/infos-legales")
        );
        assert!(visit.identifiers.vat.is_some());
    }

    #[tokio::test]
    async fn test_redirected_host_becomes_the_base() {
        let fetcher = ScriptedFetcher::new(vec![
            (
                "https://example.fr",
                // Home redirects to the www host
                Scripted::Page(page("https://www.example.fr/", "Accueil", "Bienvenue")),
            ),
            (
                "https://www.example.fr/mentions-legales",
                Scripted::Page(page(
                    "https://www.example.fr/mentions-legales",
                    "Mentions légales",
                    "SIREN 732 829 320",
                )),
            ),
        ]);
        let nav = navigator(fetcher, true);

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert_eq!(
            visit.found_on.as_deref(),
            Some("https://www.example.fr/mentions-legales")
        );
    }

    #[tokio::test]
    async fn test_no_data_respects_page_budget() {
        let fetcher = ScriptedFetcher::new(vec![(
            "https://example.fr",
            Scripted::Page(page("https://example.fr/", "Accueil", "Bienvenue")),
        )]);
        let nav = SiteNavigator::new(
            Arc::new(fetcher),
            Extractor::new(Denylist::default()),
            vec![
                "/mentions-legales".to_string(),
                "/cgv".to_string(),
                "/cgu".to_string(),
                "/legal".to_string(),
                "/a-propos".to_string(),
            ],
            3,
            true,
        );

        let visit = nav
            .resolve("https://example.fr", &FetchOptions::default())
            .await
            .expect("resolve");
        assert!(visit.identifiers.is_empty());
        assert!(visit.found_on.is_none());
        assert_eq!(visit.pages_checked, 3);
    }
}
