//! Batch scheduling.
//!
//! A submitted batch is validated up front, registered in the store,
//! and driven by a background task. Admission is gated by a semaphore
//! sized to the requested concurrency; each URL is pinned to a worker
//! slot (`index % concurrency`) so sticky proxies stay deterministic.
//! `submit` returns the batch id immediately; progress is read from
//! the store.

use crate::error::{Result, ScanError};
use crate::navigator::SiteNavigator;
use crate::progress::{BatchState, BatchStore, SiteResult};
use crate::proxy::{ProxyEndpoint, ProxyRotator};
use crate::retry::{retry, RetryPolicy};
use sirene_browser::{FetchOptions, PageFetcher};
use sirene_core::{AppConfig, BatchId, Outcome};
use sirene_extract::{Denylist, Extractor, IdentifierSet};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Hard ceiling on batch concurrency, independent of configuration.
pub const MAX_CONCURRENCY: usize = 50;

/// One batch submission.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Site URLs to resolve, one entry per site
    pub urls: Vec<String>,
    /// Concurrent site resolutions for this batch
    pub concurrency: usize,
}

/// Accepts batches and drives them in the background.
pub struct BatchScheduler {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn BatchStore>,
    config: AppConfig,
    proxies: Vec<ProxyEndpoint>,
}

impl BatchScheduler {
    /// Build a scheduler. Configured proxy endpoints are validated
    /// here so a bad one fails construction, not the first batch.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        store: Arc<dyn BatchStore>,
        config: AppConfig,
    ) -> Result<Self> {
        let proxies = if config.proxy.enabled {
            config
                .proxy
                .endpoints
                .iter()
                .map(|raw| ProxyEndpoint::parse(raw))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(Self {
            fetcher,
            store,
            config,
            proxies,
        })
    }

    /// Validate and launch a batch. Returns the batch id immediately;
    /// execution continues in the background.
    pub fn submit(&self, request: BatchRequest) -> Result<BatchId> {
        Self::validate(&request)?;

        let id = BatchId::generate();
        self.store.insert(BatchState::new(id.clone(), request.urls.len()));
        tracing::info!(batch = %id, sites = request.urls.len(), concurrency = request.concurrency, "batch accepted");

        let driver = BatchDriver {
            fetcher: Arc::clone(&self.fetcher),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            proxies: self.proxies.clone(),
        };
        let driver_id = id.clone();
        tokio::spawn(async move {
            driver.drive(driver_id, request).await;
        });

        Ok(id)
    }

    /// Reject malformed batches before any fetch happens.
    fn validate(request: &BatchRequest) -> Result<()> {
        if request.urls.is_empty() {
            return Err(ScanError::InvalidInput("batch has no URLs".to_string()));
        }
        if request.concurrency == 0 || request.concurrency > MAX_CONCURRENCY {
            return Err(ScanError::InvalidInput(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {}",
                request.concurrency
            )));
        }

        let mut seen = HashSet::new();
        for raw in &request.urls {
            let parsed = url::Url::parse(raw)
                .map_err(|e| ScanError::InvalidInput(format!("invalid URL '{raw}': {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ScanError::InvalidInput(format!(
                    "unsupported scheme in '{raw}'"
                )));
            }
            if parsed.host_str().is_none() {
                return Err(ScanError::InvalidInput(format!("no host in '{raw}'")));
            }
            if !seen.insert(raw.trim_end_matches('/').to_lowercase()) {
                return Err(ScanError::InvalidInput(format!("duplicate URL '{raw}'")));
            }
        }
        Ok(())
    }
}

/// Everything one background batch run needs, owned.
struct BatchDriver {
    fetcher: Arc<dyn PageFetcher>,
    store: Arc<dyn BatchStore>,
    config: AppConfig,
    proxies: Vec<ProxyEndpoint>,
}

impl BatchDriver {
    async fn drive(self, id: BatchId, request: BatchRequest) {
        let concurrency = request.concurrency;
        let semaphore = Arc::new(Semaphore::new(concurrency));

        let navigator = Arc::new(SiteNavigator::new(
            Arc::clone(&self.fetcher),
            Extractor::new(Denylist::with_extra(
                self.config.extraction.extra_denylist_sirens.clone(),
            )),
            self.config.scanning.legal_paths.clone(),
            self.config.scanning.max_pages_per_site,
            self.config.browser.fallback_to_visible,
        ));

        let policy = RetryPolicy {
            max_attempts: self.config.scanning.max_attempts,
            base_delay: Duration::from_secs(self.config.scanning.retry_base_secs),
            max_delay: Duration::from_secs(self.config.scanning.retry_max_secs),
        };

        // One rotator per worker slot when sticky, one shared otherwise
        let pool = ProxyRotator::new(self.proxies.clone());
        let slot_rotators: Vec<Arc<ProxyRotator>> = if self.config.proxy.sticky_per_worker {
            pool.partition(concurrency, self.config.proxy.proxies_per_worker)
                .into_iter()
                .map(Arc::new)
                .collect()
        } else {
            let shared = Arc::new(pool);
            (0..concurrency).map(|_| Arc::clone(&shared)).collect()
        };

        let base_opts = FetchOptions {
            navigation_timeout: Duration::from_secs(self.config.browser.navigation_timeout_secs),
            settle_timeout: Duration::from_secs(self.config.browser.settle_timeout_secs),
            proxy: None,
            visible: !self.config.browser.headless,
        };

        let mut handles = Vec::with_capacity(request.urls.len());
        for (index, url) in request.urls.into_iter().enumerate() {
            let slot = index % concurrency;
            let semaphore = Arc::clone(&semaphore);
            let navigator = Arc::clone(&navigator);
            let rotator = Arc::clone(&slot_rotators[slot]);
            let store = Arc::clone(&self.store);
            let policy = policy.clone();
            let base_opts = base_opts.clone();
            let batch_id = id.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };

                // One proxy per site, not per attempt, so retries keep
                // the same exit IP.
                let proxy = rotator.next();
                let mut opts = base_opts;
                opts.proxy = proxy.as_ref().map(ProxyEndpoint::server_url);

                let started = Instant::now();
                let resolved = {
                    let navigator = Arc::clone(&navigator);
                    let url = url.clone();
                    let opts = opts.clone();
                    retry(&policy, move |attempt| {
                        let navigator = Arc::clone(&navigator);
                        let url = url.clone();
                        let opts = opts.clone();
                        async move {
                            if attempt > 0 {
                                tracing::debug!(%url, attempt, "retrying site");
                            }
                            navigator.resolve(&url, &opts).await
                        }
                    })
                    .await
                };

                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                let result = match resolved {
                    Ok(visit) if !visit.identifiers.is_empty() => SiteResult {
                        url,
                        identifiers: visit.identifiers,
                        outcome: Outcome::Success,
                        error: None,
                        found_on: visit.found_on,
                        pages_checked: visit.pages_checked,
                        used_visible: visit.used_visible,
                        worker_slot: slot,
                        proxy: proxy.as_ref().map(ToString::to_string),
                        duration_ms,
                        finished_at: chrono::Utc::now(),
                    },
                    Ok(visit) => SiteResult {
                        url,
                        identifiers: IdentifierSet::default(),
                        outcome: Outcome::NoData,
                        error: None,
                        found_on: None,
                        pages_checked: visit.pages_checked,
                        used_visible: visit.used_visible,
                        worker_slot: slot,
                        proxy: proxy.as_ref().map(ToString::to_string),
                        duration_ms,
                        finished_at: chrono::Utc::now(),
                    },
                    Err(e) => {
                        let outcome = match &e {
                            ScanError::Blocked { .. } => Outcome::Blocked,
                            _ => Outcome::Error,
                        };
                        tracing::warn!(%url, outcome = %outcome, "site failed: {}", e);
                        SiteResult {
                            url,
                            identifiers: IdentifierSet::default(),
                            outcome,
                            error: Some(e.to_string()),
                            found_on: None,
                            pages_checked: 0,
                            used_visible: false,
                            worker_slot: slot,
                            proxy: proxy.as_ref().map(ToString::to_string),
                            duration_ms,
                            finished_at: chrono::Utc::now(),
                        }
                    }
                };

                store.update(&batch_id, &mut |state| state.record(result.clone()));
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(batch = %id, "site task panicked: {}", e);
            }
        }

        self.store.update(&id, &mut |state| state.finish());
        tracing::info!(batch = %id, "batch finished");
    }
}
