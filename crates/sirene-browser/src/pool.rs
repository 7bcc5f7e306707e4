use crate::error::{FetchError, Result};
use chromiumoxide::{Browser, Page};
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Pool of reusable browser tabs.
///
/// Opening a tab is much cheaper than launching a browser but still
/// not free; tabs are reused across fetches. A checked-out tab is
/// exclusively owned by its lease until returned. Checkin resets the
/// tab before reuse; a lease dropped early (error paths, cancelled
/// futures) closes its tab instead of returning unknown state to the
/// pool.
pub struct PagePool {
    browser: Arc<Browser>,
    idle: Mutex<Vec<Page>>,
    permits: Arc<Semaphore>,
}

impl PagePool {
    /// Pool over `browser`, with at most `capacity` tabs open at once.
    #[must_use]
    pub fn new(browser: Arc<Browser>, capacity: usize) -> Self {
        Self {
            browser,
            idle: Mutex::new(Vec::new()),
            permits: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Borrow a tab, reusing an idle one when available.
    pub async fn checkout(self: &Arc<Self>) -> Result<PageLease> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| FetchError::Chromium("page pool closed".to_string()))?;

        let idle_page = self.idle.lock().await.pop();
        let page = match idle_page {
            Some(page) => page,
            None => self
                .browser
                .new_page("about:blank")
                .await
                .map_err(|e| FetchError::Chromium(e.to_string()))?,
        };

        Ok(PageLease {
            page: Some(page),
            pool: Arc::clone(self),
            _permit: permit,
        })
    }

    /// Reset a returned tab and put it back in rotation. A tab that
    /// refuses to reset is closed and discarded.
    async fn checkin(&self, page: Page) {
        match page.goto("about:blank").await {
            Ok(_) => self.idle.lock().await.push(page),
            Err(e) => {
                tracing::debug!("discarding page that failed to reset: {}", e);
                if let Err(e) = page.close().await {
                    tracing::debug!("page close failed: {}", e);
                }
            }
        }
    }
}

/// Exclusive borrow of one pooled tab.
pub struct PageLease {
    page: Option<Page>,
    pool: Arc<PagePool>,
    _permit: OwnedSemaphorePermit,
}

impl PageLease {
    /// Return the tab to the pool, resetting it first.
    pub async fn checkin(mut self) {
        if let Some(page) = self.page.take() {
            self.pool.checkin(page).await;
        }
    }
}

impl Deref for PageLease {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        // Only `checkin` takes the page, and it consumes the lease.
        self.page.as_ref().expect("page already returned")
    }
}

impl Drop for PageLease {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = page.close().await {
                        tracing::debug!("page cleanup on drop failed: {}", e);
                    }
                });
            } else {
                tracing::warn!("no runtime available for page cleanup");
            }
        }
    }
}
