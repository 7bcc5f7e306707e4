//! Sirene Scanner - Batch orchestration for identifier extraction.
//!
//! This crate drives whole batches of sites through the browser
//! fetcher and the extraction pipeline with bounded concurrency,
//! retry logic, challenge detection and proxy rotation, and exposes
//! live progress per batch.
//!
//! # Features
//!
//! - Concurrent site resolution with a configurable, capped parallelism
//! - Retry with exponential backoff for transient failures only
//! - Anti-automation challenge detection with a one-shot visible retry
//! - Round-robin or sticky per-worker proxy rotation
//! - Live batch progress with throughput and ETA
//!
//! # Example
//!
//! ```rust,ignore
//! use sirene_scanner::{BatchRequest, BatchScheduler, InMemoryBatchStore};
//! use sirene_browser::ChromiumFetcher;
//! use sirene_core::AppConfig;
//! use std::sync::Arc;
//!
//! let scheduler = BatchScheduler::new(
//!     Arc::new(ChromiumFetcher::new()),
//!     Arc::new(InMemoryBatchStore::new()),
//!     AppConfig::load()?,
//! )?;
//!
//! let batch_id = scheduler.submit(BatchRequest {
//!     urls: vec!["https://example.fr".to_string()],
//!     concurrency: 3,
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)]

pub mod blocked;
#[allow(missing_docs)]
pub mod error;
pub mod navigator;
pub mod progress;
pub mod proxy;
pub mod retry;
pub mod scheduler;

// Re-export commonly used types
pub use blocked::is_challenge;
pub use error::{Result, ScanError};
pub use navigator::{SiteNavigator, SiteVisit};
pub use progress::{BatchSnapshot, BatchState, BatchStore, InMemoryBatchStore, SiteResult};
pub use proxy::{ProxyEndpoint, ProxyRotator};
pub use retry::{is_retryable, retry, RetryPolicy};
pub use scheduler::{BatchRequest, BatchScheduler, MAX_CONCURRENCY};
