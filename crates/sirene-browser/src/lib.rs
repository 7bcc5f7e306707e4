//! Chromium-backed page fetcher.
//!
//! Renders JavaScript-heavy pages in a real browser and hands back the
//! visible text, prioritized regions and navigation links for
//! extraction downstream.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod fingerprint;
pub mod pool;

pub use engine::ChromiumFetcher;
pub use error::{FetchError, Result};
pub use fetcher::{AnchorLink, FetchOptions, FetchedPage, PageFetcher};
pub use fingerprint::FingerprintConfig;
pub use pool::{PageLease, PagePool};
