//! Sirene Core - Foundation crate for the Sirene extraction engine.
//!
//! This crate provides the shared error types, TOML configuration and
//! common newtypes that the other Sirene crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`BatchId`, `Outcome`)
//!
//! # Example
//!
//! ```rust
//! use sirene_core::{AppConfig, BatchId, Outcome};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(config.scanning.max_concurrency >= 1);
//!
//! let id = BatchId::generate();
//! assert_eq!(Outcome::NoData.to_string(), "no_data");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, ExtractionConfig, ProxyConfig, ScanningConfig,
};
pub use error::{ConfigError, ConfigResult, Result, SireneError};
pub use types::{BatchId, Outcome};
