use sirene_browser::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("anti-automation challenge on {url}")]
    Blocked { url: String },

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
