//! AudioBreak Scraper: page extraction and bulk media retrieval
//!
//! This crate implements a small web service that extracts text and media
//! references from pages (optionally following pagination), and retrieves
//! selected media into downloadable ZIP archives through background jobs.

pub mod config;
pub mod crawler;
pub mod jobs;
pub mod server;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Invalid job state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors from fetching a single page or asset
///
/// These are always recorded against the URL that produced them and never
/// abort a crawl or a retrieval job.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Request timeout")]
    Timeout,

    #[error("{0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

impl FetchError {
    /// Classifies a reqwest send error
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Network("Connection refused".to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// An invalid CSS selector supplied by the caller
#[derive(Debug, Error)]
#[error("Invalid selector '{selector}': {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Archive construction errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error while writing archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive task failed: {0}")]
    Task(String),
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{traverse, CrawlReport, CrawlRequest, MediaKind, PaginationMode};
pub use state::{JobSnapshot, JobStatus};
pub use storage::JobRegistry;
