//! Error types for the preview image pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while selecting pages and capturing preview images
#[derive(Error, Debug)]
pub enum Error {
    /// A selected page has no `<title>` tag
    #[error("No <title> found in {}", path.display())]
    MissingTitle { path: PathBuf },

    /// A selected page could not be read
    #[error("Failed to read page {}: {source}", path.display())]
    PageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset directory could not be created
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The preview template is missing or unreadable
    #[error("Failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rendering engine could not start
    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    /// A screenshot could not be written to disk
    #[error("Failed to write image {}: {source}", path.display())]
    CaptureWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load markup into a rendering context
    #[error("Failed to load content: {0}")]
    Load(String),

    /// Failed to render or capture a page
    #[error("Rendering failed: {0}")]
    Render(String),

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Enumerating the build output failed
    #[error("Failed to scan build output: {0}")]
    Scan(String),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    Cdp(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Cdp(err.to_string())
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Scan(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Config(format!("invalid pattern: {}", err))
    }
}
