//! Error types for the provisioning pipeline.
//!
//! Every variant here is fatal: the pipeline prints a short diagnostic and
//! terminates with the variant's exit code. Lookups that may degrade
//! gracefully (public IP, country code) never produce a [`LaunchError`];
//! they substitute a placeholder value instead.

use thiserror::Error;

/// Error type for all fatal provisioning failures.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Host CPU architecture has no published relay build
    #[error("unsupported architecture: {0} (only x86_64 builds are published)")]
    UnsupportedArch(String),

    /// Relay binary download did not complete
    #[error("relay binary download failed: {0}")]
    Download(#[source] reqwest::Error),

    /// Certificate generation or parsing failed
    #[error("certificate error: {0}")]
    Certificate(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server config could not be rendered
    #[error("config rendering error: {0}")]
    Render(#[from] serde_json::Error),

    /// File system I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LaunchError {
    /// Process exit code for this failure.
    ///
    /// Unsupported architecture and download failures carry distinct codes
    /// so panel wrappers can tell them apart; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaunchError::UnsupportedArch(_) => 2,
            LaunchError::Download(_) => 3,
            _ => 1,
        }
    }
}

impl From<rcgen::Error> for LaunchError {
    fn from(e: rcgen::Error) -> Self {
        LaunchError::Certificate(e.to_string())
    }
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, LaunchError>;
