// src/error.rs

use thiserror::Error;

/// Core error types for terark-get
#[derive(Error, Debug)]
pub enum Error {
    /// Host OS is neither Linux nor macOS
    #[error("{0} is not supported, prebuilt packages exist for Linux and macOS only")]
    UnsupportedPlatform(String),

    /// Release catalog could not be fetched or parsed
    #[error("release catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// A non-interactive selection did not match any catalog entry
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// No package in the release matches the host platform and feature tier
    #[error("no package in release {version} matches this host ({host})")]
    NoCompatiblePackage { version: String, host: String },

    /// Package transfer failed
    #[error("download failed: {0}")]
    DownloadError(String),

    /// Archive is not a gzip-compressed tar
    #[error("unsupported package format: {0}, expected a .tgz or .tar.gz archive")]
    UnsupportedFormat(String),

    /// Install root could not be created or used
    #[error("cannot install into {path}: {reason}, please retry with a different path")]
    InstallPathError { path: String, reason: String },

    /// Target path missing after the payload was moved into place
    #[error("installation verification failed: {0}")]
    VerificationFailure(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using terark-get's Error type
pub type Result<T> = std::result::Result<T, Error>;
