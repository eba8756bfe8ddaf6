//! Error types for the download module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while streaming a media file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS, body read).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or idle-read deadline elapsed.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response; nothing was written.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The caller-supplied sink rejected a write or flush.
    #[error("write to destination failed: {source}")]
    Sink {
        #[source]
        source: std::io::Error,
    },

    /// File system error on a file destination.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Cancellation was requested before the transfer finished.
    #[error("download of {url} cancelled")]
    Cancelled {
        /// The URL being downloaded.
        url: String,
    },

    /// The body ended before `Content-Length` bytes arrived.
    #[error("incomplete download of {url}: expected {expected} bytes, got {actual}")]
    Incomplete {
        /// The URL being downloaded.
        url: String,
        /// Declared content length.
        expected: u64,
        /// Bytes actually received.
        actual: u64,
    },
}

impl DownloadError {
    /// Maps a reqwest error into timeout, invalid URL or network.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else if source.is_builder() {
            Self::InvalidUrl { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a sink write error.
    pub fn sink(source: std::io::Error) -> Self {
        Self::Sink { source }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Creates a short-body error.
    pub fn incomplete(url: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::Incomplete {
            url: url.into(),
            expected,
            actual,
        }
    }

    /// Re-attributes a sink failure to the file it was writing.
    #[must_use]
    pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Sink { source } => Self::io(path, source),
            other => other,
        }
    }

    /// A few words describing the failure, without URLs.
    #[must_use]
    pub fn short_reason(&self) -> String {
        match self {
            Self::Network { .. } => "network error".to_string(),
            Self::Timeout { .. } => "timed out".to_string(),
            Self::HttpStatus { status, .. } => format!("HTTP {status}"),
            Self::Sink { source } | Self::Io { source, .. } => format!("write failed ({source})"),
            Self::InvalidUrl { .. } => "invalid video URL".to_string(),
            Self::Cancelled { .. } => "cancelled".to_string(),
            Self::Incomplete {
                expected, actual, ..
            } => format!("connection closed after {actual} of {expected} bytes"),
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the
// URL or path, which the source errors don't carry.
