//! Error types for resolver operations.
//!
//! Resolution failures are split so callers and tests can tell a page that
//! simply has no media link apart from a network or parse problem, even
//! though all of them surface the same way to an end user.

use thiserror::Error;

use crate::fetcher::FetchError;

use super::Platform;

/// Errors that can occur while resolving a page URL to a direct media URL.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The platform answered but no media link could be extracted.
    #[error("no {platform} media link found for '{input}': {reason}")]
    NotFound {
        /// Platform whose resolver ran.
        platform: Platform,
        /// The page URL being resolved.
        input: String,
        /// What was missing.
        reason: String,
    },

    /// Network, DNS, TLS or timeout failure while talking to the platform.
    #[error("could not reach {platform} endpoint for '{input}': {reason}")]
    Transport {
        /// Platform whose resolver ran.
        platform: Platform,
        /// The page URL being resolved.
        input: String,
        /// Underlying transport error text.
        reason: String,
    },

    /// The platform endpoint answered with a non-2xx status.
    #[error("{platform} endpoint returned HTTP {status} for '{input}'")]
    HttpStatus {
        /// Platform whose resolver ran.
        platform: Platform,
        /// The page URL being resolved.
        input: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response was not the JSON/HTML shape the adapter expects.
    #[error("unexpected {platform} response for '{input}': {reason}")]
    Parse {
        /// Platform whose resolver ran.
        platform: Platform,
        /// The page URL being resolved.
        input: String,
        /// What could not be parsed.
        reason: String,
    },

    /// Resolution was cancelled by the caller.
    #[error("resolution of '{input}' was cancelled")]
    Cancelled {
        /// The page URL being resolved.
        input: String,
    },

    /// No resolver handles the URL and fallback is disabled.
    #[error(
        "unsupported platform for '{input}'\n  Suggestion: Use a YouTube, Twitter/X, Instagram or Facebook URL"
    )]
    UnsupportedPlatform {
        /// The unrecognized URL.
        input: String,
    },
}

impl ResolveError {
    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(platform: Platform, input: &str, reason: &str) -> Self {
        Self::NotFound {
            platform,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a `Transport` error from a fetch failure.
    #[must_use]
    pub fn transport(platform: Platform, input: &str, source: &FetchError) -> Self {
        Self::Transport {
            platform,
            input: input.to_string(),
            reason: source.to_string(),
        }
    }

    /// Creates an `HttpStatus` error.
    #[must_use]
    pub fn http_status(platform: Platform, input: &str, status: u16) -> Self {
        Self::HttpStatus {
            platform,
            input: input.to_string(),
            status,
        }
    }

    /// Creates a `Parse` error.
    #[must_use]
    pub fn parse(platform: Platform, input: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            platform,
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a `Cancelled` error.
    #[must_use]
    pub fn cancelled(input: &str) -> Self {
        Self::Cancelled {
            input: input.to_string(),
        }
    }

    /// Creates an `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(input: &str) -> Self {
        Self::UnsupportedPlatform {
            input: input.to_string(),
        }
    }

    /// True when the platform answered but had nothing usable (`NotFound` or `Parse`).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Parse { .. })
    }

    /// True for network failures and non-2xx statuses.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }

    /// The platform whose resolver produced this error, if one ran.
    #[must_use]
    pub fn platform(&self) -> Option<Platform> {
        match self {
            Self::NotFound { platform, .. }
            | Self::Transport { platform, .. }
            | Self::HttpStatus { platform, .. }
            | Self::Parse { platform, .. } => Some(*platform),
            Self::Cancelled { .. } | Self::UnsupportedPlatform { .. } => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_not_found_message() {
        let err = ResolveError::not_found(
            Platform::Twitter,
            "https://twitter.com/u/status/1",
            "no mp4 video element",
        );
        let msg = err.to_string();
        assert!(msg.contains("twitter"), "should name platform: {msg}");
        assert!(msg.contains("https://twitter.com/u/status/1"));
        assert!(msg.contains("no mp4 video element"));
        assert!(err.is_not_found());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_resolve_error_parse_counts_as_not_found() {
        let err = ResolveError::parse(Platform::YouTube, "u", "expected JSON object");
        assert!(err.is_not_found());
        assert_eq!(err.platform(), Some(Platform::YouTube));
    }

    #[test]
    fn test_resolve_error_http_status_is_transport() {
        let err = ResolveError::http_status(Platform::Instagram, "u", 503);
        assert!(err.is_transport());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_resolve_error_transport_keeps_fetch_reason() {
        let fetch = FetchError::Timeout {
            url: "https://imginn.com/p/x/".to_string(),
        };
        let err = ResolveError::transport(Platform::Instagram, "u", &fetch);
        assert!(err.is_transport());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_resolve_error_unsupported_platform_has_suggestion() {
        let err = ResolveError::unsupported_platform("https://vimeo.com/1");
        let msg = err.to_string();
        assert!(msg.contains("vimeo.com"));
        assert!(msg.contains("Suggestion"));
        assert_eq!(err.platform(), None);
    }

    #[test]
    fn test_resolve_error_clone() {
        let err = ResolveError::cancelled("https://youtu.be/x");
        assert_eq!(err.to_string(), err.clone().to_string());
    }
}
