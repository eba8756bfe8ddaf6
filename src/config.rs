//! Runtime configuration for resolvers and the download engine.
//!
//! Third-party endpoints and header sets change without notice, so every
//! value a platform adapter depends on is carried here instead of being
//! hardcoded at the call site.

use std::time::Duration;

use crate::download::DEFAULT_CHUNK_SIZE;
use crate::user_agent::BROWSER_USER_AGENT;

/// Default YouTube resolution API endpoint.
pub const DEFAULT_YOUTUBE_API_URL: &str = "https://api.cobalt.tools/api/json";

/// Default Twitter/X mirror site base URL.
pub const DEFAULT_TWITTER_MIRROR_URL: &str = "https://twitsave.com";

/// Default Instagram mirror site base URL.
pub const DEFAULT_INSTAGRAM_MIRROR_URL: &str = "https://imginn.com";

/// Default connect timeout for every outbound call.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout for every outbound call.
pub const READ_TIMEOUT_SECS: u64 = 30;

/// Base URLs of the third-party services used by the platform resolvers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// JSON API that turns a YouTube page URL into a media URL.
    pub youtube_api_url: String,
    /// Mirror site queried with a tweet id.
    pub twitter_mirror_url: String,
    /// Mirror site queried with an Instagram shortcode.
    pub instagram_mirror_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube_api_url: DEFAULT_YOUTUBE_API_URL.to_string(),
            twitter_mirror_url: DEFAULT_TWITTER_MIRROR_URL.to_string(),
            instagram_mirror_url: DEFAULT_INSTAGRAM_MIRROR_URL.to_string(),
        }
    }
}

/// Connect and read timeouts for an HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

impl HttpTimeouts {
    #[must_use]
    pub fn new(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect_secs,
            read_secs,
        }
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self::new(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }
}

/// What the dispatcher does with a URL no platform resolver recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPlatformPolicy {
    /// Send unrecognized URLs to the YouTube resolver.
    #[default]
    FallbackToYouTube,
    /// Refuse unrecognized URLs with `ResolveError::UnsupportedPlatform`.
    Reject,
}

impl UnknownPlatformPolicy {
    /// Returns the stable config label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FallbackToYouTube => "youtube",
            Self::Reject => "reject",
        }
    }

    /// Parses a config label (`"youtube"` or `"reject"`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "youtube" => Some(Self::FallbackToYouTube),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Header set sent with Facebook page requests.
///
/// Mirrors what a desktop Chrome sends on a top-level navigation; Facebook
/// serves a login wall to clients that look automated.
#[must_use]
pub fn default_facebook_headers() -> Vec<(String, String)> {
    [
        ("sec-fetch-user", "?1"),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("cache-control", "max-age=0"),
        ("authority", "www.facebook.com"),
        ("upgrade-insecure-requests", "1"),
        (
            "accept-language",
            "en-GB,en;q=0.9,tr-TR;q=0.8,tr;q=0.7,en-US;q=0.6",
        ),
        (
            "sec-ch-ua",
            "\"Google Chrome\";v=\"89\", \"Chromium\";v=\"89\", \";Not A Brand\";v=\"99\"",
        ),
        ("user-agent", BROWSER_USER_AGENT),
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9",
        ),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Complete configuration for a resolve-then-download pipeline.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoints: Endpoints,
    /// Timeouts for resolver requests (applied as connect + total request timeout).
    pub resolver_timeouts: HttpTimeouts,
    /// Timeouts for media downloads (applied as connect + per-read idle timeout).
    pub download_timeouts: HttpTimeouts,
    /// Bytes written to the destination per chunk.
    pub chunk_size: usize,
    pub unknown_platform: UnknownPlatformPolicy,
    pub facebook_headers: Vec<(String, String)>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            resolver_timeouts: HttpTimeouts::default(),
            download_timeouts: HttpTimeouts::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            unknown_platform: UnknownPlatformPolicy::default(),
            facebook_headers: default_facebook_headers(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_defaults_match_published_endpoints() {
        let config = FetchConfig::default();
        assert_eq!(config.endpoints.youtube_api_url, "https://api.cobalt.tools/api/json");
        assert_eq!(config.endpoints.twitter_mirror_url, "https://twitsave.com");
        assert_eq!(config.endpoints.instagram_mirror_url, "https://imginn.com");
        assert_eq!(config.resolver_timeouts, HttpTimeouts::new(30, 30));
        assert_eq!(config.download_timeouts, HttpTimeouts::new(30, 30));
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(
            config.unknown_platform,
            UnknownPlatformPolicy::FallbackToYouTube
        );
    }

    #[test]
    fn test_unknown_platform_policy_labels_round_trip() {
        for policy in [
            UnknownPlatformPolicy::FallbackToYouTube,
            UnknownPlatformPolicy::Reject,
        ] {
            assert_eq!(UnknownPlatformPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(
            UnknownPlatformPolicy::parse(" Reject "),
            Some(UnknownPlatformPolicy::Reject)
        );
        assert_eq!(UnknownPlatformPolicy::parse("vimeo"), None);
    }

    #[test]
    fn test_default_facebook_headers_include_browser_hints() {
        let headers = default_facebook_headers();
        let get = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(get("user-agent"), Some(BROWSER_USER_AGENT));
        assert_eq!(get("sec-fetch-mode"), Some("navigate"));
        assert!(get("accept-language").is_some());
        assert!(get("cache-control").is_some());
    }

    #[test]
    fn test_http_timeouts_durations() {
        let timeouts = HttpTimeouts::new(5, 60);
        assert_eq!(timeouts.connect(), Duration::from_secs(5));
        assert_eq!(timeouts.read(), Duration::from_secs(60));
    }
}
