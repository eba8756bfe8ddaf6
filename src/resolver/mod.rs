//! URL resolution pipeline for turning social media page URLs into direct media URLs.
//!
//! # Architecture
//!
//! - [`Resolver`] - Async trait each platform adapter implements
//! - [`ResolverDispatcher`] - Ordered resolver list; first `can_handle` match wins
//! - [`YouTubeResolver`] - Resolution API call (JSON)
//! - [`TwitterResolver`] - Mirror site scrape (`<video src=...mp4>`)
//! - [`InstagramResolver`] - Mirror site scrape (`.downloads a[download]`)
//! - [`FacebookResolver`] - Inline JSON scan of the page itself, `og:video` fallback
//!
//! Every adapter keeps its selectors and regexes private to its own file, so
//! a markup change on one site touches one file.
//!
//! # Example
//!
//! ```no_run
//! use fetchit_core::FetchConfig;
//! use fetchit_core::resolver::{ResolveContext, build_default_dispatcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = build_default_dispatcher(&FetchConfig::default())?;
//! let media = dispatcher
//!     .try_resolve("https://twitter.com/user/status/1234567890", &ResolveContext::default())
//!     .await?;
//! println!("Direct URL: {}", media.direct_url);
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod error;
mod facebook;
mod instagram;
mod twitter;
mod utils;
mod youtube;

pub use dispatcher::ResolverDispatcher;
pub use error::ResolveError;
pub use facebook::FacebookResolver;
pub use instagram::{InstagramResolver, extract_shortcode};
pub use twitter::{TwitterResolver, extract_tweet_id};
pub use youtube::YouTubeResolver;

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::FetchConfig;
use crate::fetcher::{FetchError, Fetcher};

/// Builds the dispatcher used by the pipeline and CLI.
///
/// Registration order is the classification order: YouTube, Twitter,
/// Instagram, Facebook. All four share one [`Fetcher`].
///
/// # Errors
///
/// Returns [`FetchError`] when the shared HTTP client or the Facebook
/// header set cannot be built.
pub fn build_default_dispatcher(config: &FetchConfig) -> Result<ResolverDispatcher, FetchError> {
    let fetcher = Fetcher::new(config.resolver_timeouts)?;
    let endpoints = &config.endpoints;

    let mut dispatcher = ResolverDispatcher::new(config.unknown_platform);
    dispatcher.register(Box::new(YouTubeResolver::with_api_url(
        fetcher.clone(),
        &endpoints.youtube_api_url,
    )));
    dispatcher.register(Box::new(TwitterResolver::with_mirror_url(
        fetcher.clone(),
        &endpoints.twitter_mirror_url,
    )));
    dispatcher.register(Box::new(InstagramResolver::with_mirror_url(
        fetcher.clone(),
        &endpoints.instagram_mirror_url,
    )));
    dispatcher.register(Box::new(FacebookResolver::with_headers(
        fetcher,
        &config.facebook_headers,
    )?));
    Ok(dispatcher)
}

/// Source platform of a page URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    YouTube,
    Twitter,
    Instagram,
    Facebook,
}

impl Platform {
    /// Returns the stable lowercase label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Twitter => "twitter",
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A direct media URL produced by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    /// URL serving the raw video bytes.
    pub direct_url: String,
    /// Platform whose resolver produced the URL.
    pub platform: Platform,
    /// Page title when the adapter could read one.
    pub title: Option<String>,
}

impl ResolvedMedia {
    #[must_use]
    pub fn new(platform: Platform, direct_url: impl Into<String>) -> Self {
        Self {
            direct_url: direct_url.into(),
            platform,
            title: None,
        }
    }

    /// Attaches a page title.
    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// Per-call context passed to resolvers.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// Checked before and after the resolver's network call.
    pub cancel: CancellationToken,
}

impl ResolveContext {
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Returns `Cancelled` if the token has fired.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Cancelled`] once cancellation was requested.
    pub fn ensure_active(&self, input: &str) -> Result<(), ResolveError> {
        if self.cancel.is_cancelled() {
            Err(ResolveError::cancelled(input))
        } else {
            Ok(())
        }
    }
}

/// A platform adapter converting a page URL into a direct media URL.
///
/// Uses `async_trait` so resolvers can be held as `Box<dyn Resolver>` by the
/// dispatcher.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Returns the resolver's name (e.g. "youtube").
    fn name(&self) -> &str;

    /// Returns the platform this resolver serves.
    fn platform(&self) -> Platform;

    /// Returns true if the raw URL belongs to this resolver's platform.
    fn can_handle(&self, url: &str) -> bool;

    /// Resolves the page URL into a direct media URL.
    async fn resolve(&self, url: &str, ctx: &ResolveContext)
    -> Result<ResolvedMedia, ResolveError>;
}
