//! Twitter/X resolver backed by a mirror site that renders tweet videos as HTML.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};

use crate::config::DEFAULT_TWITTER_MIRROR_URL;
use crate::fetcher::Fetcher;

use super::utils::{compile_static_regex, compile_static_selector, first_capture_or_empty, host_of};
use super::{Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver};

static TWEET_ID_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"status/(\d+)"));
static VIDEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector("video[src]"));

/// Extracts the numeric tweet id from a tweet URL.
///
/// Returns an empty string when the URL has no `status/<digits>` segment.
#[must_use]
pub fn extract_tweet_id(url: &str) -> String {
    first_capture_or_empty(&TWEET_ID_RE, url)
}

/// Resolver for `twitter.com` and `x.com` URLs.
#[derive(Debug, Clone)]
pub struct TwitterResolver {
    fetcher: Fetcher,
    mirror_url: String,
}

impl TwitterResolver {
    /// Creates a resolver pointed at the default mirror site.
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_mirror_url(fetcher, DEFAULT_TWITTER_MIRROR_URL)
    }

    /// Creates a resolver with a custom mirror base URL.
    #[must_use]
    pub fn with_mirror_url(fetcher: Fetcher, mirror_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            mirror_url: mirror_url.into(),
        }
    }

    fn lookup_url(&self, tweet_id: &str) -> String {
        format!(
            "{}/info?url={}",
            self.mirror_url.trim_end_matches('/'),
            urlencoding::encode(tweet_id)
        )
    }
}

#[async_trait]
impl Resolver for TwitterResolver {
    fn name(&self) -> &'static str {
        "twitter"
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("twitter.com")
            || host_of(url).is_some_and(|host| host == "x.com" || host.ends_with(".x.com"))
    }

    #[tracing::instrument(skip(self, ctx), fields(resolver = "twitter"))]
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext,
    ) -> Result<ResolvedMedia, ResolveError> {
        let tweet_id = extract_tweet_id(url);
        if tweet_id.is_empty() {
            tracing::debug!("no tweet id in URL; querying mirror anyway");
        }

        ctx.ensure_active(url)?;
        let response = self
            .fetcher
            .get(&self.lookup_url(&tweet_id), HeaderMap::new())
            .await
            .map_err(|e| ResolveError::transport(Platform::Twitter, url, &e))?;
        ctx.ensure_active(url)?;

        if !response.is_success() {
            return Err(ResolveError::http_status(
                Platform::Twitter,
                url,
                response.status,
            ));
        }

        find_mp4_video_src(&response.body)
            .map(|src| ResolvedMedia::new(Platform::Twitter, src))
            .ok_or_else(|| {
                ResolveError::not_found(Platform::Twitter, url, "no <video> with an .mp4 source")
            })
    }
}

/// Returns the `src` of the first `<video>` pointing at an `.mp4` file.
fn find_mp4_video_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&VIDEO_SELECTOR)
        .filter_map(|element| element.value().attr("src"))
        .find(|src| is_mp4_source(src))
        .map(str::to_string)
}

/// True when the path part of `src` ends in `.mp4`, ignoring case, query and fragment.
fn is_mp4_source(src: &str) -> bool {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    path.to_ascii_lowercase().ends_with(".mp4")
}
