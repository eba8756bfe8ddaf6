//! Facebook resolver that reads the video page itself.
//!
//! Facebook pages embed player configuration as inline JSON. The resolver
//! scans the raw body for `browser_native_hd_url` / `browser_native_sd_url`
//! and prefers HD. When neither is present, the `og:video:url` meta tag is
//! tried as a weaker second source.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use tracing::debug;

use crate::config::default_facebook_headers;
use crate::fetcher::{FetchError, Fetcher};

use super::utils::{
    compile_static_regex, compile_static_selector, header_map_from_pairs, non_empty,
    unescape_json_fragment,
};
use super::{Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver};

static HD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#""browser_native_hd_url":"([^"]+)""#));
static SD_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r#""browser_native_sd_url":"([^"]+)""#));
static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("title"));
static OG_VIDEO_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(r#"meta[property="og:video:url"]"#));

/// Resolver for `facebook.com` video pages.
#[derive(Debug, Clone)]
pub struct FacebookResolver {
    fetcher: Fetcher,
    headers: HeaderMap,
}

impl FacebookResolver {
    /// Creates a resolver sending the default desktop-browser header set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if a default header is malformed.
    pub fn new(fetcher: Fetcher) -> Result<Self, FetchError> {
        Self::with_headers(fetcher, &default_facebook_headers())
    }

    /// Creates a resolver sending a custom header set.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] naming the first invalid header.
    pub fn with_headers(fetcher: Fetcher, headers: &[(String, String)]) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher,
            headers: header_map_from_pairs("facebook", headers)?,
        })
    }
}

#[async_trait]
impl Resolver for FacebookResolver {
    fn name(&self) -> &'static str {
        "facebook"
    }

    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("facebook.com")
    }

    #[tracing::instrument(skip(self, ctx), fields(resolver = "facebook"))]
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext,
    ) -> Result<ResolvedMedia, ResolveError> {
        ctx.ensure_active(url)?;
        let response = self
            .fetcher
            .get(url, self.headers.clone())
            .await
            .map_err(|e| ResolveError::transport(Platform::Facebook, url, &e))?;
        ctx.ensure_active(url)?;

        if !response.is_success() {
            return Err(ResolveError::http_status(
                Platform::Facebook,
                url,
                response.status,
            ));
        }
        if response.body.trim().is_empty() {
            return Err(ResolveError::not_found(
                Platform::Facebook,
                url,
                "empty page body",
            ));
        }

        let (og_video_url, title) = read_page_markup(&response.body);
        let Some(direct_url) = extract_inline_video_url(&response.body).or(og_video_url) else {
            return Err(ResolveError::not_found(
                Platform::Facebook,
                url,
                "no video URL in page",
            ));
        };

        Ok(ResolvedMedia::new(Platform::Facebook, direct_url).with_title(title))
    }
}

/// Returns the HD inline URL, else the SD one, JSON-unescaped.
fn extract_inline_video_url(body: &str) -> Option<String> {
    let capture = |regex: &Regex| {
        regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .and_then(|raw| {
                let decoded = unescape_json_fragment(raw.as_str());
                if decoded.is_none() {
                    debug!(raw = raw.as_str(), "inline video URL is not valid JSON text");
                }
                decoded
            })
            .filter(|value| !value.is_empty())
    };
    capture(&HD_URL_RE).or_else(|| capture(&SD_URL_RE))
}

/// Parses the page once for the `og:video:url` meta content and the `<title>` text.
fn read_page_markup(body: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(body);
    (extract_og_video_url(&document), extract_title(&document))
}

fn extract_og_video_url(document: &Html) -> Option<String> {
    document
        .select(&OG_VIDEO_SELECTOR)
        .find_map(|element| non_empty(element.value().attr("content")))
}

/// First `<title>` text with entities decoded.
fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .and_then(|element| non_empty(Some(element.text().collect::<String>().as_str())))
}
