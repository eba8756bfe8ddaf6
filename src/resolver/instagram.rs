//! Instagram resolver backed by a mirror site listing download links for a post.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};

use crate::config::DEFAULT_INSTAGRAM_MIRROR_URL;
use crate::fetcher::Fetcher;

use super::utils::{compile_static_regex, compile_static_selector, first_capture_or_empty, non_empty};
use super::{Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver};

static SHORTCODE_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"instagram\.com/(?:p|reel|tv)/([^/?]+)"));
static DOWNLOAD_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".downloads a[download]"));

/// Extracts the post shortcode from `/p/`, `/reel/` or `/tv/` URLs.
///
/// Returns an empty string when no shortcode is present.
#[must_use]
pub fn extract_shortcode(url: &str) -> String {
    first_capture_or_empty(&SHORTCODE_RE, url)
}

/// Resolver for `instagram.com` URLs.
#[derive(Debug, Clone)]
pub struct InstagramResolver {
    fetcher: Fetcher,
    mirror_url: String,
}

impl InstagramResolver {
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_mirror_url(fetcher, DEFAULT_INSTAGRAM_MIRROR_URL)
    }

    /// Creates a resolver with a custom mirror base URL.
    #[must_use]
    pub fn with_mirror_url(fetcher: Fetcher, mirror_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            mirror_url: mirror_url.into(),
        }
    }

    fn post_page_url(&self, shortcode: &str) -> String {
        format!(
            "{}/p/{}/",
            self.mirror_url.trim_end_matches('/'),
            urlencoding::encode(shortcode)
        )
    }
}

#[async_trait]
impl Resolver for InstagramResolver {
    fn name(&self) -> &'static str {
        "instagram"
    }

    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("instagram.com")
    }

    #[tracing::instrument(skip(self, ctx), fields(resolver = "instagram"))]
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext,
    ) -> Result<ResolvedMedia, ResolveError> {
        let shortcode = extract_shortcode(url);
        if shortcode.is_empty() {
            return Err(ResolveError::not_found(
                Platform::Instagram,
                url,
                "no post shortcode in URL",
            ));
        }

        ctx.ensure_active(url)?;
        let response = self
            .fetcher
            .get(&self.post_page_url(&shortcode), HeaderMap::new())
            .await
            .map_err(|e| ResolveError::transport(Platform::Instagram, url, &e))?;
        ctx.ensure_active(url)?;

        if !response.is_success() {
            return Err(ResolveError::http_status(
                Platform::Instagram,
                url,
                response.status,
            ));
        }

        find_download_href(&response.body)
            .map(|href| ResolvedMedia::new(Platform::Instagram, href))
            .ok_or_else(|| {
                ResolveError::not_found(Platform::Instagram, url, "no download link on mirror page")
            })
    }
}

fn find_download_href(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&DOWNLOAD_LINK_SELECTOR)
        .find_map(|element| non_empty(element.value().attr("href")))
}
