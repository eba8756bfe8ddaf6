//! YouTube resolver backed by a third-party resolution API.
//!
//! The API takes `{"url": "<page url>"}` and answers with a JSON object whose
//! `url` field is the direct media link. Error answers carry `status` and
//! `text` instead, which are logged but otherwise treated as "not found".

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_YOUTUBE_API_URL;
use crate::fetcher::Fetcher;

use super::{Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver};

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Resolver for `youtube.com` and `youtu.be` URLs.
#[derive(Debug, Clone)]
pub struct YouTubeResolver {
    fetcher: Fetcher,
    api_url: String,
}

impl YouTubeResolver {
    /// Creates a resolver pointed at the default resolution API.
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self::with_api_url(fetcher, DEFAULT_YOUTUBE_API_URL)
    }

    /// Creates a resolver with a custom API endpoint.
    #[must_use]
    pub fn with_api_url(fetcher: Fetcher, api_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl Resolver for YouTubeResolver {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn can_handle(&self, url: &str) -> bool {
        url.contains("youtube.com") || url.contains("youtu.be")
    }

    #[tracing::instrument(skip(self, ctx), fields(resolver = "youtube"))]
    async fn resolve(
        &self,
        url: &str,
        ctx: &ResolveContext,
    ) -> Result<ResolvedMedia, ResolveError> {
        let body = serde_json::to_vec(&ApiRequest { url })
            .map_err(|e| ResolveError::parse(Platform::YouTube, url, e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        ctx.ensure_active(url)?;
        let response = self
            .fetcher
            .post(&self.api_url, headers, body)
            .await
            .map_err(|e| ResolveError::transport(Platform::YouTube, url, &e))?;
        ctx.ensure_active(url)?;

        if !response.is_success() {
            return Err(ResolveError::http_status(
                Platform::YouTube,
                url,
                response.status,
            ));
        }

        let direct_url = extract_media_url(&response.body, url)?;
        Ok(ResolvedMedia::new(Platform::YouTube, direct_url))
    }
}

/// Reads the `url` field of an API answer; empty or missing means not found.
fn extract_media_url(body: &str, input: &str) -> Result<String, ResolveError> {
    let parsed: ApiResponse = serde_json::from_str(body)
        .map_err(|e| ResolveError::parse(Platform::YouTube, input, e.to_string()))?;

    match parsed.url.filter(|value| !value.is_empty()) {
        Some(direct_url) => Ok(direct_url),
        None => {
            debug!(
                status = parsed.status.as_deref().unwrap_or(""),
                text = parsed.text.as_deref().unwrap_or(""),
                "API answered without a media URL"
            );
            Err(ResolveError::not_found(
                Platform::YouTube,
                input,
                "API response has no url field",
            ))
        }
    }
}
