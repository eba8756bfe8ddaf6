//! Single-request HTTP fetcher shared by the platform resolvers.
//!
//! A [`Fetcher`] issues one GET or POST, reads the whole body as text and
//! hands back a [`FetchResult`]. It never interprets the status code; each
//! resolver decides what a non-2xx response means for its platform.
//!
//! Client construction policy (timeouts, user-agent, proxy fallback) lives
//! here too so the download engine builds its client the same way.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::HttpTimeouts;
use crate::user_agent::default_user_agent;

/// Errors produced while performing a single HTTP exchange.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request URL could not be turned into a request.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// Connect or read deadline elapsed.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// DNS, connection, TLS or body read failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client construction failed for {purpose}: {reason}")]
    Client {
        /// Which component asked for the client.
        purpose: String,
        /// Why construction failed.
        reason: String,
    },
}

impl FetchError {
    /// Maps a reqwest error into the matching variant.
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

    /// Creates a client construction error.
    pub fn client(purpose: &str, reason: impl Into<String>) -> Self {
        Self::Client {
            purpose: purpose.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw outcome of one HTTP call.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// HTTP status code.
    pub status: u16,
    /// Full response body decoded as text.
    pub body: String,
    /// Response headers with lowercase names; non-UTF-8 values are dropped.
    pub headers: HashMap<String, String>,
}

impl FetchResult {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up a response header by (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Performs single GET/POST requests and returns the body as text.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with the given timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the HTTP client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client("fetcher", timeouts, ClientKind::Resolver)?,
        })
    }

    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure. Non-2xx statuses are not errors.
    #[tracing::instrument(level = "debug", skip(self, headers))]
    pub async fn get(&self, url: &str, headers: HeaderMap) -> Result<FetchResult, FetchError> {
        self.execute(url, self.client.get(url).headers(headers))
            .await
    }

    /// Issues a POST request with a raw body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure. Non-2xx statuses are not errors.
    #[tracing::instrument(level = "debug", skip(self, headers, body))]
    pub async fn post(
        &self,
        url: &str,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Result<FetchResult, FetchError> {
        self.execute(url, self.client.post(url).headers(headers).body(body))
            .await
    }

    async fn execute(&self, url: &str, request: RequestBuilder) -> Result<FetchResult, FetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        debug!(status, body_len = body.len(), "fetch complete");
        Ok(FetchResult {
            status,
            body,
            headers,
        })
    }
}

/// Which timeout semantics a client gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClientKind {
    /// Whole request bounded by the read timeout; compressed bodies accepted.
    Resolver,
    /// Only idle reads bounded, so long transfers are not cut off; no
    /// compression so `Content-Length` reflects the media size.
    Download,
}

/// Builds an HTTP client using the shared project policy.
///
/// Some sandboxed environments panic while reading system proxy settings;
/// in that case the build is retried with system lookup disabled and only
/// the proxy environment variables applied.
///
/// # Errors
///
/// Returns [`FetchError::Client`] when client construction fails.
pub(crate) fn build_http_client(
    purpose: &str,
    timeouts: HttpTimeouts,
    kind: ClientKind,
) -> Result<Client, FetchError> {
    match try_build_client(timeouts, kind, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            warn!(
                purpose,
                "HTTP client hit system proxy panic; using env-proxy fallback builder"
            );
            match try_build_client(timeouts, kind, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Panic) => Err(FetchError::client(
                    purpose,
                    "client builder panicked while initializing networking",
                )),
                Err(BuildClientFailure::Build(error)) => {
                    Err(FetchError::client(purpose, error.to_string()))
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(FetchError::client(purpose, error.to_string())),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    kind: ClientKind,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts, kind);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts, kind: ClientKind) -> ClientBuilder {
    let builder = Client::builder()
        .connect_timeout(timeouts.connect())
        .user_agent(default_user_agent());
    match kind {
        ClientKind::Resolver => builder.timeout(timeouts.read()).gzip(true),
        ClientKind::Download => builder.read_timeout(timeouts.read()).gzip(false),
    }
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    for (scheme, names) in [
        ("https", ["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        ("http", ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
    ] {
        let Some(proxy) = first_env_value(&names) else {
            continue;
        };
        let resolved = if scheme == "https" {
            Proxy::https(&proxy)
        } else {
            Proxy::http(&proxy)
        };
        if let Ok(resolved) = resolved {
            builder = builder.proxy(resolved);
        }
    }
    builder
}

fn first_env_value(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
