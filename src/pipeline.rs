//! Resolve-then-download flow used by the CLI and library callers.
//!
//! A [`Pipeline`] owns one [`ResolverDispatcher`] and one [`DownloadEngine`].
//! Resolution failures short-circuit: no download events fire and nothing is
//! written to the destination.

use std::path::Path;

use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::config::FetchConfig;
use crate::download::{DownloadEngine, DownloadError, DownloadEvent, DownloadOutcome, DownloadSummary};
use crate::fetcher::FetchError;
use crate::resolver::{
    ResolveContext, ResolveError, ResolvedMedia, ResolverDispatcher, build_default_dispatcher,
};

/// Message shown when a page could not be turned into a media URL.
pub const MSG_RESOLVE_FAILED: &str = "could not retrieve video URL";
/// Message shown when the media host answered with an error status.
pub const MSG_DOWNLOAD_FAILED: &str = "download failed";
/// Message shown on success.
pub const MSG_DOWNLOAD_COMPLETE: &str = "download complete";

/// Result of one resolve-and-download call.
#[derive(Debug)]
pub enum FetchOutcome {
    Downloaded {
        media: ResolvedMedia,
        summary: DownloadSummary,
    },
    ResolutionFailed(ResolveError),
    DownloadFailed {
        media: ResolvedMedia,
        error: DownloadError,
        bytes_written: u64,
    },
}

impl FetchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded { .. })
    }

    /// One-line message suitable for showing to an end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Downloaded { .. } => MSG_DOWNLOAD_COMPLETE.to_string(),
            Self::ResolutionFailed(ResolveError::Cancelled { .. }) => "cancelled".to_string(),
            Self::ResolutionFailed(_) => MSG_RESOLVE_FAILED.to_string(),
            Self::DownloadFailed {
                error: DownloadError::HttpStatus { .. },
                ..
            } => MSG_DOWNLOAD_FAILED.to_string(),
            Self::DownloadFailed { error, .. } => {
                format!("download error: {}", error.short_reason())
            }
        }
    }

    fn from_download(media: ResolvedMedia, outcome: DownloadOutcome) -> Self {
        match outcome {
            DownloadOutcome::Success(summary) => Self::Downloaded { media, summary },
            DownloadOutcome::Failed {
                error,
                bytes_written,
            } => Self::DownloadFailed {
                media,
                error,
                bytes_written,
            },
        }
    }
}

/// Dispatcher plus download engine.
#[derive(Debug)]
pub struct Pipeline {
    dispatcher: ResolverDispatcher,
    engine: DownloadEngine,
}

impl Pipeline {
    /// Builds the default four-platform dispatcher and a download engine.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when an HTTP client or the Facebook header set
    /// cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let dispatcher = build_default_dispatcher(config)?;
        let engine =
            DownloadEngine::new(config.download_timeouts)?.with_chunk_size(config.chunk_size);
        Ok(Self::from_parts(dispatcher, engine))
    }

    #[must_use]
    pub fn from_parts(dispatcher: ResolverDispatcher, engine: DownloadEngine) -> Self {
        Self { dispatcher, engine }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &ResolverDispatcher {
        &self.dispatcher
    }

    /// Resolves without downloading.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ResolveError`].
    pub async fn resolve(
        &self,
        source_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolvedMedia, ResolveError> {
        self.dispatcher
            .try_resolve(source_url, &ResolveContext::new(cancel.clone()))
            .await
    }

    /// Resolves `source_url` and streams the media into `sink`.
    #[instrument(skip(self, sink, on_event, cancel))]
    pub async fn resolve_and_download<W, F>(
        &self,
        source_url: &str,
        sink: &mut W,
        on_event: F,
        cancel: &CancellationToken,
    ) -> FetchOutcome
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(DownloadEvent<'_>),
    {
        let media = match self.resolve(source_url, cancel).await {
            Ok(media) => media,
            Err(error) => return FetchOutcome::ResolutionFailed(error),
        };
        info!(platform = %media.platform, "downloading resolved media");
        let outcome = self
            .engine
            .download(&media.direct_url, sink, on_event, cancel)
            .await;
        FetchOutcome::from_download(media, outcome)
    }

    /// Resolves `source_url` and saves the media at `path`.
    ///
    /// The file is only created once resolution succeeds.
    #[instrument(skip(self, on_event, cancel), fields(path = %path.display()))]
    pub async fn resolve_and_download_to_file<F>(
        &self,
        source_url: &str,
        path: &Path,
        on_event: F,
        cancel: &CancellationToken,
    ) -> FetchOutcome
    where
        F: FnMut(DownloadEvent<'_>),
    {
        let media = match self.resolve(source_url, cancel).await {
            Ok(media) => media,
            Err(error) => return FetchOutcome::ResolutionFailed(error),
        };
        let outcome = self
            .engine
            .download_to_file(&media.direct_url, path, on_event, cancel)
            .await;
        FetchOutcome::from_download(media, outcome)
    }
}
