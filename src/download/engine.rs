//! Download engine: streams a direct media URL into a sink with throttled progress.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::DEFAULT_CHUNK_SIZE;
use super::error::DownloadError;
use super::progress::{DownloadEvent, ProgressThrottle};
use crate::config::HttpTimeouts;
use crate::fetcher::{ClientKind, FetchError, build_http_client};

/// Details of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Bytes written to the sink.
    pub bytes_written: u64,
    /// Declared `Content-Length`, when present and non-zero.
    pub content_length: Option<u64>,
    /// Destination file for [`DownloadEngine::download_to_file`].
    pub path: Option<PathBuf>,
}

/// Terminal result of one download.
#[derive(Debug)]
pub enum DownloadOutcome {
    Success(DownloadSummary),
    Failed {
        error: DownloadError,
        /// Bytes the sink accepted before the failure.
        bytes_written: u64,
    },
}

impl DownloadOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the error for failed outcomes.
    #[must_use]
    pub fn error(&self) -> Option<&DownloadError> {
        match self {
            Self::Success(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        match self {
            Self::Success(summary) => summary.bytes_written,
            Self::Failed { bytes_written, .. } => *bytes_written,
        }
    }
}

/// Streams HTTP bodies into caller-supplied destinations.
///
/// Create once and reuse; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: Client,
    chunk_size: usize,
}

impl DownloadEngine {
    /// Creates an engine with the given connect and idle-read timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] when the HTTP client cannot be built.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client("download", timeouts, ClientKind::Download)?,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Sets the largest slice written to the sink at once (minimum 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Downloads `url` into `sink`.
    ///
    /// `on_event` receives throttled [`DownloadEvent::Progress`] events and
    /// then exactly one [`DownloadEvent::Finished`]. A non-2xx response
    /// produces no progress events and no writes. The sink is flushed on
    /// success; it is never closed.
    #[instrument(skip(self, sink, on_event, cancel), fields(url = %url))]
    pub async fn download<W, F>(
        &self,
        url: &str,
        sink: &mut W,
        mut on_event: F,
        cancel: &CancellationToken,
    ) -> DownloadOutcome
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(DownloadEvent<'_>),
    {
        let mut bytes_written = 0;
        let result = self
            .stream_into(url, sink, &mut on_event, cancel, &mut bytes_written)
            .await;
        let outcome = into_outcome(result, bytes_written, None);
        log_outcome(&outcome);
        on_event(DownloadEvent::Finished(&outcome));
        outcome
    }

    /// Downloads `url` into a file at `path`.
    ///
    /// Bytes go to a sibling `<name>.part` file that replaces `path` only
    /// once the transfer succeeds, so a failure leaves any existing file at
    /// `path` untouched. On failure the `.part` file is removed before the
    /// `Finished` event fires.
    #[instrument(skip(self, on_event, cancel), fields(url = %url, path = %path.display()))]
    pub async fn download_to_file<F>(
        &self,
        url: &str,
        path: &Path,
        mut on_event: F,
        cancel: &CancellationToken,
    ) -> DownloadOutcome
    where
        F: FnMut(DownloadEvent<'_>),
    {
        let part_path = partial_path(path);
        let mut bytes_written = 0;
        let result = match File::create(&part_path).await {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                let streamed = self
                    .stream_into(url, &mut writer, &mut on_event, cancel, &mut bytes_written)
                    .await
                    .map_err(|error| error.with_path(path));
                drop(writer);
                let finished = match streamed {
                    Ok(total) => tokio::fs::rename(&part_path, path)
                        .await
                        .map(|()| total)
                        .map_err(|source| DownloadError::io(path, source)),
                    Err(error) => Err(error),
                };
                if finished.is_err() {
                    debug!(path = %part_path.display(), "cleaning up partial file after error");
                    if let Err(error) = tokio::fs::remove_file(&part_path).await {
                        warn!(path = %part_path.display(), %error, "could not remove partial file");
                    }
                }
                finished
            }
            Err(source) => Err(DownloadError::io(path, source)),
        };

        let outcome = into_outcome(result, bytes_written, Some(path));
        log_outcome(&outcome);
        on_event(DownloadEvent::Finished(&outcome));
        outcome
    }

    /// Copies the response body into `sink`, returning the declared length.
    async fn stream_into<W, F>(
        &self,
        url: &str,
        sink: &mut W,
        on_event: &mut F,
        cancel: &CancellationToken,
        bytes_written: &mut u64,
    ) -> Result<Option<u64>, DownloadError>
    where
        W: AsyncWrite + Unpin + ?Sized,
        F: FnMut(DownloadEvent<'_>),
    {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if cancel.is_cancelled() {
            return Err(DownloadError::cancelled(url));
        }

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
            sent = self.client.get(url).send() => {
                sent.map_err(|e| DownloadError::from_reqwest(url, e))?
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let total = response.content_length().filter(|length| *length > 0);
        debug!(?total, chunk_size = self.chunk_size, "response accepted; streaming body");

        let mut throttle = ProgressThrottle::new();
        for progress in throttle.observe(0, total, Instant::now()) {
            on_event(DownloadEvent::Progress(progress));
        }

        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(DownloadError::cancelled(url)),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk.map_err(|e| DownloadError::from_reqwest(url, e))?;

            for piece in chunk.chunks(self.chunk_size) {
                if cancel.is_cancelled() {
                    return Err(DownloadError::cancelled(url));
                }
                sink.write_all(piece).await.map_err(DownloadError::sink)?;
                *bytes_written += piece.len() as u64;
                for progress in throttle.observe(*bytes_written, total, Instant::now()) {
                    on_event(DownloadEvent::Progress(progress));
                }
            }
        }

        sink.flush().await.map_err(DownloadError::sink)?;

        if let Some(expected) = total.filter(|expected| *bytes_written < *expected) {
            return Err(DownloadError::incomplete(url, expected, *bytes_written));
        }
        Ok(total)
    }
}

/// `dir/video.mp4` becomes `dir/video.mp4.part`.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn into_outcome(
    result: Result<Option<u64>, DownloadError>,
    bytes_written: u64,
    path: Option<&Path>,
) -> DownloadOutcome {
    match result {
        Ok(content_length) => DownloadOutcome::Success(DownloadSummary {
            bytes_written,
            content_length,
            path: path.map(Path::to_path_buf),
        }),
        Err(error) => DownloadOutcome::Failed {
            error,
            bytes_written,
        },
    }
}

fn log_outcome(outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Success(summary) => info!(
            bytes = summary.bytes_written,
            content_length = ?summary.content_length,
            "download complete"
        ),
        DownloadOutcome::Failed {
            error,
            bytes_written,
        } => warn!(bytes_written, error = %error, "download failed"),
    }
}
