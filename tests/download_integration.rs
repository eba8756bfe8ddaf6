//! Integration tests for the download engine.
//!
//! These tests verify streaming, progress throttling and failure handling
//! against mock HTTP servers.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use fetchit_core::config::HttpTimeouts;
use fetchit_core::download::{DownloadEngine, DownloadError, DownloadEvent, DownloadOutcome};
use tempfile::TempDir;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// What the callback saw, in order.
#[derive(Debug, Default)]
struct EventLog {
    percents: Vec<u8>,
    finished: usize,
    progress_after_finish: bool,
}

impl EventLog {
    fn record(&mut self, event: DownloadEvent<'_>) {
        match event {
            DownloadEvent::Progress(progress) => {
                if self.finished > 0 {
                    self.progress_after_finish = true;
                }
                self.percents.push(progress.percent);
            }
            DownloadEvent::Finished(_) => self.finished += 1,
        }
    }
}

/// Sink that records the size of every write it accepts.
#[derive(Debug, Default)]
struct RecordingSink {
    data: Vec<u8>,
    write_sizes: Vec<usize>,
    cancel_after_first_write: Option<CancellationToken>,
    fail_writes: bool,
}

impl AsyncWrite for RecordingSink {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.fail_writes {
            return Poll::Ready(Err(io::Error::other("sink closed")));
        }
        self.data.extend_from_slice(buf);
        self.write_sizes.push(buf.len());
        if let Some(token) = &self.cancel_after_first_write {
            token.cancel();
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn engine() -> DownloadEngine {
    DownloadEngine::new(HttpTimeouts::new(5, 5)).expect("engine should build")
}

fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn mount_body(server: &MockServer, route: &str, content: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_download_streams_body_in_chunks_with_band_progress() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = body(100_003);
    mount_body(&server, "/video.mp4", content.clone()).await;

    let mut sink = RecordingSink::default();
    let mut log = EventLog::default();
    let outcome = engine()
        .download(
            &format!("{}/video.mp4", server.uri()),
            &mut sink,
            |event| log.record(event),
            &CancellationToken::new(),
        )
        .await;

    let DownloadOutcome::Success(summary) = &outcome else {
        panic!("download should succeed: {outcome:?}");
    };
    assert_eq!(summary.bytes_written, 100_003);
    assert_eq!(summary.content_length, Some(100_003));
    assert_eq!(sink.data, content);
    assert!(
        sink.write_sizes.iter().all(|size| *size <= 4096),
        "writes larger than a chunk: {:?}",
        sink.write_sizes
    );

    let expected: Vec<u8> = (0..=100).step_by(5).collect();
    assert_eq!(log.percents, expected);
    assert_eq!(log.finished, 1);
    assert!(!log.progress_after_finish);
}

#[tokio::test]
async fn test_download_custom_chunk_size_bounds_writes() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/clip.mp4", body(10_000)).await;

    let mut sink = RecordingSink::default();
    let outcome = engine()
        .with_chunk_size(1000)
        .download(
            &format!("{}/clip.mp4", server.uri()),
            &mut sink,
            |_| {},
            &CancellationToken::new(),
        )
        .await;

    assert!(outcome.is_success());
    assert!(sink.write_sizes.iter().all(|size| *size <= 1000));
    assert!(sink.write_sizes.len() >= 10);
}

#[tokio::test]
async fn test_download_small_body_jumps_straight_to_hundred() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/tiny.mp4", b"tiny".to_vec()).await;

    let mut sink = RecordingSink::default();
    let mut log = EventLog::default();
    let outcome = engine()
        .download(
            &format!("{}/tiny.mp4", server.uri()),
            &mut sink,
            |event| log.record(event),
            &CancellationToken::new(),
        )
        .await;

    assert!(outcome.is_success());
    // Every band still fires once, in order, even when one chunk covers them all.
    let expected: Vec<u8> = (0..=100).step_by(5).collect();
    assert_eq!(log.percents, expected);
    assert!(log.percents.iter().all(|percent| percent % 5 == 0));
}

#[tokio::test]
async fn test_download_non_success_status_writes_nothing() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/forbidden.mp4"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let mut sink = RecordingSink::default();
    let mut log = EventLog::default();
    let outcome = engine()
        .download(
            &format!("{}/forbidden.mp4", server.uri()),
            &mut sink,
            |event| log.record(event),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        outcome,
        DownloadOutcome::Failed {
            error: DownloadError::HttpStatus { status: 403, .. },
            bytes_written: 0
        }
    ));
    assert!(log.percents.is_empty(), "no progress expected: {:?}", log.percents);
    assert_eq!(log.finished, 1);
    assert!(sink.write_sizes.is_empty());
}

#[tokio::test]
async fn test_download_sink_failure_is_reported() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/video.mp4", body(8192)).await;

    let mut sink = RecordingSink {
        fail_writes: true,
        ..RecordingSink::default()
    };
    let outcome = engine()
        .download(
            &format!("{}/video.mp4", server.uri()),
            &mut sink,
            |_| {},
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(outcome.error(), Some(DownloadError::Sink { .. })));
    assert_eq!(outcome.bytes_written(), 0);
}

#[tokio::test]
async fn test_download_cancelled_between_chunks() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/long.mp4", body(64 * 1024)).await;

    let cancel = CancellationToken::new();
    let mut sink = RecordingSink {
        cancel_after_first_write: Some(cancel.clone()),
        ..RecordingSink::default()
    };
    let mut log = EventLog::default();
    let outcome = engine()
        .download(
            &format!("{}/long.mp4", server.uri()),
            &mut sink,
            |event| log.record(event),
            &cancel,
        )
        .await;

    assert!(matches!(outcome.error(), Some(DownloadError::Cancelled { .. })));
    assert_eq!(sink.write_sizes.len(), 1);
    assert_eq!(outcome.bytes_written(), sink.data.len() as u64);
    assert_eq!(log.finished, 1);
}

#[tokio::test]
async fn test_download_to_file_preserves_content() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let content = body(20_000);
    mount_body(&server, "/video.mp4", content.clone()).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("video.mp4");

    let outcome = engine()
        .download_to_file(
            &format!("{}/video.mp4", server.uri()),
            &target,
            |_| {},
            &CancellationToken::new(),
        )
        .await;

    let DownloadOutcome::Success(summary) = &outcome else {
        panic!("download should succeed: {outcome:?}");
    };
    assert_eq!(summary.path.as_deref(), Some(target.as_path()));
    assert_eq!(std::fs::read(&target).expect("should read file"), content);
}

#[tokio::test]
async fn test_download_to_file_removes_file_on_http_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("video.mp4");

    let mut file_existed_at_finish = None;
    let outcome = engine()
        .download_to_file(
            &format!("{}/broken.mp4", server.uri()),
            &target,
            |event| {
                if let DownloadEvent::Finished(_) = event {
                    file_existed_at_finish = Some(target.exists());
                }
            },
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        outcome.error(),
        Some(DownloadError::HttpStatus { status: 500, .. })
    ));
    assert!(!target.exists(), "partial file should be removed");
    assert_eq!(file_existed_at_finish, Some(false));
}

#[tokio::test]
async fn test_failed_download_keeps_existing_file_at_target() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("keep.mp4");
    std::fs::write(&target, b"earlier download").expect("should seed file");

    let outcome = engine()
        .download_to_file(
            &format!("{}/missing.mp4", server.uri()),
            &target,
            |_| {},
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(
        outcome.error(),
        Some(DownloadError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(
        std::fs::read(&target).expect("existing file should survive"),
        b"earlier download"
    );
    assert!(!temp_dir.path().join("keep.mp4.part").exists());
}

#[tokio::test]
async fn test_successful_download_replaces_existing_file() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/fresh.mp4", b"fresh bytes".to_vec()).await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let target = temp_dir.path().join("clip.mp4");
    std::fs::write(&target, b"stale content that is longer").expect("should seed file");

    let outcome = engine()
        .download_to_file(
            &format!("{}/fresh.mp4", server.uri()),
            &target,
            |_| {},
            &CancellationToken::new(),
        )
        .await;

    assert!(outcome.is_success());
    assert_eq!(std::fs::read(&target).expect("should read file"), b"fresh bytes");
    assert!(!temp_dir.path().join("clip.mp4.part").exists());
}
