//! Streaming download engine for resolved media URLs.
//!
//! The engine GETs a direct URL, copies the body into any `AsyncWrite` sink
//! in fixed-size chunks and reports throttled progress through a callback.
//!
//! # Features
//!
//! - Chunked streaming (4096 bytes by default), nothing buffered whole
//! - Progress events only at 5% boundaries, time-throttled when the size is unknown
//! - A terminal [`DownloadEvent::Finished`] event for success and failure alike
//! - Cancellation between chunks via `CancellationToken`
//! - File destinations remove partial output on failure
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use fetchit_core::config::HttpTimeouts;
//! use fetchit_core::download::{DownloadEngine, DownloadEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(HttpTimeouts::default())?;
//! let outcome = engine
//!     .download_to_file(
//!         "https://cdn.example/video.mp4",
//!         Path::new("video.mp4"),
//!         |event| {
//!             if let DownloadEvent::Progress(progress) = event {
//!                 println!("{}%", progress.percent);
//!             }
//!         },
//!         &CancellationToken::new(),
//!     )
//!     .await;
//! println!("success: {}", outcome.is_success());
//! # Ok(())
//! # }
//! ```

mod constants;
mod engine;
mod error;
mod progress;

pub use constants::{DEFAULT_CHUNK_SIZE, PROGRESS_STEP_PERCENT, UNKNOWN_TOTAL_PROGRESS_INTERVAL};
pub use engine::{DownloadEngine, DownloadOutcome, DownloadSummary};
pub use error::DownloadError;
pub use progress::{DownloadEvent, DownloadProgress, ProgressThrottle, percent_complete};

