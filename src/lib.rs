//! FetchIt Core Library
//!
//! Turns a social media page URL (YouTube, Twitter/X, Instagram, Facebook)
//! into a direct video URL and streams that video into a destination.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Endpoints, timeouts and policies
//! - [`fetcher`] - Single-request HTTP helper shared by resolvers
//! - [`resolver`] - Platform classification and per-platform resolvers
//! - [`download`] - Chunked streaming with throttled progress
//! - [`pipeline`] - Resolve-then-download entry points

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
mod user_agent;

// Re-export commonly used types
pub use config::{Endpoints, FetchConfig, HttpTimeouts, UnknownPlatformPolicy};
pub use download::{
    DownloadEngine, DownloadError, DownloadEvent, DownloadOutcome, DownloadProgress,
    DownloadSummary,
};
pub use fetcher::{FetchError, FetchResult, Fetcher};
pub use pipeline::{FetchOutcome, Pipeline};
pub use resolver::{
    Platform, ResolveContext, ResolveError, ResolvedMedia, Resolver, ResolverDispatcher,
    build_default_dispatcher,
};
