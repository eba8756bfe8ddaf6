//! CLI entry point for fetchit.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use fetchit_core::{FetchConfig, FetchOutcome, Pipeline};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod output;
mod progress_ui;

use cli::Args;
use progress_ui::ProgressReporter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so `--resolve-only` output stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "Loaded configuration file");
    }
    let fetch_config = loaded.config.apply_to(FetchConfig::default());

    let urls = read_input_urls(&args.urls)?;
    if urls.is_empty() {
        info!("No input provided. Pipe URLs via stdin or pass as arguments.");
        info!("Example: fetchit 'https://twitter.com/user/status/1234567890'");
        return Ok(ExitCode::SUCCESS);
    }
    if args.output.is_some() && urls.len() > 1 {
        bail!("--output can only be used with a single URL ({} given)", urls.len());
    }

    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| loaded.config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let pipeline = Pipeline::new(&fetch_config).context("Failed to initialize HTTP clients")?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    info!(urls = urls.len(), "fetchit starting");
    let mut failures = 0usize;
    for (index, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!(skipped = urls.len() - index, "Skipping remaining URLs after cancellation");
            failures += urls.len() - index;
            break;
        }

        let succeeded = if args.resolve_only {
            resolve_only(&pipeline, url, &cancel).await
        } else {
            let path = output::choose_output_path(
                args.output.as_deref(),
                &output_dir,
                OffsetDateTime::now_utc(),
            )?;
            download_one(&pipeline, url, path, !args.quiet, &cancel).await
        };
        if !succeeded {
            failures += 1;
        }
    }

    info!(total = urls.len(), failed = failures, "fetchit finished");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// URLs from positional args, else one per line from piped stdin.
fn read_input_urls(positional: &[String]) -> Result<Vec<String>> {
    let input_text = if !positional.is_empty() {
        positional.join("\n")
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read URLs from stdin")?;
        buffer
    } else {
        String::new()
    };

    Ok(input_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling");
            cancel.cancel();
        }
    });
}

async fn resolve_only(pipeline: &Pipeline, url: &str, cancel: &CancellationToken) -> bool {
    match pipeline.resolve(url, cancel).await {
        Ok(media) => {
            println!("{}", media.direct_url);
            true
        }
        Err(error) => {
            debug!(%error, "resolution failed");
            eprintln!("{url}: {}", FetchOutcome::ResolutionFailed(error).user_message());
            false
        }
    }
}

async fn download_one(
    pipeline: &Pipeline,
    url: &str,
    path: PathBuf,
    show_progress: bool,
    cancel: &CancellationToken,
) -> bool {
    let mut reporter = ProgressReporter::new(show_progress);
    let outcome = pipeline
        .resolve_and_download_to_file(url, &path, |event| reporter.handle(event), cancel)
        .await;

    match &outcome {
        FetchOutcome::Downloaded { media, summary } => {
            let title = media
                .title
                .as_deref()
                .map(|title| format!(" ({title})"))
                .unwrap_or_default();
            println!(
                "{url}: {}{title} -> {} [{} bytes]",
                outcome.user_message(),
                path.display(),
                summary.bytes_written
            );
            true
        }
        FetchOutcome::ResolutionFailed(_) | FetchOutcome::DownloadFailed { .. } => {
            eprintln!("{url}: {}", outcome.user_message());
            false
        }
    }
}
