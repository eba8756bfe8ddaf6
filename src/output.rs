//! Output path selection for downloaded videos.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use time::macros::format_description;

/// Default name for a download started at `now`: `video_YYYYMMDD_HHMMSS.mp4`.
pub fn default_file_name(now: OffsetDateTime) -> Result<String> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .context("Failed to format download timestamp")?;
    Ok(format!("video_{stamp}.mp4"))
}

/// Returns `dir/filename`, or `stem_N.ext` with the first free `N` when taken.
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let base_path = dir.join(filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    };

    for i in 1..1000 {
        let candidate = dir.join(format!("{stem}_{i}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
    }

    // Every suffix taken; fall back to a nanosecond stamp.
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    dir.join(format!("{stem}_{nanos}{ext}"))
}

/// Picks where the video for one URL goes.
///
/// `explicit` wins verbatim. Otherwise a timestamped name is placed in
/// `output_dir` without overwriting an existing file.
pub fn choose_output_path(
    explicit: Option<&Path>,
    output_dir: &Path,
    now: OffsetDateTime,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let name = default_file_name(now)?;
    Ok(resolve_unique_path(output_dir, &name))
}
