//! Constants for the download module (chunking, progress throttling).

use std::time::Duration;

/// Bytes written to the destination per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Progress events fire only at multiples of this percentage.
pub const PROGRESS_STEP_PERCENT: u8 = 5;

/// Minimum spacing between progress events when the total size is unknown.
pub const UNKNOWN_TOTAL_PROGRESS_INTERVAL: Duration = Duration::from_millis(250);
