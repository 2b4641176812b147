//! Follows a capture file and feeds its records to the inspector.
//!
//! The file is newline-delimited JSON, one record per line, appended to by
//! the capture interceptors while the viewer runs. Reading starts at the
//! beginning and keeps going as the file grows.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sniffer_inspect::{InspectError, InspectorHandle};
use sniffer_types::Record;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Errors that stop the tail.
#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to open capture file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read capture file: {0}")]
    Read(#[from] std::io::Error),
}

/// Counters reported when the tail stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TailStats {
    pub lines: u64,
    pub appended: u64,
    pub skipped: u64,
}

/// Reads `path` from the start and appends every record to `inspector`.
///
/// At end of file the tail sleeps for `poll_interval` and tries again. A
/// trailing line without its newline is held back until the rest of it is
/// written. Lines that do not decode, and records the store rejects, are
/// logged and skipped.
///
/// Returns once the inspector has shut down.
pub async fn tail_capture(
    path: &Path,
    poll_interval: Duration,
    inspector: InspectorHandle,
) -> Result<TailStats, TailError> {
    let file = File::open(path).await.map_err(|source| TailError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "following capture file");

    let mut reader = BufReader::new(file);
    let mut line = Vec::new();
    let mut stats = TailStats::default();

    loop {
        let read = reader.read_until(b'\n', &mut line).await?;
        if read == 0 || line.last() != Some(&b'\n') {
            if inspector.is_closed() {
                break;
            }
            tokio::time::sleep(poll_interval).await;
            continue;
        }

        stats.lines += 1;
        if !line.iter().all(u8::is_ascii_whitespace) {
            match serde_json::from_slice::<Record>(&line) {
                Ok(record) => match inspector.append(record).await {
                    Ok(_) => stats.appended += 1,
                    Err(InspectError::Closed) => break,
                    Err(_) => stats.skipped += 1,
                },
                Err(e) => {
                    stats.skipped += 1;
                    tracing::warn!(line = stats.lines, error = %e, "skipping undecodable capture line");
                }
            }
        }
        line.clear();
    }

    tracing::info!(
        lines = stats.lines,
        appended = stats.appended,
        skipped = stats.skipped,
        "capture tail stopped"
    );
    Ok(stats)
}
