//! Line Source
//!
//! Reads the input stream line by line, normalizes each line and hands it to
//! the hub. Reading blocks, so it runs on its own OS thread rather than on
//! the async runtime; `broadcast` never blocks, so a stalled viewer can never
//! hold up reading.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use serde::Serialize;

use crate::hub::{BroadcastHub, Record};
use crate::normalize::Normalizer;

/// Counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Lines read from the input
    pub lines: u64,
    /// Lines broadcast in normalized form
    pub normalized: u64,
}

/// Read `reader` to the end, broadcasting one record per line
///
/// Returns when the input reaches end-of-stream. Invalid UTF-8 is replaced
/// rather than rejected, and `\n` / `\r\n` terminators are stripped.
pub fn run<R: BufRead>(
    mut reader: R,
    normalizer: &Normalizer,
    hub: &BroadcastHub,
) -> io::Result<IngestStats> {
    let mut stats = IngestStats::default();
    let mut buf = Vec::with_capacity(4096);

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let line = decode_line(&buf);
        let record: Record = match normalizer.normalize(&line) {
            Some(json) => {
                stats.normalized += 1;
                json.into()
            }
            None => line.into(),
        };

        hub.broadcast(&record);
        stats.lines += 1;
    }

    Ok(stats)
}

/// Decode one raw line, dropping its terminator
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Start reading standard input on a dedicated thread
///
/// End of input stops ingestion for good; connected viewers stay connected
/// but receive nothing further.
pub fn spawn_stdin(normalizer: Normalizer, hub: Arc<BroadcastHub>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("leno-ingest".to_string())
        .spawn(move || {
            tracing::info!(format = %normalizer.format(), "Reading lines from stdin");

            let stdin = io::stdin();
            match run(stdin.lock(), &normalizer, &hub) {
                Ok(stats) => tracing::info!(
                    lines = stats.lines,
                    normalized = stats.normalized,
                    "Input stream closed, no further lines will be broadcast"
                ),
                Err(e) => tracing::error!(error = %e, "Failed to read from stdin, ingestion stopped"),
            }
        })
}
