//! Input Distributor: loads the parameter file once and partitions it into
//! one bounded queue per connection.
//!
//! Shard rotation is count-driven: every shard's capacity is fixed up front
//! (`ceil(queries / connections)`, last shard takes the remainder), so a
//! filled shard rotates to the next one and input is never silently dropped.

#[cfg(test)]
mod tests;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::warn;

use crate::error::InputError;

/// One input row, split into positional fields. Consumed exactly once by
/// whichever worker dequeues it.
#[derive(Debug)]
pub struct ParameterLine {
    fields: Vec<String>,
}

impl ParameterLine {
    #[must_use]
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// A sealed, bounded queue of rows owned by one connection and drained by
/// its workers. Cloning shares the same underlying queue.
#[derive(Clone)]
pub struct Shard {
    queue: Arc<Mutex<mpsc::Receiver<ParameterLine>>>,
    len: usize,
}

impl Shard {
    /// Dequeue the next row; `None` once the shard is exhausted.
    pub async fn pop(&self) -> Option<ParameterLine> {
        self.queue.lock().await.recv().await
    }

    /// Number of rows the distributor enqueued at fill time.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[derive(Debug)]
pub struct DistributionSummary {
    /// Rows enqueued across all shards: `min(file line count, queries)`.
    pub enqueued: u64,
    /// Rows skipped for having fewer fields than required.
    pub malformed: u64,
    /// Whether the file held more usable rows than were requested.
    pub truncated: bool,
    pub shard_lengths: Vec<usize>,
}

/// Read `path` once and split its rows across `shard_count` bounded queues.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or read, or when it
/// yields no usable rows at all. A file with fewer rows than `total_lines`
/// is not an error; the caller is expected to warn from the summary.
pub fn distribute(
    path: &Path,
    total_lines: u64,
    shard_count: usize,
    delimiter: char,
    min_fields: usize,
) -> Result<(Vec<Shard>, DistributionSummary), InputError> {
    let file = File::open(path).map_err(|err| InputError::Open {
        path: path.to_path_buf(),
        source: err,
    })?;
    let reader = BufReader::new(file);

    let shard_count = shard_count.max(1);
    let count = u64::try_from(shard_count).unwrap_or(1).max(1);
    let base_capacity = total_lines
        .checked_add(count.saturating_sub(1))
        .and_then(|padded| padded.checked_div(count))
        .unwrap_or(total_lines)
        .max(1);
    let base_capacity = usize::try_from(base_capacity).unwrap_or(usize::MAX);

    let mut sealed: Vec<Vec<ParameterLine>> = Vec::with_capacity(shard_count);
    let mut current: Vec<ParameterLine> = Vec::new();
    let mut enqueued: u64 = 0;
    let mut malformed: u64 = 0;
    let mut truncated = false;

    for line_result in reader.lines() {
        let line = line_result.map_err(|err| InputError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
        if enqueued >= total_lines {
            truncated = true;
            break;
        }
        let fields: Vec<String> = line
            .split(delimiter)
            .map(|field| field.trim().to_owned())
            .collect();
        if fields.len() < min_fields || fields.iter().all(|field| field.is_empty()) {
            malformed = malformed.saturating_add(1);
            continue;
        }
        current.push(ParameterLine::new(fields));
        enqueued = enqueued.saturating_add(1);
        if current.len() >= base_capacity && sealed.len().saturating_add(1) < shard_count {
            sealed.push(std::mem::take(&mut current));
        }
    }

    if enqueued == 0 {
        return Err(InputError::Empty {
            path: path.to_path_buf(),
        });
    }

    sealed.push(current);
    while sealed.len() < shard_count {
        sealed.push(Vec::new());
    }

    let mut shards = Vec::with_capacity(shard_count);
    let mut shard_lengths = Vec::with_capacity(shard_count);
    let mut dropped: u64 = 0;
    for buffer in sealed {
        let len = buffer.len();
        let (tx, rx) = mpsc::channel(len.max(1));
        for row in buffer {
            if tx.try_send(row).is_err() {
                dropped = dropped.saturating_add(1);
            }
        }
        drop(tx);
        shard_lengths.push(len);
        shards.push(Shard {
            queue: Arc::new(Mutex::new(rx)),
            len,
        });
    }
    if dropped > 0 {
        warn!("Dropped {} rows while sealing shards.", dropped);
    }

    Ok((
        shards,
        DistributionSummary {
            enqueued: enqueued.saturating_sub(dropped),
            malformed,
            truncated,
            shard_lengths,
        },
    ))
}
