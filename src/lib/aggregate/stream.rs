//! Host-side driver: one producer thread feeding rayon workers through a
//! bounded channel, each worker folding into its own [`LocalBuffer`].

use crate::aggregate::{LocalBuffer, Record, StreamingAggregator};
use crate::core::error::{BiomError, Result};
use crate::sparse::{SparseTable, EPSILON};
use crossbeam::channel::bounded;
use log::{debug, info};
use rayon::prelude::*;
use std::thread;

/// Records per batch sent through the channel.
pub const DEFAULT_BATCH_SIZE: usize = 8_192;
/// Batches in flight per worker thread.
pub const BATCHES_PER_THREAD: usize = 4;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub batch_size: usize,
    pub threads: usize,
    pub epsilon: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            threads: rayon::current_num_threads(),
            epsilon: EPSILON,
        }
    }
}

impl StreamConfig {
    fn channel_capacity(&self) -> usize {
        self.threads.max(1).saturating_mul(BATCHES_PER_THREAD)
    }

    /// Rows a worker buffers before it combines into the global state.
    fn flush_rows(&self) -> usize {
        self.batch_size.max(1).saturating_mul(BATCHES_PER_THREAD)
    }
}

/// Build a table from a stream of records. The iterator is consumed on the
/// calling thread, so it need not be `Send`. Sinking and combining run on the
/// current rayon pool, or serially on the calling thread when it is itself a
/// pool worker.
pub fn aggregate_records<I>(records: I, config: &StreamConfig) -> Result<SparseTable>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let aggregator = StreamingAggregator::with_epsilon(config.epsilon);
    let produced = if rayon::current_thread_index().is_some() {
        debug!("Called from a rayon worker; aggregating on the calling thread");
        aggregate_serial(&aggregator, records, config)?
    } else {
        aggregate_parallel(&aggregator, records, config)?
    };

    info!("Streamed {} records into the aggregator", produced);
    aggregator.finalize()
}

/// Single-worker sink/combine loop. A pool worker blocking on the channel
/// would starve the jobs meant to drain it.
fn aggregate_serial<I>(
    aggregator: &StreamingAggregator,
    records: I,
    config: &StreamConfig,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let batch_size = config.batch_size.max(1);
    let flush_rows = config.flush_rows();
    let mut local = aggregator.init_local();
    let mut batch = Vec::with_capacity(batch_size);
    let mut produced = 0usize;
    for record in records {
        batch.push(record?);
        if batch.len() == batch_size {
            produced += batch.len();
            aggregator.sink(&mut local, batch.drain(..))?;
            if local.len() >= flush_rows {
                aggregator.combine(&mut local)?;
            }
        }
    }
    produced += batch.len();
    aggregator.sink(&mut local, batch)?;
    aggregator.combine(&mut local)?;
    Ok(produced)
}

fn aggregate_parallel<I>(
    aggregator: &StreamingAggregator,
    records: I,
    config: &StreamConfig,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let batch_size = config.batch_size.max(1);
    let flush_rows = config.flush_rows();
    let (sender, receiver) = bounded::<Vec<Record>>(config.channel_capacity());
    debug!(
        "Streaming records in batches of {} over a channel of {}",
        batch_size,
        config.channel_capacity()
    );

    thread::scope(|scope| -> Result<usize> {
        let consumer = scope.spawn(move || -> Result<()> {
            receiver
                .into_iter()
                .par_bridge()
                .try_fold(
                    || aggregator.init_local(),
                    |mut local: LocalBuffer, batch| -> Result<LocalBuffer> {
                        aggregator.sink(&mut local, batch)?;
                        if local.len() >= flush_rows {
                            aggregator.combine(&mut local)?;
                        }
                        Ok(local)
                    },
                )
                .try_for_each(|local| {
                    let mut local = local?;
                    aggregator.combine(&mut local)
                })
        });

        let mut produced = 0usize;
        let mut batch = Vec::with_capacity(batch_size);
        let mut read_error = None;
        for record in records {
            match record {
                Ok(record) => batch.push(record),
                Err(err) => {
                    read_error = Some(err);
                    break;
                }
            }
            if batch.len() == batch_size {
                produced += batch.len();
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                if sender.send(full).is_err() {
                    break;
                }
            }
        }
        if !batch.is_empty() && read_error.is_none() {
            produced += batch.len();
            sender.send(batch).ok();
        }
        drop(sender);

        let consumed = consumer
            .join()
            .map_err(|_| BiomError::BadInput("aggregation worker panicked".to_string()))?;
        match read_error {
            Some(err) => Err(err),
            None => consumed.map(|_| produced),
        }
    })
}
