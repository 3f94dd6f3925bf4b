//! Concurrent construction of a [`SparseTable`] from streamed triples.
//!
//! Each worker owns a [`LocalBuffer`] and appends to it without locking.
//! [`StreamingAggregator::combine`] takes the global lock once per buffer,
//! interns the buffered identifiers and appends the encoded triples.
//! [`StreamingAggregator::finalize`] canonicalizes the merged triples.
//! [`stream`] wires the three steps to a record iterator.

pub mod stream;

use crate::core::error::{BiomError, Result};
use crate::sparse::{CooBuilder, CooParts, Dictionary, SparseTable, EPSILON};
use log::{debug, info};
use parking_lot::Mutex;
use serde::Deserialize;

pub use stream::{aggregate_records, StreamConfig};

/// One input row as delivered by the host. Any field may be null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    pub feature_id: Option<String>,
    pub sample_id: Option<String>,
    pub value: Option<f64>,
}

impl Record {
    pub fn new(feature_id: &str, sample_id: &str, value: f64) -> Self {
        Self {
            feature_id: Some(feature_id.to_string()),
            sample_id: Some(sample_id.to_string()),
            value: Some(value),
        }
    }
}

/// Per-worker buffer of validated, not yet encoded rows.
#[derive(Debug, Default)]
pub struct LocalBuffer {
    feature_ids: Vec<String>,
    sample_ids: Vec<String>,
    values: Vec<f64>,
}

impl LocalBuffer {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn push(&mut self, record: Record) -> Result<()> {
        let feature_id = match record.feature_id {
            None => return Err(BiomError::BadInput("NULL values not allowed in feature_id column".into())),
            Some(id) if id.is_empty() => {
                return Err(BiomError::BadInput("empty feature_id not allowed".into()))
            }
            Some(id) => id,
        };
        let sample_id = match record.sample_id {
            None => return Err(BiomError::BadInput("NULL values not allowed in sample_id column".into())),
            Some(id) if id.is_empty() => {
                return Err(BiomError::BadInput("empty sample_id not allowed".into()))
            }
            Some(id) => id,
        };
        let value = record
            .value
            .ok_or_else(|| BiomError::BadInput("NULL values not allowed in value column".into()))?;

        self.feature_ids.push(feature_id);
        self.sample_ids.push(sample_id);
        self.values.push(value);
        Ok(())
    }

    fn clear(&mut self) {
        self.feature_ids.clear();
        self.sample_ids.clear();
        self.values.clear();
    }
}

/// Shared state guarded by the aggregator's lock.
#[derive(Debug, Default)]
struct GlobalState {
    features: Dictionary,
    samples: Dictionary,
    coo: CooBuilder,
}

/// Global half of the sink/combine/finalize protocol. One instance per table.
#[derive(Debug)]
pub struct StreamingAggregator {
    state: Mutex<GlobalState>,
    epsilon: f64,
}

impl Default for StreamingAggregator {
    fn default() -> Self {
        Self::with_epsilon(EPSILON)
    }
}

impl StreamingAggregator {
    /// Empty global state: two empty dictionaries and empty COO arrays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator whose final table drops summed values `<= epsilon`.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            state: Mutex::new(GlobalState::default()),
            epsilon,
        }
    }

    /// Fresh per-worker buffer.
    pub fn init_local(&self) -> LocalBuffer {
        LocalBuffer::default()
    }

    /// Validate and buffer a batch of rows. Fails on the first null or empty key
    /// or null value; rows before it stay buffered.
    pub fn sink<I>(&self, local: &mut LocalBuffer, batch: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        for record in batch {
            local.push(record)?;
        }
        Ok(())
    }

    /// Encode a worker's buffer into the global dictionaries and COO arrays,
    /// then clear the buffer. Interning and appending happen under one lock.
    pub fn combine(&self, local: &mut LocalBuffer) -> Result<()> {
        if local.is_empty() {
            return Ok(());
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let n = local.len();
        let mut encoded = CooParts {
            rows: Vec::with_capacity(n),
            cols: Vec::with_capacity(n),
            values: Vec::with_capacity(n),
        };
        for (feature_id, sample_id) in local.feature_ids.iter().zip(&local.sample_ids) {
            encoded.rows.push(state.features.intern(feature_id)?);
            encoded.cols.push(state.samples.intern(sample_id)?);
        }
        encoded.values.extend_from_slice(&local.values);
        state.coo.append(&mut encoded);

        debug!(
            "Combined {} rows; global state holds {} triples, {} features, {} samples",
            n,
            state.coo.len(),
            state.features.len(),
            state.samples.len()
        );
        drop(guard);

        local.clear();
        Ok(())
    }

    /// Build the canonical table. Fails when either axis exceeds the int32
    /// range of the container format.
    pub fn finalize(self) -> Result<SparseTable> {
        let GlobalState {
            features,
            samples,
            mut coo,
        } = self.state.into_inner();

        info!(
            "Finalizing table from {} triples ({} features × {} samples)",
            coo.len(),
            features.len(),
            samples.len()
        );
        let table = SparseTable::from_encoded_with_epsilon(coo.drain(), features, samples, self.epsilon)?;
        table.check_int32_shape()?;
        Ok(table)
    }
}
