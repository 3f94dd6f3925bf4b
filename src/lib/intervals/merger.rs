//! Streaming coalescer for half-open `[start, stop)` intervals.

use log::debug;

/// Number of uncompacted additions at which [`IntervalMerger::add`] compacts on its own.
pub const COMPACT_THRESHOLD: usize = 1_000_000;

/// Accumulates intervals and keeps memory bounded by periodically merging
/// them into a sorted, disjoint, non-touching union.
///
/// After [`IntervalMerger::compress`] the stored intervals satisfy
/// `starts[i] <= stops[i]` and `stops[i] < starts[i + 1]`. Any `add` may break
/// that until the next `compress`.
#[derive(Debug, Clone)]
pub struct IntervalMerger {
    starts: Vec<i64>,
    stops: Vec<i64>,
    threshold: usize,
    pending: usize,
}

impl Default for IntervalMerger {
    fn default() -> Self {
        Self::with_threshold(COMPACT_THRESHOLD)
    }
}

impl IntervalMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merger that compacts after `threshold` uncompacted additions.
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            starts: Vec::new(),
            stops: Vec::new(),
            threshold: threshold.max(1),
            pending: 0,
        }
    }

    /// Record one interval. Inverted bounds are swapped.
    pub fn add(&mut self, start: i64, stop: i64) {
        let (start, stop) = if start > stop {
            debug!("Swapping inverted interval ({}, {})", start, stop);
            (stop, start)
        } else {
            (start, stop)
        };

        self.starts.push(start);
        self.stops.push(stop);
        self.pending += 1;

        if self.pending >= self.threshold {
            self.compress();
        }
    }

    /// Re-add every interval held by `other`, as when combining partial states.
    pub fn absorb(&mut self, other: &IntervalMerger) {
        for (&start, &stop) in other.starts.iter().zip(&other.stops) {
            self.add(start, stop);
        }
    }

    /// Sort and merge overlapping or touching intervals in place.
    pub fn compress(&mut self) {
        self.pending = 0;
        if self.starts.is_empty() {
            return;
        }

        let before = self.starts.len();
        let mut intervals: Vec<(i64, i64)> = self
            .starts
            .drain(..)
            .zip(self.stops.drain(..))
            .collect();
        intervals.sort_unstable();

        let (mut current_start, mut current_stop) = intervals[0];
        for &(start, stop) in &intervals[1..] {
            if start <= current_stop {
                current_stop = current_stop.max(stop);
            } else {
                self.starts.push(current_start);
                self.stops.push(current_stop);
                current_start = start;
                current_stop = stop;
            }
        }
        self.starts.push(current_start);
        self.stops.push(current_stop);

        debug!(
            "Compacted {} intervals into {} disjoint ranges",
            before,
            self.starts.len()
        );
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// `true` when no `add` happened since the last compaction.
    #[inline]
    pub fn is_compacted(&self) -> bool {
        self.pending == 0
    }

    /// Intervals added since the last compaction.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Interval starts; only ordered and disjoint after [`IntervalMerger::compress`].
    pub fn starts(&self) -> &[i64] {
        &self.starts
    }

    /// Interval stops; only ordered and disjoint after [`IntervalMerger::compress`].
    pub fn stops(&self) -> &[i64] {
        &self.stops
    }

    /// Compact and return the coalesced `(start, stop)` pairs, or `None` when
    /// nothing was added.
    pub fn into_intervals(mut self) -> Option<Vec<(i64, i64)>> {
        self.compress();
        if self.is_empty() {
            return None;
        }
        Some(self.starts.into_iter().zip(self.stops).collect())
    }
}
