//! Bounded time-series history with chart-ready downsampling.
//!
//! A [`TelemetryBuffer`] keeps the most recent `capacity` samples of one
//! metric schema, oldest first. Recording past capacity evicts from the head
//! (ring-buffer semantics). Readers pull an ordered window with
//! [`TelemetryBuffer::query`] and shrink it for rendering with [`downsample`].
//!
//! [`SharedBuffer`] wraps a buffer for the single-writer / many-reader case:
//! the collector thread records under a write lock, readers copy a snapshot
//! under a read lock and downsample after releasing it.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TelemetryError;
use crate::sample::{MetricSet, Sample};

/// Select `target` elements from `items` at a fixed stride.
///
/// - `target == 0` is rejected with [`TelemetryError::InvalidTargetCount`],
///   even when `items` is empty.
/// - When `items.len() <= target` the input is returned unchanged.
/// - Otherwise output index `i` takes input index `floor(i * len / target)`.
///
/// The selection is nearest-index, not an aggregate: short spikes that fall
/// between selected indices do not appear in the output. Good enough for
/// trend lines, not for alerting.
pub fn downsample<T: Clone>(items: &[T], target: usize) -> Result<Vec<T>, TelemetryError> {
    if target == 0 {
        return Err(TelemetryError::InvalidTargetCount);
    }
    let len = items.len();
    if len <= target {
        return Ok(items.to_vec());
    }
    let out = (0..target)
        .map(|i| {
            let idx = (i as u128 * len as u128 / target as u128) as usize;
            items[idx].clone()
        })
        .collect();
    Ok(out)
}

/// Slots reserved up front; larger buffers grow as samples arrive.
const PREALLOC_LIMIT: usize = 4096;

/// Append-only, capacity-bounded sample history for one metric schema.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer<M> {
    samples: VecDeque<Sample<M>>,
    capacity: usize,
}

impl<M: MetricSet> TelemetryBuffer<M> {
    /// Create an empty buffer retaining at most `capacity` samples.
    ///
    /// Memory grows with `capacity`; choosing a sane value (tens to a few
    /// thousand) is the caller's job.
    pub fn new(capacity: usize) -> Result<Self, TelemetryError> {
        if capacity == 0 {
            return Err(TelemetryError::InvalidCapacity);
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity.min(PREALLOC_LIMIT)),
            capacity,
        })
    }

    /// Append a sample at the tail, evicting the oldest sample when full.
    ///
    /// A sample older than the current tail is rejected with
    /// [`TelemetryError::OutOfOrderSample`] and the buffer is left untouched.
    /// Equal timestamps are accepted.
    pub fn record(&mut self, sample: Sample<M>) -> Result<(), TelemetryError> {
        if let Some(last) = self.samples.back()
            && sample.timestamp_ms() < last.timestamp_ms()
        {
            return Err(TelemetryError::OutOfOrderSample {
                last_ms: last.timestamp_ms(),
                got_ms: sample.timestamp_ms(),
            });
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        Ok(())
    }

    /// All retained samples with `timestamp_ms >= since_ms`, oldest first.
    pub fn query(&self, since_ms: u64) -> Vec<Sample<M>> {
        let start = self
            .samples
            .partition_point(|s| s.timestamp_ms() < since_ms);
        self.samples.range(start..).cloned().collect()
    }

    /// `query(since_ms)` followed by `downsample(.., target)`.
    pub fn render(&self, since_ms: u64, target: usize) -> Result<Vec<Sample<M>>, TelemetryError> {
        downsample(&self.query(since_ms), target)
    }

    pub fn latest(&self) -> Option<&Sample<M>> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<M>> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

// ---------------------------------------------------------------------------
// SharedBuffer
// ---------------------------------------------------------------------------

/// Cloneable handle to a buffer shared between one producer and many readers.
#[derive(Debug)]
pub struct SharedBuffer<M> {
    inner: Arc<RwLock<TelemetryBuffer<M>>>,
}

impl<M> Clone for SharedBuffer<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: MetricSet> SharedBuffer<M> {
    pub fn new(capacity: usize) -> Result<Self, TelemetryError> {
        Ok(Self::from_buffer(TelemetryBuffer::new(capacity)?))
    }

    pub fn from_buffer(buffer: TelemetryBuffer<M>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    // A panic while holding the lock cannot leave the deque half-updated
    // (push/pop are single calls), so poisoned guards are still usable.
    fn read(&self) -> RwLockReadGuard<'_, TelemetryBuffer<M>> {
        match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, TelemetryBuffer<M>> {
        match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record(&self, sample: Sample<M>) -> Result<(), TelemetryError> {
        self.write().record(sample)
    }

    /// Copy of every sample at or after `since_ms`.
    pub fn snapshot_since(&self, since_ms: u64) -> Vec<Sample<M>> {
        self.read().query(since_ms)
    }

    /// Snapshot under the read lock, then downsample without holding it.
    pub fn render(&self, since_ms: u64, target: usize) -> Result<Vec<Sample<M>>, TelemetryError> {
        let snapshot = self.snapshot_since(since_ms);
        downsample(&snapshot, target)
    }

    pub fn latest(&self) -> Option<Sample<M>> {
        self.read().latest().cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}
