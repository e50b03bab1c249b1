//! Periodic sample producers.
//!
//! A [`Collector`] owns one [`SampleSource`] on a background thread, fetches
//! one sample per tick, stamps it with the wall clock and records it into a
//! [`SharedBuffer`]. The returned [`CollectorHandle`] is the only way to stop
//! it: call [`CollectorHandle::stop`] or drop the handle. Either way the worker
//! is woken immediately (no waiting out the interval) and joined.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::buffer::SharedBuffer;
use crate::error::{SourceError, TelemetryError};
use crate::sample::{MetricSet, Sample};
use crate::window::unix_ms_now;

/// Something that can produce one metric set per tick.
pub trait SampleSource<M: MetricSet>: Send {
    /// Short identifier used in logs (e.g. `"procfs_netdev"`).
    fn name(&self) -> &str;

    /// Fetch the next observation. May block on I/O; never called while
    /// the buffer lock is held.
    fn fetch(&mut self) -> Result<M, SourceError>;
}

impl<M: MetricSet> SampleSource<M> for Box<dyn SampleSource<M>> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&mut self) -> Result<M, SourceError> {
        (**self).fetch()
    }
}

/// Configuration for a periodic collector.
#[derive(Debug, Clone)]
pub struct Collector {
    name: String,
    interval: Duration,
    clock: fn() -> u64,
}

impl Collector {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            clock: unix_ms_now,
        }
    }

    /// Replace the wall clock used to stamp samples (milliseconds).
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one fetch/stamp/record cycle. Returns `true` when a sample was recorded.
    fn tick<M: MetricSet, S: SampleSource<M>>(
        &self,
        source: &mut S,
        buffer: &SharedBuffer<M>,
    ) -> bool {
        let metrics = match source.fetch() {
            Ok(m) => m,
            Err(e) => {
                log::warn!(
                    "collector {}: {} fetch failed, skipping tick: {e}",
                    self.name,
                    source.name()
                );
                return false;
            }
        };
        let sample = Sample::new((self.clock)(), metrics);
        match buffer.record(sample) {
            Ok(()) => true,
            Err(TelemetryError::OutOfOrderSample { last_ms, got_ms }) => {
                log::warn!(
                    "collector {}: clock went backwards ({got_ms} < {last_ms}), dropping sample",
                    self.name
                );
                false
            }
            Err(e) => {
                log::error!("collector {}: record failed: {e}", self.name);
                false
            }
        }
    }

    /// Start collecting on a background thread.
    ///
    /// The first sample is taken immediately, then one per interval.
    pub fn spawn<M, S>(self, mut source: S, buffer: SharedBuffer<M>) -> std::io::Result<CollectorHandle>
    where
        M: MetricSet,
        S: SampleSource<M> + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let ticks = Arc::new(AtomicU64::new(0));
        let worker_ticks = Arc::clone(&ticks);
        let name = self.name.clone();

        let join = thread::Builder::new()
            .name(format!("collector-{}", self.name))
            .spawn(move || {
                log::debug!(
                    "collector {} started: {} every {:?}",
                    self.name,
                    source.name(),
                    self.interval
                );
                loop {
                    if self.tick(&mut source, &buffer) {
                        worker_ticks.fetch_add(1, Ordering::Relaxed);
                    }
                    match stop_rx.recv_timeout(self.interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        // Explicit stop, or the handle was dropped.
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::debug!("collector {} stopped", self.name);
            })?;

        Ok(CollectorHandle {
            name,
            stop_tx: Some(stop_tx),
            join: Some(join),
            ticks,
        })
    }
}

/// Stop handle for a running collector. Dropping it stops the collector.
#[derive(Debug)]
pub struct CollectorHandle {
    name: String,
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU64>,
}

impl CollectorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of samples successfully recorded so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.join.as_ref().is_some_and(|j| !j.is_finished())
    }

    /// Stop the collector and wait for its thread to exit.
    ///
    /// Returns `false` if the worker had panicked.
    pub fn stop(mut self) -> bool {
        self.shutdown()
    }

    fn shutdown(&mut self) -> bool {
        if let Some(tx) = self.stop_tx.take() {
            // The worker may already be gone; a failed send is fine.
            let _ = tx.send(());
        }
        match self.join.take() {
            Some(join) => match join.join() {
                Ok(()) => true,
                Err(_) => {
                    log::error!("collector {} panicked", self.name);
                    false
                }
            },
            None => true,
        }
    }
}

impl Drop for CollectorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
