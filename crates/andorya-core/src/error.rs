//! Error types for telemetry buffers and sample producers.

use thiserror::Error;

/// Configuration and contract errors raised by [`TelemetryBuffer`](crate::TelemetryBuffer)
/// and [`downsample`](crate::downsample).
///
/// These are programming or configuration mistakes, never transient faults:
/// callers should fail fast instead of retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// A buffer was constructed with a capacity of zero.
    #[error("buffer capacity must be at least 1")]
    InvalidCapacity,

    /// `downsample` was asked for zero output points.
    #[error("downsample target count must be at least 1")]
    InvalidTargetCount,

    /// A sample arrived with a timestamp earlier than the buffer tail.
    #[error("out-of-order sample: timestamp {got_ms} ms is earlier than last recorded {last_ms} ms")]
    OutOfOrderSample { last_ms: u64, got_ms: u64 },

    /// A lookback window string could not be parsed.
    #[error("invalid window '{0}': expected 1h, 6h, 24h, 7d or <N>m/<N>h/<N>d")]
    InvalidWindow(String),
}

/// Failure while fetching one sample from a producer.
///
/// The collector logs these and skips the tick; they never reach the buffer.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),
}
