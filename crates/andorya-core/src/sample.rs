//! Timestamped samples and the metric schemas they carry.
//!
//! Each buffer holds exactly one schema: a [`TelemetryBuffer<NetworkThroughput>`]
//! can only ever receive `download`/`upload` pairs, so chart consumers never
//! have to guess which keys a record carries.
//!
//! [`TelemetryBuffer<NetworkThroughput>`]: crate::TelemetryBuffer

use serde::{Deserialize, Serialize};

/// A fixed, explicitly declared set of named numeric metrics.
pub trait MetricSet: Clone + Send + Sync + 'static {
    /// Schema identifier (e.g. `"network"`).
    const SCHEMA: &'static str;
    /// Metric names, in the order returned by [`values`](Self::values).
    const NAMES: &'static [&'static str];

    /// Metric values in [`NAMES`](Self::NAMES) order.
    fn values(&self) -> Vec<f64>;

    /// Look up one metric by name.
    fn value(&self, name: &str) -> Option<f64> {
        let idx = Self::NAMES.iter().position(|n| *n == name)?;
        self.values().get(idx).copied()
    }
}

/// One observation: a millisecond Unix timestamp and a metric set.
///
/// Serializes flat, e.g. `{"timestamp": 1700000000000, "download": 1.5, "upload": 0.2}`,
/// which is the record shape chart libraries expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample<M> {
    #[serde(rename = "timestamp")]
    timestamp_ms: u64,
    #[serde(flatten)]
    metrics: M,
}

impl<M: MetricSet> Sample<M> {
    pub fn new(timestamp_ms: u64, metrics: M) -> Self {
        Self {
            timestamp_ms,
            metrics,
        }
    }

    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Shorthand for `self.metrics().value(name)`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.metrics.value(name)
    }
}

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

/// A single unnamed reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Gauge {
    pub value: f64,
}

impl MetricSet for Gauge {
    const SCHEMA: &'static str = "gauge";
    const NAMES: &'static [&'static str] = &["value"];

    fn values(&self) -> Vec<f64> {
        vec![self.value]
    }
}

/// CPU busy percentage and used memory.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemLoad {
    /// CPU busy time over the last interval, 0–100.
    pub cpu_load: f64,
    /// Used memory in GiB (`MemTotal - MemAvailable`).
    pub mem_used: f64,
}

impl MetricSet for SystemLoad {
    const SCHEMA: &'static str = "system";
    const NAMES: &'static [&'static str] = &["cpu_load", "mem_used"];

    fn values(&self) -> Vec<f64> {
        vec![self.cpu_load, self.mem_used]
    }
}

/// Network throughput in MB/s across non-loopback interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkThroughput {
    pub download: f64,
    pub upload: f64,
}

impl MetricSet for NetworkThroughput {
    const SCHEMA: &'static str = "network";
    const NAMES: &'static [&'static str] = &["download", "upload"];

    fn values(&self) -> Vec<f64> {
        vec![self.download, self.upload]
    }
}

/// Disk throughput in MB/s plus completed I/O operations per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiskThroughput {
    pub read: f64,
    pub write: f64,
    pub iops: f64,
}

impl MetricSet for DiskThroughput {
    const SCHEMA: &'static str = "disk";
    const NAMES: &'static [&'static str] = &["read", "write", "iops"];

    fn values(&self) -> Vec<f64> {
        vec![self.read, self.write, self.iops]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_serializes_flat() {
        let s = Sample::new(
            1_700_000_000_000,
            NetworkThroughput {
                download: 1.5,
                upload: 0.25,
            },
        );
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"timestamp": 1_700_000_000_000u64, "download": 1.5, "upload": 0.25})
        );
    }

    #[test]
    fn sample_deserializes_flat() {
        let s: Sample<DiskThroughput> =
            serde_json::from_str(r#"{"timestamp":5,"read":1.0,"write":2.0,"iops":30.0}"#).unwrap();
        assert_eq!(s.timestamp_ms(), 5);
        assert_eq!(s.metrics().iops, 30.0);
    }

    #[test]
    fn value_lookup_by_name() {
        let s = Sample::new(
            1,
            DiskThroughput {
                read: 400.0,
                write: 300.0,
                iops: 2000.0,
            },
        );
        assert_eq!(s.value("write"), Some(300.0));
        assert_eq!(s.value("download"), None);
    }

    #[test]
    fn names_match_values_width() {
        assert_eq!(Gauge::NAMES.len(), Gauge::default().values().len());
        assert_eq!(SystemLoad::NAMES.len(), SystemLoad::default().values().len());
        assert_eq!(
            NetworkThroughput::NAMES.len(),
            NetworkThroughput::default().values().len()
        );
        assert_eq!(
            DiskThroughput::NAMES.len(),
            DiskThroughput::default().values().len()
        );
    }
}
