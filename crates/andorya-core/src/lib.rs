//! # andorya-core
//!
//! Bounded telemetry history for a NAS dashboard.
//!
//! A collector polls a source (procfs counters, or synthetic demo data) on a
//! fixed interval and records timestamped samples into a capacity-bounded
//! buffer. Readers pull a time window and downsample it to a fixed number of
//! chart points.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use andorya_core::{Collector, DiskThroughput, SharedBuffer, SyntheticSource, Window};
//!
//! let buffer = SharedBuffer::<DiskThroughput>::new(10_080).unwrap();
//! let handle = Collector::new("disk", Duration::from_secs(3))
//!     .spawn(SyntheticSource::new(), buffer.clone())
//!     .unwrap();
//!
//! let since = Window::Hour.since(andorya_core::unix_ms_now());
//! let points = buffer.render(since, 60).unwrap();
//! println!("{} chart points", points.len());
//!
//! handle.stop();
//! ```
//!
//! ## Architecture
//!
//! Source → Collector (thread) → SharedBuffer → query/downsample → chart
//!
//! Each buffer is typed by its metric schema ([`SystemLoad`],
//! [`NetworkThroughput`], [`DiskThroughput`]), so a chart never has to guess
//! which fields a record carries.

pub mod buffer;
pub mod collector;
pub mod error;
pub mod inventory;
pub mod sample;
pub mod synthetic;
pub mod telemetry;
pub mod window;

pub use buffer::{SharedBuffer, TelemetryBuffer, downsample};
pub use collector::{Collector, CollectorHandle, SampleSource};
pub use error::{SourceError, TelemetryError};
pub use inventory::{
    DiskKind, DiskStatus, Share, StorageDisk, User, list_disks, parse_passwd_users,
    parse_smb_shares, read_smb_shares, read_users,
};
pub use sample::{DiskThroughput, Gauge, MetricSet, NetworkThroughput, Sample, SystemLoad};
pub use synthetic::{Synthesize, SyntheticSource};
pub use telemetry::{
    HostDiskSource, HostNetworkSource, HostPaths, HostStats, HostSystemSource,
    collect_host_stats,
};
pub use window::{Window, unix_ms_now};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
