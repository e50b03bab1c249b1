pub mod monitor;
pub mod serve;
pub mod stats;
pub mod watch;

use std::path::PathBuf;
use std::time::Duration;

use andorya_core::{HostPaths, Window};

/// Parse a window flag, exiting with a usage error when it is malformed.
pub fn parse_window(raw: &str, flag: &str) -> Window {
    match raw.parse::<Window>() {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: --{flag}: {e}");
            std::process::exit(2);
        }
    }
}

/// Clap parser for counts that must be at least 1 (`--points`, `--capacity`).
pub fn positive_count() -> clap::builder::RangedU64ValueParser<usize> {
    clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
}

/// Convert an interval flag in seconds, rejecting zero, negative and NaN.
pub fn parse_interval(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        eprintln!("Error: --interval must be a positive number of seconds, got {secs}");
        std::process::exit(2);
    }
    Duration::from_secs_f64(secs)
}

pub fn host_paths(proc_root: &str, sys_root: &str) -> HostPaths {
    HostPaths {
        proc_root: PathBuf::from(proc_root),
        sys_root: PathBuf::from(sys_root),
    }
}

/// Pretty-print `value` as JSON to `path`, reporting the outcome on stdout/stderr.
pub fn write_json<T: serde::Serialize>(value: &T, path: &str, label: &str) {
    let result = serde_json::to_string_pretty(value)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(path, json));
    match result {
        Ok(()) => println!("{label} written to {path}"),
        Err(e) => {
            eprintln!("Error: failed to write {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Binary-prefixed byte count, e.g. `12.50MiB`.
pub fn format_bytes(value: f64) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let mut v = value.abs();
    let units = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];
    let mut idx = 0usize;
    while v >= 1024.0 && idx < units.len() - 1 {
        v /= 1024.0;
        idx += 1;
    }
    format!("{sign}{v:.2}{}", units[idx])
}

/// `3d 04:12:09` style uptime.
pub fn format_uptime(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let days = total / 86_400;
    let h = (total % 86_400) / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if days > 0 {
        format!("{days}d {h:02}:{m:02}:{s:02}")
    } else {
        format!("{h:02}:{m:02}:{s:02}")
    }
}

/// Unit suffix for a metric name, as charted.
pub fn metric_unit(name: &str) -> &'static str {
    match name {
        "cpu_load" => "%",
        "mem_used" => "GiB",
        "download" | "upload" | "read" | "write" => "MB/s",
        "iops" => "IOPS",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_use_binary_prefixes() {
        assert_eq!(format_bytes(512.0), "512.00B");
        assert_eq!(format_bytes(1536.0), "1.50KiB");
        assert_eq!(format_bytes(3.0 * 1024.0 * 1024.0 * 1024.0), "3.00GiB");
    }

    #[test]
    fn uptime_formats_days() {
        assert_eq!(format_uptime(59.9), "00:00:59");
        assert_eq!(format_uptime(90_061.0), "1d 01:01:01");
    }

    #[test]
    fn units_cover_every_schema_metric() {
        use andorya_core::{DiskThroughput, MetricSet, NetworkThroughput, SystemLoad};
        for name in SystemLoad::NAMES
            .iter()
            .chain(NetworkThroughput::NAMES)
            .chain(DiskThroughput::NAMES)
        {
            assert!(!metric_unit(name).is_empty(), "{name}");
        }
    }
}
