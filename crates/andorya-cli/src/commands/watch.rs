//! Headless collection of one stream, printed as it arrives.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use andorya_core::{
    Collector, DiskThroughput, HostDiskSource, HostNetworkSource, HostSystemSource, MetricSet,
    NetworkThroughput, Sample, SampleSource, SharedBuffer, SyntheticSource, SystemLoad, Window,
};
use serde::Serialize;

/// Per-metric min/mean/max over a set of samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub name: &'static str,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

pub fn summarize<M: MetricSet>(samples: &[Sample<M>]) -> Vec<MetricSummary> {
    if samples.is_empty() {
        return Vec::new();
    }
    M::NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<f64> = samples
                .iter()
                .map(|s| s.metrics().values()[idx])
                .collect();
            MetricSummary {
                name: *name,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect()
}

/// `HH:MM:SS` (UTC) for a millisecond timestamp.
fn format_clock(ts_ms: u64) -> String {
    let secs = (ts_ms / 1000) % 86_400;
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Samples needed to hold `limit` of history at `interval`.
fn capacity_for(limit: Duration, interval: Duration) -> usize {
    let interval_ms = interval.as_millis().max(1);
    let samples = limit.as_millis().div_ceil(interval_ms).max(1);
    usize::try_from(samples).unwrap_or(usize::MAX)
}

#[derive(Serialize)]
struct WatchReport<M> {
    stream: &'static str,
    collected: usize,
    summary: Vec<MetricSummary>,
    samples: Vec<Sample<M>>,
}

struct WatchConfig<'a> {
    stream: &'static str,
    interval: Duration,
    limit: Option<Duration>,
    points: usize,
    output: Option<&'a str>,
}

fn watch<M: MetricSet + Serialize>(cfg: WatchConfig<'_>, source: Box<dyn SampleSource<M>>) {
    // Without --duration keep one day; older samples roll off.
    let retained = cfg.limit.unwrap_or(Window::Day.duration());
    let buffer = match SharedBuffer::<M>::new(capacity_for(retained, cfg.interval)) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("could not install Ctrl+C handler: {e}");
    }

    let source_name = source.name().to_string();
    let handle = match Collector::new(cfg.stream, cfg.interval).spawn(source, buffer.clone()) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error: failed to start collector: {e}");
            std::process::exit(1);
        }
    };

    println!(
        "Watching {} ({source_name}) every {:.1}s. Press Ctrl+C to stop.",
        cfg.stream,
        cfg.interval.as_secs_f64()
    );
    let header: Vec<String> = M::NAMES
        .iter()
        .map(|n| format!("{:>12}", format!("{n} ({})", super::metric_unit(n))))
        .collect();
    println!("{:<10}{}", "time UTC", header.join(""));

    let started = Instant::now();
    let mut printed = 0u64;
    while running.load(Ordering::SeqCst) && cfg.limit.is_none_or(|l| started.elapsed() < l) {
        std::thread::sleep(Duration::from_millis(50));
        let ticks = handle.ticks();
        if ticks == printed {
            continue;
        }
        printed = ticks;
        if let Some(sample) = buffer.latest() {
            let cols: Vec<String> = sample
                .metrics()
                .values()
                .iter()
                .map(|v| format!("{v:>12.2}"))
                .collect();
            println!("{:<10}{}", format_clock(sample.timestamp_ms()), cols.join(""));
        }
    }

    if !handle.stop() {
        log::warn!("collector for {} exited abnormally", cfg.stream);
    }

    let all = buffer.snapshot_since(0);
    let summary = summarize(&all);
    println!("\n{:=<60}", "");
    println!("{} samples collected", all.len());
    for m in &summary {
        println!(
            "  {:<10} min {:>10.2}  mean {:>10.2}  max {:>10.2}",
            m.name, m.min, m.mean, m.max
        );
    }

    if let Some(path) = cfg.output {
        let samples = match buffer.render(0, cfg.points) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error: --points: {e}");
                std::process::exit(2);
            }
        };
        let report = WatchReport {
            stream: cfg.stream,
            collected: all.len(),
            summary,
            samples,
        };
        super::write_json(&report, path, "History");
    }
}

pub fn run(
    stream: &str,
    interval_secs: f64,
    duration: Option<&str>,
    points: usize,
    synthetic: bool,
    output: Option<&str>,
) {
    let interval = super::parse_interval(interval_secs);
    let limit = duration.map(|d| super::parse_window(d, "duration").duration());
    let cfg = |stream: &'static str| WatchConfig {
        stream,
        interval,
        limit,
        points,
        output,
    };

    match stream {
        "system" => {
            let source: Box<dyn SampleSource<SystemLoad>> = if synthetic {
                Box::new(SyntheticSource::new())
            } else {
                Box::new(HostSystemSource::default())
            };
            watch(cfg("system"), source);
        }
        "network" => {
            let source: Box<dyn SampleSource<NetworkThroughput>> = if synthetic {
                Box::new(SyntheticSource::new())
            } else {
                Box::new(HostNetworkSource::default())
            };
            watch(cfg("network"), source);
        }
        "disk" => {
            let source: Box<dyn SampleSource<DiskThroughput>> = if synthetic {
                Box::new(SyntheticSource::new())
            } else {
                Box::new(HostDiskSource::default())
            };
            watch(cfg("disk"), source);
        }
        other => {
            eprintln!("Error: unknown stream '{other}': expected system, network or disk");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_per_metric() {
        let samples = vec![
            Sample::new(
                1,
                NetworkThroughput {
                    download: 1.0,
                    upload: 10.0,
                },
            ),
            Sample::new(
                2,
                NetworkThroughput {
                    download: 3.0,
                    upload: 20.0,
                },
            ),
        ];
        let s = summarize(&samples);
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].name, "download");
        assert_eq!((s[0].min, s[0].mean, s[0].max), (1.0, 2.0, 3.0));
        assert_eq!((s[1].min, s[1].mean, s[1].max), (10.0, 15.0, 20.0));
        assert!(summarize::<NetworkThroughput>(&[]).is_empty());
    }

    #[test]
    fn clock_wraps_daily() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(86_400_000 + 3_723_000), "01:02:03");
    }

    #[test]
    fn capacity_rounds_up() {
        assert_eq!(capacity_for(Duration::from_secs(10), Duration::from_secs(3)), 4);
        assert_eq!(capacity_for(Duration::from_secs(1), Duration::from_secs(5)), 1);
    }
}
