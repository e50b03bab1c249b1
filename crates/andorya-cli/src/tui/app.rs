//! TUI application state and event loop.
//!
//! Design: one collector per stream runs on its own thread for the whole
//! session, feeding a bounded buffer. The UI only reads: every frame it pulls
//! the selected window from the selected stream's buffer and downsamples it to
//! the chart width. Host stats for the side panel are refreshed on a
//! background thread so the UI never blocks on the sampling window.

use std::io;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use andorya_core::{
    Collector, CollectorHandle, DiskThroughput, HostDiskSource, HostNetworkSource, HostPaths,
    HostStats, HostSystemSource, MetricSet, NetworkThroughput, Sample, SampleSource,
    SharedBuffer, SyntheticSource, SystemLoad, TelemetryError, Window, collect_host_stats,
    unix_ms_now,
};

// ---------------------------------------------------------------------------
// Stream
// ---------------------------------------------------------------------------

/// Which buffer the chart reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stream {
    #[default]
    Disk,
    Network,
    System,
}

impl Stream {
    pub fn next(self) -> Self {
        match self {
            Self::Disk => Self::Network,
            Self::Network => Self::System,
            Self::System => Self::Disk,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disk => "Disk",
            Self::Network => "Network",
            Self::System => "System",
        }
    }

    /// Metric names charted for this stream.
    pub fn metrics(self) -> &'static [&'static str] {
        match self {
            Self::Disk => DiskThroughput::NAMES,
            Self::Network => NetworkThroughput::NAMES,
            Self::System => SystemLoad::NAMES,
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Chart point counts the user can cycle through.
pub const POINT_COUNTS: [usize; 5] = [30, 60, 120, 240, 480];

/// How often the side panel's host stats are refreshed.
const STATS_REFRESH: Duration = Duration::from_secs(2);

/// Sampling window for the side panel's CPU and network rates.
const STATS_WINDOW: Duration = Duration::from_millis(200);

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Monitor settings, filled from `andorya monitor` flags.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub interval: Duration,
    pub window: Window,
    pub points: usize,
    pub synthetic: bool,
    pub paths: HostPaths,
    /// Longest window the buffers can serve; `w` skips presets beyond it.
    pub retention: Window,
    /// Where `e` writes chart exports.
    pub export_dir: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            window: Window::Hour,
            points: 60,
            synthetic: false,
            paths: HostPaths::default(),
            retention: Window::Day,
            export_dir: PathBuf::from("."),
        }
    }
}

impl MonitorConfig {
    fn capacity(&self) -> usize {
        let interval_ms = self.interval.as_millis().max(1);
        let samples = self.retention.duration().as_millis().div_ceil(interval_ms).max(1);
        usize::try_from(samples).unwrap_or(usize::MAX)
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// One charted series: `(minutes relative to now, value)` points.
pub struct Series {
    pub name: &'static str,
    pub points: Vec<(f64, f64)>,
    pub latest: Option<f64>,
}

/// Turn samples into one series per metric, x in minutes before `now_ms`.
pub fn chart_series<M: MetricSet>(samples: &[Sample<M>], now_ms: u64) -> Vec<Series> {
    M::NAMES
        .iter()
        .enumerate()
        .map(|(idx, &name)| {
            let points: Vec<(f64, f64)> = samples
                .iter()
                .map(|s| {
                    let age_min = now_ms.saturating_sub(s.timestamp_ms()) as f64 / 60_000.0;
                    (-age_min, s.metrics().values()[idx])
                })
                .collect();
            Series {
                name,
                latest: points.last().map(|p| p.1),
                points,
            }
        })
        .collect()
}

/// Y axis bounds with headroom; never collapses to a zero-height range.
pub fn y_bounds<'a>(series: impl IntoIterator<Item = &'a Series>) -> (f64, f64) {
    let (min, max) = series
        .into_iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let lo = if min >= 0.0 { 0.0 } else { min * 1.1 };
    let hi = (max * 1.1).max(lo + 1.0);
    (lo, hi)
}

// ---------------------------------------------------------------------------
// Snapshot: one consistent read for the UI frame
// ---------------------------------------------------------------------------

/// Everything the UI needs for one frame.
pub struct Snapshot {
    pub series: Vec<Series>,
    /// Samples in the window before downsampling.
    pub in_window: usize,
    pub buffered: usize,
    pub capacity: usize,
    pub stats: Option<HostStats>,
    pub stats_refreshing: bool,
}

struct SharedStats {
    latest: Option<HostStats>,
    refreshing: bool,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    config: MonitorConfig,
    system: SharedBuffer<SystemLoad>,
    network: SharedBuffer<NetworkThroughput>,
    disk: SharedBuffer<DiskThroughput>,
    collectors: Vec<CollectorHandle>,
    stats: Arc<Mutex<SharedStats>>,
    stats_flag: Arc<AtomicBool>,
    stream: Stream,
    window: Window,
    points: usize,
    /// Chart end time while paused; collectors keep recording underneath.
    frozen_at: Option<u64>,
    running: bool,
    last_export: Option<String>,
    export_error: Option<String>,
}

impl App {
    pub fn new(config: MonitorConfig) -> Result<Self, TelemetryError> {
        if config.points == 0 {
            return Err(TelemetryError::InvalidTargetCount);
        }
        let capacity = config.capacity();
        Ok(Self {
            system: SharedBuffer::new(capacity)?,
            network: SharedBuffer::new(capacity)?,
            disk: SharedBuffer::new(capacity)?,
            collectors: Vec::new(),
            stats: Arc::new(Mutex::new(SharedStats {
                latest: None,
                refreshing: false,
            })),
            stats_flag: Arc::new(AtomicBool::new(false)),
            stream: Stream::default(),
            window: config.window,
            points: config.points,
            frozen_at: None,
            running: true,
            last_export: None,
            export_error: None,
            config,
        })
    }

    fn start_collectors(&mut self) -> io::Result<()> {
        let cfg = &self.config;
        let (system, network, disk): (
            Box<dyn SampleSource<SystemLoad>>,
            Box<dyn SampleSource<NetworkThroughput>>,
            Box<dyn SampleSource<DiskThroughput>>,
        ) = if cfg.synthetic {
            (
                Box::new(SyntheticSource::new()),
                Box::new(SyntheticSource::new()),
                Box::new(SyntheticSource::new()),
            )
        } else {
            (
                Box::new(HostSystemSource::new(cfg.paths.clone())),
                Box::new(HostNetworkSource::new(cfg.paths.clone())),
                Box::new(HostDiskSource::new(cfg.paths.clone())),
            )
        };
        self.collectors = vec![
            Collector::new("system", cfg.interval).spawn(system, self.system.clone())?,
            Collector::new("network", cfg.interval).spawn(network, self.network.clone())?,
            Collector::new("disk", cfg.interval).spawn(disk, self.disk.clone())?,
        ];
        Ok(())
    }

    fn stop_collectors(&mut self) {
        for handle in self.collectors.drain(..) {
            handle.stop();
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        self.start_collectors()?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before printing a panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.stop_collectors();

        if let Some(path) = &self.last_export {
            println!("Last export: {path}");
        }

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        self.kick_stats();
        let mut last_stats = Instant::now();

        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(100))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if last_stats.elapsed() >= STATS_REFRESH {
                self.kick_stats();
                last_stats = Instant::now();
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Tab | KeyCode::Char('s') => self.stream = self.stream.next(),
            KeyCode::Char('w') => self.window = self.next_window(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Char(']') => {
                if let Some(&p) = POINT_COUNTS.iter().find(|&&p| p > self.points) {
                    self.points = p;
                }
            }
            KeyCode::Char('-') | KeyCode::Char('[') => {
                if let Some(&p) = POINT_COUNTS.iter().rev().find(|&&p| p < self.points) {
                    self.points = p;
                }
            }
            KeyCode::Char('p') => {
                self.frozen_at = match self.frozen_at {
                    Some(_) => None,
                    None => Some(unix_ms_now()),
                };
            }
            KeyCode::Char('e') => self.export_window(),
            _ => {}
        }
    }

    /// Next preset the buffers can actually fill.
    fn next_window(&self) -> Window {
        let limit = self.config.retention.minutes();
        let mut w = self.window.next();
        while w.minutes() > limit && w != Window::Hour {
            w = w.next();
        }
        w
    }

    fn kick_stats(&self) {
        if self.stats_flag.swap(true, Ordering::Relaxed) {
            return;
        }
        let shared = Arc::clone(&self.stats);
        let flag = Arc::clone(&self.stats_flag);
        let paths = self.config.paths.clone();

        if let Ok(mut s) = shared.lock() {
            s.refreshing = true;
        }
        thread::spawn(move || {
            let stats = collect_host_stats(&paths, STATS_WINDOW);
            if let Ok(mut s) = shared.lock() {
                s.latest = Some(stats);
                s.refreshing = false;
            }
            flag.store(false, Ordering::Relaxed);
        });
    }

    /// Write the current chart window, downsampled, as JSON.
    fn export_window(&mut self) {
        let now = self.chart_end();
        let since = self.window.since(now);
        let points = self.points();
        let samples = match self.stream {
            Stream::Disk => to_json(self.disk.render(since, points)),
            Stream::Network => to_json(self.network.render(since, points)),
            Stream::System => to_json(self.system.render(since, points)),
        };
        let samples = match samples {
            Ok(s) => s,
            Err(e) => {
                self.export_error = Some(e);
                return;
            }
        };
        let json = serde_json::json!({
            "stream": self.stream.label().to_lowercase(),
            "range": self.window.to_string(),
            "end": now,
            "samples": samples,
        });
        let path = self.config.export_dir.join(format!(
            "andorya-{}-{}.json",
            self.stream.label().to_lowercase(),
            now / 1000
        ));
        let written = serde_json::to_string_pretty(&json)
            .map_err(io::Error::other)
            .and_then(|contents| std::fs::write(&path, contents));
        match written {
            Ok(()) => {
                self.last_export = Some(path.display().to_string());
                self.export_error = None;
            }
            Err(e) => {
                log::warn!("export to {} failed: {e}", path.display());
                self.export_error = Some(format!("{}: {e}", path.display()));
            }
        }
    }

    fn chart_end(&self) -> u64 {
        self.frozen_at.unwrap_or_else(unix_ms_now)
    }

    // --- Public accessors ---

    pub fn stream(&self) -> Stream {
        self.stream
    }
    pub fn window(&self) -> Window {
        self.window
    }
    pub fn points(&self) -> usize {
        self.points
    }
    pub fn is_paused(&self) -> bool {
        self.frozen_at.is_some()
    }
    pub fn interval_secs(&self) -> f64 {
        self.config.interval.as_secs_f64()
    }
    pub fn is_synthetic(&self) -> bool {
        self.config.synthetic
    }
    pub fn last_export(&self) -> Option<&str> {
        self.last_export.as_deref()
    }
    pub fn export_error(&self) -> Option<&str> {
        self.export_error.as_deref()
    }

    /// Read the selected window of the selected stream and the latest host stats.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.chart_end();
        let since = self.window.since(now);
        let target = self.points();
        let (series, in_window, buffered, capacity) = match self.stream {
            Stream::Disk => window_series(&self.disk, since, now, target),
            Stream::Network => window_series(&self.network, since, now, target),
            Stream::System => window_series(&self.system, since, now, target),
        };

        let s = match self.stats.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Snapshot {
            series,
            in_window,
            buffered,
            capacity,
            stats: s.latest.clone(),
            stats_refreshing: s.refreshing,
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_collectors();
    }
}

fn to_json<M: MetricSet + serde::Serialize>(
    rendered: Result<Vec<Sample<M>>, TelemetryError>,
) -> Result<serde_json::Value, String> {
    let samples = rendered.map_err(|e| e.to_string())?;
    serde_json::to_value(samples).map_err(|e| e.to_string())
}

fn window_series<M: MetricSet>(
    buffer: &SharedBuffer<M>,
    since: u64,
    now: u64,
    target: usize,
) -> (Vec<Series>, usize, usize, usize) {
    let window = buffer.snapshot_since(since);
    // Samples recorded after a pause are not part of the frozen chart.
    let end = window.partition_point(|s| s.timestamp_ms() <= now);
    let in_window = &window[..end];
    let shown = andorya_core::downsample(in_window, target).unwrap_or_default();
    (
        chart_series(&shown, now),
        in_window.len(),
        buffer.len(),
        buffer.capacity(),
    )
}
