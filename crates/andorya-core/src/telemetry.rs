//! Host telemetry readers for Linux procfs/sysfs.
//!
//! Everything here is best-effort and unprivileged:
//! - values are read from user-space-visible files only,
//! - counters are turned into rates by diffing consecutive reads,
//! - a counter that goes backwards (reset, wrap, hot-unplug) yields a zero
//!   rate for that tick instead of a negative one.
//!
//! The parsers take file contents as `&str` so they can be tested on fixture
//! text; the sources and [`collect_host_stats`] do the actual file I/O.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::collector::SampleSource;
use crate::error::SourceError;
use crate::sample::{DiskThroughput, NetworkThroughput, SystemLoad};

const BYTES_PER_SECTOR: f64 = 512.0;
const BYTES_PER_MB: f64 = 1_000_000.0;
const KIB_PER_GIB: f64 = 1024.0 * 1024.0;
/// Reported when no thermal sensor is readable.
pub const FALLBACK_CPU_TEMP_C: f64 = 40.0;

/// Filesystem roots for procfs and sysfs. Overridable for tests and containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub proc_root: PathBuf,
    pub sys_root: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
        }
    }
}

impl HostPaths {
    fn read_proc(&self, rel: &str) -> Result<String, SourceError> {
        read_host_file(&self.proc_root.join(rel))
    }
}

fn read_host_file(path: &Path) -> Result<String, SourceError> {
    match std::fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound && !cfg!(target_os = "linux") => {
            Err(SourceError::Unsupported("procfs host metrics require Linux"))
        }
        Err(e) => Err(SourceError::Io(e)),
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let v = raw.trim();
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn read_first_f64(path: &Path) -> Option<f64> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| s.split_whitespace().next().and_then(|v| v.parse().ok()))
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

/// Aggregate CPU time from the `cpu ` line of `/proc/stat`, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTimes {
    pub busy: u64,
    pub total: u64,
}

pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let rest = stat.lines().find_map(|l| l.strip_prefix("cpu "))?;
    let parts: Vec<u64> = rest
        .split_whitespace()
        .filter_map(|s| s.parse::<u64>().ok())
        .collect();
    if parts.len() < 4 {
        return None;
    }
    let field = |i: usize| parts.get(i).copied().unwrap_or(0);
    // user nice system idle iowait irq softirq steal; guest time is already
    // folded into user/nice by the kernel.
    let idle = field(3) + field(4);
    let busy = field(0) + field(1) + field(2) + field(5) + field(6) + field(7);
    Some(CpuTimes {
        busy,
        total: busy + idle,
    })
}

/// CPU busy percentage between two `/proc/stat` readings.
pub fn cpu_busy_percent(prev: CpuTimes, curr: CpuTimes) -> f64 {
    if curr.total <= prev.total || curr.busy < prev.busy {
        return 0.0;
    }
    let total = (curr.total - prev.total) as f64;
    let busy = (curr.busy - prev.busy) as f64;
    (busy / total * 100.0).clamp(0.0, 100.0)
}

/// Memory figures from `/proc/meminfo`, in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemInfo {
    pub total_kib: u64,
    pub available_kib: u64,
}

impl MemInfo {
    pub fn used_gib(&self) -> f64 {
        self.total_kib.saturating_sub(self.available_kib) as f64 / KIB_PER_GIB
    }

    pub fn total_gib(&self) -> f64 {
        self.total_kib as f64 / KIB_PER_GIB
    }
}

pub fn parse_meminfo(raw: &str) -> Option<MemInfo> {
    let mut total = None;
    let mut available = None;
    let mut free = 0;
    let mut buffers = 0;
    let mut cached = 0;
    for line in raw.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        else {
            continue;
        };
        match key {
            "MemTotal" => total = Some(value),
            "MemAvailable" => available = Some(value),
            "MemFree" => free = value,
            "Buffers" => buffers = value,
            "Cached" => cached = value,
            _ => {}
        }
    }
    // Kernels before 3.14 have no MemAvailable.
    let total_kib = total?;
    Some(MemInfo {
        total_kib,
        available_kib: available.unwrap_or(free + buffers + cached),
    })
}

/// Byte counters summed over all non-loopback interfaces in `/proc/net/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

pub fn parse_net_dev(raw: &str) -> Option<NetCounters> {
    let mut counters = NetCounters::default();
    let mut seen = false;
    for line in raw.lines().skip(2) {
        let Some((iface, stats)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<u64> = stats
            .split_whitespace()
            .filter_map(|s| s.parse::<u64>().ok())
            .collect();
        if fields.len() < 16 {
            continue;
        }
        seen = true;
        counters.rx_bytes += fields[0];
        counters.tx_bytes += fields[8];
    }
    seen.then_some(counters)
}

/// Whole-disk I/O counters summed from `/proc/diskstats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskCounters {
    pub read_ios: u64,
    pub read_sectors: u64,
    pub write_ios: u64,
    pub write_sectors: u64,
}

/// Whether a block device name is a whole physical disk rather than a
/// partition, loop device, device-mapper target or optical drive.
pub fn is_likely_disk_device(name: &str) -> bool {
    const VIRTUAL_PREFIXES: [&str; 8] = ["loop", "ram", "dm-", "md", "zram", "sr", "fd", "nbd"];
    if VIRTUAL_PREFIXES.iter().any(|p| name.starts_with(p)) {
        return false;
    }
    if name.starts_with("nvme") || name.starts_with("mmcblk") {
        return !name.contains('p');
    }
    !name.chars().last().is_some_and(|c| c.is_ascii_digit())
}

pub fn parse_diskstats(raw: &str) -> Option<DiskCounters> {
    let mut counters = DiskCounters::default();
    let mut seen = false;
    for line in raw.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 || !is_likely_disk_device(parts[2]) {
            continue;
        }
        let parsed: Vec<u64> = parts[3..14]
            .iter()
            .filter_map(|v| v.parse::<u64>().ok())
            .collect();
        if parsed.len() < 11 {
            continue;
        }
        seen = true;
        counters.read_ios += parsed[0];
        counters.read_sectors += parsed[2];
        counters.write_ios += parsed[4];
        counters.write_sectors += parsed[6];
    }
    seen.then_some(counters)
}

/// Per-second rate of a monotonically increasing counter.
pub fn counter_rate(prev: u64, curr: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 || curr < prev {
        return 0.0;
    }
    (curr - prev) as f64 / secs
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// CPU busy % and used memory. The first fetch reports 0% CPU.
#[derive(Debug, Default)]
pub struct HostSystemSource {
    paths: HostPaths,
    prev_cpu: Option<CpuTimes>,
}

impl HostSystemSource {
    pub fn new(paths: HostPaths) -> Self {
        Self {
            paths,
            prev_cpu: None,
        }
    }
}

impl SampleSource<SystemLoad> for HostSystemSource {
    fn name(&self) -> &str {
        "procfs_system"
    }

    fn fetch(&mut self) -> Result<SystemLoad, SourceError> {
        let cpu = parse_cpu_times(&self.paths.read_proc("stat")?)
            .ok_or_else(|| SourceError::Parse("no cpu line in /proc/stat".into()))?;
        let mem = parse_meminfo(&self.paths.read_proc("meminfo")?)
            .ok_or_else(|| SourceError::Parse("no MemTotal in /proc/meminfo".into()))?;
        let cpu_load = self
            .prev_cpu
            .replace(cpu)
            .map_or(0.0, |prev| cpu_busy_percent(prev, cpu));
        Ok(SystemLoad {
            cpu_load,
            mem_used: mem.used_gib(),
        })
    }
}

/// Non-loopback network throughput in MB/s. The first fetch primes the baseline.
#[derive(Debug, Default)]
pub struct HostNetworkSource {
    paths: HostPaths,
    prev: Option<(NetCounters, Instant)>,
}

impl HostNetworkSource {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths, prev: None }
    }
}

impl SampleSource<NetworkThroughput> for HostNetworkSource {
    fn name(&self) -> &str {
        "procfs_netdev"
    }

    fn fetch(&mut self) -> Result<NetworkThroughput, SourceError> {
        let now = Instant::now();
        let curr = parse_net_dev(&self.paths.read_proc("net/dev")?)
            .ok_or_else(|| SourceError::Parse("no interfaces in /proc/net/dev".into()))?;
        let Some((prev, at)) = self.prev.replace((curr, now)) else {
            return Ok(NetworkThroughput::default());
        };
        let elapsed = now.duration_since(at);
        Ok(NetworkThroughput {
            download: counter_rate(prev.rx_bytes, curr.rx_bytes, elapsed) / BYTES_PER_MB,
            upload: counter_rate(prev.tx_bytes, curr.tx_bytes, elapsed) / BYTES_PER_MB,
        })
    }
}

/// Whole-disk throughput (MB/s) and IOPS. The first fetch primes the baseline.
#[derive(Debug, Default)]
pub struct HostDiskSource {
    paths: HostPaths,
    prev: Option<(DiskCounters, Instant)>,
}

impl HostDiskSource {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths, prev: None }
    }
}

impl SampleSource<DiskThroughput> for HostDiskSource {
    fn name(&self) -> &str {
        "procfs_diskstats"
    }

    fn fetch(&mut self) -> Result<DiskThroughput, SourceError> {
        let now = Instant::now();
        let curr = parse_diskstats(&self.paths.read_proc("diskstats")?)
            .ok_or_else(|| SourceError::Parse("no physical disks in /proc/diskstats".into()))?;
        let Some((prev, at)) = self.prev.replace((curr, now)) else {
            return Ok(DiskThroughput::default());
        };
        let elapsed = now.duration_since(at);
        let ios = counter_rate(prev.read_ios, curr.read_ios, elapsed)
            + counter_rate(prev.write_ios, curr.write_ios, elapsed);
        Ok(DiskThroughput {
            read: counter_rate(prev.read_sectors, curr.read_sectors, elapsed) * BYTES_PER_SECTOR
                / BYTES_PER_MB,
            write: counter_rate(prev.write_sectors, curr.write_sectors, elapsed)
                * BYTES_PER_SECTOR
                / BYTES_PER_MB,
            iops: ios,
        })
    }
}

// ---------------------------------------------------------------------------
// Point-in-time host stats
// ---------------------------------------------------------------------------

/// Live host figures for the dashboard header cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStats {
    /// CPU busy %, measured over the sampling window.
    pub cpu_load: f64,
    /// Hottest readable sensor in °C, or [`FALLBACK_CPU_TEMP_C`].
    pub cpu_temp: f64,
    /// Used memory, GiB.
    pub mem_used: f64,
    /// Total memory, GiB.
    pub mem_total: f64,
    /// Bytes/s received on non-loopback interfaces.
    pub net_download: f64,
    /// Bytes/s sent on non-loopback interfaces.
    pub net_upload: f64,
    /// Seconds since boot.
    pub uptime: f64,
    /// 1/5/15 minute load averages, when the platform reports them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<[f64; 3]>,
}

impl Default for HostStats {
    fn default() -> Self {
        Self {
            cpu_load: 0.0,
            cpu_temp: FALLBACK_CPU_TEMP_C,
            mem_used: 0.0,
            mem_total: 0.0,
            net_download: 0.0,
            net_upload: 0.0,
            uptime: 0.0,
            load_average: None,
        }
    }
}

fn collect_loadavg() -> Option<[f64; 3]> {
    #[cfg(unix)]
    {
        let mut values = [0.0_f64; 3];
        // SAFETY: `getloadavg` writes up to `n` doubles to a valid buffer.
        let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
        (n == 3).then_some(values)
    }
    #[cfg(not(unix))]
    {
        None
    }
}

/// Highest temperature across hwmon `temp*_input` files and thermal zones.
pub fn max_temperature_celsius(sys_root: &Path) -> Option<f64> {
    let mut readings = Vec::new();

    if let Ok(chips) = std::fs::read_dir(sys_root.join("class/hwmon")) {
        for chip in chips.flatten() {
            let Ok(files) = std::fs::read_dir(chip.path()) else {
                continue;
            };
            for file in files.flatten() {
                let fname = file.file_name().to_string_lossy().into_owned();
                if fname.starts_with("temp") && fname.ends_with("_input") {
                    readings.extend(read_first_f64(&file.path()));
                }
            }
        }
    }
    if let Ok(zones) = std::fs::read_dir(sys_root.join("class/thermal")) {
        for zone in zones.flatten() {
            if zone
                .file_name()
                .to_string_lossy()
                .starts_with("thermal_zone")
            {
                readings.extend(read_first_f64(&zone.path().join("temp")));
            }
        }
    }

    readings
        .into_iter()
        // Millidegrees; ignore sensors reporting nonsense.
        .map(|milli| milli / 1000.0)
        .filter(|c| c.is_finite() && *c > 0.0 && *c < 150.0)
        .reduce(f64::max)
}

/// Sample the host over `window` and build a [`HostStats`].
///
/// Blocks for `window` to measure CPU load and network rates. Missing files
/// leave the corresponding field at its default.
pub fn collect_host_stats(paths: &HostPaths, window: Duration) -> HostStats {
    let read = |rel: &str| paths.read_proc(rel).ok();

    let cpu_start = read("stat").as_deref().and_then(parse_cpu_times);
    let net_start = read("net/dev").as_deref().and_then(parse_net_dev);
    let started = Instant::now();
    std::thread::sleep(window);
    let cpu_end = read("stat").as_deref().and_then(parse_cpu_times);
    let net_end = read("net/dev").as_deref().and_then(parse_net_dev);
    let elapsed = started.elapsed();

    let mut stats = HostStats {
        load_average: collect_loadavg(),
        ..HostStats::default()
    };
    if let (Some(a), Some(b)) = (cpu_start, cpu_end) {
        stats.cpu_load = cpu_busy_percent(a, b);
    }
    if let (Some(a), Some(b)) = (net_start, net_end) {
        stats.net_download = counter_rate(a.rx_bytes, b.rx_bytes, elapsed);
        stats.net_upload = counter_rate(a.tx_bytes, b.tx_bytes, elapsed);
    }
    if let Some(mem) = read("meminfo").as_deref().and_then(parse_meminfo) {
        stats.mem_used = mem.used_gib();
        stats.mem_total = mem.total_gib();
    }
    if let Some(uptime) = read_first_f64(&paths.proc_root.join("uptime")) {
        stats.uptime = uptime;
    }
    if let Some(temp) = max_temperature_celsius(&paths.sys_root) {
        stats.cpu_temp = temp;
    }
    log::debug!(
        "host stats: cpu {:.1}% mem {:.1}/{:.1} GiB",
        stats.cpu_load,
        stats.mem_used,
        stats.mem_total
    );
    stats
}

/// Hostname from procfs, if readable.
pub fn hostname(paths: &HostPaths) -> Option<String> {
    read_trimmed(&paths.proc_root.join("sys/kernel/hostname"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const STAT: &str = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 50 0 25 400 25 0 0 0 0 0\nctxt 12345\n";
    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 5000      50    0    0    0     0          0         0     5000      50    0    0    0     0       0          0
  eth0: 1000000   900    0    0    0     0          0         0   250000     400    0    0    0     0       0          0
 wlan0: 500       5      0    0    0     0          0         0     100        1    0    0    0     0       0          0
";
    const DISKSTATS: &str = "\
   8       0 sda 1000 10 20000 500 2000 20 40000 900 0 1200 1400 0 0 0 0
   8       1 sda1 900 10 18000 450 1900 20 38000 850 0 1100 1300 0 0 0 0
   7       0 loop0 50 0 100 5 0 0 0 0 0 5 5 0 0 0 0
 259       0 nvme0n1 3000 0 60000 700 1000 0 8000 100 0 800 800 0 0 0 0
 259       1 nvme0n1p1 2900 0 59000 690 990 0 7900 99 0 790 790 0 0 0 0
";
    const MEMINFO: &str = "\
MemTotal:       16384000 kB
MemFree:         2000000 kB
MemAvailable:    8192000 kB
Buffers:          100000 kB
Cached:          3000000 kB
";

    #[test]
    fn parses_cpu_line() {
        let t = parse_cpu_times(STAT).unwrap();
        assert_eq!(t.busy, 150);
        assert_eq!(t.total, 1000);
        assert!(parse_cpu_times("intr 1 2 3\n").is_none());
    }

    #[test]
    fn cpu_percent_between_readings() {
        let a = CpuTimes {
            busy: 150,
            total: 1000,
        };
        let b = CpuTimes {
            busy: 200,
            total: 1200,
        };
        assert!((cpu_busy_percent(a, b) - 25.0).abs() < 1e-9);
        assert_eq!(cpu_busy_percent(b, a), 0.0);
        assert_eq!(cpu_busy_percent(a, a), 0.0);
    }

    #[test]
    fn net_dev_skips_loopback() {
        let c = parse_net_dev(NET_DEV).unwrap();
        assert_eq!(c.rx_bytes, 1_000_500);
        assert_eq!(c.tx_bytes, 250_100);
        assert!(parse_net_dev("header\nheader\n").is_none());
    }

    #[test]
    fn diskstats_counts_whole_disks_only() {
        let c = parse_diskstats(DISKSTATS).unwrap();
        assert_eq!(c.read_ios, 4000);
        assert_eq!(c.read_sectors, 80_000);
        assert_eq!(c.write_ios, 3000);
        assert_eq!(c.write_sectors, 48_000);
    }

    #[test]
    fn disk_device_classification() {
        assert!(is_likely_disk_device("sda"));
        assert!(is_likely_disk_device("nvme0n1"));
        assert!(is_likely_disk_device("mmcblk0"));
        assert!(!is_likely_disk_device("sda1"));
        assert!(!is_likely_disk_device("nvme0n1p2"));
        assert!(!is_likely_disk_device("loop3"));
        assert!(!is_likely_disk_device("dm-0"));
        assert!(!is_likely_disk_device("sr0"));
    }

    #[test]
    fn meminfo_used_memory() {
        let m = parse_meminfo(MEMINFO).unwrap();
        assert_eq!(m.total_kib, 16_384_000);
        assert_eq!(m.available_kib, 8_192_000);
        assert!((m.used_gib() - 8_192_000.0 / KIB_PER_GIB).abs() < 1e-9);
    }

    #[test]
    fn meminfo_without_available_falls_back() {
        let raw = "MemTotal: 1000 kB\nMemFree: 100 kB\nBuffers: 50 kB\nCached: 250 kB\n";
        assert_eq!(parse_meminfo(raw).unwrap().available_kib, 400);
        assert!(parse_meminfo("MemFree: 1 kB\n").is_none());
    }

    #[test]
    fn counter_rate_handles_reset() {
        let sec = Duration::from_secs(2);
        assert_eq!(counter_rate(100, 300, sec), 100.0);
        assert_eq!(counter_rate(300, 100, sec), 0.0);
        assert_eq!(counter_rate(0, 100, Duration::ZERO), 0.0);
    }

    fn fake_proc(dir: &Path, rx: u64, sectors: u64) {
        fs::create_dir_all(dir.join("net")).unwrap();
        fs::write(dir.join("stat"), STAT).unwrap();
        fs::write(dir.join("meminfo"), MEMINFO).unwrap();
        fs::write(
            dir.join("net/dev"),
            format!(
                "h\nh\n  eth0: {rx} 1 0 0 0 0 0 0 {rx} 1 0 0 0 0 0 0\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("diskstats"),
            format!("   8 0 sda 10 0 {sectors} 0 10 0 {sectors} 0 0 0 0\n"),
        )
        .unwrap();
    }

    #[test]
    fn network_source_primes_then_reports_rates() {
        let tmp = tempfile::tempdir().unwrap();
        fake_proc(tmp.path(), 0, 0);
        let mut source = HostNetworkSource::new(HostPaths {
            proc_root: tmp.path().to_path_buf(),
            sys_root: tmp.path().join("sys"),
        });
        assert_eq!(source.fetch().unwrap(), NetworkThroughput::default());
        std::thread::sleep(Duration::from_millis(20));
        fake_proc(tmp.path(), 10_000_000, 0);
        let rate = source.fetch().unwrap();
        assert!(rate.download > 0.0);
        assert!((rate.download - rate.upload).abs() < 1e-9);
    }

    #[test]
    fn disk_source_reports_zero_after_counter_reset() {
        let tmp = tempfile::tempdir().unwrap();
        fake_proc(tmp.path(), 0, 1_000_000);
        let mut source = HostDiskSource::new(HostPaths {
            proc_root: tmp.path().to_path_buf(),
            sys_root: tmp.path().join("sys"),
        });
        source.fetch().unwrap();
        std::thread::sleep(Duration::from_millis(5));
        fake_proc(tmp.path(), 0, 10);
        let d = source.fetch().unwrap();
        assert_eq!(d.read, 0.0);
        assert_eq!(d.write, 0.0);
    }

    #[test]
    fn system_source_reads_memory() {
        let tmp = tempfile::tempdir().unwrap();
        fake_proc(tmp.path(), 0, 0);
        let mut source = HostSystemSource::new(HostPaths {
            proc_root: tmp.path().to_path_buf(),
            sys_root: tmp.path().join("sys"),
        });
        let load = source.fetch().unwrap();
        assert_eq!(load.cpu_load, 0.0);
        assert!(load.mem_used > 7.0 && load.mem_used < 8.0);
    }

    #[test]
    fn missing_files_are_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let mut source = HostSystemSource::new(HostPaths {
            proc_root: tmp.path().join("nope"),
            sys_root: tmp.path().join("nope"),
        });
        assert!(source.fetch().is_err());
    }

    #[test]
    fn temperature_picks_hottest_sensor() {
        let tmp = tempfile::tempdir().unwrap();
        let hwmon = tmp.path().join("class/hwmon/hwmon0");
        let zone = tmp.path().join("class/thermal/thermal_zone0");
        fs::create_dir_all(&hwmon).unwrap();
        fs::create_dir_all(&zone).unwrap();
        fs::write(hwmon.join("temp1_input"), "45000\n").unwrap();
        fs::write(hwmon.join("fan1_input"), "1200\n").unwrap();
        fs::write(zone.join("temp"), "52500\n").unwrap();
        assert_eq!(max_temperature_celsius(tmp.path()), Some(52.5));
        assert_eq!(max_temperature_celsius(&tmp.path().join("none")), None);
    }

    #[test]
    fn host_stats_from_fixture() {
        let tmp = tempfile::tempdir().unwrap();
        fake_proc(tmp.path(), 0, 0);
        fs::write(tmp.path().join("uptime"), "3600.50 7000.00\n").unwrap();
        let stats = collect_host_stats(
            &HostPaths {
                proc_root: tmp.path().to_path_buf(),
                sys_root: tmp.path().join("sys"),
            },
            Duration::from_millis(1),
        );
        assert_eq!(stats.uptime, 3600.5);
        assert_eq!(stats.cpu_temp, FALLBACK_CPU_TEMP_C);
        assert!((stats.mem_total - 16_384_000.0 / KIB_PER_GIB).abs() < 1e-9);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("cpuLoad").is_some());
        assert!(json.get("memTotal").is_some());
    }
}
