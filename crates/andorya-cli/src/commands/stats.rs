use std::time::Duration;

use andorya_core::{HostPaths, HostStats, collect_host_stats, telemetry::hostname};

pub fn print_stats(stats: &HostStats, host: Option<&str>) {
    println!("\n{:=<60}", "");
    println!("Host stats ({})", host.unwrap_or("unknown host"));
    println!("{:=<60}", "");
    println!("  cpu:      {:>6.1}%   temp {:.1}°C", stats.cpu_load, stats.cpu_temp);
    println!(
        "  memory:   {:>6.2} / {:.2} GiB",
        stats.mem_used, stats.mem_total
    );
    println!(
        "  network:  down {}/s   up {}/s",
        super::format_bytes(stats.net_download),
        super::format_bytes(stats.net_upload)
    );
    println!("  uptime:   {}", super::format_uptime(stats.uptime));
    match stats.load_average {
        Some([l1, l5, l15]) => println!("  loadavg:  1m {l1:.2}  5m {l5:.2}  15m {l15:.2}"),
        None => println!("  loadavg:  unavailable"),
    }
}

pub fn run(window_ms: u64, json: bool, output_path: Option<&str>) {
    let window = Duration::from_millis(window_ms.clamp(1, 60_000));
    let paths = HostPaths::default();
    let stats = collect_host_stats(&paths, window);

    if json {
        match serde_json::to_string_pretty(&stats) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print_stats(&stats, hostname(&paths).as_deref());
    }
    if let Some(path) = output_path {
        super::write_json(&stats, path, "Host stats");
    }
}
