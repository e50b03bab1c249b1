//! CLI for andorya: live telemetry for small NAS boxes.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "andorya")]
#[command(about = "Live telemetry and chart history for small NAS boxes")]
#[command(version = andorya_core::VERSION)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP agent backing the web dashboard
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Collector interval in seconds
        #[arg(long, default_value = "3.0")]
        interval: f64,

        /// Samples kept per stream before the oldest are evicted
        #[arg(long, default_value = "720", value_parser = commands::positive_count())]
        capacity: usize,

        /// Chart generated demo data instead of procfs counters
        #[arg(long)]
        synthetic: bool,

        /// procfs mount point
        #[arg(long, default_value = "/proc")]
        proc_root: String,

        /// sysfs mount point
        #[arg(long, default_value = "/sys")]
        sys_root: String,

        /// Samba configuration listing the shares
        #[arg(long, default_value = "/etc/samba/smb.conf")]
        smb_conf: String,

        /// Account database listing the users
        #[arg(long, default_value = "/etc/passwd")]
        passwd: String,
    },

    /// Live terminal dashboard (TUI)
    Monitor {
        /// Collector interval in seconds
        #[arg(long, default_value = "1.0")]
        interval: f64,

        /// Initial chart window (1h, 6h, 24h, 7d or e.g. 15m)
        #[arg(long, default_value = "1h")]
        window: String,

        /// Chart points per window
        #[arg(long, default_value = "60", value_parser = commands::positive_count())]
        points: usize,

        /// Chart generated demo data instead of procfs counters
        #[arg(long)]
        synthetic: bool,

        /// procfs mount point
        #[arg(long, default_value = "/proc")]
        proc_root: String,

        /// sysfs mount point
        #[arg(long, default_value = "/sys")]
        sys_root: String,
    },

    /// Print one host stats snapshot
    Stats {
        /// Sampling window for CPU and network rates, in milliseconds
        #[arg(long, default_value = "200")]
        window_ms: u64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Write JSON to path
        #[arg(long)]
        output: Option<String>,
    },

    /// Collect one stream headless and print samples as they arrive
    Watch {
        /// Stream to collect
        #[arg(long, default_value = "disk", value_parser = ["system", "network", "disk"])]
        stream: String,

        /// Collector interval in seconds
        #[arg(long, default_value = "1.0")]
        interval: f64,

        /// Stop after this long (e.g. 5m, 1h); default: until Ctrl+C
        #[arg(long)]
        duration: Option<String>,

        /// Chart points in the final summary
        #[arg(long, default_value = "60", value_parser = commands::positive_count())]
        points: usize,

        /// Chart generated demo data instead of procfs counters
        #[arg(long)]
        synthetic: bool,

        /// Write the downsampled history as JSON on exit
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Serve {
            port,
            host,
            interval,
            capacity,
            synthetic,
            proc_root,
            sys_root,
            smb_conf,
            passwd,
        } => commands::serve::run(commands::serve::ServeCommandConfig {
            host: &host,
            port,
            interval_secs: interval,
            capacity,
            synthetic,
            proc_root: &proc_root,
            sys_root: &sys_root,
            smb_conf: &smb_conf,
            passwd: &passwd,
        }),
        Commands::Monitor {
            interval,
            window,
            points,
            synthetic,
            proc_root,
            sys_root,
        } => commands::monitor::run(
            interval,
            &window,
            points,
            synthetic,
            &proc_root,
            &sys_root,
        ),
        Commands::Stats {
            window_ms,
            json,
            output,
        } => commands::stats::run(window_ms, json, output.as_deref()),
        Commands::Watch {
            stream,
            interval,
            duration,
            points,
            synthetic,
            output,
        } => commands::watch::run(
            &stream,
            interval,
            duration.as_deref(),
            points,
            synthetic,
            output.as_deref(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_counts_are_rejected_at_parse_time() {
        for args in [
            ["andorya", "watch", "--points", "0"],
            ["andorya", "monitor", "--points", "0"],
            ["andorya", "serve", "--capacity", "0"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn counts_parse_as_given() {
        let cli = Cli::try_parse_from(["andorya", "monitor", "--points", "100"]).unwrap();
        match cli.command {
            Commands::Monitor { points, .. } => assert_eq!(points, 100),
            _ => panic!("expected monitor"),
        }
        let cli = Cli::try_parse_from(["andorya", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { capacity, .. } => assert_eq!(capacity, 720),
            _ => panic!("expected serve"),
        }
    }
}
