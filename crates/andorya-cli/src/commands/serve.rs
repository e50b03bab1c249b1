use std::path::PathBuf;

use andorya_agent::{AgentConfig, DEFAULT_POINTS, MAX_POINTS};

pub struct ServeCommandConfig<'a> {
    pub host: &'a str,
    pub port: u16,
    pub interval_secs: f64,
    pub capacity: usize,
    pub synthetic: bool,
    pub proc_root: &'a str,
    pub sys_root: &'a str,
    pub smb_conf: &'a str,
    pub passwd: &'a str,
}

pub fn run(cmd: ServeCommandConfig<'_>) {
    let config = AgentConfig {
        host: cmd.host.to_string(),
        port: cmd.port,
        interval: super::parse_interval(cmd.interval_secs),
        capacity: cmd.capacity,
        synthetic: cmd.synthetic,
        paths: super::host_paths(cmd.proc_root, cmd.sys_root),
        smb_conf: PathBuf::from(cmd.smb_conf),
        passwd: PathBuf::from(cmd.passwd),
        ..AgentConfig::default()
    };

    let shown_host = if cmd.host == "0.0.0.0" { "localhost" } else { cmd.host };
    let base = format!("http://{shown_host}:{}", cmd.port);
    let source = if cmd.synthetic { "synthetic demo data" } else { "procfs" };

    println!("Andorya agent v{}", andorya_core::VERSION);
    println!("   {base}");
    println!(
        "   collecting {source} every {:.1}s, keeping {} samples per stream (~{})",
        config.interval.as_secs_f64(),
        config.capacity,
        super::format_uptime(config.retained_span().as_secs_f64())
    );
    println!();
    println!("   Endpoints:");
    println!("     GET /                        API index (try: curl {base})");
    println!("     GET /api/health              Liveness and agent uptime");
    println!("     GET /api/stats               Live host stats");
    println!("     GET /api/history/{{stream}}    system | network | disk");
    println!("     GET /api/disks               Physical disks");
    println!("     GET /api/shares              Samba shares");
    println!("     GET /api/users               Local users");
    println!();
    println!("   Query params for /api/history:");
    println!("     range=1h|6h|24h|7d           Lookback window (default: 1h)");
    println!("     points=N                     Chart points (1-{MAX_POINTS}, default: {DEFAULT_POINTS})");
    println!();
    println!("   Examples:");
    println!("     curl {base}/api/history/disk?range=24h");
    println!("     curl {base}/api/stats");
    println!();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(andorya_agent::run_agent(config)) {
        eprintln!("Error: agent failed: {e}");
        std::process::exit(1);
    }
}
