//! HTTP agent for the Andorya NAS dashboard.
//!
//! Runs one background collector per metric stream (system, network, disk),
//! each feeding its own bounded [`SharedBuffer`], and serves:
//! - live host stats for the header cards,
//! - downsampled history windows for the charts,
//! - read-only inventory (disks, Samba shares, users).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use andorya_core::{
    Collector, CollectorHandle, DiskThroughput, HostDiskSource, HostNetworkSource, HostPaths,
    HostStats, HostSystemSource, MetricSet, NetworkThroughput, Sample, SampleSource, SharedBuffer,
    Share, StorageDisk, SyntheticSource, SystemLoad, TelemetryError, User, Window,
    collect_host_stats, list_disks, read_smb_shares, read_users, unix_ms_now,
};

/// Chart points returned when `?points=` is absent.
pub const DEFAULT_POINTS: usize = 60;
/// Upper bound for `?points=`.
pub const MAX_POINTS: usize = 1000;
/// Samples kept per stream on a stock install.
pub const DEFAULT_CAPACITY: usize = 720;

/// Agent settings. Filled from CLI flags; defaults match a stock install.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub host: String,
    pub port: u16,
    /// Collector tick interval.
    pub interval: Duration,
    /// Samples kept per stream; older samples are evicted first.
    pub capacity: usize,
    /// Feed charts with generated data instead of procfs.
    pub synthetic: bool,
    pub paths: HostPaths,
    pub smb_conf: PathBuf,
    pub passwd: PathBuf,
    /// Sampling window for `/api/stats` CPU and network rates.
    pub stats_window: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            interval: Duration::from_secs(3),
            capacity: DEFAULT_CAPACITY,
            synthetic: false,
            paths: HostPaths::default(),
            smb_conf: PathBuf::from("/etc/samba/smb.conf"),
            passwd: PathBuf::from("/etc/passwd"),
            stats_window: Duration::from_millis(200),
        }
    }
}

impl AgentConfig {
    /// Time span the buffers hold once full, saturating on absurd settings.
    pub fn retained_span(&self) -> Duration {
        self.interval
            .saturating_mul(u32::try_from(self.capacity).unwrap_or(u32::MAX))
    }
}

/// Shared request state: the three history buffers plus inventory paths.
pub struct AppState {
    started: Instant,
    system: SharedBuffer<SystemLoad>,
    network: SharedBuffer<NetworkThroughput>,
    disk: SharedBuffer<DiskThroughput>,
    config: AgentConfig,
}

impl AppState {
    pub fn new(config: AgentConfig) -> Result<Self, TelemetryError> {
        let capacity = config.capacity;
        Ok(Self {
            started: Instant::now(),
            system: SharedBuffer::new(capacity)?,
            network: SharedBuffer::new(capacity)?,
            disk: SharedBuffer::new(capacity)?,
            config,
        })
    }

    pub fn system(&self) -> &SharedBuffer<SystemLoad> {
        &self.system
    }

    pub fn network(&self) -> &SharedBuffer<NetworkThroughput> {
        &self.network
    }

    pub fn disk(&self) -> &SharedBuffer<DiskThroughput> {
        &self.disk
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// JSON `{error}` body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(e: TelemetryError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: f64,
}

#[derive(Deserialize)]
struct HistoryParams {
    range: Option<String>,
    points: Option<usize>,
}

#[derive(Serialize)]
struct HistoryResponse<M> {
    stream: &'static str,
    range: Window,
    points: usize,
    samples: Vec<Sample<M>>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn handle_index() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "Andorya NAS agent",
        "version": andorya_core::VERSION,
        "endpoints": {
            "/": "This API index",
            "/api/health": "Liveness check with agent uptime",
            "/api/stats": "Live CPU, temperature, memory, network and uptime",
            "/api/history/{stream}": {
                "method": "GET",
                "description": "Downsampled history for a chart",
                "params": {
                    "stream": "system, network or disk",
                    "range": "1h (default), 6h, 24h, 7d or <N>m/<N>h/<N>d",
                    "points": format!("Chart points (1-{MAX_POINTS}, default: {DEFAULT_POINTS})"),
                }
            },
            "/api/disks": "Physical disks",
            "/api/shares": "Samba shares",
            "/api/users": "Local users",
        },
        "examples": {
            "disk_week": "/api/history/disk?range=7d&points=60",
            "network_hour": "/api/history/network",
        }
    }))
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime: state.started.elapsed().as_secs_f64(),
    })
}

async fn handle_stats(State(state): State<Arc<AppState>>) -> Result<Json<HostStats>, ApiError> {
    let paths = state.config.paths.clone();
    let window = state.config.stats_window;
    blocking(move || collect_host_stats(&paths, window)).await.map(Json)
}

fn history<M: MetricSet + Serialize>(
    stream: &'static str,
    buffer: &SharedBuffer<M>,
    window: Window,
    target: usize,
) -> Result<Response, ApiError> {
    let samples = buffer.render(window.since(unix_ms_now()), target)?;
    Ok(Json(HistoryResponse {
        stream,
        range: window,
        points: samples.len(),
        samples,
    })
    .into_response())
}

async fn handle_history(
    State(state): State<Arc<AppState>>,
    Path(stream): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Response, ApiError> {
    let window = match params.range.as_deref() {
        Some(raw) => raw.parse::<Window>()?,
        None => Window::default(),
    };
    let target = match params.points {
        Some(0) => return Err(TelemetryError::InvalidTargetCount.into()),
        Some(n) => n.min(MAX_POINTS),
        None => DEFAULT_POINTS,
    };
    match stream.as_str() {
        "system" => history("system", &state.system, window, target),
        "network" => history("network", &state.network, window, target),
        "disk" => history("disk", &state.disk, window, target),
        other => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("unknown stream '{other}': expected system, network or disk"),
        )),
    }
}

async fn handle_disks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StorageDisk>>, ApiError> {
    let paths = state.config.paths.clone();
    let disks = blocking(move || {
        let mounts = std::fs::read_to_string(paths.proc_root.join("mounts")).unwrap_or_default();
        list_disks(&paths.sys_root.join("block"), &mounts)
    })
    .await?
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(disks))
}

async fn handle_shares(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Share>>, ApiError> {
    let path = state.config.smb_conf.clone();
    blocking(move || read_smb_shares(&path)).await.map(Json)
}

async fn handle_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    let path = state.config.passwd.clone();
    blocking(move || read_users(&path)).await.map(Json)
}

/// Run a filesystem read off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/health", get(handle_health))
        .route("/api/stats", get(handle_stats))
        .route("/api/history/{stream}", get(handle_history))
        .route("/api/disks", get(handle_disks))
        .route("/api/shares", get(handle_shares))
        .route("/api/users", get(handle_users))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Running collectors plus the state they feed.
pub struct Agent {
    state: Arc<AppState>,
    collectors: Vec<CollectorHandle>,
}

fn spawn_stream<M: MetricSet>(
    name: &str,
    interval: Duration,
    source: Box<dyn SampleSource<M>>,
    buffer: &SharedBuffer<M>,
) -> std::io::Result<CollectorHandle> {
    log::info!("collector {name}: {} every {interval:?}", source.name());
    Collector::new(name, interval).spawn(source, buffer.clone())
}

impl Agent {
    /// Allocate buffers and start one collector per stream.
    pub fn start(config: AgentConfig) -> std::io::Result<Self> {
        let state = AppState::new(config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let cfg = &state.config;

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

        let collectors = vec![
            spawn_stream("system", cfg.interval, system, &state.system)?,
            spawn_stream("network", cfg.interval, network, &state.network)?,
            spawn_stream("disk", cfg.interval, disk, &state.disk)?,
        ];
        log::info!(
            "history: {} samples per stream ({:?} at {:?})",
            cfg.capacity,
            cfg.retained_span(),
            cfg.interval
        );

        Ok(Self {
            state: Arc::new(state),
            collectors,
        })
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn router(&self) -> Router {
        build_router(self.state())
    }

    /// Stop every collector and wait for its thread.
    pub fn stop(self) {
        for handle in self.collectors {
            let name = handle.name().to_string();
            if !handle.stop() {
                log::warn!("collector {name} exited abnormally");
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("received Ctrl+C"),
        _ = terminate => log::info!("received SIGTERM"),
    }
}

/// Run the agent until Ctrl-C/SIGTERM, then stop the collectors.
pub async fn run_agent(config: AgentConfig) -> std::io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let agent = Agent::start(config)?;
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            agent.stop();
            return Err(e);
        }
    };
    log::info!("agent listening on http://{addr}");

    let served = axum::serve(listener, agent.router())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    log::info!("stopping collectors");
    agent.stop();
    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_config(dir: &std::path::Path) -> AgentConfig {
        AgentConfig {
            interval: Duration::from_secs(60),
            capacity: 100,
            paths: HostPaths {
                proc_root: dir.join("proc"),
                sys_root: dir.join("sys"),
            },
            smb_conf: dir.join("smb.conf"),
            passwd: dir.join("passwd"),
            stats_window: Duration::from_millis(1),
            ..AgentConfig::default()
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn seeded_state(dir: &std::path::Path) -> Arc<AppState> {
        let state = AppState::new(test_config(dir)).unwrap();
        let now = unix_ms_now();
        for i in 0..100u64 {
            let ts = now - (100 - i) * 1_000;
            state
                .disk()
                .record(Sample::new(
                    ts,
                    DiskThroughput {
                        read: i as f64,
                        write: 0.0,
                        iops: 0.0,
                    },
                ))
                .unwrap();
        }
        Arc::new(state)
    }

    #[test]
    fn default_capacity_is_bounded() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.capacity, 720);
        assert_eq!(cfg.retained_span(), Duration::from_secs(36 * 60));
        let huge = AgentConfig {
            capacity: usize::MAX,
            interval: Duration::from_secs(u64::MAX),
            ..AgentConfig::default()
        };
        assert_eq!(huge.retained_span(), Duration::MAX);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = AgentConfig {
            capacity: 0,
            ..AgentConfig::default()
        };
        assert!(matches!(
            AppState::new(cfg),
            Err(TelemetryError::InvalidCapacity)
        ));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get_json(build_router(seeded_state(tmp.path())), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    }

    #[tokio::test]
    async fn history_downsamples_window() {
        let tmp = tempfile::tempdir().unwrap();
        let app = build_router(seeded_state(tmp.path()));
        let (status, body) = get_json(app, "/api/history/disk?range=1h&points=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stream"], "disk");
        assert_eq!(body["range"], "1h");
        assert_eq!(body["points"], 10);
        let samples = body["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0]["read"], 0.0);
        assert_eq!(samples[1]["read"], 10.0);
        assert!(samples[0]["timestamp"].is_u64());
    }

    #[tokio::test]
    async fn history_defaults_and_clamps_points() {
        let tmp = tempfile::tempdir().unwrap();
        let state = seeded_state(tmp.path());
        let (_, body) = get_json(build_router(Arc::clone(&state)), "/api/history/disk").await;
        assert_eq!(body["points"], DEFAULT_POINTS);
        assert_eq!(body["range"], "1h");

        let (_, body) =
            get_json(build_router(state), "/api/history/disk?points=100000").await;
        // Only 100 samples recorded, all returned.
        assert_eq!(body["points"], 100);
    }

    #[tokio::test]
    async fn empty_stream_has_no_samples() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) =
            get_json(build_router(seeded_state(tmp.path())), "/api/history/network").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["points"], 0);
        assert_eq!(body["samples"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn history_rejects_bad_input() {
        let tmp = tempfile::tempdir().unwrap();
        let state = seeded_state(tmp.path());

        let (status, body) = get_json(build_router(Arc::clone(&state)), "/api/history/gpu").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("gpu"));

        let (status, _) =
            get_json(build_router(Arc::clone(&state)), "/api/history/disk?range=3y").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get_json(build_router(state), "/api/history/disk?points=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn shares_and_users_from_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("smb.conf"), "[global]\n[media]\n[backup]\n").unwrap();
        std::fs::write(
            tmp.path().join("passwd"),
            "root:x:0:0:::\nalice:x:1000:1000:::\n",
        )
        .unwrap();
        let state = seeded_state(tmp.path());

        let (status, shares) = get_json(build_router(Arc::clone(&state)), "/api/shares").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shares.as_array().unwrap().len(), 2);
        assert_eq!(shares[0]["name"], "media");

        let (_, users) = get_json(build_router(state), "/api/users").await;
        assert_eq!(users[0]["username"], "alice");
    }

    #[tokio::test]
    async fn missing_smb_conf_is_empty_list() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, shares) =
            get_json(build_router(seeded_state(tmp.path())), "/api/shares").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shares, serde_json::json!([]));
    }

    #[tokio::test]
    async fn stats_fall_back_without_procfs() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get_json(build_router(seeded_state(tmp.path())), "/api/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cpuTemp"], 40.0);
        assert_eq!(body["memTotal"], 0.0);
    }

    #[tokio::test]
    async fn index_lists_endpoints() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get_json(build_router(seeded_state(tmp.path())), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["endpoints"]["/api/history/{stream}"].is_object());
    }

    #[test]
    fn synthetic_agent_starts_and_stops() {
        let tmp = tempfile::tempdir().unwrap();
        let agent = Agent::start(AgentConfig {
            synthetic: true,
            ..test_config(tmp.path())
        })
        .unwrap();
        let state = agent.state();
        let deadline = Instant::now() + Duration::from_secs(5);
        while state.disk().is_empty() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        }
        agent.stop();
        assert_eq!(state.disk().len(), 1);
    }
}
