//! 코인 트레이딩 시뮬레이터 API 서버.
//!
//! 설정을 로드하고 저장소/엔진/가격 시뮬레이터를 구성한 뒤
//! Axum 서버를 시작합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use coinsim_core::{init_logging, AppConfig};
use coinsim_engine::{seed_default_coins, PriceSimulator};
use coinsim_store::{LedgerStore, MemoryStore, PgStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use coinsim_api::metrics::setup_metrics_recorder;
use coinsim_api::{create_app, AppState, BroadcastHub};

/// 데이터베이스 URL 결정.
///
/// `DATABASE_URL` 환경 변수가 설정 파일보다 우선합니다.
fn database_url(config: &AppConfig) -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
        .or_else(|| config.database.url.clone())
}

/// 원장 저장소 생성.
///
/// 데이터베이스 URL이 없으면 인메모리 저장소를 사용합니다.
async fn create_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match database_url(config) {
        Some(url) => {
            let store = PgStore::connect(&url, &config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.migrate().await.context("failed to run migrations")?;
            info!("Connected to PostgreSQL ledger store");
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory ledger store (state is lost on restart)");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// CORS 레이어 생성.
///
/// 허용 Origin이 설정되지 않으면 모든 Origin을 허용합니다.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let config = Arc::clone(&state.config);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    Router::new()
        .merge(metrics_router)
        .merge(create_app(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(cors_layer(&config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    info!("Starting Coinsim API server...");

    let metrics_handle =
        setup_metrics_recorder().context("failed to install Prometheus recorder")?;

    let addr = config.server.bind_addr();

    if config.auth.jwt_secret == coinsim_core::AuthConfig::default().jwt_secret {
        warn!("Using the default JWT secret (INSECURE, set COINSIM__AUTH__JWT_SECRET)");
    }

    let store = create_store(&config).await?;
    seed_default_coins(store.as_ref(), config.simulator.history_window)
        .await
        .context("failed to seed coin catalog")?;

    let hub = BroadcastHub::new(config.broadcast.capacity);
    let state = Arc::new(AppState::new(Arc::clone(&store), hub.clone(), config.clone()));

    // 전역 종료 토큰 (백그라운드 태스크 종료 전파용)
    let shutdown_token = CancellationToken::new();

    let simulator_handle = if config.simulator.enabled {
        let simulator = PriceSimulator::new(store, Arc::new(hub), config.simulator.clone());
        Some(simulator.spawn(shutdown_token.clone()))
    } else {
        warn!("Price simulator disabled by configuration");
        None
    };

    info!(
        version = %state.version,
        store = state.store.backend(),
        "Application state initialized"
    );

    let app = create_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);
    info!("WebSocket available at ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await?;

    info!("Server shutdown initiated, cleaning up...");
    shutdown_token.cancel();

    if let Some(handle) = simulator_handle {
        match tokio::time::timeout(Duration::from_secs(10), handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Price simulator task failed"),
            Err(_) => warn!("Price simulator did not stop in time, forcing shutdown"),
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 종료 토큰을 취소합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
