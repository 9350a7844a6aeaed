//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 공유됩니다.

use std::sync::Arc;

use axum::extract::FromRef;
use coinsim_core::AppConfig;
use coinsim_engine::TransactionEngine;
use coinsim_store::LedgerStore;

use crate::auth::JwtConfig;
use crate::websocket::BroadcastHub;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 원장 저장소 (유일한 상태 원천)
    pub store: Arc<dyn LedgerStore>,

    /// 실시간 이벤트 브로드캐스트 허브
    pub hub: BroadcastHub,

    /// 트랜잭션 엔진 - 매수/매도 실행
    pub engine: Arc<TransactionEngine>,

    /// 로드된 전체 설정
    pub config: Arc<AppConfig>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// 트랜잭션 엔진은 같은 저장소와 허브를 공유하도록 내부에서 구성됩니다.
    pub fn new(store: Arc<dyn LedgerStore>, hub: BroadcastHub, config: AppConfig) -> Self {
        let engine = TransactionEngine::new(
            Arc::clone(&store),
            Arc::new(hub.clone()),
            config.trading.clone(),
        );

        Self {
            store,
            hub,
            engine: Arc::new(engine),
            config: Arc::new(config),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

impl FromRef<Arc<AppState>> for JwtConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        JwtConfig {
            secret: state.config.auth.jwt_secret.clone(),
        }
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 저장소에 기본 코인을 시드한 상태를 만듭니다.
#[cfg(any(test, feature = "test-utils"))]
pub async fn create_test_state() -> AppState {
    create_test_state_with(AppConfig::default()).await
}

/// 설정을 지정하여 테스트용 AppState를 생성합니다.
#[cfg(any(test, feature = "test-utils"))]
pub async fn create_test_state_with(config: AppConfig) -> AppState {
    let store: Arc<dyn LedgerStore> = Arc::new(coinsim_store::MemoryStore::new());
    coinsim_engine::seed_default_coins(store.as_ref(), config.simulator.history_window)
        .await
        .expect("seeding the in-memory store cannot fail");
    let hub = BroadcastHub::new(config.broadcast.capacity);
    AppState::new(store, hub, config)
}
