//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `POST /signup`, `POST /login` - 회원가입/로그인
//! - `GET /user` - 현재 사용자 (인증 필요)
//! - `GET /coins` - 코인 목록
//! - `POST /transaction`, `GET /transactions` - 거래 실행/내역 (인증 필요)
//! - `GET /ws` - 실시간 이벤트 WebSocket
//! - `/health`, `/health/ready` - 헬스 체크

pub mod auth;
pub mod coins;
pub mod health;
pub mod transactions;
pub mod user;

pub use auth::{auth_router, CredentialsRequest, MessageResponse, TokenResponse};
pub use coins::coins_router;
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use transactions::{
    transactions_router, TransactionRequest, TransactionResponse, RECENT_TRANSACTION_LIMIT,
};
pub use user::user_router;

use axum::{middleware, Router};
use std::sync::Arc;

use crate::middleware::metrics_layer;
use crate::state::AppState;
use crate::websocket::websocket_router;

/// 전체 API 라우터 생성 (상태 미적용).
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .merge(auth_router())
        .merge(user_router())
        .merge(coins_router())
        .merge(transactions_router())
        .merge(websocket_router())
}

/// 상태와 메트릭 미들웨어가 적용된 애플리케이션 라우터.
///
/// `/metrics`와 CORS/Trace/Timeout 레이어는 바이너리에서 추가합니다.
pub fn create_app(state: Arc<AppState>) -> Router {
    create_api_router()
        .with_state(state)
        .layer(middleware::from_fn(metrics_layer))
}
