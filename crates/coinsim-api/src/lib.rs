//! 코인 트레이딩 시뮬레이터 REST API 및 WebSocket 서버.
//!
//! Axum 기반으로 회원가입/로그인, 사용자/코인 조회, 거래 실행 엔드포인트와
//! 가격/사용자 이벤트를 실시간으로 전달하는 WebSocket을 제공합니다.

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod websocket;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use routes::{create_api_router, create_app};
pub use state::AppState;
pub use websocket::BroadcastHub;
