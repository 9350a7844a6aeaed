//! 통합 API 에러 타입.
//!
//! 모든 엔드포인트는 [`ApiError`]를 반환하고, 응답 본문은
//! [`ApiErrorResponse`] 형식으로 통일됩니다.
//!
//! ```json
//! {
//!   "code": "INSUFFICIENT_FUNDS",
//!   "message": "Insufficient funds: required 12800, available 10000",
//!   "timestamp": 1738300800
//! }
//! ```

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coinsim_core::TradeError;
use coinsim_engine::EngineError;
use coinsim_store::StoreError;
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "COIN_NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// API 에러 분류.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 잘못되었거나 누락된 입력 (400)
    #[error("{0}")]
    Validation(String),

    /// 비즈니스 규칙 위반 (400)
    #[error("{message}")]
    BusinessRule { code: &'static str, message: String },

    /// 인증 실패 (401)
    #[error("{0}")]
    Unauthorized(String),

    /// 리소스 없음 (404)
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// 재시도 한도를 넘는 동시 갱신 (409)
    #[error("{0}")]
    Contention(String),

    /// 저장소/내부 장애 (500). 상세 내용은 로그에만 남습니다.
    #[error("{0}")]
    Infrastructure(String),
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BusinessRule { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Contention(_) => StatusCode::CONFLICT,
            ApiError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::BusinessRule { code, .. } | ApiError::NotFound { code, .. } => *code,
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Contention(_) => "CONTENTION",
            ApiError::Infrastructure(_) => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn business(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BusinessRule {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Infrastructure(detail) => {
                error!(error = %detail, "Request failed with infrastructure error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiErrorResponse::new(self.code(), message))).into_response()
    }
}

impl From<TradeError> for ApiError {
    fn from(err: TradeError) -> Self {
        match err {
            TradeError::InvalidAmount | TradeError::AmountTooLarge => {
                ApiError::Validation(err.to_string())
            }
            TradeError::InsufficientFunds { .. } => {
                ApiError::business("INSUFFICIENT_FUNDS", err.to_string())
            }
            TradeError::InsufficientHoldings { .. } => {
                ApiError::business("INSUFFICIENT_HOLDINGS", err.to_string())
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Trade(e) => e.into(),
            EngineError::UserNotFound(_) => ApiError::not_found("USER_NOT_FOUND", "User not found"),
            EngineError::CoinNotFound(_) => ApiError::not_found("COIN_NOT_FOUND", "Coin not found"),
            EngineError::InvalidType(_) => ApiError::business(
                "INVALID_TRANSACTION_TYPE",
                "Invalid transaction type",
            ),
            EngineError::Contention { .. } => ApiError::Contention(
                "Trade could not be applied due to concurrent updates, please retry".to_string(),
            ),
            EngineError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::not_found("NOT_FOUND", what),
            StoreError::Conflict(_) => ApiError::Contention(
                "Resource was modified concurrently, please retry".to_string(),
            ),
            other => ApiError::Infrastructure(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}
