//! Axum용 JWT 인증 추출기.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::{decode_token, Claims};
use crate::error::ApiErrorResponse;

/// JWT 인증 추출기.
///
/// `Authorization: Bearer <token>` 헤더를 검증하고 Claims를 꺼냅니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(
///     JwtAuth(claims): JwtAuth,
/// ) -> impl IntoResponse {
///     format!("Authenticated user: {}", claims.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

/// JWT 인증 에러.
///
/// 토큰이 없으면 401, 토큰이 있지만 유효하지 않으면 403입니다.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("Authentication token is required")]
    MissingToken,
    #[error("Malformed Authorization header")]
    InvalidAuthHeader,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
}

impl JwtAuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            JwtAuthError::MissingToken | JwtAuthError::InvalidAuthHeader => {
                StatusCode::UNAUTHORIZED
            }
            JwtAuthError::TokenExpired | JwtAuthError::InvalidToken => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            JwtAuthError::MissingToken => "MISSING_TOKEN",
            JwtAuthError::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            JwtAuthError::TokenExpired => "TOKEN_EXPIRED",
            JwtAuthError::InvalidToken => "INVALID_TOKEN",
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorResponse::new(self.code(), self.to_string()));
        (self.status(), body).into_response()
    }
}

/// JWT 비밀 키.
///
/// 애플리케이션 상태에서 `FromRef`로 꺼내 씁니다.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl<S> FromRequestParts<S> for JwtAuth
where
    S: Send + Sync,
    JwtConfig: FromRef<S>,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(JwtAuthError::MissingToken)?
            .to_str()
            .map_err(|_| JwtAuthError::InvalidAuthHeader)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let jwt = JwtConfig::from_ref(state);
        let token_data = decode_token(token, &jwt.secret).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            match e {
                super::JwtError::TokenExpired => JwtAuthError::TokenExpired,
                _ => JwtAuthError::InvalidToken,
            }
        })?;

        Ok(JwtAuth(token_data.claims))
    }
}
