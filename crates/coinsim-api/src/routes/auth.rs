//! 회원가입 및 로그인 endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use coinsim_core::User;
use coinsim_store::StoreError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{create_token, hash_password, verify_password, Claims, PasswordError};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 회원가입/로그인 요청.
///
/// 누락된 필드는 빈 문자열로 받아 검증 단계에서 400으로 거부합니다.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

fn parse_credentials(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<CredentialsRequest> {
    let Json(mut request) = payload?;
    request.username = request.username.trim().to_string();
    request.validate()?;
    Ok(request)
}

/// 회원가입.
///
/// POST /signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let request = parse_credentials(payload)?;

    let hash = hash_password(&request.password)
        .map_err(|e| ApiError::Infrastructure(e.to_string()))?;
    let user = User::new(
        request.username,
        hash,
        state.config.trading.starting_balance,
    );

    let created = state.store.create_user(user).await.map_err(|e| match e {
        StoreError::Duplicate(_) => ApiError::business("DUPLICATE_USERNAME", "Username already exists"),
        other => other.into(),
    })?;

    info!(user_id = %created.value.id, username = %created.value.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// 로그인.
///
/// POST /login
///
/// 사용자가 없으면 400, 비밀번호가 틀리면 401을 반환합니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let request = parse_credentials(payload)?;

    let user = state
        .store
        .find_user_by_username(&request.username)
        .await?
        .ok_or_else(|| ApiError::business("USER_NOT_FOUND", "User not found"))?
        .into_inner();

    match verify_password(&request.password, &user.password_hash) {
        Ok(()) => {}
        Err(PasswordError::VerificationFailed) => {
            warn!(username = %user.username, "Login rejected: invalid password");
            return Err(ApiError::Unauthorized("Invalid password".to_string()));
        }
        Err(e) => return Err(ApiError::Infrastructure(e.to_string())),
    }

    let claims = Claims::new(user.id, &user.username, state.config.auth.token_ttl_minutes);
    let token = create_token(&claims, &state.config.auth.jwt_secret)
        .map_err(|e| ApiError::Infrastructure(e.to_string()))?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(TokenResponse { token }))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}
