//! 현재 사용자 조회 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use coinsim_core::UserView;
use coinsim_store::StoreError;

use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 현재 사용자 조회 (비밀번호 해시 제외).
///
/// GET /user
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<UserView>> {
    let user = state.store.get_user(claims.sub).await.map_err(|e| match e {
        StoreError::NotFound(_) => ApiError::not_found("USER_NOT_FOUND", "User not found"),
        other => other.into(),
    })?;

    Ok(Json(user.value.view()))
}

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new().route("/user", get(get_user))
}
