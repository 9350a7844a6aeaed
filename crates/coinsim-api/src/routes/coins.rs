//! 코인 목록 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use coinsim_core::Coin;

use crate::error::ApiResult;
use crate::state::AppState;

/// 전체 코인 목록 (가격 이력 포함).
///
/// GET /coins
pub async fn list_coins(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Coin>>> {
    let coins = state
        .store
        .list_coins()
        .await?
        .into_iter()
        .map(|c| c.value)
        .collect();

    Ok(Json(coins))
}

pub fn coins_router() -> Router<Arc<AppState>> {
    Router::new().route("/coins", get(list_coins))
}
