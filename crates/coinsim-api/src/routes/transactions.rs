//! 거래 실행 및 거래 내역 endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use coinsim_core::{Transaction, UserView};
use coinsim_engine::parse_trade_type;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 최근 거래 내역 조회 개수.
pub const RECENT_TRANSACTION_LIMIT: usize = 5;

/// 거래 요청.
///
/// `coinId`는 코인 심볼입니다.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default)]
    #[validate(required(message = "coinId is required"))]
    pub coin_id: Option<String>,
    #[serde(default, rename = "type")]
    #[validate(required(message = "type is required"))]
    pub trade_type: Option<String>,
    #[serde(default)]
    #[validate(required(message = "amount is required"))]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub message: String,
    pub user: UserView,
}

/// 매수/매도 실행.
///
/// POST /transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> ApiResult<Json<TransactionResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let (Some(symbol), Some(raw_type), Some(amount)) =
        (request.coin_id, request.trade_type, request.amount)
    else {
        return Err(ApiError::Validation("coinId, type and amount are required".to_string()));
    };
    let trade_type = parse_trade_type(&raw_type)?;

    let outcome = state
        .engine
        .execute(claims.sub, symbol.trim(), trade_type, amount)
        .await?;

    Ok(Json(TransactionResponse {
        message: "Transaction successful".to_string(),
        user: outcome.user.view(),
    }))
}

/// 최근 거래 내역 (최신순 5건).
///
/// GET /transactions
pub async fn recent_transactions(
    State(state): State<Arc<AppState>>,
    JwtAuth(claims): JwtAuth,
) -> ApiResult<Json<Vec<Transaction>>> {
    let transactions = state
        .store
        .recent_transactions(claims.sub, RECENT_TRANSACTION_LIMIT)
        .await?;

    Ok(Json(transactions))
}

pub fn transactions_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transaction", post(create_transaction))
        .route("/transactions", get(recent_transactions))
}
