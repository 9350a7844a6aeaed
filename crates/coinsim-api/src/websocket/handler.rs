//! WebSocket 연결 handler.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::hub::HubSession;
use crate::state::AppState;

/// WebSocket 업그레이드 핸들러.
///
/// `GET /ws`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // 업그레이드 전에 등록해야 연결 직후 발행된 이벤트도 받음
    let session = state.hub.connect();
    ws.on_upgrade(move |socket| handle_socket(socket, session))
}

/// WebSocket 연결 처리.
async fn handle_socket(socket: WebSocket, mut session: HubSession) {
    let session_id = uuid::Uuid::new_v4();
    info!(%session_id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();

    // 클라이언트 메시지는 프로토콜에 없으므로 종료 감지만 함
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                    debug!(%session_id, "Ignoring client message");
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(%session_id, error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        loop {
            match session.recv().await {
                Ok(event) => {
                    let json = match event.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(%session_id, error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%session_id, skipped, "WebSocket client lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = &mut receive_task => {
            send_task.abort();
            debug!(%session_id, "Receive task ended");
        }
        _ = &mut send_task => {
            receive_task.abort();
            debug!(%session_id, "Send task ended");
        }
    }

    info!(%session_id, "WebSocket disconnected");
}

/// WebSocket 라우터 생성.
pub fn websocket_router() -> Router<Arc<AppState>> {
    Router::new().route("/ws", get(websocket_handler))
}
