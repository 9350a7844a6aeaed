//! 요청별 HTTP 메트릭 수집.
//!
//! 경로 라벨은 라우터가 매칭한 템플릿을 사용하므로, 존재하지 않는 경로로
//! 들어온 요청은 모두 [`UNMATCHED_ROUTE`] 하나로 묶입니다.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::metrics::{record_http_duration, record_http_request, record_http_response};

/// 라우트에 매칭되지 않은 요청의 경로 라벨.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// 요청 수, 응답 상태, 처리 시간을 라우트 단위로 기록합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());

    record_http_request(&method, &route);
    let response = next.run(request).await;

    record_http_response(&method, &route, response.status().as_u16());
    record_http_duration(&method, &route, start.elapsed().as_secs_f64());

    response
}
