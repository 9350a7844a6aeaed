//! API 통합 테스트 공용 도구

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use coinsim_api::state::create_test_state;
use coinsim_api::{create_app, AppState};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn value(&self) -> Value {
        self.json()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let state = Arc::new(create_test_state().await);
        Self::with_state(state)
    }

    pub fn with_state(state: Arc<AppState>) -> Self {
        let router = create_app(Arc::clone(&state));
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// 회원가입 후 로그인하여 토큰을 반환합니다.
    pub async fn register(&self, username: &str, password: &str) -> String {
        let credentials = json!({ "username": username, "password": password });

        let signup = self.post("/signup", None, credentials.clone()).await;
        assert_eq!(signup.status, StatusCode::CREATED, "{}", signup.text());

        let login = self.post("/login", None, credentials).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.text());
        login.value()["token"].as_str().unwrap().to_string()
    }

    pub async fn trade(&self, token: &str, symbol: &str, kind: &str, amount: Value) -> TestResponse {
        self.post(
            "/transaction",
            Some(token),
            json!({ "coinId": symbol, "type": kind, "amount": amount }),
        )
        .await
    }
}
