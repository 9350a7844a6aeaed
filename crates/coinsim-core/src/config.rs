//! 설정 관리.
//!
//! 설정은 다음 순서로 병합됩니다 (뒤쪽이 우선):
//! 1. 각 구조체의 기본값
//! 2. TOML 설정 파일 (`COINSIM_CONFIG` 또는 `config/default.toml`, 없으면 건너뜀)
//! 3. `COINSIM__` 접두사 환경 변수 (예: `COINSIM__SERVER__PORT=8080`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_HISTORY_WINDOW, DEFAULT_IMPACT_FACTOR, DEFAULT_MAX_TICK_CHANGE};
use crate::logging::{LogConfig, LogFormat};

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 거래 설정
    pub trading: TradingConfig,
    /// 가격 시뮬레이터 설정
    pub simulator: SimulatorConfig,
    /// 브로드캐스트 설정
    pub broadcast: BroadcastConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용할 CORS origin 목록 (비어 있으면 전체 허용)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 형태의 바인딩 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
///
/// `url`이 없으면 인메모리 저장소를 사용합니다.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 5,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 키
    pub jwt_secret: String,
    /// 토큰 유효 시간 (분)
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "coinsim-dev-secret-change-me".to_string(),
            token_ttl_minutes: 24 * 60,
        }
    }
}

/// 거래 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TradingConfig {
    /// 신규 사용자 시작 잔고
    pub starting_balance: Decimal,
    /// 수량당 가격 충격 비율
    pub price_impact_factor: Decimal,
    /// 버전 충돌 시 최대 재시도 횟수
    pub max_commit_retries: u32,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::new(10000, 0),
            price_impact_factor: DEFAULT_IMPACT_FACTOR,
            max_commit_retries: 16,
        }
    }
}

/// 가격 시뮬레이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// 시뮬레이터 활성화 여부
    pub enabled: bool,
    /// 틱 간격 (밀리초)
    pub tick_interval_ms: u64,
    /// 틱당 최대 변동 비율
    pub max_tick_change: Decimal,
    /// 가격 이력 윈도우 크기
    pub history_window: usize,
    /// 코인별 버전 충돌 재시도 횟수
    pub max_update_retries: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: 2000,
            max_tick_change: DEFAULT_MAX_TICK_CHANGE,
            history_window: DEFAULT_HISTORY_WINDOW,
            max_update_retries: 5,
        }
    }
}

impl SimulatorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// 브로드캐스트 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// 브로드캐스트 채널 용량
    pub capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환합니다.
    ///
    /// `RUST_LOG`/`LOG_FORMAT` 환경 변수가 있으면 우선합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        let format = std::env::var("LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| self.format.parse().ok())
            .unwrap_or(LogFormat::Pretty);

        LogConfig::new(level).with_format(format)
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("COINSIM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path = std::env::var("COINSIM_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(Some(&path))
    }
}
