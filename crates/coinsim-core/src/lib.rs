//! # Coinsim Core
//!
//! 코인 트레이딩 시뮬레이터의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자, 보유 코인(Holdings), 코인, 가격 이력, 거래 기록
//! - 거래 정산 및 가격 충격(price impact) 계산
//! - 랜덤 워크 가격 변동 계산
//! - 실시간 이벤트 타입과 발행 인터페이스
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
