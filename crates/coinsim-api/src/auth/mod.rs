//! 인증.
//!
//! JWT 기반 무상태 토큰 발급/검증과 Argon2 비밀번호 해싱을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`Claims`]: JWT 페이로드 구조체
//! - [`JwtAuth`]: Axum 핸들러용 JWT 검증 추출기
//! - 토큰 생성/검증 함수
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     JwtAuth(claims): JwtAuth,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", claims.username)
//! }
//! ```

mod jwt;
mod middleware;
mod password;

pub use jwt::{create_token, decode_token, Claims, JwtError};
pub use middleware::{JwtAuth, JwtAuthError, JwtConfig};
pub use password::{hash_password, verify_password, PasswordError};
