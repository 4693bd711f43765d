//! 환경 변수 설정
// region:    --- Imports
use crate::access::ViewMode;
use crate::bidding::model::AuthSession;
use std::time::Duration;

// endregion: --- Imports

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_BID_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TICK_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("BID_MODE must be `bid` or `view`, got {0:?}")]
    InvalidMode(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    /// 없으면 메모리 저장소로 실행
    pub database_url: Option<String>,
    pub car_id: Option<String>,
    pub auth: AuthSession,
    pub mode: ViewMode,
    pub access_code: Option<String>,
    pub bid_timeout: Duration,
    /// `None` 이면 로컬 카운트다운 비활성
    pub countdown_tick: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 조회 함수로부터 설정 구성
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mode = match get("BID_MODE").as_deref() {
            None | Some("view") => ViewMode::View,
            Some("bid") => ViewMode::Bid,
            Some(other) => return Err(ConfigError::InvalidMode(other.to_string())),
        };
        let bid_timeout = parse_u64(&get, "BID_TIMEOUT_SECS", DEFAULT_BID_TIMEOUT_SECS)?;
        let tick_ms = parse_u64(&get, "COUNTDOWN_TICK_MS", DEFAULT_TICK_MS)?;

        Ok(Self {
            backend_url: get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            database_url: get("DATABASE_URL"),
            car_id: get("CAR_ID"),
            auth: get("USER_ID").map_or(AuthSession::Guest, AuthSession::signed_in),
            mode,
            access_code: get("ACCESS_CODE"),
            bid_timeout: Duration::from_secs(bid_timeout),
            countdown_tick: (tick_ms > 0).then(|| Duration::from_millis(tick_ms)),
        })
    }
}

fn parse_u64(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match get(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
    }
}
