use serde::{Deserialize, Serialize};

/// 로그인 세션
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthSession {
    #[default]
    Guest,
    SignedIn { uid: String },
}

impl AuthSession {
    pub fn signed_in(uid: impl Into<String>) -> Self {
        AuthSession::SignedIn { uid: uid.into() }
    }

    pub fn uid(&self) -> Option<&str> {
        match self {
            AuthSession::Guest => None,
            AuthSession::SignedIn { uid } => Some(uid),
        }
    }
}

/// 입찰 금액 입력값 (입력창 문자열 또는 숫자)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProposedAmount {
    Number(i64),
    Text(String),
}

impl ProposedAmount {
    /// 빈 문자열 또는 0
    pub fn is_empty(&self) -> bool {
        match self {
            ProposedAmount::Number(amount) => *amount == 0,
            ProposedAmount::Text(text) => text.trim().is_empty(),
        }
    }
}

impl From<i64> for ProposedAmount {
    fn from(amount: i64) -> Self {
        ProposedAmount::Number(amount)
    }
}

impl From<String> for ProposedAmount {
    fn from(text: String) -> Self {
        ProposedAmount::Text(text)
    }
}

impl From<&str> for ProposedAmount {
    fn from(text: &str) -> Self {
        ProposedAmount::Text(text.to_string())
    }
}

/// 입찰 요청 (`POST /api/place-bid`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    pub car_id: String,
    pub user_id: String,
    pub bid_amount: ProposedAmount,
}

/// 입찰 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// 사용자 알림 (제목, 본문)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}
