//! 경매 참가 승인 및 액세스 코드 확인
//!
//! 사용자는 참가 요청을 남기고, 관리자가 보증금을 확인한 뒤 별도 채널로
//! 액세스 코드를 보낸다. 코드가 확인된 세션만 입찰 모드로 들어간다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Access Request
/// 참가 요청 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    GlobalAccess,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::GlobalAccess => "GLOBAL_ACCESS",
        }
    }
}

/// 참가 요청 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// 경매 참가 요청 (`auction_requests`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub user_id: String,
    pub user_name: String,
    pub cnic: String,
    pub whatsapp: String,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub access_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccessRequest {
    /// 새 요청은 항상 대기 상태, 코드 없음
    pub fn pending(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        cnic: impl Into<String>,
        whatsapp: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            cnic: cnic.into(),
            whatsapp: whatsapp.into(),
            request_type: RequestType::GlobalAccess,
            status: RequestStatus::Pending,
            access_code: None,
            created_at: Utc::now(),
        }
    }
}
// endregion: --- Access Request

// region:    --- View Mode
/// 화면 모드: 입찰 가능 또는 보기 전용
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Bid,
    #[default]
    #[serde(alias = "view_only")]
    View,
}

impl ViewMode {
    pub fn can_bid(&self) -> bool {
        matches!(self, ViewMode::Bid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("sign in to enter an access code")]
    NotSignedIn,
    #[error("could not load registration: {0}")]
    Lookup(String),
    #[error("could not save registration: {0}")]
    Submit(String),
    #[error("no auction registration found")]
    NotRegistered,
    #[error("registration is awaiting approval")]
    Pending,
    #[error("registration was rejected")]
    Rejected,
    #[error("access code does not match")]
    CodeMismatch,
}

/// 입력한 액세스 코드로 입찰 모드 해제
pub fn unlock(request: Option<&AccessRequest>, entered_code: &str) -> Result<ViewMode, AccessError> {
    let request = request.ok_or(AccessError::NotRegistered)?;

    match request.status {
        RequestStatus::Pending => return Err(AccessError::Pending),
        RequestStatus::Rejected => return Err(AccessError::Rejected),
        RequestStatus::Approved => {}
    }

    let entered = entered_code.trim();
    match request.access_code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() && code == entered => {
            info!(
                "{:<12} --> 액세스 코드 확인: user={}",
                "Access", request.user_id
            );
            Ok(ViewMode::Bid)
        }
        _ => {
            warn!(
                "{:<12} --> 액세스 코드 불일치: user={}",
                "Access", request.user_id
            );
            Err(AccessError::CodeMismatch)
        }
    }
}
// endregion: --- View Mode
