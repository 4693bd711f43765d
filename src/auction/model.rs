use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// region:    --- Auction Item
/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuctionStatus {
    #[default]
    NotStarted,
    Live,
    Ended,
}

impl From<String> for AuctionStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "live" | "active" => AuctionStatus::Live,
            "ended" | "completed" | "sold" => AuctionStatus::Ended,
            _ => AuctionStatus::NotStarted,
        }
    }
}

impl From<AuctionStatus> for String {
    fn from(value: AuctionStatus) -> Self {
        match value {
            AuctionStatus::NotStarted => "not_started",
            AuctionStatus::Live => "live",
            AuctionStatus::Ended => "ended",
        }
        .to_string()
    }
}

/// 경매 파라미터 (`auctionParams`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionParams {
    #[serde(default)]
    pub base_price: Option<i64>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// 경매 상품(차량) 문서 모델
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub current_bid: Option<i64>,
    #[serde(default)]
    pub auction_params: AuctionParams,
    #[serde(default)]
    pub status: AuctionStatus,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub inspection_sheet_image: Option<String>,
    #[serde(default)]
    pub inspection_sheet_pdf: Option<String>,
}

impl AuctionItem {
    /// 현재 입찰가: `currentBid` 우선, 없으면 `auctionParams.basePrice`
    ///
    /// 0 은 값이 없는 것으로 취급한다.
    pub fn effective_bid(&self) -> Option<i64> {
        self.current_bid
            .filter(|bid| *bid != 0)
            .or(self.auction_params.base_price.filter(|price| *price != 0))
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.auction_params.end_time
    }
}
// endregion: --- Auction Item

// region:    --- Bid Record
/// 입찰 이력 모델 (`cars/{id}/bidHistory`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BidRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub amount: i64,
    /// 서버 타임스탬프가 아직 확정되지 않은 경우 `None`
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}
// endregion: --- Bid Record
