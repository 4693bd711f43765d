//! 화면 표시용 포맷 함수
// region:    --- Imports
use super::model::AuctionItem;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
// endregion: --- Imports

pub const THUMBNAIL_PLACEHOLDER: &str = "https://via.placeholder.com/150";
pub const INSPECTION_SHEET_PLACEHOLDER: &str =
    "https://via.placeholder.com/400x300.png?text=No+Inspection+Image";
pub const PDF_NOT_AVAILABLE: &str = "PDF not available";
pub const JUST_NOW: &str = "Just now";

/// 천 단위 구분 기호를 넣은 금액 (`1,234,567`)
pub fn group_thousands(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// 통화 표기 (`Rs. 1,234,567`)
pub fn price_label(amount: i64) -> String {
    format!("Rs. {}", group_thousands(amount))
}

/// 입찰자 표시: 사용자 ID 앞 5글자
pub fn bidder_label(user_id: Option<&str>) -> String {
    match user_id {
        Some(id) if !id.is_empty() => format!("{}...", id.chars().take(5).collect::<String>()),
        _ => "User...".to_string(),
    }
}

/// 입찰 시각 표시 (`3:04:05 PM`), 서버 시각 미확정이면 "Just now"
pub fn bid_time_label<Tz>(timestamp: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match timestamp {
        Some(ts) => ts.with_timezone(tz).format("%-I:%M:%S %p").to_string(),
        None => JUST_NOW.to_string(),
    }
}

impl AuctionItem {
    /// 대표 이미지, 없으면 플레이스홀더
    pub fn thumbnail_url(&self) -> &str {
        self.images
            .first()
            .map(String::as_str)
            .unwrap_or(THUMBNAIL_PLACEHOLDER)
    }

    /// 성능 점검표 이미지, 없으면 플레이스홀더
    pub fn inspection_sheet_url(&self) -> &str {
        self.inspection_sheet_image
            .as_deref()
            .unwrap_or(INSPECTION_SHEET_PLACEHOLDER)
    }

    /// 성능 점검표 PDF 링크
    pub fn inspection_pdf_url(&self) -> Result<&str, &'static str> {
        self.inspection_sheet_pdf.as_deref().ok_or(PDF_NOT_AVAILABLE)
    }
}
