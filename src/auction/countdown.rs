//! 경매 남은 시간 표시
// region:    --- Imports
use chrono::{DateTime, Utc};
// endregion: --- Imports

pub const WAITING: &str = "Waiting...";
pub const AUCTION_ENDED: &str = "Auction Ended";

/// 종료 시각과 현재 시각으로 남은 시간 문자열 계산
pub fn time_left(end_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(end_time) = end_time else {
        return WAITING.to_string();
    };

    // 밀리초 단위 차이를 초 단위로 내림
    let remaining = (end_time - now).num_milliseconds().div_euclid(1000);
    if remaining <= 0 {
        return AUCTION_ENDED.to_string();
    }

    let hours = remaining / 3600;
    let minutes = (remaining % 3600) / 60;
    let seconds = remaining % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
