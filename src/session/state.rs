//! 실시간 입찰 화면 상태
//!
//! 차량 스냅샷과 입찰 이력은 서로 따로 도착한다. 두 조각은 각각 독립적으로
//! 갱신되며, 한쪽 갱신이 다른 쪽 갱신을 전제하지 않는다.
// region:    --- Imports
use super::params::ResolvedParams;
use super::HISTORY_LIMIT;
use crate::access::ViewMode;
use crate::auction::countdown;
use crate::auction::display::{bid_time_label, bidder_label, price_label};
use crate::auction::model::{AuctionItem, BidRecord};
use crate::bidding::gateway::{self, BidError, BidReceipt};
use crate::bidding::model::Alert;
use crate::store::newest_first;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use tracing::debug;

// endregion: --- Imports

/// 입찰 이력 한 줄
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub record: BidRecord,
    pub bidder: String,
    /// 스냅샷 수신 시점에 포맷한 시각
    pub time: String,
}

impl HistoryEntry {
    pub fn amount_label(&self) -> String {
        price_label(self.record.amount)
    }
}

#[derive(Debug, Clone)]
pub struct LiveState {
    pub car_id: Option<String>,
    pub mode: ViewMode,
    pub item: Option<AuctionItem>,
    pub current_bid: i64,
    pub end_time: Option<DateTime<Utc>>,
    pub time_left: String,
    pub history: Vec<HistoryEntry>,
    pub bid_input: String,
    pub in_flight: usize,
    pub notice: Option<Alert>,
    /// 보여 줄 입찰 이력 최대 건수
    pub history_limit: usize,
}

impl LiveState {
    pub fn new(params: &ResolvedParams) -> Self {
        Self {
            car_id: params.car_id.clone(),
            mode: params.mode,
            item: None,
            current_bid: params.initial_bid,
            end_time: None,
            time_left: countdown::WAITING.to_string(),
            history: Vec::new(),
            bid_input: String::new(),
            in_flight: 0,
            notice: None,
            history_limit: HISTORY_LIMIT,
        }
    }

    // region:    --- Snapshots
    /// 차량 스냅샷 반영, 문서가 없으면 이전 상태 유지
    pub fn apply_item(&mut self, snapshot: Option<AuctionItem>, now: DateTime<Utc>) -> bool {
        let Some(item) = snapshot else {
            debug!("{:<12} --> 차량 문서 없음, 이전 상태 유지", "LiveState");
            return false;
        };

        if let Some(bid) = item.effective_bid() {
            self.current_bid = bid;
        }
        if let Some(end_time) = item.end_time() {
            self.end_time = Some(end_time);
        }
        self.time_left = countdown::time_left(self.end_time, now);
        self.item = Some(item);
        true
    }

    /// 입찰 이력 스냅샷으로 통째로 교체
    pub fn apply_history<Tz>(&mut self, mut records: Vec<BidRecord>, tz: &Tz)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        newest_first(&mut records);
        records.truncate(self.history_limit);
        self.history = records
            .into_iter()
            .map(|record| HistoryEntry {
                bidder: bidder_label(record.user_id.as_deref()),
                time: bid_time_label(record.timestamp, tz),
                record,
            })
            .collect();
    }

    /// 마지막으로 알려진 종료 시각으로 남은 시간 재계산
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.time_left = countdown::time_left(self.end_time, now);
    }
    // endregion: --- Snapshots

    // region:    --- Input
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.bid_input = input.into();
    }

    /// 빠른 증액: 매번 현재가 스냅샷에서 다시 계산한다
    pub fn quick_add(&mut self, increment: i64) {
        self.bid_input = gateway::quick_add(self.current_bid, increment);
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn begin_submission(&mut self) {
        self.in_flight += 1;
    }

    /// 네트워크 호출 전에 걸러진 입찰
    pub fn reject_locally(&mut self, error: &BidError) {
        self.notice = Some(error.alert());
    }

    /// 입찰 결과 반영: 성공이면 입력창만 비운다
    pub fn settle_submission(&mut self, result: &Result<BidReceipt, BidError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match result {
            Ok(receipt) => {
                self.bid_input.clear();
                self.notice = Some(receipt.alert());
            }
            Err(error) => self.notice = Some(error.alert()),
        }
    }

    pub fn take_notice(&mut self) -> Option<Alert> {
        self.notice.take()
    }
    // endregion: --- Input

    // region:    --- Display
    pub fn title(&self) -> &str {
        self.item
            .as_ref()
            .map(|item| item.title.as_str())
            .filter(|title| !title.is_empty())
            .unwrap_or("Loading...")
    }

    pub fn current_bid_label(&self) -> String {
        price_label(self.current_bid)
    }

    pub fn history_button_label(&self) -> String {
        format!("View Bid History ({})", self.history.len())
    }
    // endregion: --- Display
}
