//! 실시간 입찰 세션
//!
//! 화면이 열릴 때 차량 구독과 입찰 이력 구독을 맺고, 닫힐 때 둘 다 해제한다.
//! [`LiveSession::next`] 는 먼저 도착한 이벤트 하나를 상태에 반영하고 돌려준다.
// region:    --- Imports
use super::params::NavigationParams;
use super::state::LiveState;
use super::HISTORY_LIMIT;
use crate::access::{self, AccessError, AccessRequest, ViewMode};
use crate::auction::model::{AuctionItem, BidRecord};
use crate::bidding::gateway::{BidError, BidGateway, BidReceipt};
use crate::bidding::model::{Alert, ProposedAmount};
use crate::store::{DocumentStore, StoreError, Subscription};
use chrono::{Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Session Options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 로컬 카운트다운 주기, `None` 이면 스냅샷 수신 때만 갱신
    pub tick: Option<Duration>,
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tick: Some(Duration::from_secs(1)),
            history_limit: HISTORY_LIMIT,
        }
    }
}
// endregion: --- Session Options

/// 세션이 상태에 반영한 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ItemUpdated,
    ItemMissing,
    HistoryUpdated,
    Ticked,
    BidSettled(Alert),
    FeedError { feed: &'static str, message: String },
    FeedEnded { feed: &'static str },
}

// region:    --- Live Session
pub struct LiveSession {
    store: Arc<dyn DocumentStore>,
    gateway: BidGateway,
    state: LiveState,
    car_feed: Option<Subscription<Option<AuctionItem>>>,
    history_feed: Option<Subscription<Vec<BidRecord>>>,
    ticker: Option<Interval>,
    settled_tx: mpsc::UnboundedSender<Result<BidReceipt, BidError>>,
    settled_rx: mpsc::UnboundedReceiver<Result<BidReceipt, BidError>>,
}

impl LiveSession {
    /// 세션 열기
    ///
    /// 차량 ID 가 없으면(게스트 미리보기) 아무것도 구독하지 않는다.
    /// 구독 실패는 로그만 남기고 빈 상태로 계속 간다.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        gateway: BidGateway,
        params: &NavigationParams,
        options: SessionOptions,
    ) -> Self {
        let resolved = params.resolve();
        let mut state = LiveState::new(&resolved);
        state.history_limit = options.history_limit;
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();

        let mut session = Self {
            store,
            gateway,
            state,
            car_feed: None,
            history_feed: None,
            ticker: None,
            settled_tx,
            settled_rx,
        };

        let Some(car_id) = resolved.car_id else {
            info!("{:<12} --> 차량 ID 없음, 구독 생략", "Session");
            return session;
        };
        info!(
            "{:<12} --> 세션 시작 car={}, mode={:?}",
            "Session", car_id, resolved.mode
        );

        session.car_feed = match session.store.watch_car(&car_id).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!("{:<12} --> 차량 구독 실패: {:?}", "Session", e);
                None
            }
        };
        session.history_feed = match session
            .store
            .watch_bid_history(&car_id, options.history_limit)
            .await
        {
            Ok(feed) => Some(feed),
            Err(e) => {
                warn!("{:<12} --> 입찰 이력 구독 실패: {:?}", "Session", e);
                None
            }
        };
        session.ticker = options.tick.map(|period| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        session
    }

    pub fn state(&self) -> &LiveState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut LiveState {
        &mut self.state
    }

    pub fn is_subscribed(&self) -> bool {
        self.car_feed.is_some() || self.history_feed.is_some()
    }

    /// 다음 이벤트를 받아 상태에 반영
    ///
    /// 더 기다릴 것이 없으면 `None`.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        if !self.is_subscribed() && self.ticker.is_none() && self.state.in_flight == 0 {
            return None;
        }

        tokio::select! {
            snapshot = recv_feed(&mut self.car_feed) => {
                Some(match snapshot {
                    Some(Ok(item)) => {
                        if self.state.apply_item(item, Utc::now()) {
                            SessionEvent::ItemUpdated
                        } else {
                            SessionEvent::ItemMissing
                        }
                    }
                    Some(Err(e)) => feed_error("car", e),
                    None => {
                        self.car_feed = None;
                        SessionEvent::FeedEnded { feed: "car" }
                    }
                })
            }
            snapshot = recv_feed(&mut self.history_feed) => {
                Some(match snapshot {
                    Some(Ok(records)) => {
                        self.state.apply_history(records, &Local);
                        SessionEvent::HistoryUpdated
                    }
                    Some(Err(e)) => feed_error("bidHistory", e),
                    None => {
                        self.history_feed = None;
                        SessionEvent::FeedEnded { feed: "bidHistory" }
                    }
                })
            }
            _ = tick(&mut self.ticker) => {
                self.state.tick(Utc::now());
                Some(SessionEvent::Ticked)
            }
            Some(result) = self.settled_rx.recv() => {
                self.state.settle_submission(&result);
                let alert = match &result {
                    Ok(receipt) => receipt.alert(),
                    Err(e) => e.alert(),
                };
                Some(SessionEvent::BidSettled(alert))
            }
        }
    }

    /// 입찰 제출
    ///
    /// 사전 조건 실패는 즉시 `Err` 로 돌려준다. 통과하면 전송은 백그라운드로
    /// 보내고 결과는 [`SessionEvent::BidSettled`] 로 도착한다. 동시에 여러 건이
    /// 진행될 수 있고 서로 순서를 맞추지 않는다.
    pub fn place_bid(&mut self, amount: impl Into<ProposedAmount>) -> Result<(), BidError> {
        let amount = amount.into();
        let mode = self.state.mode;
        let car_id = self.state.car_id.clone();

        if let Err(e) = self.gateway.check(mode, car_id.as_deref(), &amount) {
            info!("{:<12} --> 입찰 사전 조건 실패: {}", "Session", e);
            self.state.reject_locally(&e);
            return Err(e);
        }

        self.state.begin_submission();
        let gateway = self.gateway.clone();
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = gateway.submit(mode, car_id.as_deref(), amount).await;
            // 세션이 먼저 닫혔으면 결과를 받을 곳이 없다
            let _ = settled_tx.send(result);
        });
        Ok(())
    }

    /// 입력창 금액으로 입찰
    pub fn place_input(&mut self) -> Result<(), BidError> {
        let input = self.state.bid_input.clone();
        self.place_bid(input)
    }

    /// 경매 참가 요청 저장
    ///
    /// 새 요청은 대기 상태로 들어가고, 승인 후 받은 코드로 [`Self::unlock`] 한다.
    pub async fn register(
        &self,
        user_name: &str,
        cnic: &str,
        whatsapp: &str,
    ) -> Result<AccessRequest, AccessError> {
        let uid = self.gateway.auth().uid().ok_or(AccessError::NotSignedIn)?;
        let request = AccessRequest::pending(uid, user_name, cnic, whatsapp);
        self.store
            .submit_access_request(request.clone())
            .await
            .map_err(|e| AccessError::Submit(e.to_string()))?;
        info!("{:<12} --> 참가 요청 접수: user={}", "Session", uid);
        Ok(request)
    }

    /// 액세스 코드로 입찰 모드 해제
    pub async fn unlock(&mut self, code: &str) -> Result<ViewMode, AccessError> {
        let uid = self.gateway.auth().uid().ok_or(AccessError::NotSignedIn)?;
        let request = self
            .store
            .access_request(uid)
            .await
            .map_err(|e| AccessError::Lookup(e.to_string()))?;
        let mode = access::unlock(request.as_ref(), code)?;
        self.state.mode = mode;
        Ok(mode)
    }

    /// 구독 해제 (여러 번 호출해도 된다)
    pub fn close(&mut self) {
        if let Some(mut feed) = self.car_feed.take() {
            feed.unsubscribe();
        }
        if let Some(mut feed) = self.history_feed.take() {
            feed.unsubscribe();
        }
        if self.ticker.take().is_some() {
            info!("{:<12} --> 세션 종료", "Session");
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.close();
    }
}
// endregion: --- Live Session

fn feed_error(feed: &'static str, error: StoreError) -> SessionEvent {
    // 마지막으로 받은 상태를 그대로 보여준다
    warn!("{:<12} --> 구독 오류 ({}): {}", "Session", feed, error);
    SessionEvent::FeedError {
        feed,
        message: error.to_string(),
    }
}

async fn recv_feed<T>(feed: &mut Option<Subscription<T>>) -> Option<Result<T, StoreError>> {
    match feed {
        Some(feed) => feed.recv().await,
        None => std::future::pending().await,
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
