//! 외부 문서 저장소 구독
//!
//! 저장소는 변경이 생길 때마다 문서 전체 스냅샷을 채널로 밀어 넣는다.
//! 화면 쪽은 [`Subscription`] 을 비우면서 상태를 갱신하기만 한다.
// region:    --- Imports
use crate::access::AccessRequest;
use crate::auction::model::{AuctionItem, BidRecord};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::MemoryStore;
pub use postgres::PgStore;
// endregion: --- Modules

/// 구독 채널 버퍼 크기
pub const SUBSCRIPTION_BUFFER: usize = 16;

// region:    --- Store Error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("document decode error: {0}")]
    Decode(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
// endregion: --- Store Error

// region:    --- Subscription
/// 스냅샷 구독 핸들
///
/// 백그라운드 감시 작업과 스냅샷 채널을 소유한다. drop 되면 구독도 해제된다.
pub struct Subscription<T> {
    feed: &'static str,
    rx: mpsc::Receiver<Result<T, StoreError>>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub fn new(
        feed: &'static str,
        rx: mpsc::Receiver<Result<T, StoreError>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            feed,
            rx,
            task: Some(task),
        }
    }

    pub fn feed(&self) -> &'static str {
        self.feed
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    /// 다음 스냅샷 수신, 구독이 끝났으면 `None`
    pub async fn recv(&mut self) -> Option<Result<T, StoreError>> {
        if self.task.is_none() {
            return None;
        }
        self.rx.recv().await
    }

    /// 구독 해제 (여러 번 호출해도 된다)
    pub fn unsubscribe(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();
        self.rx.close();
        debug!("{:<12} --> 구독 해제: {}", "Subscription", self.feed);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
// endregion: --- Subscription

// region:    --- Document Store Trait
/// 문서 저장소 트레이트
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 차량 문서 구독, 문서가 없으면 `None` 스냅샷
    async fn watch_car(
        &self,
        car_id: &str,
    ) -> Result<Subscription<Option<AuctionItem>>, StoreError>;

    /// 최근 입찰 이력 구독 (최신순, 최대 `limit` 건)
    async fn watch_bid_history(
        &self,
        car_id: &str,
        limit: usize,
    ) -> Result<Subscription<Vec<BidRecord>>, StoreError>;

    /// 사용자의 최근 경매 참가 요청 조회
    async fn access_request(&self, user_id: &str) -> Result<Option<AccessRequest>, StoreError>;

    /// 경매 참가 요청 저장
    async fn submit_access_request(&self, request: AccessRequest) -> Result<(), StoreError>;
}
// endregion: --- Document Store Trait

/// 이력 정렬: 최신순, 서버 시각 미확정 건이 가장 앞
pub(crate) fn newest_first(history: &mut [BidRecord]) {
    history.sort_by_key(|bid| {
        std::cmp::Reverse(
            bid.timestamp
                .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC),
        )
    });
}
