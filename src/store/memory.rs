//! 프로세스 내부 문서 저장소
//!
//! 변경 알림은 broadcast 채널로 흘려 보내고, 각 구독 작업이 자기 차량에
//! 해당하는 알림만 골라 스냅샷을 다시 만든다.
// region:    --- Imports
use super::{newest_first, DocumentStore, StoreError, Subscription, SUBSCRIPTION_BUFFER};
use crate::access::AccessRequest;
use crate::auction::model::{AuctionItem, BidRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

// endregion: --- Imports

/// 변경 알림 채널 크기
const CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
enum Change {
    Car(String),
    History(String),
    Fault { car_id: String, message: String },
}

#[derive(Default)]
struct Documents {
    cars: HashMap<String, AuctionItem>,
    bids: HashMap<String, Vec<BidRecord>>,
    requests: Vec<AccessRequest>,
    next_bid_id: u64,
}

// region:    --- Memory Store
#[derive(Clone)]
pub struct MemoryStore {
    docs: Arc<Mutex<Documents>>,
    changes: broadcast::Sender<Change>,
    watch_calls: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            docs: Arc::new(Mutex::new(Documents::default())),
            changes,
            watch_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 지금까지 열린 구독 수
    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    /// 아직 살아 있는 구독 작업 수
    pub fn active_watchers(&self) -> usize {
        self.changes.receiver_count()
    }

    /// 차량 문서 저장 (전체 교체)
    pub fn upsert_car(&self, item: AuctionItem) {
        let car_id = item.id.clone();
        lock(&self.docs).cars.insert(car_id.clone(), item);
        self.notify(Change::Car(car_id));
    }

    /// 입찰 반영
    ///
    /// 현재 가격보다 높은 금액만 받아들이고, 받아들인 경우 현재 가격 갱신과
    /// 이력 추가를 한 번에 처리한다.
    pub fn record_bid(
        &self,
        car_id: &str,
        user_id: &str,
        amount: i64,
        timestamp: Option<DateTime<Utc>>,
    ) -> bool {
        {
            let mut docs = lock(&self.docs);
            let Some(car) = docs.cars.get_mut(car_id) else {
                warn!("{:<12} --> 입찰 실패: 없는 차량 {}", "MemoryStore", car_id);
                return false;
            };
            if car.effective_bid().is_some_and(|current| current >= amount) {
                info!(
                    "{:<12} --> 입찰 실패: 현재 가격이 더 높거나 같음",
                    "MemoryStore"
                );
                return false;
            }
            car.current_bid = Some(amount);

            docs.next_bid_id += 1;
            let record = BidRecord {
                id: format!("bid-{}", docs.next_bid_id),
                user_id: Some(user_id.to_string()),
                amount,
                timestamp,
            };
            docs.bids.entry(car_id.to_string()).or_default().push(record);
        }

        info!(
            "{:<12} --> 입찰 성공: car={}, 현재 가격 {}",
            "MemoryStore", car_id, amount
        );
        self.notify(Change::Car(car_id.to_string()));
        self.notify(Change::History(car_id.to_string()));
        true
    }

    /// 해당 차량의 모든 구독에 오류 전달
    pub fn inject_fault(&self, car_id: &str, message: &str) {
        self.notify(Change::Fault {
            car_id: car_id.to_string(),
            message: message.to_string(),
        });
    }

    fn notify(&self, change: Change) {
        // 구독자가 없으면 보낼 곳이 없을 뿐이다
        let _ = self.changes.send(change);
    }

    fn car_snapshot(docs: &Mutex<Documents>, car_id: &str) -> Option<AuctionItem> {
        lock(docs).cars.get(car_id).cloned()
    }

    fn history_snapshot(docs: &Mutex<Documents>, car_id: &str, limit: usize) -> Vec<BidRecord> {
        let mut history = lock(docs).bids.get(car_id).cloned().unwrap_or_default();
        newest_first(&mut history);
        history.truncate(limit);
        history
    }

    /// 공통 감시 작업: 초기 스냅샷 후 관련 알림마다 다시 스냅샷
    fn spawn_watcher<T, F>(
        &self,
        feed: &'static str,
        car_id: &str,
        wants: fn(&Change, &str) -> bool,
        snapshot: F,
    ) -> Subscription<T>
    where
        T: Send + 'static,
        F: Fn() -> T + Send + 'static,
    {
        self.watch_calls.fetch_add(1, Ordering::SeqCst);

        // 초기 스냅샷보다 먼저 구독해야 사이의 변경을 놓치지 않는다
        let mut changes = self.changes.subscribe();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let car_id = car_id.to_string();

        let task = tokio::spawn(async move {
            if tx.send(Ok(snapshot())).await.is_err() {
                return;
            }
            loop {
                let next = match changes.recv().await {
                    Ok(Change::Fault { car_id: id, message }) if id == car_id => {
                        Err(StoreError::Unavailable(message))
                    }
                    Ok(change) if wants(&change, &car_id) => Ok(snapshot()),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(
                            "{:<12} --> 변경 알림 {}건 유실, 스냅샷 재전송",
                            "MemoryStore", skipped
                        );
                        Ok(snapshot())
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if tx.send(next).await.is_err() {
                    break;
                }
            }
        });

        Subscription::new(feed, rx, task)
    }
}

fn lock(docs: &Mutex<Documents>) -> MutexGuard<'_, Documents> {
    docs.lock().unwrap_or_else(PoisonError::into_inner)
}
// endregion: --- Memory Store

// region:    --- Document Store Impl
#[async_trait]
impl DocumentStore for MemoryStore {
    async fn watch_car(
        &self,
        car_id: &str,
    ) -> Result<Subscription<Option<AuctionItem>>, StoreError> {
        let docs = Arc::clone(&self.docs);
        let id = car_id.to_string();
        Ok(self.spawn_watcher(
            "car",
            car_id,
            |change, car_id| matches!(change, Change::Car(id) if id == car_id),
            move || Self::car_snapshot(&docs, &id),
        ))
    }

    async fn watch_bid_history(
        &self,
        car_id: &str,
        limit: usize,
    ) -> Result<Subscription<Vec<BidRecord>>, StoreError> {
        let docs = Arc::clone(&self.docs);
        let id = car_id.to_string();
        Ok(self.spawn_watcher(
            "bidHistory",
            car_id,
            |change, car_id| matches!(change, Change::History(id) if id == car_id),
            move || Self::history_snapshot(&docs, &id, limit),
        ))
    }

    async fn access_request(&self, user_id: &str) -> Result<Option<AccessRequest>, StoreError> {
        Ok(lock(&self.docs)
            .requests
            .iter()
            .filter(|request| request.user_id == user_id)
            .max_by_key(|request| request.created_at)
            .cloned())
    }

    async fn submit_access_request(&self, request: AccessRequest) -> Result<(), StoreError> {
        info!(
            "{:<12} --> 참가 요청 저장: user={}",
            "MemoryStore", request.user_id
        );
        lock(&self.docs).requests.push(request);
        Ok(())
    }
}
// endregion: --- Document Store Impl

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RequestStatus;
    use chrono::Duration;

    fn car(id: &str, base_price: i64) -> AuctionItem {
        AuctionItem {
            id: id.to_string(),
            title: "Corolla Altis".to_string(),
            auction_params: crate::auction::model::AuctionParams {
                base_price: Some(base_price),
                end_time: None,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn car_watch_delivers_initial_and_updated_snapshots() {
        let store = MemoryStore::new();
        store.upsert_car(car("car-1", 100_000));

        let mut sub = store.watch_car("car-1").await.unwrap();
        let first = sub.recv().await.unwrap().unwrap().unwrap();
        assert_eq!(first.effective_bid(), Some(100_000));

        assert!(store.record_bid("car-1", "uid-1", 120_000, Some(Utc::now())));
        let second = sub.recv().await.unwrap().unwrap().unwrap();
        assert_eq!(second.effective_bid(), Some(120_000));
    }

    #[tokio::test]
    async fn unsubscribe_releases_the_watcher() {
        let store = MemoryStore::new();
        store.upsert_car(car("car-1", 100_000));

        let mut sub = store.watch_car("car-1").await.unwrap();
        assert_eq!(store.active_watchers(), 1);

        sub.unsubscribe();
        while store.active_watchers() > 0 {
            tokio::task::yield_now().await;
        }
        assert!(!store.record_bid("car-1", "uid-1", 90_000, None));
        assert_eq!(store.active_watchers(), 0);
    }

    #[tokio::test]
    async fn missing_car_yields_none_snapshot() {
        let store = MemoryStore::new();
        let mut sub = store.watch_car("ghost").await.unwrap();
        assert!(sub.recv().await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn low_bids_are_not_recorded() {
        let store = MemoryStore::new();
        store.upsert_car(car("car-1", 100_000));

        assert!(!store.record_bid("car-1", "uid-1", 100_000, Some(Utc::now())));
        assert!(!store.record_bid("car-2", "uid-1", 500_000, Some(Utc::now())));

        let mut sub = store.watch_bid_history("car-1", 10).await.unwrap();
        assert!(sub.recv().await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_newest_first_and_bounded() {
        let store = MemoryStore::new();
        store.upsert_car(car("car-1", 0));
        let start = Utc::now() - Duration::minutes(30);
        for i in 1..=15 {
            store.record_bid("car-1", "uid-1", i * 1000, Some(start + Duration::seconds(i)));
        }

        let mut sub = store.watch_bid_history("car-1", 10).await.unwrap();
        let history = sub.recv().await.unwrap().unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].amount, 15_000);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].timestamp > pair[1].timestamp));
    }

    #[tokio::test]
    async fn latest_access_request_wins() {
        let store = MemoryStore::new();
        let mut old = AccessRequest::pending("uid-1", "Ali", "x", "y");
        old.created_at = Utc::now() - Duration::days(1);
        old.status = RequestStatus::Rejected;
        store.submit_access_request(old).await.unwrap();
        store
            .submit_access_request(AccessRequest::pending("uid-1", "Ali", "x", "y"))
            .await
            .unwrap();

        let latest = store.access_request("uid-1").await.unwrap().unwrap();
        assert_eq!(latest.status, RequestStatus::Pending);
        assert!(store.access_request("uid-2").await.unwrap().is_none());
    }
}
