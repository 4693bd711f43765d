//! Postgres 문서 저장소
//!
//! 테이블 트리거가 `pg_notify` 로 변경된 차량 ID 를 알리고, 구독 작업은
//! `LISTEN` 으로 알림을 받아 해당 문서를 다시 조회한다.
// region:    --- Imports
use super::{queries, DocumentStore, StoreError, Subscription, SUBSCRIPTION_BUFFER};
use crate::access::{AccessRequest, RequestStatus, RequestType};
use crate::auction::model::{AuctionItem, AuctionParams, AuctionStatus, BidRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgListener, PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

/// LISTEN 오류 후 재시도 간격
const RETRY_DELAY: Duration = Duration::from_secs(1);

// region:    --- Rows
#[derive(FromRow)]
struct CarRow {
    id: String,
    title: String,
    brand: String,
    year: Option<i32>,
    current_bid: Option<i64>,
    base_price: Option<i64>,
    end_time: Option<DateTime<Utc>>,
    status: String,
    images: Vec<String>,
    inspection_sheet_image: Option<String>,
    inspection_sheet_pdf: Option<String>,
}

impl From<CarRow> for AuctionItem {
    fn from(row: CarRow) -> Self {
        AuctionItem {
            id: row.id,
            title: row.title,
            brand: row.brand,
            year: row.year,
            current_bid: row.current_bid,
            auction_params: AuctionParams {
                base_price: row.base_price,
                end_time: row.end_time,
            },
            status: AuctionStatus::from(row.status),
            images: row.images,
            inspection_sheet_image: row.inspection_sheet_image,
            inspection_sheet_pdf: row.inspection_sheet_pdf,
        }
    }
}

#[derive(FromRow)]
struct AccessRequestRow {
    user_id: String,
    user_name: String,
    cnic: String,
    whatsapp: String,
    request_type: String,
    status: String,
    access_code: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccessRequestRow> for AccessRequest {
    type Error = StoreError;

    fn try_from(row: AccessRequestRow) -> Result<Self, Self::Error> {
        let status = RequestStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Decode(format!("unknown request status: {}", row.status)))?;
        if row.request_type != RequestType::GlobalAccess.as_str() {
            return Err(StoreError::Decode(format!(
                "unknown request type: {}",
                row.request_type
            )));
        }
        Ok(AccessRequest {
            user_id: row.user_id,
            user_name: row.user_name,
            cnic: row.cnic,
            whatsapp: row.whatsapp,
            request_type: RequestType::GlobalAccess,
            status,
            access_code: row.access_code,
            created_at: row.created_at,
        })
    }
}
// endregion: --- Rows

/// 알림 payload 가 감시 중인 차량이면 다시 조회
///
/// `None` 은 연결이 끊겼던 경우라 놓친 변경이 있을 수 있으므로 항상 다시 조회한다.
fn should_refetch(payload: Option<&str>, car_id: &str) -> bool {
    payload.map_or(true, |payload| payload == car_id)
}

// region:    --- Pg Store
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    /// 커넥션 풀 생성
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// 스키마 및 알림 트리거 생성
    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        let create_schema_sql = include_str!("../../sql/01-create-schema.sql");
        sqlx::raw_sql(create_schema_sql).execute(&*self.pool).await?;
        info!("{:<12} --> 스키마 초기화 완료", "PgStore");
        Ok(())
    }

    async fn fetch_car(pool: &PgPool, car_id: &str) -> Result<Option<AuctionItem>, StoreError> {
        let row = sqlx::query_as::<_, CarRow>(queries::GET_CAR)
            .bind(car_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(AuctionItem::from))
    }

    async fn fetch_history(
        pool: &PgPool,
        car_id: &str,
        limit: usize,
    ) -> Result<Vec<BidRecord>, StoreError> {
        let history = sqlx::query_as::<_, BidRecord>(queries::GET_BID_HISTORY)
            .bind(car_id)
            .bind(limit as i64)
            .fetch_all(pool)
            .await?;
        Ok(history)
    }

    /// 공통 감시 작업: `channel` 알림 중 payload 가 `car_id` 인 것마다 `fetch` 재실행
    async fn spawn_listener<T, F, Fut>(
        &self,
        feed: &'static str,
        channel: &'static str,
        car_id: &str,
        fetch: F,
    ) -> Result<Subscription<T>, StoreError>
    where
        T: Send + 'static,
        F: Fn(Arc<PgPool>, String) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, StoreError>> + Send,
    {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(channel).await?;

        let pool = Arc::clone(&self.pool);
        let car_id = car_id.to_string();
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            if tx.send(fetch(Arc::clone(&pool), car_id.clone()).await).await.is_err() {
                return;
            }
            loop {
                let payload = match listener.try_recv().await {
                    Ok(Some(notification)) => Some(notification.payload().to_string()),
                    // 연결이 끊겼다가 다시 붙는 동안의 알림은 유실될 수 있다
                    Ok(None) => {
                        warn!(
                            "{:<12} --> LISTEN 연결 끊김, 재연결 후 다시 조회: channel={}",
                            "PgStore", channel
                        );
                        None
                    }
                    Err(e) => {
                        error!("{:<12} --> LISTEN 오류: {:?}", "PgStore", e);
                        if tx.send(Err(StoreError::Database(e))).await.is_err() {
                            break;
                        }
                        sleep(RETRY_DELAY).await;
                        continue;
                    }
                };
                if !should_refetch(payload.as_deref(), &car_id) {
                    continue;
                }
                debug!(
                    "{:<12} --> 변경 알림 수신: channel={}, car={}",
                    "PgStore", channel, car_id
                );
                let snapshot = fetch(Arc::clone(&pool), car_id.clone()).await;
                if tx.send(snapshot).await.is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(feed, rx, task))
    }
}
// endregion: --- Pg Store

// region:    --- Document Store Impl
#[async_trait]
impl DocumentStore for PgStore {
    async fn watch_car(
        &self,
        car_id: &str,
    ) -> Result<Subscription<Option<AuctionItem>>, StoreError> {
        info!("{:<12} --> 차량 구독 id: {}", "PgStore", car_id);
        self.spawn_listener("car", queries::CAR_CHANNEL, car_id, |pool, id| async move {
            Self::fetch_car(&pool, &id).await
        })
        .await
    }

    async fn watch_bid_history(
        &self,
        car_id: &str,
        limit: usize,
    ) -> Result<Subscription<Vec<BidRecord>>, StoreError> {
        info!("{:<12} --> 입찰 이력 구독 id: {}", "PgStore", car_id);
        self.spawn_listener(
            "bidHistory",
            queries::BID_HISTORY_CHANNEL,
            car_id,
            move |pool, id| async move { Self::fetch_history(&pool, &id, limit).await },
        )
        .await
    }

    async fn access_request(&self, user_id: &str) -> Result<Option<AccessRequest>, StoreError> {
        info!("{:<12} --> 참가 요청 조회 user: {}", "PgStore", user_id);
        sqlx::query_as::<_, AccessRequestRow>(queries::GET_ACCESS_REQUEST)
            .bind(user_id)
            .fetch_optional(&*self.pool)
            .await?
            .map(AccessRequest::try_from)
            .transpose()
    }

    async fn submit_access_request(&self, request: AccessRequest) -> Result<(), StoreError> {
        info!("{:<12} --> 참가 요청 저장 user: {}", "PgStore", request.user_id);
        sqlx::query(queries::INSERT_ACCESS_REQUEST)
            .bind(&request.user_id)
            .bind(&request.user_name)
            .bind(&request.cnic)
            .bind(&request.whatsapp)
            .bind(request.request_type.as_str())
            .bind(request.status.as_str())
            .bind(&request.access_code)
            .bind(request.created_at)
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
// endregion: --- Document Store Impl

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refetches_only_for_watched_car() {
        assert!(should_refetch(Some("car-1"), "car-1"));
        assert!(!should_refetch(Some("car-2"), "car-1"));
    }

    #[test]
    fn refetches_after_lost_connection() {
        assert!(should_refetch(None, "car-1"));
    }

    #[test]
    fn car_row_maps_to_item() {
        let item = AuctionItem::from(CarRow {
            id: "car-1".to_string(),
            title: "Civic".to_string(),
            brand: "Honda".to_string(),
            year: Some(2020),
            current_bid: None,
            base_price: Some(90_000),
            end_time: None,
            status: "active".to_string(),
            images: vec!["https://img/1.jpg".to_string()],
            inspection_sheet_image: None,
            inspection_sheet_pdf: None,
        });
        assert_eq!(item.status, AuctionStatus::Live);
        assert_eq!(item.effective_bid(), Some(90_000));
        assert_eq!(item.images.len(), 1);
    }
}
