// region:    --- Imports
use super::model::{PlaceBidRequest, PlaceBidResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

// endregion: --- Imports

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

// region:    --- Bid Transport Trait
/// 입찰 전송 트레이트
#[async_trait]
pub trait BidTransport: Send + Sync {
    async fn place_bid(&self, request: &PlaceBidRequest) -> Result<PlaceBidResponse, TransportError>;
}

/// HTTP 입찰 전송 구현체
pub struct HttpBidTransport {
    client: Client,
    endpoint: String,
}

impl HttpBidTransport {
    /// `{backend}/api/place-bid` 로 보내는 전송 생성
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/place-bid", backend_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl BidTransport for HttpBidTransport {
    async fn place_bid(&self, request: &PlaceBidRequest) -> Result<PlaceBidResponse, TransportError> {
        info!(
            "{:<12} --> 입찰 전송: car={}, user={}",
            "Transport", request.car_id, request.user_id
        );
        // 실패 응답도 JSON 본문으로 온다, 상태 코드는 보지 않는다
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        debug!("{:<12} --> 응답 상태: {}", "Transport", response.status());

        Ok(response.json::<PlaceBidResponse>().await?)
    }
}
// endregion: --- Bid Transport Trait
