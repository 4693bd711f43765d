//! 입찰 제출
//! 1. 사전 조건 확인 (로그인, 입찰 모드, 금액)
//! 2. 입찰 전송 및 결과 해석
// region:    --- Imports
use super::model::{Alert, AuthSession, PlaceBidRequest, ProposedAmount};
use super::transport::{BidTransport, TransportError};
use crate::access::ViewMode;
use std::sync::Arc;
use tracing::{info, warn};
// endregion: --- Imports

/// 빠른 증액 버튼 금액
pub const QUICK_INCREMENTS: [i64; 3] = [10_000, 25_000, 50_000];

// region:    --- Bid Error
#[derive(Debug, thiserror::Error)]
pub enum BidError {
    #[error("not signed in")]
    NotAuthenticated,
    #[error("session is view only")]
    ViewOnly,
    #[error("no auction item selected")]
    NoItem,
    #[error("bid amount is empty")]
    EmptyAmount,
    #[error("bid rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

impl BidError {
    /// 네트워크 호출 전에 걸러진 오류인지
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BidError::NotAuthenticated | BidError::ViewOnly | BidError::NoItem | BidError::EmptyAmount
        )
    }

    pub fn alert(&self) -> Alert {
        match self {
            BidError::NotAuthenticated => Alert::new("Access Denied", "Please log in."),
            BidError::ViewOnly => Alert::new("View Only", "You are in View Only mode."),
            BidError::NoItem => Alert::new("Error", "No auction selected."),
            BidError::EmptyAmount => Alert::new("Error", "Enter amount."),
            BidError::Rejected(message) => Alert::new("Bid Failed", message.clone()),
            BidError::Transport(_) => Alert::new("Error", "Connection failed."),
        }
    }
}
// endregion: --- Bid Error

/// 접수된 입찰
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidReceipt {
    pub car_id: String,
    pub amount: ProposedAmount,
}

impl BidReceipt {
    pub fn alert(&self) -> Alert {
        Alert::new("Success", "Bid Placed!")
    }
}

// region:    --- Bid Gateway
/// 입찰 제출 게이트웨이
///
/// 성공해도 로컬 상태는 건드리지 않는다. 현재가와 이력은 구독이 반영한다.
#[derive(Clone)]
pub struct BidGateway {
    transport: Arc<dyn BidTransport>,
    auth: AuthSession,
}

impl BidGateway {
    pub fn new(transport: Arc<dyn BidTransport>, auth: AuthSession) -> Self {
        Self { transport, auth }
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// 사전 조건 확인 (네트워크 호출 없음)
    pub fn check<'a>(
        &'a self,
        mode: ViewMode,
        car_id: Option<&'a str>,
        amount: &ProposedAmount,
    ) -> Result<(&'a str, &'a str), BidError> {
        let user_id = self.auth.uid().ok_or(BidError::NotAuthenticated)?;
        if !mode.can_bid() {
            return Err(BidError::ViewOnly);
        }
        let car_id = car_id.ok_or(BidError::NoItem)?;
        if amount.is_empty() {
            return Err(BidError::EmptyAmount);
        }
        Ok((user_id, car_id))
    }

    /// 입찰 제출
    ///
    /// 사전 조건에 걸리면 네트워크 호출 없이 바로 실패한다. 재시도는 없다.
    pub async fn submit(
        &self,
        mode: ViewMode,
        car_id: Option<&str>,
        amount: impl Into<ProposedAmount>,
    ) -> Result<BidReceipt, BidError> {
        let amount = amount.into();
        let (user_id, car_id) = self.check(mode, car_id, &amount)?;

        let request = PlaceBidRequest {
            car_id: car_id.to_string(),
            user_id: user_id.to_string(),
            bid_amount: amount,
        };
        info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Gateway", request);

        let response = match self.transport.place_bid(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("{:<12} --> 입찰 전송 실패: {:?}", "Gateway", e);
                return Err(e.into());
            }
        };

        if response.success {
            info!("{:<12} --> 입찰 접수: car={}", "Gateway", request.car_id);
            Ok(BidReceipt {
                car_id: request.car_id,
                amount: request.bid_amount,
            })
        } else {
            let message = response.message.unwrap_or_default();
            info!("{:<12} --> 입찰 거절: {}", "Gateway", message);
            Err(BidError::Rejected(message))
        }
    }
}

/// 빠른 증액: 현재가 스냅샷 + 증액분 (제출하지 않음)
pub fn quick_add(current_bid: i64, increment: i64) -> String {
    current_bid.saturating_add(increment).to_string()
}
// endregion: --- Bid Gateway

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::model::PlaceBidResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedTransport {
        calls: AtomicUsize,
        reply: Mutex<Option<PlaceBidResponse>>,
        last_request: Mutex<Option<PlaceBidRequest>>,
    }

    impl ScriptedTransport {
        fn replying(success: bool, message: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                reply: Mutex::new(Some(PlaceBidResponse {
                    success,
                    message: message.map(str::to_string),
                })),
                last_request: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl BidTransport for ScriptedTransport {
        async fn place_bid(
            &self,
            request: &PlaceBidRequest,
        ) -> Result<PlaceBidResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            Ok(self.reply.lock().unwrap().clone().unwrap())
        }
    }

    #[tokio::test]
    async fn guest_is_rejected_without_network_call() {
        let transport = ScriptedTransport::replying(true, None);
        let gateway = BidGateway::new(transport.clone(), AuthSession::Guest);

        let err = gateway
            .submit(ViewMode::Bid, Some("car-1"), "150000")
            .await
            .unwrap_err();

        assert!(err.is_precondition());
        assert_eq!(err.alert(), Alert::new("Access Denied", "Please log in."));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_amount_is_rejected_without_network_call() {
        let transport = ScriptedTransport::replying(true, None);
        let gateway = BidGateway::new(transport.clone(), AuthSession::signed_in("uid-1"));

        for amount in [ProposedAmount::from(""), ProposedAmount::from("   "), ProposedAmount::from(0_i64)] {
            let err = gateway
                .submit(ViewMode::Bid, Some("car-1"), amount)
                .await
                .unwrap_err();
            assert!(matches!(err, BidError::EmptyAmount));
            assert_eq!(err.alert(), Alert::new("Error", "Enter amount."));
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn view_only_and_missing_item_are_preconditions() {
        let transport = ScriptedTransport::replying(true, None);
        let gateway = BidGateway::new(transport.clone(), AuthSession::signed_in("uid-1"));

        let err = gateway
            .submit(ViewMode::View, Some("car-1"), 150_000_i64)
            .await
            .unwrap_err();
        assert!(matches!(err, BidError::ViewOnly));

        let err = gateway.submit(ViewMode::Bid, None, 150_000_i64).await.unwrap_err();
        assert!(matches!(err, BidError::NoItem));

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_bid_forwards_amount_as_typed() {
        let transport = ScriptedTransport::replying(true, None);
        let gateway = BidGateway::new(transport.clone(), AuthSession::signed_in("uid-1"));

        let receipt = gateway
            .submit(ViewMode::Bid, Some("car-1"), "150000")
            .await
            .unwrap();

        assert_eq!(receipt.alert(), Alert::new("Success", "Bid Placed!"));
        let request = transport.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "carId": "car-1", "userId": "uid-1", "bidAmount": "150000" })
        );
    }

    #[tokio::test]
    async fn server_rejection_message_is_surfaced_verbatim() {
        let transport = ScriptedTransport::replying(false, Some("Bid must be higher than current bid"));
        let gateway = BidGateway::new(transport.clone(), AuthSession::signed_in("uid-1"));

        let err = gateway
            .submit(ViewMode::Bid, Some("car-1"), 90_000_i64)
            .await
            .unwrap_err();

        assert!(!err.is_precondition());
        assert_eq!(
            err.alert(),
            Alert::new("Bid Failed", "Bid must be higher than current bid")
        );
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quick_add_is_based_on_snapshot() {
        assert_eq!(quick_add(100_000, QUICK_INCREMENTS[0]), "110000");
        assert_eq!(quick_add(100_000, QUICK_INCREMENTS[2]), "150000");
        assert_eq!(quick_add(i64::MAX, 10_000), i64::MAX.to_string());
    }
}
