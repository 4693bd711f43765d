// region:    --- Imports
use chrono::{Duration, Utc};
use live_bidding::auction::model::{AuctionItem, AuctionParams, AuctionStatus};
use live_bidding::bidding::gateway::BidGateway;
use live_bidding::bidding::transport::HttpBidTransport;
use live_bidding::config::Config;
use live_bidding::console::{self, Command};
use live_bidding::session::{LiveSession, NavigationParams, SessionOptions, HISTORY_LIMIT};
use live_bidding::store::{DocumentStore, MemoryStore, PgStore};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // 문서 저장소 연결
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            let store = PgStore::connect(database_url).await?;
            if let Err(e) = store.initialize_schema().await {
                error!("{:<12} --> 스키마 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> Postgres 저장소 연결 성공", "Main");
            Arc::new(store)
        }
        None => {
            warn!(
                "{:<12} --> DATABASE_URL 미설정, 메모리 저장소로 실행",
                "Main"
            );
            Arc::new(demo_store(config.car_id.as_deref()))
        }
    };

    // 입찰 게이트웨이
    let transport = HttpBidTransport::new(&config.backend_url, config.bid_timeout)?;
    info!("{:<12} --> 입찰 엔드포인트: {}", "Main", transport.endpoint());
    let gateway = BidGateway::new(Arc::new(transport), config.auth.clone());

    let params = match &config.car_id {
        Some(car_id) => NavigationParams::for_car(car_id, config.mode),
        None => NavigationParams::default(),
    };
    let options = SessionOptions {
        tick: config.countdown_tick,
        history_limit: HISTORY_LIMIT,
    };
    let mut session = LiveSession::open(store, gateway, &params, options).await;

    if let Some(code) = &config.access_code {
        match session.unlock(code).await {
            Ok(mode) => info!("{:<12} --> 입찰 모드: {:?}", "Main", mode),
            Err(e) => warn!("{:<12} --> 액세스 코드 확인 실패: {}", "Main", e),
        }
    }
    console::render_state(session.state());

    // 세션 이벤트와 표준 입력 명령을 번갈아 처리
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut live = true;
    loop {
        tokio::select! {
            event = session.next(), if live => match event {
                Some(event) => console::render_event(&mut session, &event),
                None => live = false,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(command) => {
                        if !console::execute(&mut session, command).await {
                            break;
                        }
                    }
                    Err(e) => warn!("{:<12} --> {}", "Main", e),
                }
            }
        }
    }

    session.close();
    Ok(())
}
// endregion: --- Main

/// 메모리 저장소 실행용 샘플 차량
fn demo_store(car_id: Option<&str>) -> MemoryStore {
    let store = MemoryStore::new();
    if let Some(car_id) = car_id {
        store.upsert_car(AuctionItem {
            id: car_id.to_string(),
            title: "Toyota Corolla Altis 1.6".to_string(),
            brand: "Toyota".to_string(),
            year: Some(2021),
            current_bid: None,
            auction_params: AuctionParams {
                base_price: Some(4_500_000),
                end_time: Some(Utc::now() + Duration::hours(1)),
            },
            status: AuctionStatus::Live,
            ..Default::default()
        });
    }
    store
}
