/// 차량 변경 알림 채널 (payload: 차량 ID)
pub const CAR_CHANNEL: &str = "car_changes";

/// 입찰 이력 변경 알림 채널 (payload: 차량 ID)
pub const BID_HISTORY_CHANNEL: &str = "bid_history_changes";

/// 차량 조회
pub const GET_CAR: &str = r#"
    SELECT id, title, brand, year, current_bid, base_price, end_time, status,
           images, inspection_sheet_image, inspection_sheet_pdf
    FROM cars
    WHERE id = $1
"#;

/// 최근 입찰 이력 조회
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, user_id, amount, timestamp
    FROM bid_history
    WHERE car_id = $1
    ORDER BY timestamp DESC NULLS FIRST
    LIMIT $2
"#;

/// 사용자의 최근 참가 요청 조회
pub const GET_ACCESS_REQUEST: &str = r#"
    SELECT user_id, user_name, cnic, whatsapp, request_type, status, access_code, created_at
    FROM auction_requests
    WHERE user_id = $1
    ORDER BY created_at DESC
    LIMIT 1
"#;

/// 참가 요청 저장
pub const INSERT_ACCESS_REQUEST: &str = r#"
    INSERT INTO auction_requests
        (user_id, user_name, cnic, whatsapp, request_type, status, access_code, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
"#;
