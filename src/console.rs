//! 터미널 입찰 화면
//! 1. 표준 입력 명령 해석
//! 2. 세션 상태 출력
// region:    --- Imports
use crate::bidding::gateway::QUICK_INCREMENTS;
use crate::session::{LiveSession, LiveState, SessionEvent};
use tracing::{debug, info, warn};

// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 입력창에 금액을 넣고 바로 제출
    Bid(String),
    /// 빠른 증액 (`+10k`, `+25k`, `+50k`)
    QuickAdd(i64),
    /// 입력창 금액 제출
    Place,
    History,
    Status,
    Code(String),
    /// 경매 참가 요청 (`register <이름> <CNIC> <WhatsApp>`)
    Register {
        user_name: String,
        cnic: String,
        whatsapp: String,
    },
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(head, rest)| (head, rest.trim()))
            .unwrap_or((line, ""));

        match head {
            "bid" => Ok(Command::Bid(rest.to_string())),
            "place" => Ok(Command::Place),
            "history" => Ok(Command::History),
            "status" | "" => Ok(Command::Status),
            "code" if !rest.is_empty() => Ok(Command::Code(rest.to_string())),
            "register" => {
                // 이름에는 공백이 들어갈 수 있어 뒤에서부터 나눈다
                let mut parts = rest.rsplitn(3, char::is_whitespace);
                match (parts.next(), parts.next(), parts.next().map(str::trim)) {
                    (Some(whatsapp), Some(cnic), Some(user_name)) if !user_name.is_empty() => {
                        Ok(Command::Register {
                            user_name: user_name.to_string(),
                            cnic: cnic.to_string(),
                            whatsapp: whatsapp.to_string(),
                        })
                    }
                    _ => Err("usage: register <name> <cnic> <whatsapp>".to_string()),
                }
            }
            "quit" | "exit" => Ok(Command::Quit),
            chip if chip.starts_with('+') => {
                let increment = chip
                    .trim_start_matches('+')
                    .strip_suffix('k')
                    .and_then(|thousands| thousands.parse::<i64>().ok())
                    .map(|thousands| thousands * 1000)
                    .filter(|increment| QUICK_INCREMENTS.contains(increment));
                increment
                    .map(Command::QuickAdd)
                    .ok_or_else(|| format!("unknown increment: {}", chip))
            }
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

/// 명령 실행, 종료 명령이면 `false`
pub async fn execute(session: &mut LiveSession, command: Command) -> bool {
    match command {
        Command::Bid(amount) => {
            session.state_mut().set_input(amount);
            if session.place_input().is_ok() {
                info!("{:<12} --> 입찰 전송 중...", "Console");
            }
        }
        Command::QuickAdd(increment) => {
            session.state_mut().quick_add(increment);
            info!("{:<12} --> 입력 금액: {}", "Console", session.state().bid_input);
        }
        Command::Place => {
            if session.place_input().is_ok() {
                info!("{:<12} --> 입찰 전송 중...", "Console");
            }
        }
        Command::History => render_history(session.state()),
        Command::Status => render_state(session.state()),
        Command::Code(code) => match session.unlock(&code).await {
            Ok(mode) => info!("{:<12} --> 입찰 모드 해제: {:?}", "Console", mode),
            Err(e) => warn!("{:<12} --> 액세스 코드 거절: {}", "Console", e),
        },
        Command::Register {
            user_name,
            cnic,
            whatsapp,
        } => match session.register(&user_name, &cnic, &whatsapp).await {
            Ok(_) => info!(
                "{:<12} --> 참가 요청 접수, 승인 후 액세스 코드를 입력하세요.",
                "Console"
            ),
            Err(e) => warn!("{:<12} --> 참가 요청 실패: {}", "Console", e),
        },
        Command::Quit => return false,
    }
    render_notice(session.state_mut());
    true
}
// endregion: --- Commands

// region:    --- Rendering
pub fn render_event(session: &mut LiveSession, event: &SessionEvent) {
    match event {
        SessionEvent::ItemUpdated => render_state(session.state()),
        SessionEvent::ItemMissing => warn!("{:<12} --> 차량 정보를 찾을 수 없습니다.", "Console"),
        SessionEvent::HistoryUpdated => info!(
            "{:<12} --> {}",
            "Console",
            session.state().history_button_label()
        ),
        SessionEvent::Ticked => debug!("{:<12} --> {}", "Console", session.state().time_left),
        SessionEvent::BidSettled(_) => render_notice(session.state_mut()),
        SessionEvent::FeedError { feed, message } => {
            warn!("{:<12} --> {} 구독 오류: {}", "Console", feed, message)
        }
        SessionEvent::FeedEnded { feed } => warn!("{:<12} --> {} 구독 종료", "Console", feed),
    }
}

pub fn render_state(state: &LiveState) {
    info!("{:<12} --> {} | {}", "Console", state.title(), state.time_left);
    info!(
        "{:<12} --> Ongoing Bid: {}{}",
        "Console",
        state.current_bid_label(),
        if state.is_loading() { " (sending...)" } else { "" }
    );
    if let Some(item) = &state.item {
        info!("{:<12} --> image: {}", "Console", item.thumbnail_url());
        info!("{:<12} --> inspection: {}", "Console", item.inspection_sheet_url());
        match item.inspection_pdf_url() {
            Ok(pdf) => info!("{:<12} --> full sheet: {}", "Console", pdf),
            Err(missing) => info!("{:<12} --> full sheet: {}", "Console", missing),
        }
    }
    if !state.mode.can_bid() {
        info!("{:<12} --> You are in View Only mode.", "Console");
    }
}

pub fn render_history(state: &LiveState) {
    info!("{:<12} --> Bid History", "Console");
    for entry in &state.history {
        info!(
            "{:<12} --> {:<8} {:>12} {}",
            "Console",
            entry.bidder,
            entry.time,
            entry.amount_label()
        );
    }
}

fn render_notice(state: &mut LiveState) {
    if let Some(alert) = state.take_notice() {
        info!("{:<12} --> [{}] {}", "Console", alert.title, alert.message);
    }
}
// endregion: --- Rendering

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("bid 150000"), Ok(Command::Bid("150000".to_string())));
        assert_eq!(Command::parse("  +25k "), Ok(Command::QuickAdd(25_000)));
        assert_eq!(Command::parse("place"), Ok(Command::Place));
        assert_eq!(Command::parse(""), Ok(Command::Status));
        assert_eq!(Command::parse("code  7391"), Ok(Command::Code("7391".to_string())));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn register_keeps_spaces_in_name() {
        assert_eq!(
            Command::parse("register Ali Raza 35202-1234567-1 +923001234567"),
            Ok(Command::Register {
                user_name: "Ali Raza".to_string(),
                cnic: "35202-1234567-1".to_string(),
                whatsapp: "+923001234567".to_string(),
            })
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(Command::parse("+15k").is_err());
        assert!(Command::parse("+tenk").is_err());
        assert!(Command::parse("code").is_err());
        assert!(Command::parse("sell").is_err());
        assert!(Command::parse("register 35202-1234567-1 +923001234567").is_err());
    }
}
