pub mod live;
pub mod params;
pub mod state;

pub use live::{LiveSession, SessionEvent, SessionOptions};
pub use params::NavigationParams;
pub use state::LiveState;

/// 화면에 보여주는 최근 입찰 건수
pub const HISTORY_LIMIT: usize = 10;
