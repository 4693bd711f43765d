pub mod access;
pub mod auction;
pub mod bidding;
pub mod config;
pub mod console;
pub mod session;
pub mod store;
