//! Trade ledger - booking of executions and netting into positions

pub mod booking;
pub mod position;

pub use booking::TradeBookingService;
pub use position::PositionService;
