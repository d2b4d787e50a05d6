//! treasury-tx - Core Library
//! Treasury desk simulator: market data, algo execution and streaming,
//! trade booking, positions, PV01 risk and customer inquiries

// Public modules
pub mod core;
pub mod reference;
pub mod store;
pub mod orderbook;
pub mod pricing;
pub mod strategy;
pub mod streaming;
pub mod execution;
pub mod ledger;
pub mod risk;
pub mod inquiry;
pub mod feeds;
pub mod sinks;
pub mod engine;

// Re-exports
pub use crate::core::{Config, Error, Result};
pub use engine::TradingEngine;
pub use reference::ReferenceData;
