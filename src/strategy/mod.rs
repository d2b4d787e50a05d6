//! Algorithmic strategies
//!
//! Each strategy listens to an upstream store, turns what it sees into an
//! order or quote, and publishes it through its own store.

pub mod execution;
pub mod streaming;

pub use execution::AlgoExecutionService;
pub use streaming::AlgoStreamingService;
