//! Output sinks - listeners that persist records to text files

pub mod gui;
pub mod historical;

pub use gui::GuiSink;
pub use historical::HistoricalSink;

/// Timestamp prefix of every output line
pub(crate) fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}
