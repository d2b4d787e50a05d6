//! Input feeds - line parsing, file ingestion and synthetic data

pub mod generator;
pub mod parser;
pub mod reader;

pub use generator::DataGenerator;
pub use reader::{FeedReader, IngestReport};
