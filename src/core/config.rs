//! Configuration - Type-safe config with defaults for every section
//!
//! Loaded from `config.toml`; a missing or partial file falls back to the
//! defaults below.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,

    /// Market data batching
    pub market_data: MarketDataConfig,

    /// Execution and streaming algos
    pub algo: AlgoConfig,

    /// Trade booking
    pub booking: BookingConfig,

    /// GUI price output
    pub gui: GuiConfig,

    /// Synthetic input data
    pub generator: GeneratorConfig,

    /// Bond master override (empty = built-in on-the-run Treasuries)
    pub instruments: Vec<InstrumentConfig>,

    /// Risk buckets (empty = group the bond master by ticker tenor)
    pub sectors: Vec<SectorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,

    /// Directory holding prices.txt, marketdata.txt, trades.txt, inquiries.txt
    pub input_dir: PathBuf,

    /// Directory receiving the historical and GUI output files
    pub output_dir: PathBuf,

    /// Historical line format
    pub output_format: OutputFormat,
}

/// Line format of the historical output files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `timestamp,field,field,...`
    #[default]
    Csv,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    /// Price levels per side in each order book snapshot
    pub book_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgoConfig {
    /// Maximum bid/offer spread (fractional notation) at which the execution algo crosses
    pub spread_threshold: String,

    /// Visible size unit of the streaming algo
    pub stream_base_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Books assigned round-robin to algo trades
    pub books: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Minimum milliseconds between two GUI price lines
    pub throttle_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Regenerate the input files before running
    pub enabled: bool,

    /// RNG seed
    pub seed: u64,

    /// Price lines per instrument
    pub price_ticks: usize,

    /// Order book snapshots per instrument
    pub book_snapshots: usize,

    pub trades_per_instrument: usize,

    pub inquiries_per_instrument: usize,
}

/// Reference data for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub cusip: String,
    pub ticker: String,
    pub coupon: Decimal,
    pub maturity: NaiveDate,
    pub pv01: Decimal,
}

/// Named risk bucket of instrument CUSIPs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConfig {
    pub name: String,
    pub cusips: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            output_format: OutputFormat::Csv,
        }
    }
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self { book_depth: 10 }
    }
}

impl Default for AlgoConfig {
    fn default() -> Self {
        Self {
            spread_threshold: "0-002".to_string(),
            stream_base_size: 1_000_000,
        }
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            books: vec!["TRSY1".to_string(), "TRSY2".to_string(), "TRSY3".to_string()],
        }
    }
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self { throttle_ms: 300 }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: 42,
            price_ticks: 1_000,
            book_snapshots: 1_000,
            trades_per_instrument: 10,
            inquiries_per_instrument: 10,
        }
    }
}

impl Config {
    /// Load from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| {
                Error::Config(format!("Failed to read config {}: {}", path.display(), e))
            })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path, or `config.toml`; defaults when neither loads.
    pub fn load_default(path: Option<&Path>) -> Self {
        let candidates: Vec<PathBuf> = match path {
            Some(p) => vec![p.to_path_buf()],
            None => vec![
                PathBuf::from("config.toml"),
                PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml")),
            ],
        };

        for candidate in &candidates {
            match Self::load(candidate) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", candidate.display());
                    return cfg;
                }
                Err(e) => tracing::debug!("{}", e),
            }
        }

        tracing::warn!("No usable config file found, using defaults");
        Self::default()
    }

    /// Spread threshold of the execution algo as an exact price.
    pub fn spread_threshold(&self) -> Result<Decimal> {
        crate::core::price::from_fraction(&self.algo.spread_threshold)
    }

    fn validate(&self) -> Result<()> {
        if self.market_data.book_depth == 0 {
            return Err(Error::Config("market_data.book_depth must be positive".into()));
        }
        if self.booking.books.is_empty() {
            return Err(Error::Config("booking.books must not be empty".into()));
        }
        // hidden size is 2 x (2 x base) at most
        if !(1..=i64::MAX / 4).contains(&self.algo.stream_base_size) {
            return Err(Error::Config("algo.stream_base_size out of range".into()));
        }
        self.spread_threshold()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.market_data.book_depth, 10);
        assert_eq!(config.gui.throttle_ms, 300);
        assert_eq!(config.booking.books, vec!["TRSY1", "TRSY2", "TRSY3"]);
        assert_eq!(config.spread_threshold().unwrap(), Decimal::new(78125, 7));
        assert_eq!(config.app.output_format, OutputFormat::Csv);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[market_data]\nbook_depth = 5\n\n[app]\noutput_format = \"json\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.market_data.book_depth, 5);
        assert_eq!(config.app.output_format, OutputFormat::Json);
        assert_eq!(config.app.log_level, "info");
        assert_eq!(config.algo.stream_base_size, 1_000_000);
    }

    #[test]
    fn test_instrument_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[instruments]]\ncusip = \"912828V23\"\nticker = \"US2Y\"\ncoupon = 0.0425\n\
             maturity = \"2026-12-15\"\npv01 = 0.019"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.instruments.len(), 1);
        assert_eq!(config.instruments[0].pv01, Decimal::new(19, 3));
    }

    #[test]
    fn test_sectors_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[sectors]]\nname = \"Short\"\ncusips = [\"91282CJZ5\", \"912828V23\"]")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sectors.len(), 1);
        assert_eq!(config.sectors[0].name, "Short");
        assert_eq!(config.sectors[0].cusips, vec!["91282CJZ5", "912828V23"]);
        assert!(Config::default().sectors.is_empty());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[algo]\nspread_threshold = \"0.0078\"").unwrap();
        assert!(matches!(Config::load(file.path()), Err(Error::InvalidPrice(_))));
    }

    #[test]
    fn test_stream_base_size_bounds() {
        for size in [0, i64::MAX / 2] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "[algo]\nstream_base_size = {size}").unwrap();
            assert!(matches!(Config::load(file.path()), Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_default(Some(Path::new("/nonexistent/treasury.toml")));
        assert_eq!(config.market_data.book_depth, 10);
    }
}
