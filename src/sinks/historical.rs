//! Historical sink - append-only record of everything a store publishes

use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::core::config::OutputFormat;
use crate::core::{DisplayRecord, Listener, Result};
use crate::sinks::timestamp;

pub const POSITIONS_FILE: &str = "positions.txt";
pub const RISK_FILE: &str = "risk.txt";
pub const EXECUTIONS_FILE: &str = "executions.txt";
pub const STREAMING_FILE: &str = "streaming.txt";
pub const INQUIRIES_FILE: &str = "allinquiries.txt";

pub struct HistoricalSink<V> {
    name: String,
    path: PathBuf,
    format: OutputFormat,
    out: Mutex<BufWriter<File>>,
    _record: PhantomData<fn(&V)>,
}

impl<V> HistoricalSink<V> {
    /// Open (or create) `dir/file` for appending.
    pub fn open(dir: &Path, file: &str, format: OutputFormat) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(file);
        let handle = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("Persisting {} to {}", file, path.display());
        Ok(Self {
            name: format!("historical:{file}"),
            path,
            format,
            out: Mutex::new(BufWriter::new(handle)),
            _record: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn flush(&self) -> Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}

impl<V: DisplayRecord + Serialize> HistoricalSink<V> {
    /// Append one timestamped record.
    pub fn persist(&self, record: &V) -> Result<()> {
        let line = match self.format {
            OutputFormat::Csv => {
                let mut fields = vec![timestamp()];
                fields.extend(record.display_fields());
                fields.join(",")
            }
            OutputFormat::Json => serde_json::to_string(&serde_json::json!({
                "timestamp": timestamp(),
                "fields": record.display_fields(),
                "record": record,
            }))?,
        };
        writeln!(self.out.lock(), "{line}")?;
        Ok(())
    }
}

impl<V: DisplayRecord + Serialize> Listener<V> for HistoricalSink<V> {
    fn on_add(&self, record: &V) -> Result<()> {
        self.persist(record)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bond, InstrumentId, Position, Pv01};
    use rust_decimal::Decimal;

    fn position() -> Position {
        let mut p = Position::new(Bond { id: InstrumentId::new("912828V23"), ..Bond::default() });
        p.add("TRSY1", 1_000_000).unwrap();
        p.add("TRSY3", -2_000_000).unwrap();
        p
    }

    fn open_positions(dir: &Path) -> HistoricalSink<Position> {
        HistoricalSink::open(dir, POSITIONS_FILE, OutputFormat::Csv).unwrap()
    }

    #[test]
    fn test_csv_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = open_positions(dir.path());
        sink.on_add(&position()).unwrap();
        sink.on_add(&position()).unwrap();
        sink.flush().unwrap();

        let text = std::fs::read_to_string(dir.path().join(POSITIONS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let (_, rest) = lines[0].split_once(',').unwrap();
        assert_eq!(rest, "912828V23,TRSY1,1000000,TRSY3,-2000000");
    }

    #[test]
    fn test_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        for _ in 0..2 {
            let sink = open_positions(dir.path());
            sink.on_add(&position()).unwrap();
            sink.flush().unwrap();
        }
        let text = std::fs::read_to_string(dir.path().join(POSITIONS_FILE)).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let sink = HistoricalSink::<Pv01>::open(dir.path(), RISK_FILE, OutputFormat::Json).unwrap();
        let record = Pv01 {
            instrument: Bond { id: InstrumentId::new("912828Z19"), ..Bond::default() },
            pv01: Decimal::new(91, 3),
            quantity: 2_000_000,
        };
        sink.on_add(&record).unwrap();
        sink.flush().unwrap();

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["fields"][0], "912828Z19");
        assert_eq!(value["record"]["quantity"], 2_000_000);
    }

    #[test]
    fn test_unwritable_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let result = HistoricalSink::<Position>::open(&blocker, POSITIONS_FILE, OutputFormat::Csv);
        assert!(matches!(result, Err(crate::core::Error::Io(_))));
    }
}
