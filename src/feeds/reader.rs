//! Feed reader - streams input files record by record
//!
//! Malformed lines (including lines that are not UTF-8) are logged and
//! skipped. A record that parses but is refused downstream counts as
//! failed; neither stops the feed. Only IO errors on the input itself
//! abort a read.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::str::Utf8Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{Bond, Inquiry, Order, PriceQuote, Result, Trade};
use crate::feeds::parser;
use crate::orderbook::OrderBook;
use crate::reference::ReferenceData;

/// Outcome of one feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records handed downstream successfully
    pub accepted: usize,
    /// Lines that could not be turned into a record
    pub skipped: usize,
    /// Records refused downstream
    pub failed: usize,
}

impl std::fmt::Display for IngestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} accepted, {} skipped, {} failed", self.accepted, self.skipped, self.failed)
    }
}

pub struct FeedReader {
    reference: Arc<ReferenceData>,
    book_depth: usize,
}

impl FeedReader {
    pub fn new(reference: Arc<ReferenceData>, book_depth: usize) -> Self {
        Self { reference, book_depth }
    }

    /// Lines making up one book snapshot: `book_depth` levels per side.
    pub fn batch_size(&self) -> usize {
        2 * self.book_depth
    }

    pub fn open(path: &Path) -> Result<BufReader<File>> {
        Ok(BufReader::new(File::open(path)?))
    }

    pub fn read_prices(
        &self,
        input: impl BufRead,
        sink: impl FnMut(PriceQuote) -> Result<()>,
    ) -> Result<IngestReport> {
        self.read_records("prices", input, |line, r| parser::parse_quote(line, r), sink)
    }

    pub fn read_trades(
        &self,
        input: impl BufRead,
        sink: impl FnMut(Trade) -> Result<()>,
    ) -> Result<IngestReport> {
        self.read_records("trades", input, |line, r| parser::parse_trade(line, r), sink)
    }

    pub fn read_inquiries(
        &self,
        input: impl BufRead,
        sink: impl FnMut(Inquiry) -> Result<()>,
    ) -> Result<IngestReport> {
        self.read_records("inquiries", input, |line, r| parser::parse_inquiry(line, r), sink)
    }

    /// Group book lines into snapshots of `batch_size` lines. A batch whose
    /// lines name different instruments is dropped; so is a trailing partial
    /// batch.
    pub fn read_market_data(
        &self,
        input: impl BufRead,
        mut sink: impl FnMut(OrderBook) -> Result<()>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut batch: Vec<Order> = Vec::with_capacity(self.batch_size());
        let mut current: Option<Bond> = None;

        for (idx, line) in raw_lines(input).enumerate() {
            let line = match line? {
                Ok(line) => line,
                Err(e) => {
                    warn!("marketdata line {}: {}", idx + 1, e);
                    report.skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let (bond, order) = match parser::parse_book_line(&line, &self.reference) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("marketdata line {}: {}", idx + 1, e);
                    report.skipped += 1;
                    continue;
                }
            };

            if current.as_ref().is_some_and(|c| c.id != bond.id) {
                warn!(
                    "marketdata line {}: instrument changed mid-snapshot, dropping {} lines",
                    idx + 1,
                    batch.len()
                );
                report.skipped += batch.len();
                batch.clear();
            }
            current = Some(bond);
            batch.push(order);

            if batch.len() == self.batch_size() {
                if let Some(instrument) = current.take() {
                    let book = OrderBook::from_orders(instrument, batch.drain(..));
                    match sink(book) {
                        Ok(()) => report.accepted += 1,
                        Err(e) => {
                            warn!("marketdata snapshot ending line {}: {}", idx + 1, e);
                            report.failed += 1;
                        }
                    }
                }
            }
        }

        if !batch.is_empty() {
            warn!("marketdata: dropping trailing partial snapshot of {} lines", batch.len());
            report.skipped += batch.len();
        }
        info!("marketdata: {}", report);
        Ok(report)
    }

    fn read_records<T>(
        &self,
        kind: &str,
        input: impl BufRead,
        parse: impl Fn(&str, &ReferenceData) -> Result<T>,
        mut sink: impl FnMut(T) -> Result<()>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for (idx, line) in raw_lines(input).enumerate() {
            let line = match line? {
                Ok(line) => line,
                Err(e) => {
                    warn!("{} line {}: {}", kind, idx + 1, e);
                    report.skipped += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let record = match parse(&line, &self.reference) {
                Ok(record) => record,
                Err(e) => {
                    warn!("{} line {}: {}", kind, idx + 1, e);
                    report.skipped += 1;
                    continue;
                }
            };
            match sink(record) {
                Ok(()) => report.accepted += 1,
                Err(e) => {
                    warn!("{} line {}: {}", kind, idx + 1, e);
                    report.failed += 1;
                }
            }
        }
        info!("{}: {}", kind, report);
        Ok(report)
    }
}

/// A line without its terminator, or the decode error of a line that is not UTF-8
type RawLine = std::result::Result<String, Utf8Error>;

fn raw_lines(mut input: impl BufRead) -> impl Iterator<Item = io::Result<RawLine>> {
    let mut buf = Vec::new();
    std::iter::from_fn(move || {
        buf.clear();
        match input.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                Some(Ok(std::str::from_utf8(line).map(str::to_owned)))
            }
            Err(e) => Some(Err(e)),
        }
    })
}
