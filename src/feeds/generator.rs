//! Synthetic input data
//!
//! Writes the four input files for every reference instrument. Output is
//! fully determined by the configured seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::core::config::GeneratorConfig;
use crate::core::price::{TICKS_PER_POINT, tick, to_fraction};
use crate::core::Result;
use crate::reference::ReferenceData;

pub const PRICES_FILE: &str = "prices.txt";
pub const MARKET_DATA_FILE: &str = "marketdata.txt";
pub const TRADES_FILE: &str = "trades.txt";
pub const INQUIRIES_FILE: &str = "inquiries.txt";

/// Price levels per side in a generated book snapshot
pub const GENERATED_LEVELS: i64 = 5;

const LEVEL_SIZE: i64 = 10_000_000;
const LOW: i64 = 99 * TICKS_PER_POINT;
const HIGH: i64 = 101 * TICKS_PER_POINT;

fn price(ticks: i64) -> String {
    to_fraction(Decimal::from(ticks) * tick())
}

pub struct DataGenerator<'a> {
    reference: &'a ReferenceData,
    config: GeneratorConfig,
    rng: StdRng,
}

impl<'a> DataGenerator<'a> {
    pub fn new(reference: &'a ReferenceData, config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { reference, config, rng }
    }

    /// Write all input files into `dir`, replacing existing ones.
    pub fn generate_all(&mut self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let files = vec![
            self.write(dir, PRICES_FILE, Self::prices)?,
            self.write(dir, TRADES_FILE, Self::trades)?,
            self.write(dir, INQUIRIES_FILE, Self::inquiries)?,
            self.write(dir, MARKET_DATA_FILE, Self::market_data)?,
        ];
        info!("Generated {} input files in {}", files.len(), dir.display());
        Ok(files)
    }

    fn write(
        &mut self,
        dir: &Path,
        name: &str,
        body: fn(&mut Self, &mut dyn Write) -> std::io::Result<usize>,
    ) -> Result<PathBuf> {
        let path = dir.join(name);
        let mut out = BufWriter::new(File::create(&path)?);
        let lines = body(self, &mut out)?;
        out.flush()?;
        info!("{}: {} lines", name, lines);
        Ok(path)
    }

    /// Bid/ask around a mid that walks one tick at a time between
    /// 99-002 and 100-316, each side randomly widened by one more tick.
    pub fn prices(&mut self, out: &mut dyn Write) -> std::io::Result<usize> {
        let mut lines = 0;
        for bond in self.reference.bonds() {
            let mut central = LOW + 2;
            let mut up = true;
            for _ in 0..self.config.price_ticks {
                let mut ask = central + 1;
                let mut bid = central - 1;
                if self.rng.gen_bool(0.5) {
                    ask += 1;
                }
                if self.rng.gen_bool(0.5) {
                    bid -= 1;
                }

                central += if up { 1 } else { -1 };
                if central >= HIGH - 2 {
                    up = false;
                }
                if central <= LOW + 2 {
                    up = true;
                }

                writeln!(out, "{},{},{}", bond.id, price(bid), price(ask))?;
                lines += 1;
            }
        }
        Ok(lines)
    }

    /// Five-level books, level k quoted k ticks away with size k x 10mm.
    pub fn market_data(&mut self, out: &mut dyn Write) -> std::io::Result<usize> {
        let mut lines = 0;
        for bond in self.reference.bonds() {
            let mut mid = LOW;
            let mut increasing = true;
            for _ in 0..self.config.book_snapshots {
                for level in 1..=GENERATED_LEVELS {
                    let size = level * LEVEL_SIZE;
                    writeln!(out, "{},{},{},BID", bond.id, price(mid - level), size)?;
                    writeln!(out, "{},{},{},OFFER", bond.id, price(mid + level), size)?;
                    lines += 2;
                }

                if mid >= HIGH - 1 {
                    increasing = false;
                }
                if mid <= LOW + 1 {
                    increasing = true;
                }
                mid += if increasing { 1 } else { -1 };
            }
        }
        Ok(lines)
    }

    pub fn trades(&mut self, out: &mut dyn Write) -> std::io::Result<usize> {
        let mut lines = 0;
        for bond in self.reference.bonds() {
            for i in 0..self.config.trades_per_instrument {
                let side = if i % 2 == 0 { "BUY" } else { "SELL" };
                let quantity = ((i % 5) + 1) * 1_000_000;
                let book = self.rng.gen_range(1..=3);
                let ticks = LOW + self.rng.gen_range(0..2 * TICKS_PER_POINT);
                writeln!(
                    out,
                    "{},{}_TRADE{},{},TRSY{},{},{}",
                    bond.id, bond.id, i, price(ticks), book, quantity, side
                )?;
                lines += 1;
            }
        }
        Ok(lines)
    }

    pub fn inquiries(&mut self, out: &mut dyn Write) -> std::io::Result<usize> {
        let mut lines = 0;
        for bond in self.reference.bonds() {
            for i in 0..self.config.inquiries_per_instrument {
                let side = if i % 2 == 0 { "BUY" } else { "SELL" };
                let quantity = ((i % 5) + 1) * 1_000_000;
                let ticks = LOW + self.rng.gen_range(0..2 * TICKS_PER_POINT);
                writeln!(
                    out,
                    "{}_INQ{},{},{},{},{},RECEIVED",
                    bond.id, i, bond.id, side, quantity, price(ticks)
                )?;
                lines += 1;
            }
        }
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::from_fraction;
    use crate::feeds::parser;

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            enabled: true,
            seed: 7,
            price_ticks: 600,
            book_snapshots: 4,
            trades_per_instrument: 10,
            inquiries_per_instrument: 10,
        }
    }

    fn render(kind: &str) -> String {
        let reference = ReferenceData::treasuries();
        let mut generator = DataGenerator::new(&reference, config());
        let mut buf = Vec::new();
        match kind {
            "prices" => generator.prices(&mut buf),
            "market_data" => generator.market_data(&mut buf),
            "trades" => generator.trades(&mut buf),
            _ => generator.inquiries(&mut buf),
        }
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_prices_stay_in_range() {
        let reference = ReferenceData::treasuries();
        let text = render("prices");
        assert_eq!(text.lines().count(), 600 * 7);
        for line in text.lines() {
            let quote = parser::parse_quote(line, &reference).unwrap();
            assert!(quote.mid >= Decimal::from(99) && quote.mid <= Decimal::from(101), "{line}");
            assert!(quote.spread > Decimal::ZERO);
        }
    }

    #[test]
    fn test_market_data_levels() {
        let reference = ReferenceData::treasuries();
        let text = render("market_data");
        let first: Vec<&str> = text.lines().take(2).collect();
        assert_eq!(first, vec!["912828V23,98-317,10000000,BID", "912828V23,99-001,10000000,OFFER"]);

        let (_, fifth) = parser::parse_book_line(text.lines().nth(9).unwrap(), &reference).unwrap();
        assert_eq!(fifth.quantity, 50_000_000);
        assert_eq!(fifth.price, from_fraction("99-005").unwrap());
        assert_eq!(text.lines().count(), 7 * 4 * 10);
    }

    #[test]
    fn test_trades_and_inquiries_parse() {
        let reference = ReferenceData::treasuries();
        let trades = render("trades");
        let first = parser::parse_trade(trades.lines().next().unwrap(), &reference).unwrap();
        assert_eq!(first.trade_id, "912828V23_TRADE0");
        assert_eq!(first.quantity, 1_000_000);
        for line in trades.lines() {
            let trade = parser::parse_trade(line, &reference).unwrap();
            assert!(["TRSY1", "TRSY2", "TRSY3"].contains(&trade.book.as_str()));
        }

        let inquiries = render("inquiries");
        assert_eq!(inquiries.lines().count(), 70);
        for line in inquiries.lines() {
            parser::parse_inquiry(line, &reference).unwrap();
        }
    }

    #[test]
    fn test_same_seed_same_output() {
        assert_eq!(render("trades"), render("trades"));
    }

    #[test]
    fn test_generate_all_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let reference = ReferenceData::treasuries();
        let files = DataGenerator::new(&reference, config()).generate_all(dir.path()).unwrap();
        assert_eq!(files.len(), 4);
        assert!(dir.path().join(MARKET_DATA_FILE).exists());
    }
}
