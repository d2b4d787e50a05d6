//! Reference data - bond master and PV01 table
//!
//! Built once at startup and shared read-only as `Arc<ReferenceData>`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::core::config::{InstrumentConfig, SectorConfig};
use crate::core::{Bond, BucketedSector, Config, Error, InstrumentId, Result};

/// (cusip, years, maturity, coupon bp x100, pv01 x1000)
const ON_THE_RUN: [(&str, u32, (i32, u32, u32), i64, i64); 7] = [
    ("912828V23", 2, (2026, 12, 15), 425, 19),
    ("912828W22", 3, (2027, 12, 15), 430, 28),
    ("912828X21", 5, (2029, 12, 15), 435, 46),
    ("912828Y20", 7, (2031, 12, 15), 440, 64),
    ("912828Z19", 10, (2034, 12, 15), 445, 91),
    ("912810FZ8", 20, (2044, 12, 15), 450, 142),
    ("912810GZ6", 30, (2054, 12, 15), 455, 183),
];

#[derive(Debug, Clone)]
struct Entry {
    bond: Bond,
    pv01: Option<Decimal>,
}

/// Immutable instrument master
#[derive(Debug, Clone)]
pub struct ReferenceData {
    entries: BTreeMap<InstrumentId, Entry>,
    /// Instrument ids in configuration order
    order: Vec<InstrumentId>,
    /// Risk buckets over the bonds above
    sectors: Vec<BucketedSector>,
}

/// Tenor buckets: upper bound in years (inclusive) and name
const TENOR_BUCKETS: [(u32, &str); 3] = [(3, "FrontEnd"), (10, "Belly"), (u32::MAX, "LongEnd")];

impl ReferenceData {
    /// The seven on-the-run Treasuries (2Y .. 30Y).
    pub fn treasuries() -> Self {
        let mut data = Self::empty();
        for (cusip, years, (y, m, d), coupon, pv01) in ON_THE_RUN {
            let maturity = NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
            let bond = Bond::new(cusip, format!("US{years}Y"), Decimal::new(coupon, 4), maturity);
            data.insert(bond, Some(Decimal::new(pv01, 3)));
        }
        data.sectors = data.tenor_sectors();
        data
    }

    /// Configured instruments, or the on-the-run Treasuries when none are configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut data = if config.instruments.is_empty() {
            Self::treasuries()
        } else {
            let mut data = Self::empty();
            for InstrumentConfig { cusip, ticker, coupon, maturity, pv01 } in &config.instruments {
                let bond = Bond::new(cusip.as_str(), ticker.clone(), *coupon, *maturity);
                if data.entries.contains_key(&bond.id) {
                    return Err(Error::Config(format!("duplicate instrument {}", bond.id)));
                }
                data.insert(bond, Some(*pv01));
            }
            data
        };
        data.sectors = if config.sectors.is_empty() {
            data.tenor_sectors()
        } else {
            data.configured_sectors(&config.sectors)
        };
        Ok(data)
    }

    /// Build from explicit bonds; `pv01` entries may be missing.
    pub fn from_bonds(bonds: impl IntoIterator<Item = (Bond, Option<Decimal>)>) -> Self {
        let mut data = Self::empty();
        for (bond, pv01) in bonds {
            data.insert(bond, pv01);
        }
        data.sectors = data.tenor_sectors();
        data
    }

    fn empty() -> Self {
        Self { entries: BTreeMap::new(), order: Vec::new(), sectors: Vec::new() }
    }

    /// Group bonds by the tenor in their ticker; empty buckets are dropped.
    fn tenor_sectors(&self) -> Vec<BucketedSector> {
        let mut buckets: Vec<Vec<Bond>> = vec![Vec::new(); TENOR_BUCKETS.len()];
        for bond in self.bonds() {
            let Some(years) = tenor_years(&bond.ticker) else {
                tracing::debug!("{} ({}) has no tenor, not bucketed", bond.id, bond.ticker);
                continue;
            };
            if let Some(i) = TENOR_BUCKETS.iter().position(|(max, _)| years <= *max) {
                buckets[i].push(bond.clone());
            }
        }
        TENOR_BUCKETS
            .iter()
            .zip(buckets)
            .filter(|(_, bonds)| !bonds.is_empty())
            .map(|((_, name), bonds)| BucketedSector::new(*name, bonds))
            .collect()
    }

    fn configured_sectors(&self, sectors: &[SectorConfig]) -> Vec<BucketedSector> {
        sectors
            .iter()
            .map(|SectorConfig { name, cusips }| {
                let bonds = cusips
                    .iter()
                    .filter_map(|cusip| match self.bond_by_cusip(cusip) {
                        Ok(bond) => Some(bond.clone()),
                        Err(e) => {
                            tracing::warn!("sector {}: {}, skipped", name, e);
                            None
                        }
                    })
                    .collect();
                BucketedSector::new(name.as_str(), bonds)
            })
            .collect()
    }

    fn insert(&mut self, bond: Bond, pv01: Option<Decimal>) {
        let id = bond.id.clone();
        if self.entries.insert(id.clone(), Entry { bond, pv01 }).is_none() {
            self.order.push(id);
        }
    }

    pub fn bond(&self, id: &InstrumentId) -> Result<&Bond> {
        self.entries
            .get(id)
            .map(|e| &e.bond)
            .ok_or_else(|| Error::UnknownInstrument(id.to_string()))
    }

    /// Lookup by raw CUSIP as read from a feed.
    pub fn bond_by_cusip(&self, cusip: &str) -> Result<&Bond> {
        self.bond(&InstrumentId::new(cusip))
    }

    pub fn pv01(&self, id: &InstrumentId) -> Result<Decimal> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| Error::UnknownInstrument(id.to_string()))?;
        entry.pv01.ok_or_else(|| Error::MissingReferenceData {
            instrument: id.to_string(),
            field: "pv01",
        })
    }

    /// Bonds in configuration order
    pub fn bonds(&self) -> impl Iterator<Item = &Bond> {
        self.order.iter().filter_map(|id| self.entries.get(id).map(|e| &e.bond))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Named bucket of the given instruments.
    pub fn sector(&self, name: &str, ids: &[&str]) -> Result<BucketedSector> {
        let instruments = ids
            .iter()
            .map(|id| self.bond_by_cusip(id).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(BucketedSector::new(name, instruments))
    }

    /// Configured risk buckets, or front end (up to 3Y), belly (up to 10Y)
    /// and long end by ticker tenor.
    pub fn sectors(&self) -> &[BucketedSector] {
        &self.sectors
    }
}

/// Tenor in years from a ticker such as `US10Y`.
fn tenor_years(ticker: &str) -> Option<u32> {
    let head = ticker.strip_suffix('Y')?;
    let digits = head.chars().rev().take_while(char::is_ascii_digit).count();
    head[head.len() - digits..].parse().ok()
}
