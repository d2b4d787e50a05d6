//! Risk - PV01 exposure per instrument and bucketed sector risk

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::core::{BucketedSector, InstrumentId, Listener, Position, Pv01, Result, SectorRisk};
use crate::reference::ReferenceData;
use crate::store::EventStore;

/// PV01 of the latest aggregate position of every instrument
pub struct RiskService {
    store: EventStore<Pv01>,
    reference: Arc<ReferenceData>,
}

impl RiskService {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self { store: EventStore::new("risk"), reference }
    }

    /// Reprice the risk of a position and notify listeners.
    /// Fails without storing anything when the instrument has no PV01.
    pub fn add_position(&self, position: &Position) -> Result<Pv01> {
        let rate = self.reference.pv01(&position.instrument.id)?;
        let record = Pv01 {
            instrument: position.instrument.clone(),
            pv01: rate,
            quantity: position.aggregate(),
        };
        tracing::debug!(instrument = %record.instrument.id, exposure = %record.exposure(), "pv01");
        self.store.update(record.clone())?;
        Ok(record)
    }

    /// Sum of PV01 exposure over a bucket, computed from the stored records.
    /// Instruments without a position contribute nothing.
    pub fn sector_risk(&self, sector: &BucketedSector) -> SectorRisk {
        let exposure = sector
            .instruments
            .iter()
            .filter_map(|bond| self.store.get(&bond.id))
            .map(|record| record.exposure())
            .sum::<Decimal>();
        SectorRisk {
            sector: sector.name.clone(),
            exposure,
            instruments: sector.instruments.len(),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<Pv01>>) {
        self.store.subscribe(listener);
    }

    pub fn get(&self, id: &InstrumentId) -> Option<Pv01> {
        self.store.get(id)
    }

    pub fn all(&self) -> Vec<Pv01> {
        self.store.values()
    }
}

impl Listener<Position> for RiskService {
    fn on_add(&self, position: &Position) -> Result<()> {
        self.add_position(position).map(|_| ())
    }

    fn name(&self) -> &str {
        "risk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bond, Error};

    fn position(cusip: &str, book: &str, quantity: i64) -> Position {
        let mut p = Position::new(Bond { id: InstrumentId::new(cusip), ..Bond::default() });
        p.add(book, quantity).unwrap();
        p
    }

    #[test]
    fn test_exposure_uses_aggregate() {
        let risk = RiskService::new(Arc::new(ReferenceData::treasuries()));
        let mut p = position("912828Z19", "TRSY1", 3_000_000);
        p.add("TRSY2", -1_000_000).unwrap();

        let record = risk.add_position(&p).unwrap();
        assert_eq!(record.quantity, 2_000_000);
        assert_eq!(record.pv01, Decimal::new(91, 3));
        assert_eq!(record.exposure(), Decimal::from(182_000));
    }

    #[test]
    fn test_sector_risk_skips_absent() {
        let reference = Arc::new(ReferenceData::treasuries());
        let risk = RiskService::new(reference.clone());
        risk.add_position(&position("912828V23", "TRSY1", 1_000_000)).unwrap();
        risk.add_position(&position("912828W22", "TRSY1", -2_000_000)).unwrap();

        let front = reference.sector("FrontEnd", &["912828V23", "912828W22"]).unwrap();
        let result = risk.sector_risk(&front);
        assert_eq!(result.exposure, Decimal::from(19_000 - 56_000));
        assert_eq!(result.instruments, 2);

        let long = reference.sector("LongEnd", &["912810FZ8", "912810GZ6"]).unwrap();
        assert_eq!(risk.sector_risk(&long).exposure, Decimal::ZERO);
    }

    #[test]
    fn test_missing_pv01_skips_record() {
        let bond = Bond { id: InstrumentId::new("NOPV01"), ..Bond::default() };
        let risk = RiskService::new(Arc::new(ReferenceData::from_bonds([(bond.clone(), None)])));

        let err = risk.add_position(&position("NOPV01", "TRSY1", 1)).unwrap_err();
        assert!(matches!(err, Error::MissingReferenceData { .. }));
        assert!(risk.get(&bond.id).is_none());
    }
}
