//! Trading engine - builds every service and wires the listener graph
//!
//! Construction happens in two phases. `TradingEngine::new` builds each
//! service on its own; `wire` then subscribes them to one another:
//!
//! ```text
//! pricing ──> gui
//!         └─> algo streaming ──> streaming ──> streaming.txt
//! market data ──> algo execution ──> execution ──> executions.txt
//!                                              └─> trade booking ──> position ──> risk ──> risk.txt
//!                                                                            └─> positions.txt
//! inquiry ──> allinquiries.txt
//! ```
//!
//! Ingested trades enter at trade booking.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::core::{
    Config, Error, ExecutionOrder, Inquiry, Position, PriceQuote, Pv01, Result, SectorRisk, Trade,
    TwoWayQuote,
};
use crate::execution::ExecutionService;
use crate::feeds::generator::{INQUIRIES_FILE, MARKET_DATA_FILE, PRICES_FILE, TRADES_FILE};
use crate::feeds::reader::{FeedReader, IngestReport};
use crate::inquiry::InquiryService;
use crate::ledger::{PositionService, TradeBookingService};
use crate::orderbook::{MarketDataService, OrderBook};
use crate::pricing::PricingService;
use crate::reference::ReferenceData;
use crate::risk::RiskService;
use crate::sinks::historical::{
    EXECUTIONS_FILE, INQUIRIES_FILE as ALL_INQUIRIES_FILE, POSITIONS_FILE, RISK_FILE,
    STREAMING_FILE,
};
use crate::sinks::{GuiSink, HistoricalSink};
use crate::strategy::{AlgoExecutionService, AlgoStreamingService};
use crate::streaming::StreamingService;

/// Output files, opened up front so a bad output directory fails at startup
pub struct Sinks {
    pub gui: Arc<GuiSink>,
    pub positions: Arc<HistoricalSink<Position>>,
    pub risk: Arc<HistoricalSink<Pv01>>,
    pub executions: Arc<HistoricalSink<ExecutionOrder>>,
    pub streaming: Arc<HistoricalSink<TwoWayQuote>>,
    pub inquiries: Arc<HistoricalSink<Inquiry>>,
}

impl Sinks {
    pub fn open(config: &Config) -> Result<Self> {
        let dir = config.app.output_dir.as_path();
        let format = config.app.output_format;
        Ok(Self {
            gui: Arc::new(GuiSink::open(dir, Duration::from_millis(config.gui.throttle_ms))?),
            positions: Arc::new(HistoricalSink::open(dir, POSITIONS_FILE, format)?),
            risk: Arc::new(HistoricalSink::open(dir, RISK_FILE, format)?),
            executions: Arc::new(HistoricalSink::open(dir, EXECUTIONS_FILE, format)?),
            streaming: Arc::new(HistoricalSink::open(dir, STREAMING_FILE, format)?),
            inquiries: Arc::new(HistoricalSink::open(dir, ALL_INQUIRIES_FILE, format)?),
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.gui.flush()?;
        self.positions.flush()?;
        self.risk.flush()?;
        self.executions.flush()?;
        self.streaming.flush()?;
        self.inquiries.flush()
    }
}

/// Per-feed results of a full run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub prices: IngestReport,
    pub market_data: IngestReport,
    pub trades: IngestReport,
    pub inquiries: IngestReport,
}

pub struct TradingEngine {
    reference: Arc<ReferenceData>,
    book_depth: usize,
    market_data: Arc<MarketDataService>,
    pricing: Arc<PricingService>,
    algo_execution: Arc<AlgoExecutionService>,
    algo_streaming: Arc<AlgoStreamingService>,
    streaming: Arc<StreamingService>,
    execution: Arc<ExecutionService>,
    booking: Arc<TradeBookingService>,
    positions: Arc<PositionService>,
    risk: Arc<RiskService>,
    inquiries: Arc<InquiryService>,
    sinks: Option<Sinks>,
    wired: bool,
}

impl TradingEngine {
    /// Phase one: build every service, unconnected.
    pub fn new(config: &Config, reference: Arc<ReferenceData>) -> Result<Self> {
        let book_depth = config.market_data.book_depth;
        Ok(Self {
            book_depth,
            market_data: Arc::new(MarketDataService::new(book_depth)),
            pricing: Arc::new(PricingService::new()),
            algo_execution: Arc::new(AlgoExecutionService::new(config.spread_threshold()?)),
            algo_streaming: Arc::new(AlgoStreamingService::new(config.algo.stream_base_size)),
            streaming: Arc::new(StreamingService::new()),
            execution: Arc::new(ExecutionService::new()),
            booking: Arc::new(TradeBookingService::new(config.booking.books.clone())?),
            positions: Arc::new(PositionService::new()),
            risk: Arc::new(RiskService::new(reference.clone())),
            inquiries: Arc::new(InquiryService::new()),
            reference,
            sinks: None,
            wired: false,
        })
    }

    /// Phase two: subscribe services to each other, then attach `sinks`.
    pub fn wire(&mut self, sinks: Option<Sinks>) -> Result<()> {
        if self.wired {
            return Err(Error::Config("engine is already wired".into()));
        }

        if let Some(sinks) = &sinks {
            self.pricing.subscribe(sinks.gui.clone());
        }
        self.pricing.subscribe(self.algo_streaming.clone());
        self.algo_streaming.subscribe(self.streaming.clone());

        self.market_data.subscribe(self.algo_execution.clone());
        self.algo_execution.subscribe(self.execution.clone());
        if let Some(sinks) = &sinks {
            self.execution.subscribe(sinks.executions.clone());
        }
        self.execution.subscribe(self.booking.clone());
        self.booking.subscribe(self.positions.clone());
        self.positions.subscribe(self.risk.clone());

        if let Some(sinks) = &sinks {
            self.streaming.subscribe(sinks.streaming.clone());
            self.positions.subscribe(sinks.positions.clone());
            self.risk.subscribe(sinks.risk.clone());
            self.inquiries.subscribe(sinks.inquiries.clone());
        }

        info!("Engine wired ({})", if sinks.is_some() { "with sinks" } else { "no sinks" });
        self.sinks = sinks;
        self.wired = true;
        Ok(())
    }

    pub fn ingest_price(&self, quote: PriceQuote) -> Result<()> {
        self.pricing.ingest(quote)
    }

    pub fn ingest_book(&self, book: OrderBook) -> Result<()> {
        self.market_data.ingest(book)
    }

    pub fn ingest_trade(&self, trade: Trade) -> Result<()> {
        self.booking.book_trade(trade)
    }

    pub fn ingest_inquiry(&self, inquiry: Inquiry) -> Result<()> {
        self.inquiries.ingest(inquiry)
    }

    /// Stream the four input files from `dir` in pipeline order.
    pub fn run_feeds(&self, dir: &Path) -> Result<RunSummary> {
        let reader = FeedReader::new(self.reference.clone(), self.book_depth);
        let open = |name: &str| FeedReader::open(&dir.join(name));

        let summary = RunSummary {
            prices: reader.read_prices(open(PRICES_FILE)?, |q| self.ingest_price(q))?,
            market_data: reader.read_market_data(open(MARKET_DATA_FILE)?, |b| self.ingest_book(b))?,
            trades: reader.read_trades(open(TRADES_FILE)?, |t| self.ingest_trade(t))?,
            inquiries: reader.read_inquiries(open(INQUIRIES_FILE)?, |i| self.ingest_inquiry(i))?,
        };
        self.flush()?;
        Ok(summary)
    }

    /// PV01 of the reference data's risk buckets.
    pub fn sector_risks(&self) -> Vec<SectorRisk> {
        self.reference.sectors().iter().map(|sector| self.risk.sector_risk(sector)).collect()
    }

    pub fn flush(&self) -> Result<()> {
        match &self.sinks {
            Some(sinks) => sinks.flush(),
            None => Ok(()),
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn market_data(&self) -> &MarketDataService {
        &self.market_data
    }

    pub fn pricing(&self) -> &PricingService {
        &self.pricing
    }

    pub fn algo_execution(&self) -> &AlgoExecutionService {
        &self.algo_execution
    }

    pub fn algo_streaming(&self) -> &AlgoStreamingService {
        &self.algo_streaming
    }

    pub fn streaming(&self) -> &StreamingService {
        &self.streaming
    }

    pub fn execution(&self) -> &ExecutionService {
        &self.execution
    }

    pub fn booking(&self) -> &TradeBookingService {
        &self.booking
    }

    pub fn positions(&self) -> &PositionService {
        &self.positions
    }

    pub fn risk(&self) -> &RiskService {
        &self.risk
    }

    pub fn inquiries(&self) -> &InquiryService {
        &self.inquiries
    }

    pub fn sinks(&self) -> Option<&Sinks> {
        self.sinks.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::InstrumentConfig;
    use crate::core::price::from_fraction;
    use crate::core::{InstrumentId, Order, PricingSide, Side};

    fn engine() -> TradingEngine {
        let mut engine =
            TradingEngine::new(&Config::default(), Arc::new(ReferenceData::treasuries())).unwrap();
        engine.wire(None).unwrap();
        engine
    }

    fn tight_book(engine: &TradingEngine, cusip: &str) -> OrderBook {
        let bond = engine.reference().bond_by_cusip(cusip).unwrap().clone();
        OrderBook::new(
            bond,
            vec![Order::new(from_fraction("99-310").unwrap(), 10_000_000, PricingSide::Bid)],
            vec![Order::new(from_fraction("99-312").unwrap(), 20_000_000, PricingSide::Offer)],
        )
    }

    #[test]
    fn test_book_cascades_to_risk() {
        let engine = engine();
        engine.ingest_book(tight_book(&engine, "912828Z19")).unwrap();

        let id = InstrumentId::new("912828Z19");
        let order = engine.execution().get(&id).unwrap();
        assert_eq!(order.order_id, "AlgoExec1");

        let trade = engine.booking().get("AlgoExec1").unwrap();
        assert_eq!(trade.book, "TRSY2");
        assert_eq!(trade.side, Side::Buy);

        let position = engine.positions().get(&id).unwrap();
        assert_eq!(position.book_quantity("TRSY2"), 20_000_000);

        let risk = engine.risk().get(&id).unwrap();
        assert_eq!(risk.quantity, 20_000_000);
    }

    #[test]
    fn test_price_cascades_to_streaming() {
        let engine = engine();
        let bond = engine.reference().bond_by_cusip("912828V23").unwrap().clone();
        let bid = from_fraction("99-000").unwrap();
        let ask = from_fraction("99-002").unwrap();
        engine.ingest_price(PriceQuote::from_bid_ask(bond.clone(), bid, ask)).unwrap();

        let quote = engine.streaming().get(&bond.id).unwrap();
        assert_eq!(quote.bid.price, from_fraction("99-000").unwrap());
        assert_eq!(quote.offer.price, from_fraction("99-002").unwrap());
    }

    #[test]
    fn test_wire_twice_rejected() {
        let mut engine = engine();
        assert!(matches!(engine.wire(None), Err(Error::Config(_))));
    }

    #[test]
    fn test_sector_risks() {
        let engine = engine();
        engine.ingest_book(tight_book(&engine, "912828V23")).unwrap();
        let sectors = engine.sector_risks();
        assert_eq!(sectors.len(), 3);
        assert_eq!(sectors[0].exposure, rust_decimal::Decimal::from(380_000));
        assert_eq!(sectors[2].exposure, rust_decimal::Decimal::ZERO);
    }

    #[test]
    fn test_sector_risks_with_instrument_override() {
        let config = Config {
            instruments: vec![InstrumentConfig {
                cusip: "91282CJZ5".into(),
                ticker: "US2Y".into(),
                coupon: rust_decimal::Decimal::new(4875, 5),
                maturity: chrono::NaiveDate::from_ymd_opt(2025, 10, 31).unwrap(),
                pv01: rust_decimal::Decimal::new(18, 3),
            }],
            ..Config::default()
        };
        let reference = Arc::new(ReferenceData::from_config(&config).unwrap());
        let mut engine = TradingEngine::new(&config, reference).unwrap();
        engine.wire(None).unwrap();
        engine.ingest_book(tight_book(&engine, "91282CJZ5")).unwrap();

        let sectors = engine.sector_risks();
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].sector, "FrontEnd");
        assert_eq!(sectors[0].exposure, rust_decimal::Decimal::from(360_000));
    }
}
