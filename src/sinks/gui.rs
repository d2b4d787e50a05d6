//! GUI sink - throttled stream of internal prices

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::core::{DisplayRecord, Listener, PriceQuote, Result};
use crate::sinks::timestamp;

pub const GUI_FILE: &str = "gui.txt";

struct State {
    out: BufWriter<File>,
    last: Option<Instant>,
    written: usize,
}

/// Writes at most one price per throttle interval; the rest are dropped.
pub struct GuiSink {
    throttle: Duration,
    state: Mutex<State>,
}

impl GuiSink {
    pub fn open(dir: &Path, throttle: Duration) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(GUI_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::info!("GUI prices to {} every {:?}", path.display(), throttle);
        Ok(Self {
            throttle,
            state: Mutex::new(State { out: BufWriter::new(file), last: None, written: 0 }),
        })
    }

    /// Write `quote` if at least one throttle interval has passed since the
    /// last written line. Returns whether it was written.
    pub fn offer_at(&self, quote: &PriceQuote, now: Instant) -> Result<bool> {
        let mut state = self.state.lock();
        if state.last.is_some_and(|last| now.saturating_duration_since(last) < self.throttle) {
            return Ok(false);
        }
        let mut fields = vec![timestamp()];
        fields.extend(quote.display_fields());
        writeln!(state.out, "{}", fields.join(","))?;
        state.last = Some(now);
        state.written += 1;
        Ok(true)
    }

    pub fn written(&self) -> usize {
        self.state.lock().written
    }

    pub fn flush(&self) -> Result<()> {
        self.state.lock().out.flush()?;
        Ok(())
    }
}

impl Listener<PriceQuote> for GuiSink {
    fn on_add(&self, quote: &PriceQuote) -> Result<()> {
        self.offer_at(quote, Instant::now()).map(|_| ())
    }

    fn name(&self) -> &str {
        "gui"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Bond, InstrumentId};
    use rust_decimal::Decimal;

    #[test]
    fn test_throttle() {
        let dir = tempfile::tempdir().unwrap();
        let gui = GuiSink::open(dir.path(), Duration::from_millis(300)).unwrap();
        let quote = PriceQuote::new(
            Bond { id: InstrumentId::new("912828V23"), ..Bond::default() },
            Decimal::new(99_515_625, 6),
            Decimal::new(78125, 7),
        );

        let t0 = Instant::now();
        assert!(gui.offer_at(&quote, t0).unwrap());
        assert!(!gui.offer_at(&quote, t0 + Duration::from_millis(299)).unwrap());
        assert!(gui.offer_at(&quote, t0 + Duration::from_millis(300)).unwrap());
        assert!(!gui.offer_at(&quote, t0 + Duration::from_millis(450)).unwrap());
        gui.flush().unwrap();

        assert_eq!(gui.written(), 2);
        let text = std::fs::read_to_string(dir.path().join(GUI_FILE)).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.ends_with(",912828V23,99-16+,0-002")));
    }
}
