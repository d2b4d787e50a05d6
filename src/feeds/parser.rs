//! Line parsers for the four input feeds
//!
//! Every record is one comma separated line. Instruments are resolved
//! against the bond master; prices use fractional notation.

use rust_decimal::Decimal;

use crate::core::price::from_fraction;
use crate::core::{Bond, Error, Inquiry, Order, PriceQuote, Result, Trade};
use crate::reference::ReferenceData;

/// Split a line into exactly `expected` trimmed fields.
fn fields<'a>(line: &'a str, expected: usize, kind: &str) -> Result<Vec<&'a str>> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.len() != expected {
        return Err(Error::Parse(format!(
            "{kind} line has {} fields, expected {expected}: {line:?}",
            fields.len()
        )));
    }
    Ok(fields)
}

fn quantity(s: &str) -> Result<i64> {
    match s.parse::<i64>() {
        Ok(q) if q >= 0 => Ok(q),
        _ => Err(Error::Parse(format!("invalid quantity {s:?}"))),
    }
}

fn price(s: &str) -> Result<Decimal> {
    from_fraction(s)
}

fn bond(reference: &ReferenceData, cusip: &str) -> Result<Bond> {
    reference.bond_by_cusip(cusip).cloned()
}

/// `instrumentId,bidFraction,askFraction`
pub fn parse_quote(line: &str, reference: &ReferenceData) -> Result<PriceQuote> {
    let f = fields(line, 3, "price")?;
    let instrument = bond(reference, f[0])?;
    Ok(PriceQuote::from_bid_ask(instrument, price(f[1])?, price(f[2])?))
}

/// `instrumentId,priceFraction,quantity,side`
pub fn parse_book_line(line: &str, reference: &ReferenceData) -> Result<(Bond, Order)> {
    let f = fields(line, 4, "market data")?;
    let instrument = bond(reference, f[0])?;
    Ok((instrument, Order::new(price(f[1])?, quantity(f[2])?, f[3].parse()?)))
}

/// `instrumentId,tradeId,priceFraction,book,quantity,side`
pub fn parse_trade(line: &str, reference: &ReferenceData) -> Result<Trade> {
    let f = fields(line, 6, "trade")?;
    Ok(Trade {
        instrument: bond(reference, f[0])?,
        trade_id: f[1].to_string(),
        price: price(f[2])?,
        book: f[3].to_string(),
        quantity: quantity(f[4])?,
        side: f[5].parse()?,
    })
}

/// `inquiryId,instrumentId,side,quantity,priceFraction,state`
pub fn parse_inquiry(line: &str, reference: &ReferenceData) -> Result<Inquiry> {
    let f = fields(line, 6, "inquiry")?;
    Ok(Inquiry {
        inquiry_id: f[0].to_string(),
        instrument: bond(reference, f[1])?,
        side: f[2].parse()?,
        quantity: quantity(f[3])?,
        price: price(f[4])?,
        state: f[5].parse()?,
    })
}
