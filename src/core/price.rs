//! Treasury fractional price notation
//!
//! Prices are quoted as `"base-XYz"`: `XY` is the number of 32nds (00..31)
//! and `z` the number of 256ths on top of that (0..7, with 4 written `+`).
//! `99-16+` is therefore 99 + 16/32 + 4/256 = 99.515625.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::core::{Error, Result};

/// Ticks per point: one tick is 1/256.
pub const TICKS_PER_POINT: i64 = 256;

/// Smallest price increment (1/256).
pub fn tick() -> Decimal {
    Decimal::new(390_625, 8)
}

/// Parse a fractional price string into an exact decimal.
///
/// Only the canonical form produced by [`to_fraction`] is accepted: no sign,
/// no leading zeros on the base, exactly two digits of 32nds and one eighth
/// character where 4 must be written `+`.
pub fn from_fraction(s: &str) -> Result<Decimal> {
    let invalid = || Error::InvalidPrice(s.to_string());

    let (base, frac) = s.split_once('-').ok_or_else(invalid)?;
    if base.is_empty()
        || !base.bytes().all(|b| b.is_ascii_digit())
        || (base.len() > 1 && base.starts_with('0'))
    {
        return Err(invalid());
    }
    let base: i64 = base.parse().map_err(|_| invalid())?;

    let frac = frac.as_bytes();
    if frac.len() != 3 || !frac[0].is_ascii_digit() || !frac[1].is_ascii_digit() {
        return Err(invalid());
    }
    let xy = i64::from(frac[0] - b'0') * 10 + i64::from(frac[1] - b'0');
    if xy > 31 {
        return Err(invalid());
    }
    let z = match frac[2] {
        b'+' => 4,
        b @ (b'0'..=b'3' | b'5'..=b'7') => i64::from(b - b'0'),
        _ => return Err(invalid()),
    };

    let ticks = base
        .checked_mul(TICKS_PER_POINT)
        .and_then(|t| t.checked_add(xy * 8 + z))
        .ok_or_else(invalid)?;
    Ok(Decimal::from(ticks) * tick())
}

/// Render a decimal price in fractional notation, truncating to the 1/256 grid.
pub fn to_fraction(price: Decimal) -> String {
    let ticks = (price * Decimal::from(TICKS_PER_POINT))
        .floor()
        .to_i64()
        .unwrap_or(if price.is_sign_negative() { i64::MIN } else { i64::MAX });
    let base = ticks.div_euclid(TICKS_PER_POINT);
    let rem = ticks.rem_euclid(TICKS_PER_POINT);
    let xy = rem / 8;
    let z = match rem % 8 {
        4 => '+',
        n => char::from(b'0' + n as u8),
    };
    format!("{base}-{xy:02}{z}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(from_fraction("99-16+").unwrap(), Decimal::new(99_515_625, 6));
        assert_eq!(from_fraction("100-000").unwrap(), Decimal::from(100));
        assert_eq!(from_fraction("100-002").unwrap(), Decimal::new(1_000_078_125, 7));
        assert_eq!(from_fraction("0-317").unwrap(), Decimal::from(255) * tick());
    }

    #[test]
    fn test_render_known_values() {
        assert_eq!(to_fraction(Decimal::new(99_515_625, 6)), "99-16+");
        assert_eq!(to_fraction(Decimal::from(101)), "101-000");
        assert_eq!(to_fraction(Decimal::new(78125, 7)), "0-002");
    }

    #[test]
    fn test_render_truncates_off_grid() {
        // 100.001 sits between 100-000 and 100-001
        assert_eq!(to_fraction(Decimal::new(100_001, 3)), "100-000");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "99", "99-", "99-1", "99-16", "99-320", "99-168", "99-164", "-99-000",
            "099-000", "99-1a0", "a-000", "99-16+x"]
        {
            assert!(
                matches!(from_fraction(bad), Err(Error::InvalidPrice(_))),
                "accepted {bad:?}"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_fraction_round_trip(base in 0i64..1000, xy in 0i64..32, z in 0i64..8) {
            let zc = if z == 4 { "+".to_string() } else { z.to_string() };
            let s = format!("{base}-{xy:02}{zc}");
            let value = from_fraction(&s).unwrap();
            prop_assert_eq!(to_fraction(value), s);
            let expected = Decimal::from(base * 256 + xy * 8 + z) / Decimal::from(256);
            prop_assert_eq!(value, expected);
        }
    }
}
