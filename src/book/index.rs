use bigdecimal::BigDecimal;

use crate::codec::to_raw_price;
use crate::errors::{AppError, Result};
use crate::models::{BookSnapshot, PriceLevel, Side};

/// Slot index of the level holding exactly `raw_price`, if any.
pub fn position_of(levels: &[PriceLevel], raw_price: u64) -> Option<usize> {
    levels.iter().position(|level| level.price == raw_price)
}

/// Resolve the PVnode slot an order at `display_price` must reference.
///
/// Prices are compared on their cent encoding, so two display prices that
/// round to the same cent address the same slot. When no slot matches, the
/// error carries the index a freshly created level is expected to take: the
/// exchange appends new nodes, so that is the current length of `book`'s side.
pub fn find_or_create(book: &BookSnapshot, side: Side, display_price: &BigDecimal) -> Result<usize> {
    let raw_price = to_raw_price(display_price)?;
    find_raw(book.levels(side), raw_price)
}

fn find_raw(levels: &[PriceLevel], raw_price: u64) -> Result<usize> {
    position_of(levels, raw_price).ok_or(AppError::LevelAbsent {
        raw_price,
        append_index: levels.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn book() -> BookSnapshot {
        BookSnapshot {
            sell: vec![
                PriceLevel::new(10_050, 0),
                PriceLevel::new(10_000, 5_000_000),
            ],
            buy: vec![PriceLevel::new(10_050, 0), PriceLevel::new(10_000, 0)],
        }
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn existing_level_returns_its_slot() {
        assert_eq!(find_or_create(&book(), Side::Buy, &dec("100.00")).unwrap(), 1);
        assert_eq!(find_or_create(&book(), Side::Sell, &dec("100.5")).unwrap(), 0);
    }

    #[test]
    fn inactive_levels_are_still_addressable() {
        // volume 0 on the buy side, but the slot exists
        assert_eq!(find_or_create(&book(), Side::Buy, &dec("100.50")).unwrap(), 0);
    }

    #[test]
    fn missing_level_reports_append_index() {
        let err = find_or_create(&book(), Side::Buy, &dec("99.5")).unwrap_err();
        assert!(matches!(
            err,
            AppError::LevelAbsent {
                raw_price: 9_950,
                append_index: 2
            }
        ));
    }

    #[test]
    fn prices_within_the_same_cent_collide() {
        let a = find_or_create(&book(), Side::Sell, &dec("100.001")).unwrap();
        let b = find_or_create(&book(), Side::Sell, &dec("99.996")).unwrap();
        assert_eq!(a, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_side_appends_at_zero() {
        let empty = BookSnapshot::default();
        assert!(matches!(
            find_or_create(&empty, Side::Sell, &dec("1")),
            Err(AppError::LevelAbsent {
                raw_price: 100,
                append_index: 0
            })
        ));
    }
}
