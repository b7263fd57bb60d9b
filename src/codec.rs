//! Fixed-point conversions between on-chain integers and display decimals.
//!
//! The exchange stores every quantity as an unsigned integer with an implicit
//! scale. Display → raw conversions run on exact decimals so that values typed
//! by the user never pick up binary floating-point drift; raw → display
//! conversions return `f64` and are truncated or rounded at the call site.

use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::errors::{AppError, Result};

/// Price: USD cents per ETH.
pub const PRICE_SCALE: u64 = 100;
/// ETH-denominated sizes, and USD reserved by buy orders.
pub const ETH_SIZE_SCALE: u64 = 1_000_000;
pub const USD_SIZE_SCALE: u64 = 10_000;
/// Chainlink answers carry 8 decimals.
pub const ORACLE_SCALE: u64 = 100_000_000;

pub fn to_display_price(raw: u64) -> f64 {
    raw as f64 / PRICE_SCALE as f64
}

pub fn to_display_eth_size(raw: u64) -> f64 {
    raw as f64 / ETH_SIZE_SCALE as f64
}

pub fn to_display_usd_size(raw: u64) -> f64 {
    raw as f64 / USD_SIZE_SCALE as f64
}

pub fn to_display_oracle_price(raw: i128) -> f64 {
    raw as f64 / ORACLE_SCALE as f64
}

/// `round(display * 100)`, half-up.
pub fn to_raw_price(display: &BigDecimal) -> Result<u64> {
    scale_to_raw(display, PRICE_SCALE)
}

pub fn to_raw_eth_size(display: &BigDecimal) -> Result<u64> {
    scale_to_raw(display, ETH_SIZE_SCALE)
}

pub fn to_raw_usd_size(display: &BigDecimal) -> Result<u64> {
    scale_to_raw(display, USD_SIZE_SCALE)
}

/// Exact decimal form of a raw price, e.g. `10050` -> `100.50`.
pub fn price_decimal(raw: u64) -> BigDecimal {
    BigDecimal::new(BigInt::from(raw), 2)
}

/// Parse a user-typed amount. Blank input is `EmptyInput`, anything that is
/// not a non-negative decimal is `InvalidInput`.
pub fn parse_display(field: &'static str, input: &str) -> Result<BigDecimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyInput(field));
    }
    let invalid = || AppError::InvalidInput {
        field,
        value: input.to_string(),
    };
    let value = BigDecimal::from_str(trimmed).map_err(|_| invalid())?;
    if value < BigDecimal::zero() {
        return Err(invalid());
    }
    Ok(value)
}

/// Lift a display `f64` into an exact decimal through its shortest
/// round-trip representation (`100.5` stays `100.5`, not `100.4999…`).
pub fn display_from_f64(value: f64) -> Result<BigDecimal> {
    if !value.is_finite() {
        return Err(AppError::Overflow(format!("non-finite display value {value}")));
    }
    BigDecimal::from_str(&value.to_string())
        .map_err(|e| AppError::Overflow(format!("display value {value}: {e}")))
}

/// `numerator / denominator` truncated to an integer count of
/// `10^-decimals` units, so `truncated_ratio(1_005_000, 1_000, 3)` is `1.005`.
/// The division runs on integers; a zero denominator gives infinity.
pub fn truncated_ratio(numerator: u128, denominator: u128, decimals: u32) -> f64 {
    match numerator.checked_div(denominator) {
        Some(units) => units_to_f64(units, decimals),
        None => f64::INFINITY,
    }
}

/// Like [`truncated_ratio`] but rounding half up.
pub fn rounded_ratio(numerator: u128, denominator: u128, decimals: u32) -> f64 {
    if denominator == 0 {
        return f64::INFINITY;
    }
    let units = numerator.saturating_add(denominator / 2) / denominator;
    units_to_f64(units, decimals)
}

fn units_to_f64(units: u128, decimals: u32) -> f64 {
    units as f64 / 10_f64.powi(decimals as i32)
}

/// Half-away-from-zero rounding to `decimals` places.
pub fn round(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

fn scale_to_raw(display: &BigDecimal, scale: u64) -> Result<u64> {
    let scaled = (display * BigDecimal::from(scale)).with_scale_round(0, RoundingMode::HalfUp);
    scaled
        .to_u64()
        .ok_or_else(|| AppError::Overflow(format!("{display} x {scale} does not fit u64")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn raw_price_round_trips_through_display() {
        for raw in (0..200_000u64).step_by(7).chain([1, 99, 10_050, u32::MAX as u64]) {
            assert_eq!(to_raw_price(&price_decimal(raw)).unwrap(), raw);
            let via_f64 = display_from_f64(to_display_price(raw)).unwrap();
            assert_eq!(to_raw_price(&via_f64).unwrap(), raw, "raw {raw}");
        }
    }

    #[test]
    fn raw_price_rounds_half_up_to_cents() {
        assert_eq!(to_raw_price(&dec("100.004")).unwrap(), 10_000);
        assert_eq!(to_raw_price(&dec("100.005")).unwrap(), 10_001);
        assert_eq!(to_raw_price(&dec("0.1")).unwrap(), 10);
    }

    #[test]
    fn size_scales() {
        assert_eq!(to_raw_eth_size(&dec("1.5")).unwrap(), 1_500_000);
        assert_eq!(to_raw_usd_size(&dec("250.25")).unwrap(), 2_502_500);
        assert_eq!(to_display_eth_size(5_000_000), 5.0);
        assert_eq!(to_display_usd_size(2_502_500), 250.25);
        assert_eq!(to_display_oracle_price(312_345_678_901), 3123.45678901);
    }

    #[test]
    fn parse_rejects_blank_and_garbage() {
        assert!(matches!(
            parse_display("limit price", "   "),
            Err(AppError::EmptyInput("limit price"))
        ));
        assert!(matches!(
            parse_display("eth size", "abc"),
            Err(AppError::InvalidInput { field: "eth size", .. })
        ));
        assert!(matches!(
            parse_display("eth size", "-1"),
            Err(AppError::InvalidInput { .. })
        ));
        assert_eq!(parse_display("usd size", " 12.5 ").unwrap(), dec("12.5"));
    }

    #[test]
    fn overflow_is_reported() {
        let huge = dec("100000000000000000000");
        assert!(matches!(to_raw_eth_size(&huge), Err(AppError::Overflow(_))));
    }

    #[test]
    fn ratios_truncate_on_integers() {
        assert_eq!(truncated_ratio(1_005_000, 1_000, 3), 1.005);
        assert_eq!(truncated_ratio(1_015_999, 1_000, 3), 1.015);
        assert_eq!(truncated_ratio(115 * 100_000_000, 1_000_000, 2), 115.0);
        assert!(truncated_ratio(1, 0, 3).is_infinite());
        assert_eq!(rounded_ratio(2_502_500, 10_000, 2), 2.5);
        assert_eq!(rounded_ratio(2_505_000, 10_000, 2), 2.51);
    }

    #[test]
    fn float_rounding() {
        assert_eq!(round(1.2345, 2), 1.23);
        assert_eq!(round(2.675_1, 2), 2.68);
    }
}
