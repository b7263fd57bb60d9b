use serde::Serialize;

use crate::codec::{ETH_SIZE_SCALE, USD_SIZE_SCALE, rounded_ratio, to_display_price, truncated_ratio};
use crate::models::{ActiveOrder, PriceLevel, Side};

/// One rendered price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LadderRow {
    pub price: f64,
    /// ETH-equivalent size, truncated to 3 decimals.
    pub size: f64,
}

/// Both sides of the book ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ladder {
    /// Ascending by price.
    pub asks: Vec<LadderRow>,
    /// Descending by price.
    pub bids: Vec<LadderRow>,
    /// Best ask minus best bid in USD. Infinite when either side is empty.
    pub spread: f64,
}

impl Ladder {
    pub fn spread_display(&self) -> Option<f64> {
        self.spread.is_finite().then_some(self.spread)
    }
}

/// One of the user's open orders ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveOrderRow {
    pub side: Side,
    pub price: f64,
    /// ETH, 3 decimals.
    pub size: f64,
    /// USD, 2 decimals.
    pub value: f64,
}

/// Build the ladder from a raw `(sell, buy)` level pair.
///
/// Buy volume is USD reserved at the 1,000,000 scale, so the buy-side size is
/// divided by the level price to express it in ETH like the sell side. Sizes
/// are truncated on the raw integers.
pub fn project(sell: &[PriceLevel], buy: &[PriceLevel]) -> Ladder {
    let mut asks: Vec<(u64, LadderRow)> = sell
        .iter()
        .filter(|level| level.is_active())
        .map(|level| {
            let size = truncated_ratio(level.volume as u128, 1_000, 3);
            (level.price, LadderRow { price: to_display_price(level.price), size })
        })
        .collect();
    let mut bids: Vec<(u64, LadderRow)> = buy
        .iter()
        .filter(|level| level.is_active())
        .map(|level| {
            let size = eth_for_reserved_usd(level.volume, level.price);
            (level.price, LadderRow { price: to_display_price(level.price), size })
        })
        .collect();

    asks.sort_by_key(|(raw, _)| *raw);
    bids.sort_by_key(|(raw, _)| std::cmp::Reverse(*raw));

    let lowest_ask = asks.first().map_or(f64::INFINITY, |(raw, _)| *raw as f64);
    let highest_bid = bids.first().map_or(f64::NEG_INFINITY, |(raw, _)| *raw as f64);

    Ladder {
        asks: asks.into_iter().map(|(_, row)| row).collect(),
        bids: bids.into_iter().map(|(_, row)| row).collect(),
        spread: (lowest_ask - highest_bid) / 100.0,
    }
}

pub fn project_active_order(order: &ActiveOrder) -> ActiveOrderRow {
    let raw_size = order.raw_size as u128;
    let (size, value) = match order.side {
        Side::Sell => (
            truncated_ratio(raw_size, 1_000, 3),
            truncated_ratio(order.price as u128 * raw_size, ETH_SIZE_SCALE as u128, 2),
        ),
        // `raw_size` is the USD the exchange holds for this order
        Side::Buy => (
            eth_for_reserved_usd(order.raw_size, order.price),
            rounded_ratio(raw_size, USD_SIZE_SCALE as u128, 2),
        ),
    };
    ActiveOrderRow {
        side: order.side,
        price: to_display_price(order.price),
        size,
        value,
    }
}

/// `trunc(usd / 1e6 / raw_price * 100, 3)`, i.e. reserved USD over the cent
/// price, in thousandths of ETH.
fn eth_for_reserved_usd(volume: u64, raw_price: u64) -> f64 {
    truncated_ratio(volume as u128, 10 * raw_price as u128, 3)
}
