//! Per-block refresh of everything the user sees.

use ethers::types::Address;
use tracing::debug;

use crate::book::{ActiveOrderRow, Ladder, project, project_active_order};
use crate::codec::{round, to_display_oracle_price};
use crate::errors::Result;
use crate::exchange::ExchangeApi;
use crate::render::Renderer;

/// One consistent read of the chain, already projected for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub ladder: Ladder,
    /// Buys first, then sells.
    pub active_orders: Vec<ActiveOrderRow>,
    /// USD, 2 decimals.
    pub oracle_price: f64,
}

/// Fetch book, active orders and oracle price concurrently and project them.
pub async fn fetch_snapshot<E: ExchangeApi>(exchange: &E, owner: Address) -> Result<SyncSnapshot> {
    let (book, buys, sells, oracle) = futures::try_join!(
        exchange.price_volume_levels(),
        exchange.active_buy_orders(owner),
        exchange.active_sell_orders(owner),
        exchange.oracle_price(),
    )?;
    debug!(
        sell_levels = book.sell.len(),
        buy_levels = book.buy.len(),
        buys = buys.len(),
        sells = sells.len(),
        "[SYNC] fetched"
    );

    let active_orders = buys
        .iter()
        .chain(sells.iter())
        .map(project_active_order)
        .collect();

    Ok(SyncSnapshot {
        ladder: project(&book.sell, &book.buy),
        active_orders,
        oracle_price: round(to_display_oracle_price(oracle), 2),
    })
}

pub fn render_snapshot<R: Renderer + ?Sized>(renderer: &mut R, snapshot: &SyncSnapshot) {
    renderer.render_ladder(&snapshot.ladder);
    renderer.render_active_orders(&snapshot.active_orders);
    renderer.render_oracle_price(snapshot.oracle_price);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActiveOrder, BookSnapshot, PriceLevel, Side};
    use crate::testing::{MockExchange, RecordingRenderer, owner};

    fn order(side: Side, price: u64, raw_size: u64) -> ActiveOrder {
        ActiveOrder {
            side,
            price,
            raw_size,
            owner: owner(),
        }
    }

    #[tokio::test]
    async fn snapshot_projects_every_source() {
        let exchange = MockExchange::with_book(BookSnapshot {
            sell: vec![PriceLevel::new(10_000, 5_000_000), PriceLevel::new(10_050, 0)],
            buy: vec![PriceLevel::new(9_900, 0), PriceLevel::new(9_950, 99_500_000)],
        });
        exchange.set_orders(
            vec![order(Side::Buy, 9_950, 99_500_000)],
            vec![order(Side::Sell, 10_000, 5_000_000)],
        );

        let snapshot = fetch_snapshot(&exchange, owner()).await.unwrap();
        assert_eq!(exchange.reads(), 4);
        assert_eq!(snapshot.ladder.asks.len(), 1);
        assert_eq!(snapshot.ladder.bids.len(), 1);
        assert_eq!(snapshot.ladder.spread_display(), Some(0.5));
        assert_eq!(snapshot.oracle_price, 3000.12);

        let sides: Vec<Side> = snapshot.active_orders.iter().map(|r| r.side).collect();
        assert_eq!(sides, vec![Side::Buy, Side::Sell]);
        assert_eq!(snapshot.active_orders[0].size, 1.0);
        assert_eq!(snapshot.active_orders[1].value, 500.0);
    }

    #[tokio::test]
    async fn rendering_replaces_rows_wholesale() {
        let exchange = MockExchange::default();
        let snapshot = fetch_snapshot(&exchange, owner()).await.unwrap();
        let mut renderer = RecordingRenderer::default();
        render_snapshot(&mut renderer, &snapshot);

        assert_eq!(renderer.ladders.len(), 1);
        assert_eq!(renderer.active_orders, vec![Vec::new()]);
        assert_eq!(renderer.oracle_prices, vec![3000.12]);
    }
}
