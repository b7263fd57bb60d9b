//! Presentation callbacks.
//!
//! The session pushes every piece of visible state through [`Renderer`]; it
//! never reads anything back. [`LogRenderer`] is the terminal front end used
//! by the binary.

use ethers::types::Address;
use serde::Serialize;
use tracing::{info, warn};

use crate::book::{ActiveOrderRow, Ladder};
use crate::form::{FeePreview, InputField};
use crate::models::Side;

pub trait Renderer: Send {
    fn render_ladder(&mut self, ladder: &Ladder);
    /// Replaces every previously rendered row.
    fn render_active_orders(&mut self, rows: &[ActiveOrderRow]);
    fn render_block_number(&mut self, block: u64);
    fn render_oracle_price(&mut self, usd: f64);
    /// Enable or disable every order-entry input and button.
    fn set_controls_enabled(&mut self, enabled: bool);
    fn render_control(&mut self, side: Side, label: &str);
    /// A field rewritten by the size linkage.
    fn render_input(&mut self, field: InputField, value: &str);
    fn render_fee_preview(&mut self, preview: Option<&FeePreview>);
    fn render_wallet(&mut self, address: Address);
    /// Blocking prompt such as a wrong-network warning.
    fn alert(&mut self, message: &str);
}

/// `0x1234...abcd`-style abbreviation of an address.
pub fn short_address(address: Address) -> String {
    let full = format!("{address:?}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum View<'a> {
    Ladder {
        asks: &'a [crate::book::LadderRow],
        bids: &'a [crate::book::LadderRow],
        spread: Option<f64>,
    },
    ActiveOrders { rows: &'a [ActiveOrderRow] },
    Block { number: u64 },
    Oracle { usd: f64 },
    Controls { enabled: bool },
    Control { side: Side, label: &'a str },
    Input { field: InputField, value: &'a str },
    FeePreview { preview: Option<&'a FeePreview> },
    Wallet { address: String },
    Alert { message: &'a str },
}

/// Renders through `tracing`, or as JSON lines on stdout for a UI process.
#[derive(Debug, Clone, Default)]
pub struct LogRenderer {
    json: bool,
}

impl LogRenderer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit_json(&self, view: &View<'_>) {
        match serde_json::to_string(view) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "view serialization failed"),
        }
    }
}

impl Renderer for LogRenderer {
    fn render_ladder(&mut self, ladder: &Ladder) {
        if self.json {
            return self.emit_json(&View::Ladder {
                asks: &ladder.asks,
                bids: &ladder.bids,
                spread: ladder.spread_display(),
            });
        }
        for row in ladder.asks.iter().rev() {
            info!("[BOOK] ask {:>10.2} | {:>10.3}", row.price, row.size);
        }
        match ladder.spread_display() {
            Some(spread) => info!("[BOOK] spread {spread:.2}"),
            None => info!("[BOOK] spread -"),
        }
        for row in &ladder.bids {
            info!("[BOOK] bid {:>10.2} | {:>10.3}", row.price, row.size);
        }
    }

    fn render_active_orders(&mut self, rows: &[ActiveOrderRow]) {
        if self.json {
            return self.emit_json(&View::ActiveOrders { rows });
        }
        if rows.is_empty() {
            info!("[ORDERS] no active orders");
        }
        for row in rows {
            info!(
                "[ORDERS] {:<4} {:>10.2} USD | {:>10.3} ETH | {:>10.2} USD",
                row.side.to_string().to_uppercase(),
                row.price,
                row.size,
                row.value
            );
        }
    }

    fn render_block_number(&mut self, block: u64) {
        if self.json {
            return self.emit_json(&View::Block { number: block });
        }
        info!(block, "[SYNC] new block");
    }

    fn render_oracle_price(&mut self, usd: f64) {
        if self.json {
            return self.emit_json(&View::Oracle { usd });
        }
        info!("[ORACLE] ${usd:.2}");
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        if self.json {
            return self.emit_json(&View::Controls { enabled });
        }
        info!(enabled, "[UI] order entry");
    }

    fn render_control(&mut self, side: Side, label: &str) {
        if self.json {
            return self.emit_json(&View::Control { side, label });
        }
        info!(%side, label, "[UI] button");
    }

    fn render_input(&mut self, field: InputField, value: &str) {
        if self.json {
            return self.emit_json(&View::Input { field, value });
        }
        info!(?field, value, "[UI] linked field");
    }

    fn render_fee_preview(&mut self, preview: Option<&FeePreview>) {
        if self.json {
            return self.emit_json(&View::FeePreview { preview });
        }
        match preview {
            Some(p) => info!("[UI] fee {} {} | total {} {}", p.fee, p.unit, p.total, p.unit),
            None => info!("[UI] fee -"),
        }
    }

    fn render_wallet(&mut self, address: Address) {
        let address = short_address(address);
        if self.json {
            return self.emit_json(&View::Wallet { address });
        }
        info!(%address, "[WALLET] connected");
    }

    fn alert(&mut self, message: &str) {
        if self.json {
            return self.emit_json(&View::Alert { message });
        }
        warn!("[ALERT] {message}");
    }
}
