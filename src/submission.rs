//! Order placement: resolve (or lazily create) the price level, then submit.
//!
//! Each side has its own [`OrderControl`]. Transaction work runs in spawned
//! tasks that report [`Progress`] back to the session, which applies it to the
//! control; the label shown to the user is derived from the state, never the
//! other way around.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use ethers::types::{Address, TxHash, U256};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::book::index;
use crate::codec::{parse_display, to_raw_eth_size, to_raw_price, to_raw_usd_size};
use crate::errors::{AppError, Result};
use crate::exchange::ExchangeApi;
use crate::form::OrderForm;
use crate::models::{ApprovalState, Side, TxStatus};
use crate::session::Event;

/// How the order size argument is encoded on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeEncoding {
    /// Sells pass ETH and buys pass the USD to reserve, both ×1,000,000:
    /// the scale the book and the active-order rows read volumes back with.
    #[default]
    Reserved,
    /// ETH size ×10,000 for buys and ×1,000,000 for sells, as the first web
    /// client sent them.
    Legacy,
}

impl FromStr for SizeEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reserved" => Ok(SizeEncoding::Reserved),
            "legacy" => Ok(SizeEncoding::Legacy),
            other => Err(format!("unknown size encoding `{other}` (expected reserved|legacy)")),
        }
    }
}

/// A validated order as typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub eth_size: BigDecimal,
    pub usd_size: BigDecimal,
    pub limit_price: BigDecimal,
}

impl OrderRequest {
    /// All three fields must be filled in, even though each side only sends
    /// one of the sizes.
    pub fn new(side: Side, eth_size: &str, usd_size: &str, limit_price: &str) -> Result<Self> {
        Ok(Self {
            side,
            eth_size: parse_display("eth size", eth_size)?,
            usd_size: parse_display("usd size", usd_size)?,
            limit_price: parse_display("limit price", limit_price)?,
        })
    }

    pub fn from_form(side: Side, form: &OrderForm) -> Result<Self> {
        Self::new(side, &form.eth_size, &form.usd_size, &form.limit_price)
    }

    /// Cent price; prices rounding to zero cents are rejected.
    pub fn raw_price(&self) -> Result<u64> {
        nonzero("limit price", &self.limit_price, to_raw_price(&self.limit_price)?)
    }

    /// Encoded size; sizes rounding to zero units are rejected.
    pub fn raw_size(&self, encoding: SizeEncoding) -> Result<u64> {
        let (field, display, raw) = match (encoding, self.side) {
            (SizeEncoding::Reserved, Side::Buy) => ("usd size", &self.usd_size, to_raw_eth_size(&self.usd_size)?),
            (SizeEncoding::Reserved, Side::Sell) => ("eth size", &self.eth_size, to_raw_eth_size(&self.eth_size)?),
            (SizeEncoding::Legacy, Side::Buy) => ("eth size", &self.eth_size, to_raw_usd_size(&self.eth_size)?),
            (SizeEncoding::Legacy, Side::Sell) => ("eth size", &self.eth_size, to_raw_eth_size(&self.eth_size)?),
        };
        nonzero(field, display, raw)
    }

    /// Check that the order encodes to a nonzero price and size.
    pub fn validate(self, encoding: SizeEncoding) -> Result<Self> {
        self.raw_price()?;
        self.raw_size(encoding)?;
        Ok(self)
    }
}

fn nonzero(field: &'static str, display: &BigDecimal, raw: u64) -> Result<u64> {
    if raw == 0 {
        return Err(AppError::InvalidInput {
            field,
            value: display.to_string(),
        });
    }
    Ok(raw)
}

/// A level this client created and saw confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedLevel {
    pub raw_price: u64,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Approving,
    /// Fetching the book to find the level; no transaction yet.
    Resolving,
    CreatingLevel,
    /// The slot exists; the order goes out on the next click.
    LevelJustCreated(CreatedLevel),
}

/// Buy or sell button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderControl {
    pub side: Side,
    pub approval: ApprovalState,
    pub state: ControlState,
}

impl OrderControl {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            approval: ApprovalState::NotApproved,
            state: ControlState::Idle,
        }
    }

    /// A transaction (or the lookup preceding one) is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            ControlState::Approving | ControlState::Resolving | ControlState::CreatingLevel
        )
    }

    pub fn label(&self) -> &'static str {
        match self.state {
            ControlState::Approving => "Approving...",
            ControlState::CreatingLevel => "Loading...",
            ControlState::LevelJustCreated(_) => "Please confirm again",
            ControlState::Idle | ControlState::Resolving => match (self.approval, self.side) {
                (ApprovalState::NotApproved, Side::Buy) => "Approve USDb",
                (ApprovalState::NotApproved, Side::Sell) => "Approve ETH",
                (ApprovalState::Approved, Side::Buy) => "Buy ETH",
                (ApprovalState::Approved, Side::Sell) => "Sell ETH",
            },
        }
    }

    pub fn apply(&mut self, progress: &Progress) {
        self.state = match progress {
            Progress::LevelCreationSent { .. } => ControlState::CreatingLevel,
            Progress::LevelCreated(created) => ControlState::LevelJustCreated(*created),
            Progress::OrderSent { .. } => ControlState::Idle,
            Progress::ApprovalSent { .. } => ControlState::Approving,
            Progress::Approved => {
                self.approval = ApprovalState::Approved;
                ControlState::Idle
            }
            Progress::Failed(_) => ControlState::Idle,
        };
    }
}

/// Reported by transaction tasks back to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    LevelCreationSent { raw_price: u64, tx: TxHash },
    LevelCreated(CreatedLevel),
    OrderSent { index: usize, tx: TxHash },
    ApprovalSent { tx: TxHash },
    Approved,
    Failed(String),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::LevelCreationSent { raw_price, .. } => write!(f, "creating level {raw_price}"),
            Progress::LevelCreated(created) => {
                write!(f, "level {} created at slot {}", created.raw_price, created.index)
            }
            Progress::OrderSent { index, .. } => write!(f, "order sent to slot {index}"),
            Progress::ApprovalSent { .. } => f.write_str("approval sent"),
            Progress::Approved => f.write_str("approved"),
            Progress::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Run one click of the order protocol to its next resting state.
pub async fn place_order<E: ExchangeApi>(
    exchange: Arc<E>,
    request: OrderRequest,
    encoding: SizeEncoding,
    remembered: Option<CreatedLevel>,
    events: mpsc::Sender<Event>,
) {
    let side = request.side;
    let last = match drive_order(&*exchange, &request, encoding, remembered, &events).await {
        Ok(progress) => progress,
        Err(e) => {
            warn!(%side, error = %e, "[ORDER] placement failed");
            Progress::Failed(e.to_string())
        }
    };
    let _ = events.send(Event::Progress(side, last)).await;
}

async fn drive_order<E: ExchangeApi>(
    exchange: &E,
    request: &OrderRequest,
    encoding: SizeEncoding,
    remembered: Option<CreatedLevel>,
    events: &mpsc::Sender<Event>,
) -> Result<Progress> {
    let side = request.side;
    let raw_price = request.raw_price()?;
    let raw_size = request.raw_size(encoding)?;

    // always scan a fresh fetch; a cached book may predate our own level
    let book = exchange.price_volume_levels().await?;
    let index = match index::find_or_create(&book, side, &request.limit_price) {
        Ok(index) => {
            if let Some(created) = remembered.filter(|c| c.raw_price == raw_price && c.index != index) {
                warn!(
                    %side,
                    raw_price,
                    expected = created.index,
                    found = index,
                    "[ORDER] level landed on an unexpected slot"
                );
            }
            index
        }
        Err(AppError::LevelAbsent { append_index, .. }) => {
            if let Some(created) = remembered.filter(|c| c.raw_price == raw_price) {
                // the node has not caught up with our own creation yet
                created.index
            } else {
                return create_level(exchange, side, raw_price, append_index, events).await;
            }
        }
        Err(e) => return Err(e),
    };

    let tx = match side {
        Side::Buy => exchange.submit_buy_order(raw_price, raw_size, index).await?,
        Side::Sell => exchange.submit_sell_order(raw_price, raw_size, index).await?,
    };
    info!(%side, raw_price, raw_size, index, ?tx, "[ORDER] order submitted");
    Ok(Progress::OrderSent { index, tx })
}

async fn create_level<E: ExchangeApi>(
    exchange: &E,
    side: Side,
    raw_price: u64,
    append_index: usize,
    events: &mpsc::Sender<Event>,
) -> Result<Progress> {
    let tx = exchange.create_price_level(raw_price).await?;
    info!(%side, raw_price, append_index, ?tx, "[ORDER] creating price level");
    let _ = events
        .send(Event::Progress(side, Progress::LevelCreationSent { raw_price, tx }))
        .await;

    match exchange.wait_for_receipt(tx).await? {
        TxStatus::Success => Ok(Progress::LevelCreated(CreatedLevel {
            raw_price,
            index: append_index,
        })),
        TxStatus::Failed => Err(AppError::TransactionFailed(tx)),
    }
}

/// Grant the exchange an unlimited allowance on the token `side` spends.
pub async fn approve<E: ExchangeApi>(
    exchange: Arc<E>,
    side: Side,
    spender: Address,
    events: mpsc::Sender<Event>,
) {
    let last = match drive_approval(&*exchange, side, spender, &events).await {
        Ok(progress) => progress,
        Err(e) => {
            warn!(%side, error = %e, "[APPROVE] approval failed");
            Progress::Failed(e.to_string())
        }
    };
    let _ = events.send(Event::Progress(side, last)).await;
}

async fn drive_approval<E: ExchangeApi>(
    exchange: &E,
    side: Side,
    spender: Address,
    events: &mpsc::Sender<Event>,
) -> Result<Progress> {
    let token = side.spent_token();
    let tx = exchange.approve_spender(token, spender, U256::MAX).await?;
    let _ = events
        .send(Event::Progress(side, Progress::ApprovalSent { tx }))
        .await;
    match exchange.wait_for_receipt(tx).await? {
        TxStatus::Success => {
            info!(%side, ?token, ?tx, "[APPROVE] allowance granted");
            Ok(Progress::Approved)
        }
        TxStatus::Failed => Err(AppError::TransactionFailed(tx)),
    }
}
