//! In-memory exchange and renderer used by the unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use ethers::types::{Address, TxHash, U256};

use crate::book::{ActiveOrderRow, Ladder};
use crate::errors::{AppError, Result};
use crate::exchange::ExchangeApi;
use crate::form::{FeePreview, InputField};
use crate::models::{ActiveOrder, BookSnapshot, PriceLevel, Side, Token, TxStatus};
use crate::render::Renderer;

pub fn owner() -> Address {
    Address::repeat_byte(0x11)
}

/// A write call the exchange received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateLevel(u64),
    BuyOrder { raw_price: u64, raw_size: u64, index: usize },
    SellOrder { raw_price: u64, raw_size: u64, index: usize },
    Approve(Token),
}

struct MockState {
    book: BookSnapshot,
    buy_orders: Vec<ActiveOrder>,
    sell_orders: Vec<ActiveOrder>,
    oracle: i128,
    allowances: HashMap<Token, U256>,
    chain_id: u64,
    wallet: Option<Address>,
    calls: Vec<Call>,
    reads: usize,
    pending_levels: HashMap<TxHash, u64>,
    next_tx: u64,
    fail_receipts: bool,
    reject_sends: bool,
}

/// Exchange double. Confirmed level creations append a node to both sides,
/// like the real contract.
pub struct MockExchange {
    state: Mutex<MockState>,
}

impl Default for MockExchange {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                book: BookSnapshot::default(),
                buy_orders: Vec::new(),
                sell_orders: Vec::new(),
                oracle: 300_012_345_678,
                allowances: HashMap::from([(Token::Quote, U256::MAX), (Token::Base, U256::MAX)]),
                chain_id: 4,
                wallet: Some(owner()),
                calls: Vec::new(),
                reads: 0,
                pending_levels: HashMap::new(),
                next_tx: 1,
                fail_receipts: false,
                reject_sends: false,
            }),
        }
    }
}

impl MockExchange {
    pub fn with_book(book: BookSnapshot) -> Self {
        let mock = Self::default();
        mock.lock().book = book;
        mock
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    pub fn book(&self) -> BookSnapshot {
        self.lock().book.clone()
    }

    pub fn set_orders(&self, buys: Vec<ActiveOrder>, sells: Vec<ActiveOrder>) {
        let mut state = self.lock();
        state.buy_orders = buys;
        state.sell_orders = sells;
    }

    pub fn set_allowance(&self, token: Token, amount: U256) {
        self.lock().allowances.insert(token, amount);
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.lock().chain_id = chain_id;
    }

    pub fn remove_wallet(&self) {
        self.lock().wallet = None;
    }

    pub fn fail_receipts(&self) {
        self.lock().fail_receipts = true;
    }

    pub fn reject_sends(&self) {
        self.lock().reject_sends = true;
    }

    fn record(&self, call: Call) -> Result<TxHash> {
        let mut state = self.lock();
        if state.reject_sends {
            return Err(AppError::TransactionRejected("user denied transaction signature".into()));
        }
        let tx = TxHash::from_low_u64_be(state.next_tx);
        state.next_tx += 1;
        if let Call::CreateLevel(raw_price) = call {
            state.pending_levels.insert(tx, raw_price);
        }
        state.calls.push(call);
        Ok(tx)
    }
}

impl ExchangeApi for MockExchange {
    async fn price_volume_levels(&self) -> Result<BookSnapshot> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.book.clone())
    }

    async fn active_buy_orders(&self, _owner: Address) -> Result<Vec<ActiveOrder>> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.buy_orders.clone())
    }

    async fn active_sell_orders(&self, _owner: Address) -> Result<Vec<ActiveOrder>> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.sell_orders.clone())
    }

    async fn oracle_price(&self) -> Result<i128> {
        let mut state = self.lock();
        state.reads += 1;
        Ok(state.oracle)
    }

    async fn allowance(&self, token: Token, _owner: Address, _spender: Address) -> Result<U256> {
        Ok(self.lock().allowances.get(&token).copied().unwrap_or_default())
    }

    async fn create_price_level(&self, raw_price: u64) -> Result<TxHash> {
        self.record(Call::CreateLevel(raw_price))
    }

    async fn submit_buy_order(&self, raw_price: u64, raw_size: u64, index: usize) -> Result<TxHash> {
        self.record(Call::BuyOrder { raw_price, raw_size, index })
    }

    async fn submit_sell_order(&self, raw_price: u64, raw_size: u64, index: usize) -> Result<TxHash> {
        self.record(Call::SellOrder { raw_price, raw_size, index })
    }

    async fn approve_spender(&self, token: Token, _spender: Address, _amount: U256) -> Result<TxHash> {
        self.record(Call::Approve(token))
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxStatus> {
        let mut state = self.lock();
        let created = state.pending_levels.remove(&tx);
        if state.fail_receipts {
            return Ok(TxStatus::Failed);
        }
        if let Some(raw_price) = created {
            state.book.sell.push(PriceLevel::new(raw_price, 0));
            state.book.buy.push(PriceLevel::new(raw_price, 0));
        }
        Ok(TxStatus::Success)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.lock().chain_id)
    }

    fn wallet_address(&self) -> Option<Address> {
        self.lock().wallet
    }
}

/// Renderer that keeps everything it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub ladders: Vec<Ladder>,
    pub active_orders: Vec<Vec<ActiveOrderRow>>,
    pub blocks: Vec<u64>,
    pub oracle_prices: Vec<f64>,
    pub controls_enabled: Vec<bool>,
    pub labels: Vec<(Side, String)>,
    pub inputs: Vec<(InputField, String)>,
    pub fee_previews: Vec<Option<FeePreview>>,
    pub wallets: Vec<Address>,
    pub alerts: Vec<String>,
}

impl RecordingRenderer {
    pub fn last_label(&self, side: Side) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|(s, _)| *s == side)
            .map(|(_, label)| label.as_str())
    }
}

impl Renderer for RecordingRenderer {
    fn render_ladder(&mut self, ladder: &Ladder) {
        self.ladders.push(ladder.clone());
    }

    fn render_active_orders(&mut self, rows: &[ActiveOrderRow]) {
        self.active_orders.push(rows.to_vec());
    }

    fn render_block_number(&mut self, block: u64) {
        self.blocks.push(block);
    }

    fn render_oracle_price(&mut self, usd: f64) {
        self.oracle_prices.push(usd);
    }

    fn set_controls_enabled(&mut self, enabled: bool) {
        self.controls_enabled.push(enabled);
    }

    fn render_control(&mut self, side: Side, label: &str) {
        self.labels.push((side, label.to_string()));
    }

    fn render_input(&mut self, field: InputField, value: &str) {
        self.inputs.push((field, value.to_string()));
    }

    fn render_fee_preview(&mut self, preview: Option<&FeePreview>) {
        self.fee_previews.push(preview.cloned());
    }

    fn render_wallet(&mut self, address: Address) {
        self.wallets.push(address);
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
