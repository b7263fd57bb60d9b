//! Event dispatcher tying the chain, the form and the renderer together.
//!
//! A single task handles one [`Event`] to completion before the next. Block
//! numbers arrive on a `watch` channel, so blocks mined while a cycle is
//! running collapse into one follow-up cycle. Transactions run in spawned
//! tasks and report back as [`Event::Progress`].

use std::sync::Arc;

use ethers::types::{Address, U256};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::exchange::ExchangeApi;
use crate::form::{InputField, OrderForm};
use crate::models::{ApprovalState, Side, Token};
use crate::render::Renderer;
use crate::submission::{self, ControlState, OrderControl, OrderRequest, Progress, SizeEncoding};
use crate::sync::{fetch_snapshot, render_snapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    NewBlock(u64),
    Connect,
    Input(InputField, String),
    /// Pointer entered a side's button, or left it.
    Hover(Option<Side>),
    Click(Side),
    Progress(Side, Progress),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub chain_id: u64,
    /// The exchange, which pulls tokens on order placement.
    pub spender: Address,
    pub min_allowance: U256,
    pub size_encoding: SizeEncoding,
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            chain_id: config.chain_id,
            spender: config.exchange_address,
            min_allowance: config.min_allowance,
            size_encoding: config.size_encoding,
        }
    }
}

pub struct Session<E, R> {
    exchange: Arc<E>,
    renderer: R,
    config: SessionConfig,
    owner: Option<Address>,
    form: OrderForm,
    hovered: Option<Side>,
    buy: OrderControl,
    sell: OrderControl,
    events: mpsc::Sender<Event>,
}

impl<E: ExchangeApi, R: Renderer> Session<E, R> {
    /// `events` is the sending half of the channel later passed to [`run`](Self::run);
    /// transaction tasks report through it.
    pub fn new(exchange: Arc<E>, renderer: R, config: SessionConfig, events: mpsc::Sender<Event>) -> Self {
        Self {
            exchange,
            renderer,
            config,
            owner: None,
            form: OrderForm::default(),
            hovered: None,
            buy: OrderControl::new(Side::Buy),
            sell: OrderControl::new(Side::Sell),
            events,
        }
    }

    /// Dispatch until the block source closes. Only a missing wallet ends the
    /// session early.
    pub async fn run(mut self, mut blocks: watch::Receiver<u64>, mut events: mpsc::Receiver<Event>) -> Result<()> {
        info!(chain_id = self.config.chain_id, "[INIT] session started");
        loop {
            let event = tokio::select! {
                changed = blocks.changed() => match changed {
                    Ok(()) => {
                        let block = *blocks.borrow_and_update();
                        Event::NewBlock(block)
                    }
                    Err(_) => {
                        info!("[SYNC] block source closed");
                        return Ok(());
                    }
                },
                event = events.recv() => match event {
                    Some(event) => event,
                    None => return Ok(()),
                },
            };
            self.handle(event).await?;
        }
    }

    pub async fn handle(&mut self, event: Event) -> Result<()> {
        match event {
            Event::NewBlock(block) => self.on_block(block).await,
            Event::Connect => return self.connect().await,
            Event::Input(field, value) => self.on_input(field, &value),
            Event::Hover(side) => self.on_hover(side),
            Event::Click(side) => self.on_click(side),
            Event::Progress(side, progress) => self.on_progress(side, progress),
        }
        Ok(())
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    pub fn control(&self, side: Side) -> &OrderControl {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }

    pub fn form(&self) -> &OrderForm {
        &self.form
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn control_mut(&mut self, side: Side) -> &mut OrderControl {
        match side {
            Side::Buy => &mut self.buy,
            Side::Sell => &mut self.sell,
        }
    }

    fn render_control(&mut self, side: Side) {
        let label = self.control(side).label();
        self.renderer.render_control(side, label);
    }

    async fn connect(&mut self) -> Result<()> {
        let owner = match self.authorize().await {
            Ok(owner) => owner,
            Err(AppError::WalletNotPresent) => return Err(AppError::WalletNotPresent),
            Err(e @ AppError::WrongNetwork { .. }) => {
                warn!(error = %e, "[WALLET] wrong network");
                self.renderer.alert(&e.to_string());
                return Ok(());
            }
            Err(e) => {
                warn!(error = %e, "[WALLET] connect failed");
                return Ok(());
            }
        };

        info!(?owner, "[WALLET] connected");
        self.owner = Some(owner);
        self.renderer.render_wallet(owner);
        self.renderer.set_controls_enabled(true);
        self.render_control(Side::Buy);
        self.render_control(Side::Sell);
        self.sync(owner).await;
        Ok(())
    }

    /// Wallet, network and allowance checks. Approvals only ever upgrade.
    async fn authorize(&mut self) -> Result<Address> {
        let owner = self.exchange.wallet_address().ok_or(AppError::WalletNotPresent)?;
        let actual = self.exchange.chain_id().await?;
        if actual != self.config.chain_id {
            return Err(AppError::WrongNetwork {
                expected: self.config.chain_id,
                actual,
            });
        }

        let spender = self.config.spender;
        let (quote, base) = futures::try_join!(
            self.exchange.allowance(Token::Quote, owner, spender),
            self.exchange.allowance(Token::Base, owner, spender),
        )?;
        for (side, allowance) in [(Side::Buy, quote), (Side::Sell, base)] {
            let state = ApprovalState::from_allowance(allowance, self.config.min_allowance);
            debug!(%side, %allowance, ?state, "[APPROVE] allowance read");
            if state.is_approved() {
                self.control_mut(side).approval = ApprovalState::Approved;
            }
        }
        Ok(owner)
    }

    async fn on_block(&mut self, block: u64) {
        self.renderer.render_block_number(block);
        let Some(owner) = self.owner else {
            self.renderer.set_controls_enabled(false);
            return;
        };
        self.sync(owner).await;
    }

    async fn sync(&mut self, owner: Address) {
        match fetch_snapshot(&*self.exchange, owner).await {
            Ok(snapshot) => render_snapshot(&mut self.renderer, &snapshot),
            Err(e) => warn!(error = %e, "[SYNC] fetch failed, skipping cycle"),
        }
    }

    fn on_input(&mut self, field: InputField, value: &str) {
        if let Some((linked, linked_value)) = self.form.set(field, value) {
            self.renderer.render_input(linked, &linked_value);
        }
        if self.hovered.is_some() {
            self.on_hover(self.hovered);
        }
    }

    fn on_hover(&mut self, side: Option<Side>) {
        self.hovered = side;
        let preview = side.and_then(|side| self.form.fee_preview(side));
        self.renderer.render_fee_preview(preview.as_ref());
    }

    fn on_click(&mut self, side: Side) {
        if self.owner.is_none() {
            debug!(%side, "[ORDER] click ignored, wallet not connected");
            return;
        }
        let control = *self.control(side);
        if control.is_busy() {
            debug!(%side, state = ?control.state, "[ORDER] click ignored, transaction in flight");
            return;
        }

        if !control.approval.is_approved() {
            self.control_mut(side).state = ControlState::Approving;
            self.render_control(side);
            tokio::spawn(submission::approve(
                self.exchange.clone(),
                side,
                self.config.spender,
                self.events.clone(),
            ));
            return;
        }

        let request = match OrderRequest::from_form(side, &self.form)
            .and_then(|request| request.validate(self.config.size_encoding))
        {
            Ok(request) => request,
            Err(e) => {
                debug!(%side, error = %e, "[ORDER] incomplete order ignored");
                return;
            }
        };
        let remembered = match control.state {
            ControlState::LevelJustCreated(created) => Some(created),
            _ => None,
        };
        self.control_mut(side).state = ControlState::Resolving;
        self.render_control(side);
        tokio::spawn(submission::place_order(
            self.exchange.clone(),
            request,
            self.config.size_encoding,
            remembered,
            self.events.clone(),
        ));
    }

    fn on_progress(&mut self, side: Side, progress: Progress) {
        match &progress {
            Progress::Failed(_) => warn!(%side, %progress, "[ORDER] progress"),
            _ => info!(%side, %progress, "[ORDER] progress"),
        }
        self.control_mut(side).apply(&progress);
        self.render_control(side);
    }
}
