//! Read/write interface to the on-chain exchange and its satellite contracts.

use std::future::Future;

use ethers::types::{Address, TxHash, U256};

use crate::errors::Result;
use crate::models::{ActiveOrder, BookSnapshot, Token, TxStatus};

pub mod client;

pub use client::EthersExchange;

/// Everything the client needs from the chain.
///
/// Write operations return as soon as the node accepts the transaction;
/// [`ExchangeApi::wait_for_receipt`] is the separate suspension point for
/// confirmation.
pub trait ExchangeApi: Send + Sync + 'static {
    /// `(sellLevels, buyLevels)`.
    fn price_volume_levels(&self) -> impl Future<Output = Result<BookSnapshot>> + Send;

    fn active_buy_orders(&self, owner: Address) -> impl Future<Output = Result<Vec<ActiveOrder>>> + Send;

    fn active_sell_orders(&self, owner: Address) -> impl Future<Output = Result<Vec<ActiveOrder>>> + Send;

    /// Latest oracle answer, 8-decimal fixed point USD.
    fn oracle_price(&self) -> impl Future<Output = Result<i128>> + Send;

    fn allowance(
        &self,
        token: Token,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256>> + Send;

    fn create_price_level(&self, raw_price: u64) -> impl Future<Output = Result<TxHash>> + Send;

    fn submit_buy_order(
        &self,
        raw_price: u64,
        raw_size: u64,
        index: usize,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    fn submit_sell_order(
        &self,
        raw_price: u64,
        raw_size: u64,
        index: usize,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    fn approve_spender(
        &self,
        token: Token,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxHash>> + Send;

    fn wait_for_receipt(&self, tx: TxHash) -> impl Future<Output = Result<TxStatus>> + Send;

    fn chain_id(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Address of the signing wallet, `None` when no wallet is available.
    fn wallet_address(&self) -> Option<Address>;
}
