//! Configuration loader and application settings.

use std::str::FromStr;

use ethers::types::{Address, U256};

use crate::errors::{AppError, Result};
use crate::submission::SizeEncoding;

const DEFAULT_EXCHANGE: &str = "0xBa46c2353fDd9cD075e4dc4bC9a0FA5Ef3112C4b";
const DEFAULT_ORACLE: &str = "0x8A753747A1Fa494EC906cE90E9f37563A8AF630e";
const DEFAULT_QUOTE_TOKEN: &str = "0xF2DF8FBB35c7D837aA7866353989E15A094400e4";
const DEFAULT_BASE_TOKEN: &str = "0x20c5c72bEE10051f923c3cFAbd744F0618b4B41f";
/// Rinkeby.
const DEFAULT_CHAIN_ID: u64 = 4;
const DEFAULT_MIN_ALLOWANCE: u64 = 1_000_000_000_000;

/// Consolidated application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP endpoint of the Ethereum-compatible node.
    pub rpc_url: String,
    /// Hex private key of the signing wallet.
    pub wallet_key: Option<String>,
    pub exchange_address: Address,
    /// Chainlink ETH/USD aggregator.
    pub oracle_address: Address,
    /// USDb.
    pub quote_token_address: Address,
    pub base_token_address: Address,
    /// Chain the wallet must be on.
    pub chain_id: u64,
    /// Allowances above this count as approved.
    pub min_allowance: U256,
    pub block_poll_ms: u64,
    pub confirmations: usize,
    pub size_encoding: SizeEncoding,
    /// Connect the wallet at start-up instead of waiting for `connect`.
    pub auto_connect: bool,
    /// Emit rendered state as JSON lines instead of log lines.
    pub render_json: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; `load` reads the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let rpc_url = lookup("RPC_URL")
            .ok_or_else(|| AppError::Config("set RPC_URL to your Ethereum node HTTP endpoint".into()))?;
        let wallet_key = lookup("WALLET_PRIVATE_KEY").filter(|key| !key.trim().is_empty());

        Ok(Self {
            rpc_url,
            wallet_key,
            exchange_address: address(&lookup, "EXCHANGE_ADDRESS", DEFAULT_EXCHANGE)?,
            oracle_address: address(&lookup, "ORACLE_ADDRESS", DEFAULT_ORACLE)?,
            quote_token_address: address(&lookup, "QUOTE_TOKEN_ADDRESS", DEFAULT_QUOTE_TOKEN)?,
            base_token_address: address(&lookup, "BASE_TOKEN_ADDRESS", DEFAULT_BASE_TOKEN)?,
            chain_id: parsed(&lookup, "CHAIN_ID", DEFAULT_CHAIN_ID)?,
            min_allowance: U256::from(parsed(&lookup, "MIN_ALLOWANCE", DEFAULT_MIN_ALLOWANCE)?),
            block_poll_ms: parsed(&lookup, "BLOCK_POLL_MS", 4_000)?,
            confirmations: parsed(&lookup, "CONFIRMATIONS", 1)?,
            size_encoding: parsed(&lookup, "ORDER_SIZE_ENCODING", SizeEncoding::default())?,
            auto_connect: parsed(&lookup, "AUTO_CONNECT", true)?,
            render_json: parsed(&lookup, "RENDER_JSON", false)?,
        })
    }
}

fn address(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<Address> {
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|e| AppError::Config(format!("{key} is not an address ({raw}): {e}")))
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key}={raw}: {e}"))),
        None => Ok(default),
    }
}
