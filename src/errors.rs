use ethers::types::TxHash;
use thiserror::Error;

use crate::exchange::client::SignerClient;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Please switch the network to chain {expected} (wallet is on chain {actual})")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("No wallet available: set WALLET_PRIVATE_KEY")]
    WalletNotPresent,

    #[error("Order field `{0}` is empty")]
    EmptyInput(&'static str),

    #[error("Order field `{field}` is not a valid amount: {value:?}")]
    InvalidInput { field: &'static str, value: String },

    #[error("No price level at raw price {raw_price}; a new one would take slot {append_index}")]
    LevelAbsent { raw_price: u64, append_index: usize },

    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    #[error("Transaction {0:?} failed or was dropped")]
    TransactionFailed(TxHash),

    #[error("Value out of range: {0}")]
    Overflow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Provider error: {0}")]
    Provider(#[from] ethers::providers::ProviderError),

    #[error("Contract error: {0}")]
    Contract(#[from] ethers::contract::ContractError<SignerClient>),

    #[error("ABI error: {0}")]
    Abi(#[from] ethers::contract::AbiError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] ethers::signers::WalletError),

    #[error("Serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}
