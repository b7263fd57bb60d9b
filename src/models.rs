//! Shared data structures used throughout the client.

use std::fmt;

use ethers::types::{Address, U256};
use serde::Serialize;

/// Side of the book an order or price level belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Token the exchange pulls from the user when an order on this side is placed.
    pub fn spent_token(self) -> Token {
        match self {
            Side::Buy => Token::Quote,
            Side::Sell => Token::Base,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// The two ERC-20 tokens traded on the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    /// USDb, spent by buy orders.
    Quote,
    /// The ETH token, spent by sell orders.
    Base,
}

/// One on-chain price-volume node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    /// USD cents per ETH.
    pub price: u64,
    /// Encoded volume; zero means the slot exists but is inactive.
    pub volume: u64,
}

impl PriceLevel {
    pub fn new(price: u64, volume: u64) -> Self {
        Self { price, volume }
    }

    pub fn is_active(&self) -> bool {
        self.volume > 0
    }
}

/// Raw `(sellLevels, buyLevels)` pair from a single fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSnapshot {
    pub sell: Vec<PriceLevel>,
    pub buy: Vec<PriceLevel>,
}

impl BookSnapshot {
    pub fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.buy,
            Side::Sell => &self.sell,
        }
    }
}

/// An open order of the connected wallet, as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveOrder {
    pub side: Side,
    pub price: u64,
    pub raw_size: u64,
    pub owner: Address,
}

/// Whether the exchange may move one of the user's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalState {
    #[default]
    NotApproved,
    Approved,
}

impl ApprovalState {
    /// Allowances above `threshold` count as unlimited.
    pub fn from_allowance(allowance: U256, threshold: U256) -> Self {
        if allowance > threshold {
            ApprovalState::Approved
        } else {
            ApprovalState::NotApproved
        }
    }

    pub fn is_approved(self) -> bool {
        self == ApprovalState::Approved
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_threshold_is_exclusive() {
        let threshold = U256::from(1_000_000_000_000u64);
        assert_eq!(
            ApprovalState::from_allowance(threshold, threshold),
            ApprovalState::NotApproved
        );
        assert!(ApprovalState::from_allowance(threshold + 1, threshold).is_approved());
        assert!(ApprovalState::from_allowance(U256::MAX, threshold).is_approved());
    }

    #[test]
    fn sides_spend_their_own_token() {
        assert_eq!(Side::Buy.spent_token(), Token::Quote);
        assert_eq!(Side::Sell.spent_token(), Token::Base);
    }
}
