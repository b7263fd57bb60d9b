use std::sync::Arc;

use ethers::{
    abi::Detokenize,
    contract::{ContractCall, abigen},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, TxHash, U64, U256},
};
use tracing::{debug, warn};

use super::ExchangeApi;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{ActiveOrder, BookSnapshot, PriceLevel, Side, Token, TxStatus};

abigen!(
    PvExchange,
    r#"[
        function getPVobs() view returns ((uint256,uint256)[], (uint256,uint256)[])
        function activeBuyOrders() view returns ((address,uint256,uint256)[])
        function activeSellOrders() view returns ((address,uint256,uint256)[])
        function initPVnode(uint256 price)
        function newBuyOrder(uint256 price, uint256 size, uint256 index)
        function newSellOrder(uint256 price, uint256 size, uint256 index)
    ]"#,
);

abigen!(
    Erc20Token,
    r#"[
        function getAllowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
    ]"#,
);

abigen!(
    PriceOracle,
    r#"[
        function latestAnswer() view returns (int256)
    ]"#,
);

pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// `(price, volume)`
type RawLevel = (U256, U256);
/// `(owner, price, size)`
type RawOrder = (Address, U256, U256);

/// Handle for the exchange, the price oracle and both traded tokens, all
/// sharing one signing client.
#[derive(Clone)]
pub struct EthersExchange {
    client: Arc<SignerClient>,
    exchange: PvExchange<SignerClient>,
    oracle: PriceOracle<SignerClient>,
    quote_token: Erc20Token<SignerClient>,
    base_token: Erc20Token<SignerClient>,
    confirmations: usize,
}

impl EthersExchange {
    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let key = config
            .wallet_key
            .as_deref()
            .ok_or(AppError::WalletNotPresent)?;
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;
        let chain_id = provider.get_chainid().await?.as_u64();
        let wallet = key.parse::<LocalWallet>()?.with_chain_id(chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        Ok(Self {
            exchange: PvExchange::new(config.exchange_address, client.clone()),
            oracle: PriceOracle::new(config.oracle_address, client.clone()),
            quote_token: Erc20Token::new(config.quote_token_address, client.clone()),
            base_token: Erc20Token::new(config.base_token_address, client.clone()),
            confirmations: config.confirmations,
            client,
        })
    }

    /// Plain read provider, e.g. for the block watcher.
    pub fn provider(&self) -> Provider<Http> {
        self.client.provider().clone()
    }

    fn token(&self, token: Token) -> &Erc20Token<SignerClient> {
        match token {
            Token::Quote => &self.quote_token,
            Token::Base => &self.base_token,
        }
    }

    async fn active_orders(&self, side: Side, owner: Address) -> Result<Vec<ActiveOrder>> {
        // the exchange keys open orders by msg.sender
        let method = match side {
            Side::Buy => "activeBuyOrders",
            Side::Sell => "activeSellOrders",
        };
        let raw: Vec<RawOrder> = self
            .exchange
            .method::<_, Vec<RawOrder>>(method, ())?
            .from(owner)
            .call()
            .await?;
        raw.into_iter()
            .map(|(order_owner, price, size)| {
                Ok(ActiveOrder {
                    side,
                    price: to_u64(price, "order price")?,
                    raw_size: to_u64(size, "order size")?,
                    owner: order_owner,
                })
            })
            .collect()
    }

    async fn submit_order(&self, method: &str, raw_price: u64, raw_size: u64, index: usize) -> Result<TxHash> {
        let call = self.exchange.method::<_, ()>(
            method,
            (U256::from(raw_price), U256::from(raw_size), U256::from(index)),
        )?;
        let tx = send(call).await?;
        debug!(method, raw_price, raw_size, index, ?tx, "[ORDER] transaction sent");
        Ok(tx)
    }
}

impl ExchangeApi for EthersExchange {
    async fn price_volume_levels(&self) -> Result<BookSnapshot> {
        // mixed-case PVnode names are called through the ABI by name
        let (sell, buy): (Vec<RawLevel>, Vec<RawLevel>) = self
            .exchange
            .method::<_, (Vec<RawLevel>, Vec<RawLevel>)>("getPVobs", ())?
            .call()
            .await?;
        Ok(BookSnapshot {
            sell: decode_levels(sell)?,
            buy: decode_levels(buy)?,
        })
    }

    async fn active_buy_orders(&self, owner: Address) -> Result<Vec<ActiveOrder>> {
        self.active_orders(Side::Buy, owner).await
    }

    async fn active_sell_orders(&self, owner: Address) -> Result<Vec<ActiveOrder>> {
        self.active_orders(Side::Sell, owner).await
    }

    async fn oracle_price(&self) -> Result<i128> {
        let answer = self.oracle.latest_answer().call().await?;
        answer
            .to_string()
            .parse::<i128>()
            .map_err(|_| AppError::Overflow(format!("oracle answer {answer}")))
    }

    async fn allowance(&self, token: Token, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.token(token).get_allowance(owner, spender).call().await?)
    }

    async fn create_price_level(&self, raw_price: u64) -> Result<TxHash> {
        let call = self
            .exchange
            .method::<_, ()>("initPVnode", U256::from(raw_price))?;
        let tx = send(call).await?;
        debug!(raw_price, ?tx, "[ORDER] price level creation sent");
        Ok(tx)
    }

    async fn submit_buy_order(&self, raw_price: u64, raw_size: u64, index: usize) -> Result<TxHash> {
        self.submit_order("newBuyOrder", raw_price, raw_size, index).await
    }

    async fn submit_sell_order(&self, raw_price: u64, raw_size: u64, index: usize) -> Result<TxHash> {
        self.submit_order("newSellOrder", raw_price, raw_size, index).await
    }

    async fn approve_spender(&self, token: Token, spender: Address, amount: U256) -> Result<TxHash> {
        let tx = send(self.token(token).approve(spender, amount)).await?;
        debug!(?token, ?spender, ?tx, "[APPROVE] transaction sent");
        Ok(tx)
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxStatus> {
        let receipt = PendingTransaction::new(tx, self.client.provider())
            .confirmations(self.confirmations)
            .await?;
        match receipt {
            Some(receipt) if receipt.status == Some(U64::from(1)) => Ok(TxStatus::Success),
            Some(receipt) => {
                warn!(?tx, status = ?receipt.status, "transaction reverted");
                Ok(TxStatus::Failed)
            }
            None => {
                warn!(?tx, "transaction dropped from mempool");
                Ok(TxStatus::Failed)
            }
        }
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.client.provider().get_chainid().await?.as_u64())
    }

    fn wallet_address(&self) -> Option<Address> {
        Some(self.client.address())
    }
}

/// Broadcast a call; any failure before the node accepts it is a rejection.
async fn send<D: Detokenize>(call: ContractCall<SignerClient, D>) -> Result<TxHash> {
    let pending = call
        .send()
        .await
        .map_err(|e| AppError::TransactionRejected(e.to_string()))?;
    Ok(pending.tx_hash())
}

fn decode_levels(raw: Vec<RawLevel>) -> Result<Vec<PriceLevel>> {
    raw.into_iter()
        .map(|(price, volume)| {
            Ok(PriceLevel::new(
                to_u64(price, "level price")?,
                to_u64(volume, "level volume")?,
            ))
        })
        .collect()
}

fn to_u64(value: U256, what: &str) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(AppError::Overflow(format!("{what} {value} exceeds u64")));
    }
    Ok(value.as_u64())
}
