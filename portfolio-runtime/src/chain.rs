//! Read-only chain access: contract calls and receipt polling.
//!
//! Strategies read on-chain state (balances, market params) through
//! [`ChainReader`] while composing calls; the executor waits on receipts
//! through the same seam.

use std::collections::HashMap;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{PendingTransactionBuilder, Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use crate::error::PortfolioError;
use crate::types::ChainId;

/// Minimal view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: String,
    pub success: bool,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` against `to` on `chain_id`, returning raw return data.
    async fn call(
        &self,
        chain_id: ChainId,
        to: Address,
        calldata: Bytes,
    ) -> Result<Bytes, PortfolioError>;

    /// Block until the transaction identified by `handle` is mined.
    async fn wait_for_receipt(
        &self,
        chain_id: ChainId,
        handle: TxHash,
    ) -> Result<ReceiptSummary, PortfolioError>;
}

/// Typed read: encode `call`, run it, decode the return.
pub async fn read<C>(
    reader: &dyn ChainReader,
    chain_id: ChainId,
    to: Address,
    call: C,
) -> Result<C::Return, PortfolioError>
where
    C: SolCall + Send,
{
    let out = reader
        .call(chain_id, to, Bytes::from(call.abi_encode()))
        .await?;
    C::abi_decode_returns(&out)
        .map_err(|e| PortfolioError::ChainRead(format!("{} on {to}: {e}", C::SIGNATURE)))
}

/// JSON-RPC backed reader, one provider per configured chain.
pub struct ChainClient {
    providers: HashMap<ChainId, RootProvider>,
}

impl ChainClient {
    pub fn new<'a>(
        rpc_urls: impl IntoIterator<Item = (ChainId, &'a str)>,
    ) -> Result<Self, PortfolioError> {
        let mut providers = HashMap::new();
        for (chain_id, rpc_url) in rpc_urls {
            let url: url::Url = rpc_url.parse().map_err(|e| {
                PortfolioError::ConfigError(format!("Invalid RPC URL for chain {chain_id}: {e}"))
            })?;
            providers.insert(chain_id, RootProvider::new_http(url));
        }
        Ok(Self { providers })
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.providers.keys().copied()
    }

    fn provider(&self, chain_id: ChainId) -> Result<&RootProvider, PortfolioError> {
        self.providers
            .get(&chain_id)
            .ok_or(PortfolioError::UnsupportedChain(chain_id))
    }
}

#[async_trait]
impl ChainReader for ChainClient {
    async fn call(
        &self,
        chain_id: ChainId,
        to: Address,
        calldata: Bytes,
    ) -> Result<Bytes, PortfolioError> {
        let tx = TransactionRequest::default().to(to).input(calldata.into());
        self.provider(chain_id)?
            .call(tx)
            .await
            .map_err(|e| PortfolioError::ChainRead(format!("eth_call to {to} failed: {e}")))
    }

    async fn wait_for_receipt(
        &self,
        chain_id: ChainId,
        handle: TxHash,
    ) -> Result<ReceiptSummary, PortfolioError> {
        let provider = self.provider(chain_id)?.clone();
        let receipt = PendingTransactionBuilder::new(provider, handle)
            .get_receipt()
            .await
            .map_err(|e| PortfolioError::ReceiptUnavailable {
                handle: handle.to_string(),
                message: e.to_string(),
            })?;

        Ok(ReceiptSummary {
            tx_hash: format!("0x{}", hex::encode(receipt.transaction_hash.as_slice())),
            success: receipt.status(),
            block_number: receipt.block_number,
        })
    }
}
