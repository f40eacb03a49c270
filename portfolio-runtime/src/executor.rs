//! Batched transaction submission: switch chain, send, wait for the receipt.

use std::sync::Arc;

use tracing::{info, warn};

use crate::chain::ChainReader;
use crate::error::PortfolioError;
use crate::types::{Call, ChainId};
use crate::wallet::{BatchOptions, SigningWallet};

/// Outcome of a successfully mined batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Submits call lists as one atomic batch through the signing wallet.
pub struct TransactionExecutor {
    wallet: Arc<dyn SigningWallet>,
    chain: Arc<dyn ChainReader>,
}

impl TransactionExecutor {
    pub fn new(wallet: Arc<dyn SigningWallet>, chain: Arc<dyn ChainReader>) -> Self {
        Self { wallet, chain }
    }

    pub fn wallet(&self) -> &Arc<dyn SigningWallet> {
        &self.wallet
    }

    /// Execute `calls` on `chain_id`.
    ///
    /// Flow:
    /// 1. Under the wallet's submission lock, switch to `chain_id` and send
    ///    every call as one batch with prompts suppressed
    /// 2. Wait for the mined receipt
    /// 3. Map a failed status to `ExecutionReverted`
    pub async fn execute(
        &self,
        calls: &[Call],
        chain_id: ChainId,
    ) -> Result<TransactionOutcome, PortfolioError> {
        if calls.is_empty() {
            return Err(PortfolioError::NoCalls);
        }

        let handle = self
            .wallet
            .submit_batch(chain_id, calls, BatchOptions::silent())
            .await?;
        info!(chain_id, calls = calls.len(), handle = %handle, "Batch submitted");

        let receipt = self.chain.wait_for_receipt(chain_id, handle).await?;
        if !receipt.success {
            warn!(chain_id, tx_hash = %receipt.tx_hash, "Batch reverted");
            return Err(PortfolioError::ExecutionReverted {
                tx_hash: receipt.tx_hash,
            });
        }

        info!(chain_id, tx_hash = %receipt.tx_hash, block = ?receipt.block_number, "Batch confirmed");
        Ok(TransactionOutcome {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }
}
