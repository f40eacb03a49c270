//! Signing wallet seam and a smart-account implementation.
//!
//! The wallet has one active chain at a time. Each wallet owns a submission
//! lock; [`SigningWallet::submit_batch`] holds it across `switch_chain` and
//! `send_batch`, so every caller sharing the wallet is serialized.

use std::collections::HashMap;
use std::sync::RwLock;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::{Address, TxHash};
use alloy::providers::fillers::{
    BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy::providers::{Identity, Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::contracts;
use crate::error::PortfolioError;
use crate::types::{Call, ChainId};

/// The concrete provider type produced by `ProviderBuilder::new().wallet(...).connect_http(...)`.
pub type HttpProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
    Ethereum,
>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    pub show_wallet_ui: bool,
}

impl BatchOptions {
    /// No confirmation prompts.
    pub fn silent() -> Self {
        Self {
            show_wallet_ui: false,
        }
    }
}

#[async_trait]
pub trait SigningWallet: Send + Sync {
    /// Account that owns the invested funds.
    fn address(&self) -> Address;

    /// Guards the active chain between a switch and the send that relies on it.
    fn submission_lock(&self) -> &Mutex<()>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), PortfolioError>;

    /// Submit `calls` as one atomic batch on the active chain.
    async fn send_batch(
        &self,
        calls: &[Call],
        options: BatchOptions,
    ) -> Result<TxHash, PortfolioError>;

    /// Switch to `chain_id` and send `calls` under the submission lock.
    async fn submit_batch(
        &self,
        chain_id: ChainId,
        calls: &[Call],
        options: BatchOptions,
    ) -> Result<TxHash, PortfolioError> {
        let _guard = self.submission_lock().lock().await;
        self.switch_chain(chain_id).await?;
        self.send_batch(calls, options).await
    }
}

/// Owner EOA driving a smart account's `executeBatch`.
pub struct SmartAccountWallet {
    account: Address,
    owner: Address,
    providers: HashMap<ChainId, HttpProvider>,
    active_chain: RwLock<Option<ChainId>>,
    submission: Mutex<()>,
}

impl SmartAccountWallet {
    /// * `account`: smart account address holding the funds
    /// * `private_key`: hex-encoded owner key (with or without "0x")
    /// * `rpc_urls`: one endpoint per chain the wallet may switch to
    pub fn new<'a>(
        account: Address,
        private_key: &str,
        rpc_urls: impl IntoIterator<Item = (ChainId, &'a str)>,
    ) -> Result<Self, PortfolioError> {
        let signer: PrivateKeySigner = private_key
            .parse()
            .map_err(|e| PortfolioError::ConfigError(format!("Invalid private key: {e}")))?;
        let owner = signer.address();
        let wallet = EthereumWallet::from(signer);

        let mut providers = HashMap::new();
        for (chain_id, rpc_url) in rpc_urls {
            let url: url::Url = rpc_url.parse().map_err(|e| {
                PortfolioError::ConfigError(format!("Invalid RPC URL for chain {chain_id}: {e}"))
            })?;
            let provider = ProviderBuilder::new()
                .wallet(wallet.clone())
                .connect_http(url);
            providers.insert(chain_id, provider);
        }

        Ok(Self {
            account,
            owner,
            providers,
            active_chain: RwLock::new(None),
            submission: Mutex::new(()),
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn active_chain(&self) -> Option<ChainId> {
        self.active_chain.read().ok().and_then(|chain| *chain)
    }
}

#[async_trait]
impl SigningWallet for SmartAccountWallet {
    fn address(&self) -> Address {
        self.account
    }

    fn submission_lock(&self) -> &Mutex<()> {
        &self.submission
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), PortfolioError> {
        if !self.providers.contains_key(&chain_id) {
            return Err(PortfolioError::UnsupportedChain(chain_id));
        }
        let mut active = self
            .active_chain
            .write()
            .map_err(|_| PortfolioError::Wallet("active chain lock poisoned".into()))?;
        *active = Some(chain_id);
        Ok(())
    }

    async fn send_batch(
        &self,
        calls: &[Call],
        options: BatchOptions,
    ) -> Result<TxHash, PortfolioError> {
        let chain_id = self
            .active_chain()
            .ok_or_else(|| PortfolioError::Wallet("no active chain selected".into()))?;
        let provider = self
            .providers
            .get(&chain_id)
            .ok_or(PortfolioError::UnsupportedChain(chain_id))?;
        if options.show_wallet_ui {
            debug!("Local signer has no wallet UI, ignoring prompt option");
        }

        let tx = TransactionRequest::default()
            .to(self.account)
            .input(contracts::encode_execute_batch(calls).into());
        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| PortfolioError::Wallet(format!("Transaction send failed: {e}")))?;
        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat account #0
    const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> SmartAccountWallet {
        SmartAccountWallet::new(
            Address::repeat_byte(0x5a),
            PRIVATE_KEY,
            [(42161, "http://localhost:8545"), (8453, "http://localhost:8546")],
        )
        .unwrap()
    }

    #[test]
    fn test_wallet_creation() {
        let w = wallet();
        assert_eq!(w.address(), Address::repeat_byte(0x5a));
        assert_eq!(
            w.owner(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
        assert_eq!(w.active_chain(), None);
    }

    #[test]
    fn test_invalid_private_key() {
        let result = SmartAccountWallet::new(Address::ZERO, "not-a-key", [(1, "http://localhost:8545")]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_switch_chain() {
        let w = wallet();
        w.switch_chain(8453).await.unwrap();
        assert_eq!(w.active_chain(), Some(8453));
        assert!(matches!(
            w.switch_chain(56).await,
            Err(PortfolioError::UnsupportedChain(56))
        ));
        assert_eq!(w.active_chain(), Some(8453));
    }

    #[tokio::test]
    async fn test_submit_batch_rejects_unknown_chain_under_lock() {
        let w = wallet();
        let err = w
            .submit_batch(56, &[], BatchOptions::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::UnsupportedChain(56)));
        assert!(w.submission_lock().try_lock().is_ok());
        assert_eq!(w.active_chain(), None);
    }

    #[tokio::test]
    async fn test_send_without_active_chain() {
        let err = wallet().send_batch(&[], BatchOptions::silent()).await.unwrap_err();
        assert!(matches!(err, PortfolioError::Wallet(_)));
    }
}
