//! Orchestration facade: plan → compose → fee → execute → reconcile.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rand::Rng;
use tracing::{info, warn};

use crate::chain::{ChainClient, ChainReader};
use crate::composer::{self, StrategyLeg};
use crate::config::EngineConfig;
use crate::error::PortfolioError;
use crate::executor::{TransactionExecutor, TransactionOutcome};
use crate::fees::{FeeEngine, FeeSplit};
use crate::ledger::{LedgerClient, PositionLedger};
use crate::planner;
use crate::registry;
use crate::strategies::{StrategyProvider, StrategyRegistry};
use crate::sync::{LegInvestment, PositionLedgerSync, SyncReport};
use crate::types::{
    AllocationLeg, ChainId, ExecutionRequest, RiskTier, StrategyId, Token, TransactionRecord,
    to_human,
};
use crate::wallet::{SigningWallet, SmartAccountWallet};

/// Result of a mined investment or redemption.
#[derive(Debug)]
pub struct ExecutionReceipt {
    pub outcome: TransactionOutcome,
    pub fee: FeeSplit,
    pub sync: SyncReport,
}

impl ExecutionReceipt {
    pub fn tx_hash(&self) -> &str {
        &self.outcome.tx_hash
    }
}

/// A single-position withdrawal.
#[derive(Debug, Clone)]
pub struct RedeemRequest {
    pub user: Address,
    pub chain_id: ChainId,
    pub strategy: StrategyId,
    /// Amount in the token's smallest unit, before fees
    pub gross_amount: U256,
    pub token: Token,
    /// Ledger position closed once the withdrawal is mined
    pub position_id: String,
}

pub struct PortfolioEngine {
    strategies: Arc<dyn StrategyProvider>,
    fees: FeeEngine,
    executor: TransactionExecutor,
    sync: PositionLedgerSync,
}

impl PortfolioEngine {
    pub fn new(
        strategies: Arc<dyn StrategyProvider>,
        fees: FeeEngine,
        executor: TransactionExecutor,
        sync: PositionLedgerSync,
    ) -> Self {
        Self {
            strategies,
            fees,
            executor,
            sync,
        }
    }

    /// Wire the production collaborators from configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, PortfolioError> {
        let rpc_urls = || config.rpc_urls.iter().map(|(id, url)| (*id, url.as_str()));

        let chain: Arc<dyn ChainReader> = Arc::new(ChainClient::new(rpc_urls())?);
        let account = config.smart_account.ok_or_else(|| {
            PortfolioError::ConfigError("SMART_ACCOUNT_ADDRESS not set".into())
        })?;
        let owner_key = config
            .owner_private_key
            .as_deref()
            .ok_or_else(|| PortfolioError::ConfigError("OWNER_PRIVATE_KEY not set".into()))?;
        let wallet: Arc<dyn SigningWallet> =
            Arc::new(SmartAccountWallet::new(account, owner_key, rpc_urls())?);
        let ledger: Arc<dyn PositionLedger> = Arc::new(
            LedgerClient::new(config.ledger_api_url.clone()).with_timeout(config.ledger_timeout),
        );

        Ok(Self::new(
            Arc::new(StrategyRegistry::new(chain.clone())),
            FeeEngine::new(config.fee_receiver, config.fee_rate_per_mille),
            TransactionExecutor::new(wallet, chain),
            PositionLedgerSync::new(ledger),
        ))
    }

    pub fn fees(&self) -> &FeeEngine {
        &self.fees
    }

    pub fn ledger(&self) -> &PositionLedgerSync {
        &self.sync
    }

    /// Allocation for one risk tier on `chain_id`.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        chain_id: ChainId,
        tier: RiskTier,
        rng: &mut R,
    ) -> Result<Vec<AllocationLeg>, PortfolioError> {
        planner::plan(chain_id, tier, rng)
    }

    /// Put the whole net amount into one strategy.
    pub async fn invest(
        &self,
        user: Address,
        chain_id: ChainId,
        strategy: StrategyId,
        gross_amount: U256,
        token: Token,
    ) -> Result<ExecutionReceipt, PortfolioError> {
        let descriptor = registry::require_descriptor(strategy, chain_id)?;
        self.multi_invest(&ExecutionRequest {
            user,
            chain_id,
            gross_amount,
            token,
            legs: vec![AllocationLeg {
                strategy: descriptor,
                allocation: 100,
            }],
        })
        .await
    }

    /// Split the net amount across `request.legs` in one batch.
    pub async fn multi_invest(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionReceipt, PortfolioError> {
        let chain_id = request.chain_id;
        composer::validate_allocation(&request.legs)?;
        let asset = request.token.asset_on(chain_id)?;
        let legs = composer::resolve_legs(&request.legs, chain_id, self.strategies.as_ref())?;
        let fee = self.fees.split(request.gross_amount);

        let mut calls =
            composer::compose_invest_calls(&legs, fee.net, request.user, asset).await?;
        self.fees.append_fee(&mut calls, asset, fee.fee);

        info!(
            chain_id,
            legs = legs.len(),
            calls = calls.len(),
            net = %fee.net,
            fee = %fee.fee,
            "Executing investment"
        );
        let outcome = self.executor.execute(&calls, chain_id).await?;

        let investments = leg_investments(&legs, fee.net);
        let sync = self
            .sync
            .reconcile(
                &outcome.tx_hash,
                request.user,
                chain_id,
                &request.token,
                &investments,
            )
            .await;

        Ok(ExecutionReceipt { outcome, fee, sync })
    }

    /// Withdraw from one strategy, then close its ledger position.
    pub async fn redeem(&self, request: &RedeemRequest) -> Result<ExecutionReceipt, PortfolioError> {
        let chain_id = request.chain_id;
        let asset = request.token.asset_on(chain_id)?;
        let legs = vec![StrategyLeg {
            strategy: self.strategies.strategy(request.strategy, chain_id)?,
            allocation: 100,
        }];
        let fee = self.fees.split(request.gross_amount);

        let mut calls =
            composer::compose_redeem_calls(&legs, fee.net, request.user, asset).await?;
        self.fees.append_fee(&mut calls, asset, fee.fee);

        info!(chain_id, strategy = %request.strategy, calls = calls.len(), "Executing redemption");
        let outcome = self.executor.execute(&calls, chain_id).await?;

        let sync = self.close_and_record(request, &outcome.tx_hash, fee.net).await;
        Ok(ExecutionReceipt { outcome, fee, sync })
    }

    /// Close the position and append the audit record. The two writes are
    /// attempted independently; each failure becomes its own warning.
    async fn close_and_record(
        &self,
        request: &RedeemRequest,
        tx_hash: &str,
        net: U256,
    ) -> SyncReport {
        let mut sync = SyncReport::default();
        let mut failures = Vec::new();

        if let Err(e) = self.sync.close_position(&request.position_id).await {
            warn!(position_id = %request.position_id, tx_hash, error = %e, "Closing position after redeem failed");
            failures.push(e);
        }

        let record = to_human(net, request.token.decimals).map(|amount| TransactionRecord {
            address: request.user.to_string(),
            chain_id: request.chain_id,
            strategy: request.strategy.to_string(),
            hash: tx_hash.to_string(),
            amount,
            token_name: request.token.name.to_string(),
        });
        let recorded = match record {
            Ok(record) => self.sync.record(&record).await,
            Err(e) => Err(e),
        };
        if let Err(e) = recorded {
            warn!(strategy = %request.strategy, tx_hash, error = %e, "Recording redeem transaction failed");
            failures.push(e);
        }

        if failures.is_empty() {
            sync.synced.push(request.strategy);
        }
        sync.warnings = failures
            .into_iter()
            .map(|e| PortfolioError::LedgerSyncFailure {
                strategy: request.strategy.to_string(),
                message: e.to_string(),
            })
            .collect();
        sync
    }
}

fn leg_investments(legs: &[StrategyLeg], net: U256) -> Vec<LegInvestment> {
    legs.iter()
        .map(|leg| LegInvestment {
            strategy: leg.strategy.id(),
            amount: composer::leg_amount(net, leg.allocation),
        })
        .filter(|leg| !leg.amount.is_zero())
        .collect()
}
