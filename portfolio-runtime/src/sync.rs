//! Post-execution ledger reconciliation.
//!
//! Runs after a batch is mined. Each leg is reconciled in order: accumulate
//! into the open position for `(user, chain, strategy)` or create one, then
//! append a transaction record. Legs with a zero amount are skipped. Failures never abort the remaining legs;
//! they come back as warnings in the [`SyncReport`].
//!
//! Find-or-create is not atomic against the remote store. Two concurrent
//! syncs for the same strategy can both miss and both create.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::PortfolioError;
use crate::ledger::{NewPosition, PositionLedger, PositionUpdate};
use crate::types::{ChainId, StrategyId, Token, TransactionRecord, to_human};

/// One leg's invested amount, in the token's smallest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegInvestment {
    pub strategy: StrategyId,
    pub amount: U256,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    /// Strategies whose position and record were both written.
    pub synced: Vec<StrategyId>,
    pub warnings: Vec<PortfolioError>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Clone)]
pub struct PositionLedgerSync {
    ledger: Arc<dyn PositionLedger>,
}

impl PositionLedgerSync {
    pub fn new(ledger: Arc<dyn PositionLedger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<dyn PositionLedger> {
        &self.ledger
    }

    /// Reconcile every leg of a mined investment sharing `tx_hash`.
    pub async fn reconcile(
        &self,
        tx_hash: &str,
        user: Address,
        chain_id: ChainId,
        token: &Token,
        legs: &[LegInvestment],
    ) -> SyncReport {
        let mut report = SyncReport::default();
        let address = user.to_string();
        for leg in legs {
            if leg.amount.is_zero() {
                continue;
            }
            match self
                .sync_leg(tx_hash, &address, chain_id, token, leg)
                .await
            {
                Ok(()) => report.synced.push(leg.strategy),
                Err(e) => {
                    warn!(
                        strategy = %leg.strategy,
                        chain_id,
                        tx_hash,
                        error = %e,
                        "Ledger sync failed"
                    );
                    report.warnings.push(PortfolioError::LedgerSyncFailure {
                        strategy: leg.strategy.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
        info!(tx_hash, synced = report.synced.len(), warnings = report.warnings.len(), "Ledger reconciled");
        report
    }

    async fn sync_leg(
        &self,
        tx_hash: &str,
        address: &str,
        chain_id: ChainId,
        token: &Token,
        leg: &LegInvestment,
    ) -> Result<(), PortfolioError> {
        let amount = to_human(leg.amount, token.decimals)?;
        self.upsert_position(address, chain_id, leg.strategy, token.name, amount)
            .await?;
        self.ledger
            .record_transaction(&TransactionRecord {
                address: address.to_string(),
                chain_id,
                strategy: leg.strategy.to_string(),
                hash: tx_hash.to_string(),
                amount,
                token_name: token.name.to_string(),
            })
            .await
    }

    /// Add `amount` to the open position for `(address, chain_id, strategy)`,
    /// or create it. A failed lookup falls through to creation.
    pub async fn upsert_position(
        &self,
        address: &str,
        chain_id: ChainId,
        strategy: StrategyId,
        token_name: &str,
        amount: Decimal,
    ) -> Result<(), PortfolioError> {
        let existing = match self.ledger.get_positions(address).await {
            Ok(positions) => positions.into_iter().find(|p| {
                p.strategy == strategy.as_str() && p.chain_id == chain_id && p.is_open()
            }),
            Err(e) => {
                warn!(address, error = %e, "Position lookup failed, creating new position");
                None
            }
        };

        match existing {
            Some(position) => {
                self.ledger
                    .update_position(&position.id, &PositionUpdate::amount(position.amount + amount))
                    .await
            }
            None => {
                self.ledger
                    .create_position(&NewPosition {
                        address: address.to_string(),
                        amount,
                        token_name: token_name.to_string(),
                        chain_id,
                        strategy: strategy.to_string(),
                    })
                    .await
            }
        }
    }

    pub async fn close_position(&self, position_id: &str) -> Result<(), PortfolioError> {
        self.ledger
            .update_position(position_id, &PositionUpdate::close())
            .await
    }

    pub async fn record(&self, record: &TransactionRecord) -> Result<(), PortfolioError> {
        self.ledger.record_transaction(record).await
    }
}
