pub mod aave_v3;
pub mod fluid;
pub mod morpho;
pub mod uniswap_v3;
pub mod uniswap_v3_liquidity;

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::chain::ChainReader;
use crate::error::PortfolioError;
use crate::registry;
use crate::tokens;
use crate::types::{Call, ChainId, Position, StrategyDescriptor, StrategyId, Token};

use aave_v3::AaveV3Strategy;
use fluid::FluidStrategy;
use morpho::MorphoStrategy;
use uniswap_v3::UniswapV3SwapLstStrategy;
use uniswap_v3_liquidity::UniswapV3LiquidityStrategy;

/// Builds protocol calls for one strategy on one chain.
///
/// Implementations may read chain state while composing; any read failure
/// aborts the whole composition.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn descriptor(&self) -> &'static StrategyDescriptor;

    fn id(&self) -> StrategyId {
        self.descriptor().id
    }

    fn chain_id(&self) -> ChainId {
        self.descriptor().chain_id
    }

    /// Calls that move `amount` of `asset` (None = native) from `user` into the protocol.
    async fn invest_calls(
        &self,
        amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError>;

    /// Calls that exit the protocol back to `user`.
    async fn redeem_calls(
        &self,
        amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError>;

    /// Unrealized profit on `position`, in the position's token units.
    async fn profit_of(&self, user: Address, position: &Position)
    -> Result<Decimal, PortfolioError>;
}

pub type StrategyHandle = Arc<dyn Strategy>;

/// Resolves strategy ids to call builders for a chain.
pub trait StrategyProvider: Send + Sync {
    fn strategy(&self, id: StrategyId, chain_id: ChainId)
    -> Result<StrategyHandle, PortfolioError>;
}

/// Registry-backed provider sharing one chain reader.
pub struct StrategyRegistry {
    reader: Arc<dyn ChainReader>,
}

impl StrategyRegistry {
    pub fn new(reader: Arc<dyn ChainReader>) -> Self {
        Self { reader }
    }
}

impl StrategyProvider for StrategyRegistry {
    fn strategy(
        &self,
        id: StrategyId,
        chain_id: ChainId,
    ) -> Result<StrategyHandle, PortfolioError> {
        build_strategy(id, chain_id, self.reader.clone())
    }
}

/// Registry: map `(id, chain)` → strategy instance.
pub fn build_strategy(
    id: StrategyId,
    chain_id: ChainId,
    reader: Arc<dyn ChainReader>,
) -> Result<StrategyHandle, PortfolioError> {
    let descriptor = registry::require_descriptor(id, chain_id)?;
    let strategy: StrategyHandle = match id {
        StrategyId::AaveV3Supply => Arc::new(AaveV3Strategy::new(descriptor, reader)),
        StrategyId::MorphoSupply => Arc::new(MorphoStrategy::new(descriptor, reader)),
        StrategyId::FluidSupply => Arc::new(FluidStrategy::new(descriptor)),
        StrategyId::UniswapV3SwapLST => Arc::new(UniswapV3SwapLstStrategy::new(descriptor, reader)),
        StrategyId::UniswapV3AddLiquidity => {
            Arc::new(UniswapV3LiquidityStrategy::new(descriptor, reader))
        }
    };
    Ok(strategy)
}

pub(crate) fn require_asset(
    asset: Option<Address>,
    id: StrategyId,
) -> Result<Address, PortfolioError> {
    asset.ok_or_else(|| PortfolioError::MissingAsset {
        strategy: id.to_string(),
    })
}

/// Token a ledger position is denominated in. Falls back to the strategy's
/// first supported token when the row carries no name.
pub(crate) fn position_token(
    descriptor: &StrategyDescriptor,
    position: &Position,
) -> Result<Token, PortfolioError> {
    if position.token_name.is_empty() {
        return descriptor.tokens.first().copied().ok_or_else(|| {
            PortfolioError::ConfigError(format!("{} lists no tokens", descriptor.id))
        });
    }
    tokens::token_by_name(&position.token_name)
}

/// Simple-interest accrual: `amount * apy / 365 * days`, where `days` is the
/// number of started days since the position was opened.
pub(crate) fn accrued_yield(
    amount: Decimal,
    apy_bps: u32,
    opened_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Decimal {
    let Some(opened_at) = opened_at else {
        return Decimal::ZERO;
    };
    let elapsed = (now - opened_at).num_seconds().unsigned_abs();
    let days = elapsed.div_ceil(86_400);
    amount * Decimal::new(i64::from(apy_bps), 4) / Decimal::from(365) * Decimal::from(days)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chains;
    use chrono::Duration;

    fn reader() -> Arc<dyn ChainReader> {
        Arc::new(testing::ScriptedReader::default())
    }

    #[test]
    fn test_build_strategy_known() {
        for d in registry::descriptors() {
            let strategy = build_strategy(d.id, d.chain_id, reader()).unwrap();
            assert_eq!(strategy.id(), d.id);
            assert_eq!(strategy.chain_id(), d.chain_id);
        }
    }

    #[test]
    fn test_build_strategy_unavailable() {
        assert!(matches!(
            build_strategy(StrategyId::FluidSupply, chains::ARBITRUM, reader()),
            Err(PortfolioError::StrategyUnavailable { .. })
        ));
    }

    #[test]
    fn test_accrued_yield() {
        let now = Utc::now();
        let opened = now - Duration::days(365);
        let profit = accrued_yield(Decimal::new(1000, 0), 450, Some(opened), now);
        assert_eq!(profit.round_dp(6), Decimal::new(45, 0));

        // A partial day counts as a full one.
        let opened = now - Duration::hours(1);
        let one_day = accrued_yield(Decimal::new(365, 0), 1000, Some(opened), now);
        assert_eq!(one_day.round_dp(6), Decimal::new(1, 1));

        assert_eq!(
            accrued_yield(Decimal::new(1000, 0), 450, None, now),
            Decimal::ZERO
        );
    }
}
