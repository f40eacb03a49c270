use std::sync::Arc;

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{Strategy, position_token, require_asset};
use crate::chain::{self, ChainReader};
use crate::contracts;
use crate::error::PortfolioError;
use crate::registry::roles;
use crate::types::{Call, Position, StrategyDescriptor, to_human};

sol! {
    interface IPool {
        function supply(address asset, uint256 amount, address onBehalfOf, uint16 referralCode) external;
        function withdraw(address asset, uint256 amount, address to) external returns (uint256);
        function getReserveAToken(address asset) external view returns (address);
    }
}

/// Supply into an Aave V3 pool; redeem withdraws the full aToken balance.
pub struct AaveV3Strategy {
    descriptor: &'static StrategyDescriptor,
    reader: Arc<dyn ChainReader>,
}

impl AaveV3Strategy {
    pub fn new(descriptor: &'static StrategyDescriptor, reader: Arc<dyn ChainReader>) -> Self {
        Self { descriptor, reader }
    }

    fn pool(&self) -> Result<Address, PortfolioError> {
        self.descriptor.contract(roles::POOL)
    }

    async fn a_token_balance(&self, asset: Address, user: Address) -> Result<U256, PortfolioError> {
        let chain_id = self.descriptor.chain_id;
        let a_token = chain::read(
            self.reader.as_ref(),
            chain_id,
            self.pool()?,
            IPool::getReserveATokenCall { asset },
        )
        .await?;
        chain::read(
            self.reader.as_ref(),
            chain_id,
            a_token,
            contracts::balance_of(user),
        )
        .await
    }
}

#[async_trait]
impl Strategy for AaveV3Strategy {
    fn descriptor(&self) -> &'static StrategyDescriptor {
        self.descriptor
    }

    async fn invest_calls(
        &self,
        amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        let asset = require_asset(asset, self.id())?;
        let pool = self.pool()?;
        let supply = IPool::supplyCall {
            asset,
            amount,
            onBehalfOf: user,
            referralCode: 0,
        };
        Ok(vec![
            contracts::approve(asset, pool, amount),
            Call::contract(pool, supply.abi_encode()),
        ])
    }

    /// Withdraws the whole aToken balance regardless of `amount`.
    async fn redeem_calls(
        &self,
        _amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        let asset = require_asset(asset, self.id())?;
        let balance = self.a_token_balance(asset, user).await?;
        if balance.is_zero() {
            return Err(PortfolioError::InsufficientLiquidity(format!(
                "no aToken balance for {user} on chain {}",
                self.chain_id()
            )));
        }
        let withdraw = IPool::withdrawCall {
            asset,
            amount: balance,
            to: user,
        };
        Ok(vec![Call::contract(self.pool()?, withdraw.abi_encode())])
    }

    /// aToken balance minus the principal recorded in the ledger.
    async fn profit_of(
        &self,
        user: Address,
        position: &Position,
    ) -> Result<Decimal, PortfolioError> {
        let token = position_token(self.descriptor, position)?;
        let asset = require_asset(token.asset_on(self.chain_id())?, self.id())?;
        let balance = self.a_token_balance(asset, user).await?;
        Ok(to_human(balance, token.decimals)? - position.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IERC20;
    use crate::registry;
    use crate::strategies::testing::{ScriptedReader, address_word, word};
    use crate::tokens::USDC;
    use crate::types::{PositionStatus, StrategyId, chains};

    const USER: Address = Address::repeat_byte(0xaa);
    const A_TOKEN: Address = Address::repeat_byte(0xbb);

    fn descriptor() -> &'static StrategyDescriptor {
        registry::descriptor(StrategyId::AaveV3Supply, chains::ARBITRUM).unwrap()
    }

    fn usdc() -> Address {
        USDC.address_on(chains::ARBITRUM).unwrap()
    }

    fn reader_with_balance(balance: u64) -> ScriptedReader {
        let pool = descriptor().contract(roles::POOL).unwrap();
        ScriptedReader::default()
            .respond(
                pool,
                IPool::getReserveATokenCall::SELECTOR,
                address_word(A_TOKEN),
            )
            .respond(A_TOKEN, IERC20::balanceOfCall::SELECTOR, word(balance))
    }

    #[tokio::test]
    async fn test_invest_approves_then_supplies() {
        let strategy = AaveV3Strategy::new(descriptor(), Arc::new(ScriptedReader::default()));
        let calls = strategy
            .invest_calls(U256::from(300_000_000u64), USER, Some(usdc()))
            .await
            .unwrap();

        assert_eq!(calls.len(), 2);
        let pool = descriptor().contract(roles::POOL).unwrap();
        assert_eq!(calls[0].to, usdc());
        assert_eq!(calls[1].to, pool);

        let supply = IPool::supplyCall::abi_decode(calls[1].data.as_ref().unwrap()).unwrap();
        assert_eq!(supply.asset, usdc());
        assert_eq!(supply.amount, U256::from(300_000_000u64));
        assert_eq!(supply.onBehalfOf, USER);
    }

    #[tokio::test]
    async fn test_invest_requires_asset() {
        let strategy = AaveV3Strategy::new(descriptor(), Arc::new(ScriptedReader::default()));
        let err = strategy
            .invest_calls(U256::from(1u64), USER, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::MissingAsset { .. }));
    }

    #[tokio::test]
    async fn test_redeem_withdraws_full_balance() {
        let strategy = AaveV3Strategy::new(descriptor(), Arc::new(reader_with_balance(1_234_567)));
        let calls = strategy
            .redeem_calls(U256::from(1u64), USER, Some(usdc()))
            .await
            .unwrap();

        assert_eq!(calls.len(), 1);
        let withdraw = IPool::withdrawCall::abi_decode(calls[0].data.as_ref().unwrap()).unwrap();
        assert_eq!(withdraw.amount, U256::from(1_234_567u64));
        assert_eq!(withdraw.to, USER);
    }

    #[tokio::test]
    async fn test_redeem_empty_balance() {
        let strategy = AaveV3Strategy::new(descriptor(), Arc::new(reader_with_balance(0)));
        let err = strategy
            .redeem_calls(U256::ZERO, USER, Some(usdc()))
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientLiquidity(_)));
    }

    #[tokio::test]
    async fn test_profit_is_balance_minus_principal() {
        let strategy = AaveV3Strategy::new(descriptor(), Arc::new(reader_with_balance(105_500_000)));
        let position = Position {
            id: "p-1".into(),
            user: None,
            chain_id: chains::ARBITRUM,
            strategy: "AaveV3Supply".into(),
            token_name: "USDC".into(),
            amount: Decimal::new(100, 0),
            status: PositionStatus::Open,
            created_at: None,
        };
        let profit = strategy.profit_of(USER, &position).await.unwrap();
        assert_eq!(profit, Decimal::new(55, 1));
    }
}
