use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{Strategy, accrued_yield, require_asset};
use crate::contracts;
use crate::error::PortfolioError;
use crate::registry::roles;
use crate::types::{Call, Position, StrategyDescriptor};

sol! {
    /// Fluid fTokens expose the ERC-4626 deposit/withdraw surface.
    interface IFToken {
        function deposit(uint256 assets, address receiver) external returns (uint256 shares);
        function withdraw(uint256 assets, address receiver, address owner) external returns (uint256 shares);
    }
}

const FLUID_APY_BPS: u32 = 623;

pub struct FluidStrategy {
    descriptor: &'static StrategyDescriptor,
}

impl FluidStrategy {
    pub fn new(descriptor: &'static StrategyDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl Strategy for FluidStrategy {
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
        let f_token = self.descriptor.contract(roles::FUSDC)?;
        let deposit = IFToken::depositCall {
            assets: amount,
            receiver: user,
        };
        Ok(vec![
            contracts::approve(asset, f_token, amount),
            Call::contract(f_token, deposit.abi_encode()),
        ])
    }

    async fn redeem_calls(
        &self,
        amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        require_asset(asset, self.id())?;
        let f_token = self.descriptor.contract(roles::FUSDC)?;
        let withdraw = IFToken::withdrawCall {
            assets: amount,
            receiver: user,
            owner: user,
        };
        Ok(vec![Call::contract(f_token, withdraw.abi_encode())])
    }

    async fn profit_of(
        &self,
        _user: Address,
        position: &Position,
    ) -> Result<Decimal, PortfolioError> {
        Ok(accrued_yield(
            position.amount,
            FLUID_APY_BPS,
            position.created_at(),
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::tokens::USDC;
    use crate::types::{PositionStatus, StrategyId, chains};
    use chrono::Duration;

    const USER: Address = Address::repeat_byte(0xaa);

    fn strategy() -> FluidStrategy {
        FluidStrategy::new(registry::descriptor(StrategyId::FluidSupply, chains::BASE).unwrap())
    }

    #[tokio::test]
    async fn test_deposit_and_withdraw() {
        let s = strategy();
        let usdc = USDC.address_on(chains::BASE).unwrap();
        let f_token = s.descriptor().contract(roles::FUSDC).unwrap();

        let invest = s
            .invest_calls(U256::from(2_000_000u64), USER, Some(usdc))
            .await
            .unwrap();
        assert_eq!(invest.len(), 2);
        assert_eq!(invest[1].to, f_token);
        let deposit = IFToken::depositCall::abi_decode(invest[1].data.as_ref().unwrap()).unwrap();
        assert_eq!(deposit.receiver, USER);

        let redeem = s
            .redeem_calls(U256::from(2_000_000u64), USER, Some(usdc))
            .await
            .unwrap();
        let withdraw = IFToken::withdrawCall::abi_decode(redeem[0].data.as_ref().unwrap()).unwrap();
        assert_eq!(withdraw.assets, U256::from(2_000_000u64));
        assert_eq!(withdraw.owner, USER);
    }

    #[tokio::test]
    async fn test_redeem_requires_asset() {
        let err = strategy()
            .redeem_calls(U256::from(1u64), USER, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::MissingAsset { .. }));
    }

    #[tokio::test]
    async fn test_profit_accrues_daily() {
        let position = Position {
            id: "p-9".into(),
            user: None,
            chain_id: chains::BASE,
            strategy: "FluidSupply".into(),
            token_name: "USDC".into(),
            amount: Decimal::new(365, 0),
            status: PositionStatus::Open,
            created_at: Some((Utc::now() - Duration::days(10) + Duration::minutes(1)).to_rfc3339()),
        };
        let profit = strategy().profit_of(USER, &position).await.unwrap();
        // 365 * 6.23% / 365 * 10 days
        assert_eq!(profit.round_dp(4), Decimal::new(623, 3));
    }
}
