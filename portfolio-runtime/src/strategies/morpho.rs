use std::sync::Arc;

use alloy::primitives::{Address, B256, Bytes, U256, b256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{Strategy, accrued_yield, require_asset};
use crate::chain::{self, ChainReader};
use crate::contracts;
use crate::error::PortfolioError;
use crate::registry::roles;
use crate::types::{Call, Position, StrategyDescriptor};

sol! {
    interface IMorpho {
        struct MarketParams {
            address loanToken;
            address collateralToken;
            address oracle;
            address irm;
            uint256 lltv;
        }

        function supply(MarketParams memory marketParams, uint256 assets, uint256 shares, address onBehalf, bytes memory data) external returns (uint256 assetsSupplied, uint256 sharesSupplied);
        function withdraw(MarketParams memory marketParams, uint256 assets, uint256 shares, address onBehalf, address receiver) external returns (uint256 assetsWithdrawn, uint256 sharesWithdrawn);
        function idToMarketParams(bytes32 id) external view returns (address loanToken, address collateralToken, address oracle, address irm, uint256 lltv);
    }
}

/// USDC lending market on Morpho Blue (Base)
pub const USDC_MARKET_ID: B256 =
    b256!("0x8793cf302b8ffd655ab97bd1c695dbd967807e8367a65cb2f4edaf1380ba1bda");

const MORPHO_APY_BPS: u32 = 450;

/// Supply into a single Morpho Blue market.
pub struct MorphoStrategy {
    descriptor: &'static StrategyDescriptor,
    reader: Arc<dyn ChainReader>,
    market_id: B256,
}

impl MorphoStrategy {
    pub fn new(descriptor: &'static StrategyDescriptor, reader: Arc<dyn ChainReader>) -> Self {
        Self::with_market(descriptor, reader, USDC_MARKET_ID)
    }

    pub fn with_market(
        descriptor: &'static StrategyDescriptor,
        reader: Arc<dyn ChainReader>,
        market_id: B256,
    ) -> Self {
        Self {
            descriptor,
            reader,
            market_id,
        }
    }

    async fn market_params(&self, morpho: Address) -> Result<IMorpho::MarketParams, PortfolioError> {
        let ret = chain::read(
            self.reader.as_ref(),
            self.chain_id(),
            morpho,
            IMorpho::idToMarketParamsCall { id: self.market_id },
        )
        .await?;
        Ok(IMorpho::MarketParams {
            loanToken: ret.loanToken,
            collateralToken: ret.collateralToken,
            oracle: ret.oracle,
            irm: ret.irm,
            lltv: ret.lltv,
        })
    }
}

#[async_trait]
impl Strategy for MorphoStrategy {
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
        let morpho = self.descriptor.contract(roles::MORPHO)?;
        let market_params = self.market_params(morpho).await?;
        let supply = IMorpho::supplyCall {
            marketParams: market_params,
            assets: amount,
            shares: U256::ZERO,
            onBehalf: user,
            data: Bytes::new(),
        };
        Ok(vec![
            contracts::approve(asset, morpho, amount),
            Call::contract(morpho, supply.abi_encode()),
        ])
    }

    async fn redeem_calls(
        &self,
        amount: U256,
        user: Address,
        _asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        let morpho = self.descriptor.contract(roles::MORPHO)?;
        let market_params = self.market_params(morpho).await?;
        let withdraw = IMorpho::withdrawCall {
            marketParams: market_params,
            assets: amount,
            shares: U256::ZERO,
            onBehalf: user,
            receiver: user,
        };
        Ok(vec![Call::contract(morpho, withdraw.abi_encode())])
    }

    async fn profit_of(
        &self,
        _user: Address,
        position: &Position,
    ) -> Result<Decimal, PortfolioError> {
        Ok(accrued_yield(
            position.amount,
            MORPHO_APY_BPS,
            position.created_at(),
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::strategies::testing::{ScriptedReader, address_word, word};
    use crate::tokens::USDC;
    use crate::types::{StrategyId, chains};

    const USER: Address = Address::repeat_byte(0xaa);
    const LOAN: Address = Address::repeat_byte(0x01);
    const ORACLE: Address = Address::repeat_byte(0x03);

    fn descriptor() -> &'static StrategyDescriptor {
        registry::descriptor(StrategyId::MorphoSupply, chains::BASE).unwrap()
    }

    fn market_reader() -> ScriptedReader {
        let morpho = descriptor().contract(roles::MORPHO).unwrap();
        let mut out = Vec::new();
        out.extend(address_word(LOAN));
        out.extend(address_word(Address::repeat_byte(0x02)));
        out.extend(address_word(ORACLE));
        out.extend(address_word(Address::repeat_byte(0x04)));
        out.extend(word(860_000_000_000_000_000u64));
        ScriptedReader::default().respond(morpho, IMorpho::idToMarketParamsCall::SELECTOR, out)
    }

    #[tokio::test]
    async fn test_invest_reads_market_then_supplies() {
        let strategy = MorphoStrategy::new(descriptor(), Arc::new(market_reader()));
        let usdc = USDC.address_on(chains::BASE).unwrap();
        let calls = strategy
            .invest_calls(U256::from(5_000_000u64), USER, Some(usdc))
            .await
            .unwrap();

        assert_eq!(calls.len(), 2);
        let supply = IMorpho::supplyCall::abi_decode(calls[1].data.as_ref().unwrap()).unwrap();
        assert_eq!(supply.marketParams.loanToken, LOAN);
        assert_eq!(supply.marketParams.oracle, ORACLE);
        assert_eq!(supply.assets, U256::from(5_000_000u64));
        assert_eq!(supply.shares, U256::ZERO);
        assert_eq!(supply.onBehalf, USER);
    }

    #[tokio::test]
    async fn test_redeem_withdraws_to_user() {
        let strategy = MorphoStrategy::new(descriptor(), Arc::new(market_reader()));
        let calls = strategy
            .redeem_calls(U256::from(7u64), USER, None)
            .await
            .unwrap();

        assert_eq!(calls.len(), 1);
        let withdraw = IMorpho::withdrawCall::abi_decode(calls[0].data.as_ref().unwrap()).unwrap();
        assert_eq!(withdraw.assets, U256::from(7u64));
        assert_eq!(withdraw.onBehalf, USER);
        assert_eq!(withdraw.receiver, USER);
    }

    #[tokio::test]
    async fn test_invest_fails_when_market_read_fails() {
        let strategy = MorphoStrategy::new(descriptor(), Arc::new(ScriptedReader::default()));
        let usdc = USDC.address_on(chains::BASE).unwrap();
        let err = strategy
            .invest_calls(U256::from(1u64), USER, Some(usdc))
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::ChainRead(_)));
    }
}
