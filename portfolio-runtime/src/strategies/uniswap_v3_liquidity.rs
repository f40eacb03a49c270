//! Full-range liquidity in the asset/USDT 0.01% pool.
//!
//! Invest mints a fresh position NFT; redeem drains the most recently minted
//! one. The user must hold enough USDT to pair with the deposit.

use std::sync::Arc;

use alloy::primitives::aliases::I24;
use alloy::primitives::{Address, Uint, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

type Uint24 = Uint<24, 1>;

use super::{Strategy, require_asset};
use crate::chain::{self, ChainReader};
use crate::contracts;
use crate::error::PortfolioError;
use crate::registry::roles;
use crate::tokens::USDT;
use crate::types::{Call, Position, StrategyDescriptor};

sol! {
    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        struct DecreaseLiquidityParams {
            uint256 tokenId;
            uint128 liquidity;
            uint256 amount0Min;
            uint256 amount1Min;
            uint256 deadline;
        }

        struct CollectParams {
            uint256 tokenId;
            address recipient;
            uint128 amount0Max;
            uint128 amount1Max;
        }

        function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        function decreaseLiquidity(DecreaseLiquidityParams calldata params) external payable returns (uint256 amount0, uint256 amount1);
        function collect(CollectParams calldata params) external payable returns (uint256 amount0, uint256 amount1);
        function balanceOf(address owner) external view returns (uint256);
        function tokenOfOwnerByIndex(address owner, uint256 index) external view returns (uint256);
        function positions(uint256 tokenId) external view returns (
            uint96 nonce,
            address operator,
            address token0,
            address token1,
            uint24 fee,
            int24 tickLower,
            int24 tickUpper,
            uint128 liquidity,
            uint256 feeGrowthInside0LastX128,
            uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0,
            uint128 tokensOwed1
        );
    }
}

const POOL_FEE_TIER: u32 = 100;
const MIN_TICK: i32 = -887_220;
const MAX_TICK: i32 = 887_220;
/// Seconds a mint/decrease stays valid after composition.
const DEADLINE_SECS: i64 = 1800;

pub struct UniswapV3LiquidityStrategy {
    descriptor: &'static StrategyDescriptor,
    reader: Arc<dyn ChainReader>,
}

impl UniswapV3LiquidityStrategy {
    pub fn new(descriptor: &'static StrategyDescriptor, reader: Arc<dyn ChainReader>) -> Self {
        Self { descriptor, reader }
    }

    fn deadline() -> U256 {
        U256::from((Utc::now().timestamp() + DEADLINE_SECS).max(0) as u64)
    }

    fn tick(value: i32) -> Result<I24, PortfolioError> {
        I24::try_from(value)
            .map_err(|e| PortfolioError::ConfigError(format!("tick {value} out of range: {e}")))
    }
}

#[async_trait]
impl Strategy for UniswapV3LiquidityStrategy {
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
        let manager = self.descriptor.contract(roles::NFT_MANAGER)?;
        let usdt = USDT
            .address_on(self.chain_id())
            .ok_or_else(|| PortfolioError::TokenUnavailable {
                token: USDT.name.to_string(),
                chain_id: self.chain_id(),
            })?;
        let (token0, token1) = if asset < usdt {
            (asset, usdt)
        } else {
            (usdt, asset)
        };

        let mint = INonfungiblePositionManager::mintCall {
            params: INonfungiblePositionManager::MintParams {
                token0,
                token1,
                fee: Uint24::from(POOL_FEE_TIER),
                tickLower: Self::tick(MIN_TICK)?,
                tickUpper: Self::tick(MAX_TICK)?,
                amount0Desired: amount,
                amount1Desired: amount,
                amount0Min: U256::ZERO,
                amount1Min: U256::ZERO,
                recipient: user,
                deadline: Self::deadline(),
            },
        };
        Ok(vec![
            contracts::approve(token0, manager, amount),
            contracts::approve(token1, manager, amount),
            Call::contract(manager, mint.abi_encode()),
        ])
    }

    /// Removes all liquidity from the user's latest position and collects
    /// both tokens. `amount` is ignored.
    async fn redeem_calls(
        &self,
        _amount: U256,
        user: Address,
        _asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        let chain_id = self.chain_id();
        let manager = self.descriptor.contract(roles::NFT_MANAGER)?;
        let reader = self.reader.as_ref();

        let count = chain::read(
            reader,
            chain_id,
            manager,
            INonfungiblePositionManager::balanceOfCall { owner: user },
        )
        .await?;
        if count.is_zero() {
            return Err(PortfolioError::InsufficientLiquidity(format!(
                "{user} holds no liquidity positions"
            )));
        }
        let token_id = chain::read(
            reader,
            chain_id,
            manager,
            INonfungiblePositionManager::tokenOfOwnerByIndexCall {
                owner: user,
                index: count - U256::from(1u8),
            },
        )
        .await?;
        let position = chain::read(
            reader,
            chain_id,
            manager,
            INonfungiblePositionManager::positionsCall { tokenId: token_id },
        )
        .await?;
        if position.liquidity == 0 {
            return Err(PortfolioError::InsufficientLiquidity(format!(
                "position {token_id} has no liquidity"
            )));
        }

        let decrease = INonfungiblePositionManager::decreaseLiquidityCall {
            params: INonfungiblePositionManager::DecreaseLiquidityParams {
                tokenId: token_id,
                liquidity: position.liquidity,
                amount0Min: U256::ZERO,
                amount1Min: U256::ZERO,
                deadline: Self::deadline(),
            },
        };
        let collect = INonfungiblePositionManager::collectCall {
            params: INonfungiblePositionManager::CollectParams {
                tokenId: token_id,
                recipient: user,
                amount0Max: u128::MAX,
                amount1Max: u128::MAX,
            },
        };
        Ok(vec![
            Call::contract(manager, decrease.abi_encode()),
            Call::contract(manager, collect.abi_encode()),
        ])
    }

    /// Fee income is not tracked for LP positions.
    async fn profit_of(
        &self,
        _user: Address,
        _position: &Position,
    ) -> Result<Decimal, PortfolioError> {
        Ok(Decimal::ZERO)
    }
}
