use std::sync::Arc;

use alloy::primitives::{Address, Uint, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

/// Alloy type alias for uint24 (used for Uniswap fee tiers)
type Uint24 = Uint<24, 1>;
/// Alloy type alias for uint160 (used for sqrtPriceLimitX96)
type Uint160 = Uint<160, 3>;

use super::{Strategy, accrued_yield, require_asset};
use crate::chain::{self, ChainReader};
use crate::contracts;
use crate::error::PortfolioError;
use crate::registry::roles;
use crate::tokens::{WB_ETH, WST_ETH};
use crate::types::{Call, ChainId, Position, StrategyDescriptor, Token, chains};

sol! {
    /// SwapRouter02 drops `deadline` from the params struct.
    interface IV3SwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }
        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);
    }
}

/// 0.05% pool
const SWAP_FEE_TIER: u32 = 500;

/// Staking yield used for profit estimates, in basis points.
const LST_APY_BPS: u32 = 450;

/// The liquid staking token the strategy swaps into on `chain_id`.
pub fn lst_token(chain_id: ChainId) -> Token {
    if chain_id == chains::BSC {
        WB_ETH
    } else {
        WST_ETH
    }
}

/// Swap the deposit asset into a liquid staking token and hold it.
pub struct UniswapV3SwapLstStrategy {
    descriptor: &'static StrategyDescriptor,
    reader: Arc<dyn ChainReader>,
}

impl UniswapV3SwapLstStrategy {
    pub fn new(descriptor: &'static StrategyDescriptor, reader: Arc<dyn ChainReader>) -> Self {
        Self { descriptor, reader }
    }

    fn lst_address(&self) -> Result<Address, PortfolioError> {
        let lst = lst_token(self.chain_id());
        lst.address_on(self.chain_id())
            .ok_or_else(|| PortfolioError::TokenUnavailable {
                token: lst.name.to_string(),
                chain_id: self.chain_id(),
            })
    }

    /// approve(router) + exactInputSingle, with no slippage bound.
    fn swap(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Vec<Call>, PortfolioError> {
        let router = self.descriptor.contract(roles::SWAP_ROUTER)?;
        let call = IV3SwapRouter::exactInputSingleCall {
            params: IV3SwapRouter::ExactInputSingleParams {
                tokenIn: token_in,
                tokenOut: token_out,
                fee: Uint24::from(SWAP_FEE_TIER),
                recipient,
                amountIn: amount_in,
                amountOutMinimum: U256::ZERO,
                sqrtPriceLimitX96: Uint160::ZERO,
            },
        };
        Ok(vec![
            contracts::approve(token_in, router, amount_in),
            Call::contract(router, call.abi_encode()),
        ])
    }
}

#[async_trait]
impl Strategy for UniswapV3SwapLstStrategy {
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
        self.swap(asset, self.lst_address()?, amount, user)
    }

    /// Swaps the user's whole LST balance back into `asset`.
    async fn redeem_calls(
        &self,
        _amount: U256,
        user: Address,
        asset: Option<Address>,
    ) -> Result<Vec<Call>, PortfolioError> {
        let asset = require_asset(asset, self.id())?;
        let lst = self.lst_address()?;
        let balance = chain::read(
            self.reader.as_ref(),
            self.chain_id(),
            lst,
            contracts::balance_of(user),
        )
        .await?;
        if balance.is_zero() {
            return Err(PortfolioError::InsufficientLiquidity(format!(
                "no {} balance for {user}",
                lst_token(self.chain_id()).name
            )));
        }
        self.swap(lst, asset, balance, user)
    }

    async fn profit_of(
        &self,
        _user: Address,
        position: &Position,
    ) -> Result<Decimal, PortfolioError> {
        Ok(accrued_yield(
            position.amount,
            LST_APY_BPS,
            position.created_at(),
            Utc::now(),
        ))
    }
}
