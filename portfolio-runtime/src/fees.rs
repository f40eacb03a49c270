use alloy::primitives::{Address, U256};

use crate::contracts;
use crate::types::Call;

/// Platform fee in parts per thousand (5 = 0.5%).
pub const DEFAULT_FEE_RATE_PER_MILLE: u32 = 5;

/// Gross amount split into platform fee and the net amount that gets invested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee: U256,
    pub net: U256,
}

/// `fee = gross * rate / 1000` (floored), `net = gross - fee`.
pub fn calculate_fee(gross: U256, rate_per_mille: u32) -> FeeSplit {
    let fee = gross.saturating_mul(U256::from(rate_per_mille)) / U256::from(1000u32);
    let fee = fee.min(gross);
    FeeSplit {
        fee,
        net: gross - fee,
    }
}

/// Transfer of `fee` to `treasury`: native value transfer when `asset` is
/// `None`, otherwise an ERC-20 `transfer` on the asset.
pub fn fee_call(treasury: Address, asset: Option<Address>, fee: U256) -> Call {
    match asset {
        Some(token) => contracts::transfer(token, treasury, fee),
        None => Call::native_transfer(treasury, fee),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeeEngine {
    treasury: Address,
    rate_per_mille: u32,
}

impl FeeEngine {
    pub fn new(treasury: Address, rate_per_mille: u32) -> Self {
        Self {
            treasury,
            rate_per_mille,
        }
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }

    pub fn rate_per_mille(&self) -> u32 {
        self.rate_per_mille
    }

    pub fn split(&self, gross: U256) -> FeeSplit {
        calculate_fee(gross, self.rate_per_mille)
    }

    /// Append the fee transfer after the strategy calls.
    pub fn append_fee(&self, calls: &mut Vec<Call>, asset: Option<Address>, fee: U256) {
        calls.push(fee_call(self.treasury, asset, fee));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IERC20;
    use alloy::sol_types::SolCall;

    const TREASURY: Address = Address::repeat_byte(0xfe);

    #[test]
    fn test_half_percent_fee() {
        let split = calculate_fee(U256::from(1000u64), 5);
        assert_eq!(split.fee, U256::from(5u64));
        assert_eq!(split.net, U256::from(995u64));
    }

    #[test]
    fn test_fee_floors() {
        let split = calculate_fee(U256::from(999u64), 5);
        assert_eq!(split.fee, U256::from(4u64));
        assert_eq!(split.net, U256::from(995u64));

        let split = calculate_fee(U256::from(100u64), 5);
        assert_eq!(split.fee, U256::ZERO);
        assert_eq!(split.net, U256::from(100u64));
    }

    #[test]
    fn test_zero_rate() {
        let split = calculate_fee(U256::from(1_000_000u64), 0);
        assert_eq!(split.fee, U256::ZERO);
        assert_eq!(split.net, U256::from(1_000_000u64));
    }

    #[test]
    fn test_native_fee_call() {
        let call = fee_call(TREASURY, None, U256::from(5u64));
        assert_eq!(call.to, TREASURY);
        assert_eq!(call.value, Some(U256::from(5u64)));
        assert!(call.data.is_none());
    }

    #[test]
    fn test_erc20_fee_call() {
        let usdc = Address::repeat_byte(0x11);
        let call = fee_call(TREASURY, Some(usdc), U256::from(5u64));
        assert_eq!(call.to, usdc);
        assert!(call.value.is_none());
        let decoded = IERC20::transferCall::abi_decode(call.data.as_ref().unwrap()).unwrap();
        assert_eq!(decoded.to, TREASURY);
        assert_eq!(decoded.amount, U256::from(5u64));
    }

    #[test]
    fn test_fee_engine_appends_last() {
        let engine = FeeEngine::new(TREASURY, DEFAULT_FEE_RATE_PER_MILLE);
        let mut calls = vec![Call::native_transfer(Address::ZERO, U256::from(1u64))];
        let split = engine.split(U256::from(2000u64));
        engine.append_fee(&mut calls, None, split.fee);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].to, TREASURY);
        assert_eq!(calls[1].value, Some(U256::from(10u64)));
    }
}
