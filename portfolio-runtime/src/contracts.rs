//! Solidity bindings shared across strategies and the wallet.
//!
//! Protocol-specific interfaces live next to the strategy that encodes them.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use crate::types::Call;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    /// Smart account batch entrypoint (Coinbase Smart Wallet layout).
    interface ISmartAccount {
        struct Call {
            address target;
            uint256 value;
            bytes data;
        }

        function executeBatch(Call[] calldata calls) external payable;
    }
}

/// `token.approve(spender, amount)`
pub fn approve(token: Address, spender: Address, amount: U256) -> Call {
    Call::contract(token, IERC20::approveCall { spender, amount }.abi_encode())
}

/// `token.transfer(to, amount)`
pub fn transfer(token: Address, to: Address, amount: U256) -> Call {
    Call::contract(token, IERC20::transferCall { to, amount }.abi_encode())
}

/// Calldata for `balanceOf(account)`.
pub fn balance_of(account: Address) -> IERC20::balanceOfCall {
    IERC20::balanceOfCall { account }
}

/// Encode a batch for `ISmartAccount.executeBatch`.
pub fn encode_execute_batch(calls: &[Call]) -> Bytes {
    let calls = calls
        .iter()
        .map(|c| ISmartAccount::Call {
            target: c.to,
            value: c.value.unwrap_or_default(),
            data: c.data.clone().unwrap_or_default(),
        })
        .collect();
    Bytes::from(ISmartAccount::executeBatchCall { calls }.abi_encode())
}
