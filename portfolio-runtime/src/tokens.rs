//! Token reference data.

use alloy::primitives::address;

use crate::error::PortfolioError;
use crate::types::{chains, Token};

pub const USDC: Token = Token {
    name: "USDC",
    decimals: 6,
    is_native: false,
    addresses: &[
        (chains::ARBITRUM, address!("0xaf88d065e77c8cC2239327C5EDb3A432268e5831")),
        (chains::BASE, address!("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")),
        (chains::BSC, address!("0x8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d")),
        (chains::POLYGON, address!("0x3c499c542cEF5E3811e1192ce70d8cC03d5c3359")),
    ],
};

pub const USDT: Token = Token {
    name: "USDT",
    decimals: 6,
    is_native: false,
    addresses: &[
        (chains::ARBITRUM, address!("0xFd086bC7CD5C481DCC9C85ebE478A1C0b69FCbb9")),
        (chains::BASE, address!("0xfde4C96c8593536E31F229EA8f37b2ADa2699bb2")),
        (chains::BSC, address!("0x55d398326f99059fF775485246999027B3197955")),
    ],
};

pub const ETH: Token = Token {
    name: "ETH",
    decimals: 18,
    is_native: true,
    addresses: &[],
};

pub const BNB: Token = Token {
    name: "BNB",
    decimals: 18,
    is_native: true,
    addresses: &[],
};

pub const WETH: Token = Token {
    name: "WETH",
    decimals: 18,
    is_native: false,
    addresses: &[
        (chains::BASE, address!("0x4200000000000000000000000000000000000006")),
        (chains::ARBITRUM, address!("0x82aF49447D8a07e3bd95BD0d56f35241523fBab1")),
    ],
};

pub const WST_ETH: Token = Token {
    name: "wstETH",
    decimals: 18,
    is_native: false,
    addresses: &[
        (chains::BASE, address!("0xc1CBa3fCea344f92D9239c08C0568f6F2F0ee452")),
        (chains::ARBITRUM, address!("0x5979D7b546E38E414F7E9822514be443A4800529")),
    ],
};

pub const WB_ETH: Token = Token {
    name: "wbETH",
    decimals: 18,
    is_native: false,
    addresses: &[(chains::BSC, address!("0xa2E3356610840701BDf5611a53974510Ae27E2e1"))],
};

pub const CELO: Token = Token {
    name: "CELO",
    decimals: 18,
    is_native: false,
    addresses: &[(chains::CELO, address!("0x471EcE3750Da237f93B8E339c536989b8978a438"))],
};

pub const C_EUR: Token = Token {
    name: "cEUR",
    decimals: 18,
    is_native: false,
    addresses: &[(chains::CELO, address!("0xD8763CBa276a3738E6DE85b4b3bF5FDed6D6cA73"))],
};

pub const TOKENS: &[Token] = &[USDC, USDT, ETH, BNB, WETH, WST_ETH, WB_ETH, CELO, C_EUR];

pub fn token_by_name(name: &str) -> Result<Token, PortfolioError> {
    TOKENS
        .iter()
        .find(|t| t.name == name)
        .copied()
        .ok_or_else(|| PortfolioError::ConfigError(format!("Unknown token: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_by_name() {
        let usdc = token_by_name("USDC").unwrap();
        assert_eq!(usdc.decimals, 6);
        assert!(usdc.address_on(chains::ARBITRUM).is_some());
        assert!(token_by_name("DOGE").is_err());
    }

    #[test]
    fn test_native_asset_is_none() {
        assert_eq!(ETH.asset_on(chains::BASE).unwrap(), None);
        assert!(USDC.asset_on(chains::CELO).is_err());
    }
}
