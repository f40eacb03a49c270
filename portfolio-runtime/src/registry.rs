//! Static strategy catalog keyed by `(StrategyId, ChainId)`.
//!
//! Several descriptors may share a strategy id across chains. Lookups return
//! the first descriptor registered for the pair.

use alloy::primitives::{address, Address};

use crate::error::PortfolioError;
use crate::tokens::{BNB, C_EUR, USDC};
use crate::types::{chains, ChainId, RiskTier, StrategyDescriptor, StrategyId};

const AAVE_POOL_ARBITRUM: Address = address!("0x794a61358D6845594F94dc1DB02A252b5b4814aD");
const AAVE_POOL_BASE: Address = address!("0xA238Dd80C259a72e81d7e4664a9801593F98d1c5");
const AAVE_POOL_BSC: Address = address!("0x6807dc923806fE8Fd134338EABCA509979a7e0cB");
const AAVE_POOL_CELO: Address = address!("0x3E59A31363E2ad014dcbc521c4a0d5757d9f3402");

const UNISWAP_ROUTER_ARBITRUM: Address = address!("0x68b3465833fb72A70ecDF485E0e4C7bD8665Fc45");
const UNISWAP_ROUTER_BASE: Address = address!("0x2626664c2603336E57B271c5C0b26F421741e481");
const UNISWAP_ROUTER_BSC: Address = address!("0xb971ef87ede563556b2ed4b1c0b0019111dd85d2");

const UNISWAP_NFT_MANAGER_ARBITRUM: Address =
    address!("0xC36442b4a4522E871399CD717aBDD847Ab11FE88");
const UNISWAP_NFT_MANAGER_BASE: Address = address!("0x03a520b32C04BF3bEEf7BEb72E919cf822Ed34f1");
const UNISWAP_NFT_MANAGER_BSC: Address = address!("0x7b8A01B39D58278b5DE7e48c8449c9f4F5170613");

const MORPHO_BLUE_BASE: Address = address!("0xBBBBBbbBBb9cC5e90e3b3Af64bdAF62C37EEFFCb");
const FLUID_FUSDC_BASE: Address = address!("0xf42f5795D9ac7e9D757dB633D693cD548Cfd9169");

/// Contract role names used by the call builders.
pub mod roles {
    pub const POOL: &str = "pool";
    pub const SWAP_ROUTER: &str = "swapRouter";
    pub const NFT_MANAGER: &str = "nftManager";
    pub const MORPHO: &str = "morpho";
    pub const FUSDC: &str = "fUSDC";
}

static DESCRIPTORS: &[StrategyDescriptor] = &[
    // Arbitrum
    StrategyDescriptor {
        id: StrategyId::AaveV3Supply,
        chain_id: chains::ARBITRUM,
        title: "AAVE Lending",
        protocol: "Aave",
        apy_bps: 450,
        risk: RiskTier::Medium,
        contracts: &[(roles::POOL, AAVE_POOL_ARBITRUM)],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3AddLiquidity,
        chain_id: chains::ARBITRUM,
        title: "Uniswap Liquidity",
        protocol: "Uniswap",
        apy_bps: 3540,
        risk: RiskTier::High,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_ARBITRUM),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_ARBITRUM),
        ],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3SwapLST,
        chain_id: chains::ARBITRUM,
        title: "Liquid Staking",
        protocol: "Lido",
        apy_bps: 280,
        risk: RiskTier::Low,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_ARBITRUM),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_ARBITRUM),
        ],
        tokens: &[USDC],
    },
    // Base
    StrategyDescriptor {
        id: StrategyId::MorphoSupply,
        chain_id: chains::BASE,
        title: "Morpho Supplying",
        protocol: "Morpho",
        apy_bps: 670,
        risk: RiskTier::Medium,
        contracts: &[(roles::MORPHO, MORPHO_BLUE_BASE)],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::AaveV3Supply,
        chain_id: chains::BASE,
        title: "AAVE Supplying",
        protocol: "Aave",
        apy_bps: 610,
        risk: RiskTier::Medium,
        contracts: &[(roles::POOL, AAVE_POOL_BASE)],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3AddLiquidity,
        chain_id: chains::BASE,
        title: "Uniswap Liquidity Narrow Range",
        protocol: "Uniswap",
        apy_bps: 3250,
        risk: RiskTier::High,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_BASE),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_BASE),
        ],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3SwapLST,
        chain_id: chains::BASE,
        title: "Liquid Staking",
        protocol: "Lido",
        apy_bps: 280,
        risk: RiskTier::Low,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_BASE),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_BASE),
        ],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::FluidSupply,
        chain_id: chains::BASE,
        title: "Fluid Supplying",
        protocol: "Fluid",
        apy_bps: 623,
        risk: RiskTier::Medium,
        contracts: &[(roles::FUSDC, FLUID_FUSDC_BASE)],
        tokens: &[USDC],
    },
    // BSC
    StrategyDescriptor {
        id: StrategyId::AaveV3Supply,
        chain_id: chains::BSC,
        title: "AAVE Supplying",
        protocol: "Aave",
        apy_bps: 430,
        risk: RiskTier::Medium,
        contracts: &[(roles::POOL, AAVE_POOL_BSC)],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3AddLiquidity,
        chain_id: chains::BSC,
        title: "Uniswap Liquidity",
        protocol: "Uniswap",
        apy_bps: 3910,
        risk: RiskTier::High,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_BSC),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_BSC),
        ],
        tokens: &[USDC],
    },
    StrategyDescriptor {
        id: StrategyId::UniswapV3SwapLST,
        chain_id: chains::BSC,
        title: "Binance Liquid Staking",
        protocol: "Lido",
        apy_bps: 280,
        risk: RiskTier::Low,
        contracts: &[
            (roles::SWAP_ROUTER, UNISWAP_ROUTER_BSC),
            (roles::NFT_MANAGER, UNISWAP_NFT_MANAGER_BSC),
        ],
        tokens: &[BNB],
    },
    // Celo
    StrategyDescriptor {
        id: StrategyId::AaveV3Supply,
        chain_id: chains::CELO,
        title: "AAVE Supplying",
        protocol: "Aave",
        apy_bps: 570,
        risk: RiskTier::Medium,
        contracts: &[(roles::POOL, AAVE_POOL_CELO)],
        tokens: &[C_EUR],
    },
];

/// Every registered descriptor, in registration order.
pub fn descriptors() -> &'static [StrategyDescriptor] {
    DESCRIPTORS
}

pub fn descriptor(id: StrategyId, chain_id: ChainId) -> Option<&'static StrategyDescriptor> {
    DESCRIPTORS
        .iter()
        .find(|d| d.id == id && d.chain_id == chain_id)
}

/// Like [`descriptor`] but fails with `StrategyUnavailable`.
pub fn require_descriptor(
    id: StrategyId,
    chain_id: ChainId,
) -> Result<&'static StrategyDescriptor, PortfolioError> {
    descriptor(id, chain_id).ok_or_else(|| PortfolioError::StrategyUnavailable {
        strategy: id.to_string(),
        chain_id,
    })
}

pub fn descriptors_for_chain(
    chain_id: ChainId,
) -> impl Iterator<Item = &'static StrategyDescriptor> {
    DESCRIPTORS.iter().filter(move |d| d.chain_id == chain_id)
}

/// Chains on which `id` has a descriptor.
pub fn supported_chains(id: StrategyId) -> Vec<ChainId> {
    let mut out: Vec<ChainId> = DESCRIPTORS
        .iter()
        .filter(|d| d.id == id)
        .map(|d| d.chain_id)
        .collect();
    out.dedup();
    out
}
