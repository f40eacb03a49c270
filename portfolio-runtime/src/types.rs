use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PortfolioError;

pub type ChainId = u64;

/// Chain IDs the registry knows about
pub mod chains {
    use super::ChainId;

    pub const BSC: ChainId = 56;
    pub const POLYGON: ChainId = 137;
    pub const BASE: ChainId = 8453;
    pub const CELO: ChainId = 42220;
    pub const ARBITRUM: ChainId = 42161;
}

/// Qualitative risk level used to pick strategies and allocation ranges
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            other => Err(PortfolioError::ConfigError(format!("Unknown risk tier: {other}"))),
        }
    }
}

/// Strategy identifiers. The serialized form is what the ledger stores in
/// its `strategy` column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StrategyId {
    AaveV3Supply,
    MorphoSupply,
    FluidSupply,
    UniswapV3SwapLST,
    UniswapV3AddLiquidity,
}

impl StrategyId {
    pub const ALL: [StrategyId; 5] = [
        StrategyId::AaveV3Supply,
        StrategyId::MorphoSupply,
        StrategyId::FluidSupply,
        StrategyId::UniswapV3SwapLST,
        StrategyId::UniswapV3AddLiquidity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::AaveV3Supply => "AaveV3Supply",
            StrategyId::MorphoSupply => "MorphoSupply",
            StrategyId::FluidSupply => "FluidSupply",
            StrategyId::UniswapV3SwapLST => "UniswapV3SwapLST",
            StrategyId::UniswapV3AddLiquidity => "UniswapV3AddLiquidity",
        }
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyId {
    type Err = PortfolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| PortfolioError::UnknownStrategy(s.to_string()))
    }
}

/// ERC-20 or native token reference data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub name: &'static str,
    pub decimals: u8,
    pub is_native: bool,
    /// Per-chain contract address. Empty for native tokens.
    pub addresses: &'static [(ChainId, Address)],
}

impl Token {
    pub fn address_on(&self, chain_id: ChainId) -> Option<Address> {
        self.addresses
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, addr)| *addr)
    }

    /// Address to hand to call builders: `None` for native tokens.
    pub fn asset_on(&self, chain_id: ChainId) -> Result<Option<Address>, PortfolioError> {
        if self.is_native {
            return Ok(None);
        }
        self.address_on(chain_id)
            .map(Some)
            .ok_or_else(|| PortfolioError::TokenUnavailable {
                token: self.name.to_string(),
                chain_id,
            })
    }
}

/// Static protocol metadata plus the contracts the strategy talks to on one chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyDescriptor {
    pub id: StrategyId,
    pub chain_id: ChainId,
    pub title: &'static str,
    pub protocol: &'static str,
    /// Advertised APY in basis points
    pub apy_bps: u32,
    pub risk: RiskTier,
    /// contract role → address
    pub contracts: &'static [(&'static str, Address)],
    pub tokens: &'static [Token],
}

impl StrategyDescriptor {
    pub fn contract(&self, role: &str) -> Result<Address, PortfolioError> {
        self.contracts
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, addr)| *addr)
            .ok_or_else(|| PortfolioError::ConfigError(format!(
                "{} has no '{role}' contract on chain {}",
                self.id, self.chain_id
            )))
    }

    pub fn supports_token(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t.name == name)
    }
}

/// One strategy's share of an allocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationLeg {
    pub strategy: &'static StrategyDescriptor,
    pub allocation: u8,
}

/// An opaque on-chain instruction included in a batched transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub to: Address,
    pub data: Option<Bytes>,
    pub value: Option<U256>,
}

impl Call {
    pub fn contract(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: Some(data.into()),
            value: None,
        }
    }

    pub fn native_transfer(to: Address, value: U256) -> Self {
        Self {
            to,
            data: None,
            value: Some(value),
        }
    }
}

/// One user action: invest `gross_amount` of `token` across `legs` on `chain_id`
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub user: Address,
    pub chain_id: ChainId,
    /// Amount in the token's smallest unit, before fees
    pub gross_amount: U256,
    pub token: Token,
    pub legs: Vec<AllocationLeg>,
}

/// Ledger status of a position.
///
/// The backend stores it as the strings `"true"` / `"false"`; `"open"` /
/// `"closed"` and JSON booleans are accepted too.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawStatus", into = "RawStatus")]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Flag(bool),
    Text(String),
}

impl TryFrom<RawStatus> for PositionStatus {
    type Error = String;

    fn try_from(raw: RawStatus) -> Result<Self, Self::Error> {
        match raw {
            RawStatus::Flag(true) => Ok(PositionStatus::Open),
            RawStatus::Flag(false) => Ok(PositionStatus::Closed),
            RawStatus::Text(s) => match s.as_str() {
                "true" | "open" => Ok(PositionStatus::Open),
                "false" | "closed" => Ok(PositionStatus::Closed),
                other => Err(format!("unknown position status '{other}'")),
            },
        }
    }
}

impl From<PositionStatus> for RawStatus {
    fn from(status: PositionStatus) -> Self {
        match status {
            PositionStatus::Open => RawStatus::Text("true".into()),
            PositionStatus::Closed => RawStatus::Text("false".into()),
        }
    }
}

/// A ledger entry for capital invested in one strategy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    #[serde(rename = "position_id", alias = "id")]
    pub id: String,
    #[serde(default, rename = "address")]
    pub user: Option<String>,
    pub chain_id: ChainId,
    pub strategy: String,
    #[serde(default)]
    pub token_name: String,
    pub amount: Decimal,
    pub status: PositionStatus,
    /// Creation timestamp as the backend formats it
    #[serde(default, rename = "create_at", alias = "created_at")]
    pub created_at: Option<String>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Parse `created_at`, accepting RFC 3339 and the backend's naive
    /// `YYYY-MM-DD HH:MM:SS` form (taken as UTC).
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Append-only audit entry, one per leg per execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub address: String,
    pub chain_id: ChainId,
    pub strategy: String,
    pub hash: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub token_name: String,
}

/// Convert a smallest-unit amount to human units using `decimals`.
pub fn to_human(amount: U256, decimals: u8) -> Result<Decimal, PortfolioError> {
    let raw = u128::try_from(amount)
        .map_err(|_| PortfolioError::InvalidAmount(format!("{amount} exceeds u128")))?;
    let raw = i128::try_from(raw)
        .map_err(|_| PortfolioError::InvalidAmount(format!("{amount} exceeds i128")))?;
    Decimal::try_from_i128_with_scale(raw, u32::from(decimals))
        .map(|d| d.normalize())
        .map_err(|e| PortfolioError::InvalidAmount(format!("{amount}: {e}")))
}

/// Convert a human amount to the token's smallest unit, truncating any
/// precision beyond `decimals`.
pub fn to_smallest_unit(amount: Decimal, decimals: u8) -> Result<U256, PortfolioError> {
    if amount.is_sign_negative() {
        return Err(PortfolioError::InvalidAmount(format!(
            "negative amount {amount}"
        )));
    }
    let scale = Decimal::from(10u64.pow(u32::from(decimals)));
    let scaled = amount
        .checked_mul(scale)
        .ok_or_else(|| PortfolioError::InvalidAmount(format!("{amount} overflows")))?;
    U256::from_str_radix(&scaled.trunc().to_string(), 10)
        .map_err(|e| PortfolioError::InvalidAmount(format!("Decimal→U256 conversion failed: {e}")))
}
