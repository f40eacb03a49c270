//! Engine configuration from environment variables.

use std::collections::BTreeMap;
use std::time::Duration;

use alloy::primitives::Address;

use crate::error::PortfolioError;
use crate::fees::DEFAULT_FEE_RATE_PER_MILLE;
use crate::types::{ChainId, chains};

const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 10;

/// Chains probed for an `RPC_URL_<chain_id>` variable.
const KNOWN_CHAINS: [ChainId; 5] = [
    chains::BSC,
    chains::POLYGON,
    chains::BASE,
    chains::CELO,
    chains::ARBITRUM,
];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ledger_api_url: String,
    /// Treasury receiving the fee leg of every batch
    pub fee_receiver: Address,
    pub fee_rate_per_mille: u32,
    pub rpc_urls: BTreeMap<ChainId, String>,
    pub smart_account: Option<Address>,
    pub owner_private_key: Option<String>,
    pub ledger_timeout: Duration,
}

impl EngineConfig {
    pub fn new(ledger_api_url: impl Into<String>, fee_receiver: Address) -> Self {
        Self {
            ledger_api_url: ledger_api_url.into(),
            fee_receiver,
            fee_rate_per_mille: DEFAULT_FEE_RATE_PER_MILLE,
            rpc_urls: BTreeMap::new(),
            smart_account: None,
            owner_private_key: None,
            ledger_timeout: Duration::from_secs(DEFAULT_LEDGER_TIMEOUT_SECS),
        }
    }

    pub fn with_rpc_url(mut self, chain_id: ChainId, url: impl Into<String>) -> Self {
        self.rpc_urls.insert(chain_id, url.into());
        self
    }

    pub fn from_env() -> Result<Self, PortfolioError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PortfolioError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let ledger_api_url = var("LEDGER_API_URL")
            .ok_or_else(|| PortfolioError::ConfigError("LEDGER_API_URL not set".into()))?;
        url::Url::parse(&ledger_api_url)
            .map_err(|e| PortfolioError::ConfigError(format!("LEDGER_API_URL: {e}")))?;

        let fee_receiver = var("FEE_RECEIVER")
            .ok_or_else(|| PortfolioError::ConfigError("FEE_RECEIVER not set".into()))
            .and_then(|v| parse_address("FEE_RECEIVER", &v))?;

        let fee_rate_per_mille: u32 = var("FEE_RATE")
            .map(|v| {
                v.trim().parse().map_err(|_| {
                    PortfolioError::ConfigError(format!(
                        "FEE_RATE must be a whole number per mille, got {v:?}"
                    ))
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_FEE_RATE_PER_MILLE);
        if fee_rate_per_mille > 1000 {
            return Err(PortfolioError::ConfigError(format!(
                "FEE_RATE must be at most 1000 per mille, got {fee_rate_per_mille}"
            )));
        }

        let rpc_urls = KNOWN_CHAINS
            .iter()
            .filter_map(|id| var(&format!("RPC_URL_{id}")).map(|url| (*id, url)))
            .collect();

        let smart_account = var("SMART_ACCOUNT_ADDRESS")
            .map(|v| parse_address("SMART_ACCOUNT_ADDRESS", &v))
            .transpose()?;

        let ledger_timeout_secs: u64 = var("LEDGER_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LEDGER_TIMEOUT_SECS);

        Ok(Self {
            ledger_api_url,
            fee_receiver,
            fee_rate_per_mille,
            rpc_urls,
            smart_account,
            owner_private_key: var("OWNER_PRIVATE_KEY"),
            ledger_timeout: Duration::from_secs(ledger_timeout_secs),
        })
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, PortfolioError> {
    value
        .trim()
        .parse()
        .map_err(|e| PortfolioError::ConfigError(format!("{key}: invalid address: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TREASURY: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("LEDGER_API_URL", "https://ledger.example.com"),
            ("FEE_RECEIVER", TREASURY),
        ]))
        .unwrap();

        assert_eq!(config.fee_rate_per_mille, 5);
        assert_eq!(config.ledger_timeout, Duration::from_secs(10));
        assert_eq!(config.fee_receiver, TREASURY.parse::<Address>().unwrap());
        assert!(config.rpc_urls.is_empty());
        assert!(config.smart_account.is_none());
        assert!(config.owner_private_key.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("LEDGER_API_URL", "https://ledger.example.com"),
            ("FEE_RECEIVER", TREASURY),
            ("FEE_RATE", "8"),
            ("RPC_URL_42161", "https://arb.example.com"),
            ("RPC_URL_8453", "https://base.example.com"),
            ("RPC_URL_1", "https://ignored.example.com"),
            ("SMART_ACCOUNT_ADDRESS", "0x0000000000000000000000000000000000000abc"),
            ("OWNER_PRIVATE_KEY", "0x01"),
            ("LEDGER_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.fee_rate_per_mille, 8);
        assert_eq!(
            config.rpc_urls.keys().copied().collect::<Vec<_>>(),
            vec![chains::BASE, chains::ARBITRUM]
        );
        assert!(config.smart_account.is_some());
        assert_eq!(config.owner_private_key.as_deref(), Some("0x01"));
        assert_eq!(config.ledger_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_required_vars() {
        let err = EngineConfig::from_lookup(lookup(&[("FEE_RECEIVER", TREASURY)])).unwrap_err();
        assert!(err.to_string().contains("LEDGER_API_URL"));

        let err = EngineConfig::from_lookup(lookup(&[(
            "LEDGER_API_URL",
            "https://ledger.example.com",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("FEE_RECEIVER"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_lookup(lookup(&[
            ("LEDGER_API_URL", "https://ledger.example.com"),
            ("FEE_RECEIVER", "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PortfolioError::ConfigError(_)));

        let err = EngineConfig::from_lookup(lookup(&[
            ("LEDGER_API_URL", "https://ledger.example.com"),
            ("FEE_RECEIVER", TREASURY),
            ("FEE_RATE", "1500"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("FEE_RATE"));
    }

    #[test]
    fn test_unparseable_fee_rate_rejected() {
        for raw in ["abc", "1%", "0.5", "-1"] {
            let err = EngineConfig::from_lookup(lookup(&[
                ("LEDGER_API_URL", "https://ledger.example.com"),
                ("FEE_RECEIVER", TREASURY),
                ("FEE_RATE", raw),
            ]))
            .unwrap_err();
            assert!(err.to_string().contains("FEE_RATE"), "{raw}: {err}");
        }
    }

    #[test]
    fn test_unparseable_timeout_falls_back() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("LEDGER_API_URL", "https://ledger.example.com"),
            ("FEE_RECEIVER", TREASURY),
            ("LEDGER_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap();
        assert_eq!(config.fee_rate_per_mille, 5);
        assert_eq!(config.ledger_timeout, Duration::from_secs(10));
    }
}
