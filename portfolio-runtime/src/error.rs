use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("Chain {0} is not supported yet")]
    UnsupportedChain(u64),

    #[error("{strategy}: asset is required")]
    MissingAsset { strategy: String },

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Strategy {strategy} not found on chain {chain_id}")]
    StrategyUnavailable { strategy: String, chain_id: u64 },

    #[error("Token {token} has no address on chain {chain_id}")]
    TokenUnavailable { token: String, chain_id: u64 },

    #[error("Chain read failed: {0}")]
    ChainRead(String),

    #[error("Insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("Strategy execution reverted with txHash: {tx_hash}")]
    ExecutionReverted { tx_hash: String },

    #[error("Receipt for {handle} unavailable: {message}")]
    ReceiptUnavailable { handle: String, message: String },

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Ledger sync failed for {strategy}: {message}")]
    LedgerSyncFailure { strategy: String, message: String },

    #[error("No calls found")]
    NoCalls,

    #[error("Invalid transition: {action} from {state}")]
    InvalidTransition { state: String, action: String },

    #[error("Allocation must total 100%, got {0}%")]
    InvalidAllocation(u32),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl PortfolioError {
    /// Whether the failure happened before anything was submitted on-chain,
    /// so the same request can be retried as-is.
    pub fn is_pre_submission(&self) -> bool {
        !matches!(
            self,
            PortfolioError::ExecutionReverted { .. }
                | PortfolioError::ReceiptUnavailable { .. }
                | PortfolioError::Wallet(_)
                | PortfolioError::LedgerSyncFailure { .. }
        )
    }
}

impl From<reqwest::Error> for PortfolioError {
    fn from(e: reqwest::Error) -> Self {
        PortfolioError::HttpError(e.to_string())
    }
}

impl From<serde_json::Error> for PortfolioError {
    fn from(e: serde_json::Error) -> Self {
        PortfolioError::SerializationError(e.to_string())
    }
}
