//! Remote position/transaction ledger over HTTP.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PortfolioError;
use crate::types::{ChainId, Position, PositionStatus, TransactionRecord};

/// Body of `POST /position`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPosition {
    pub address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub token_name: String,
    pub chain_id: ChainId,
    pub strategy: String,
}

/// Body of `PATCH /positions/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PositionUpdate {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PositionStatus>,
}

impl PositionUpdate {
    pub fn amount(amount: Decimal) -> Self {
        Self {
            amount: Some(amount),
            status: None,
        }
    }

    pub fn close() -> Self {
        Self {
            amount: None,
            status: Some(PositionStatus::Closed),
        }
    }
}

/// A transaction record as returned by `GET /transactions/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredTransaction {
    pub transaction_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub strategy: String,
    pub hash: String,
    pub amount: Decimal,
    pub chain_id: ChainId,
    pub token_name: String,
}

#[async_trait]
pub trait PositionLedger: Send + Sync {
    async fn get_positions(&self, address: &str) -> Result<Vec<Position>, PortfolioError>;

    async fn create_position(&self, position: &NewPosition) -> Result<(), PortfolioError>;

    async fn update_position(
        &self,
        position_id: &str,
        update: &PositionUpdate,
    ) -> Result<(), PortfolioError>;

    async fn record_transaction(&self, record: &TransactionRecord) -> Result<(), PortfolioError>;

    async fn list_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<StoredTransaction>, PortfolioError>;
}

#[derive(Debug, Clone)]
pub struct LedgerClient {
    base_url: String,
    client: reqwest::Client,
    timeout: std::time::Duration,
}

impl LedgerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: std::time::Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PositionLedger for LedgerClient {
    async fn get_positions(&self, address: &str) -> Result<Vec<Position>, PortfolioError> {
        let positions = self
            .client
            .get(self.url(&format!("/positions/{address}")))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Position>>()
            .await?;
        debug!(address, count = positions.len(), "Fetched positions");
        Ok(positions)
    }

    async fn create_position(&self, position: &NewPosition) -> Result<(), PortfolioError> {
        self.client
            .post(self.url("/position"))
            .json(position)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn update_position(
        &self,
        position_id: &str,
        update: &PositionUpdate,
    ) -> Result<(), PortfolioError> {
        self.client
            .patch(self.url(&format!("/positions/{position_id}")))
            .json(update)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn record_transaction(&self, record: &TransactionRecord) -> Result<(), PortfolioError> {
        self.client
            .post(self.url("/transaction"))
            .json(record)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn list_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<StoredTransaction>, PortfolioError> {
        Ok(self
            .client
            .get(self.url(&format!("/transactions/{address}")))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<StoredTransaction>>()
            .await?)
    }
}
