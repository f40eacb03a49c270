pub mod error;
pub mod types;
pub mod tokens;
pub mod registry;
pub mod contracts;
pub mod chain;
pub mod strategies;
pub mod planner;
pub mod composer;
pub mod fees;
pub mod wallet;
pub mod executor;
pub mod ledger;
pub mod sync;
pub mod engine;
pub mod workflow;
pub mod config;
pub mod logging;

pub use config::EngineConfig;
pub use engine::{ExecutionReceipt, PortfolioEngine, RedeemRequest};
pub use error::PortfolioError;
pub use types::*;
pub use workflow::{WorkflowAction, WorkflowState};
