//! Conversational workflow feeding the planner.
//!
//! Each step is a [`WorkflowState`]; [`WorkflowState::next`] applies a
//! [`WorkflowAction`] according to a fixed transition table. Anything not in
//! the table is rejected with `InvalidTransition`. Leaving `Edit` requires
//! the edited percentages to total 100.

use std::fmt;

use rand::Rng;
use rust_decimal::Decimal;

use crate::composer;
use crate::error::PortfolioError;
use crate::planner;
use crate::types::{AllocationLeg, ChainId, RiskTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowAction {
    Next,
    Build,
    Edit,
    Deposit,
    Portfolio,
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowAction::Next => "next",
            WorkflowAction::Build => "build",
            WorkflowAction::Edit => "edit",
            WorkflowAction::Deposit => "deposit",
            WorkflowAction::Portfolio => "portfolio",
        };
        f.write_str(name)
    }
}

/// Discriminant of [`WorkflowState`], used by the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Text,
    Invest,
    Portfolio,
    BuildPortfolio,
    Edit,
    ReviewPortfolio,
    Deposit,
    FindStrategies,
    StrategiesCards,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Every legal `(from, action, to)` triple.
const TRANSITIONS: &[(StateKind, WorkflowAction, StateKind)] = &[
    (StateKind::Invest, WorkflowAction::Next, StateKind::Portfolio),
    (StateKind::Portfolio, WorkflowAction::Build, StateKind::BuildPortfolio),
    (StateKind::Portfolio, WorkflowAction::Edit, StateKind::Edit),
    (StateKind::Portfolio, WorkflowAction::Deposit, StateKind::Deposit),
    (StateKind::ReviewPortfolio, WorkflowAction::Build, StateKind::BuildPortfolio),
    (StateKind::ReviewPortfolio, WorkflowAction::Edit, StateKind::Edit),
    (StateKind::ReviewPortfolio, WorkflowAction::Deposit, StateKind::Deposit),
    (StateKind::Edit, WorkflowAction::Next, StateKind::ReviewPortfolio),
    (StateKind::Deposit, WorkflowAction::Build, StateKind::BuildPortfolio),
    (StateKind::Deposit, WorkflowAction::Portfolio, StateKind::Portfolio),
    (StateKind::BuildPortfolio, WorkflowAction::Next, StateKind::Text),
    (StateKind::FindStrategies, WorkflowAction::Next, StateKind::StrategiesCards),
];

pub fn legal_transitions() -> &'static [(StateKind, WorkflowAction, StateKind)] {
    TRANSITIONS
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Text {
        message: String,
    },
    Invest {
        amount: Decimal,
        chain_id: ChainId,
    },
    /// Plans for every tier; `tier` selects the one carried forward.
    Portfolio {
        amount: Decimal,
        chain_id: ChainId,
        tier: RiskTier,
        plans: Vec<(RiskTier, Vec<AllocationLeg>)>,
    },
    BuildPortfolio {
        amount: Decimal,
        legs: Vec<AllocationLeg>,
    },
    Edit {
        amount: Decimal,
        chain_id: ChainId,
        legs: Vec<AllocationLeg>,
    },
    ReviewPortfolio {
        amount: Decimal,
        chain_id: ChainId,
        legs: Vec<AllocationLeg>,
    },
    Deposit {
        amount: Decimal,
        chain_id: ChainId,
        legs: Vec<AllocationLeg>,
    },
    FindStrategies {
        tier: RiskTier,
        chains: Vec<ChainId>,
    },
    StrategiesCards {
        tier: RiskTier,
        chains: Vec<ChainId>,
    },
}

impl WorkflowState {
    pub fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Text { .. } => StateKind::Text,
            WorkflowState::Invest { .. } => StateKind::Invest,
            WorkflowState::Portfolio { .. } => StateKind::Portfolio,
            WorkflowState::BuildPortfolio { .. } => StateKind::BuildPortfolio,
            WorkflowState::Edit { .. } => StateKind::Edit,
            WorkflowState::ReviewPortfolio { .. } => StateKind::ReviewPortfolio,
            WorkflowState::Deposit { .. } => StateKind::Deposit,
            WorkflowState::FindStrategies { .. } => StateKind::FindStrategies,
            WorkflowState::StrategiesCards { .. } => StateKind::StrategiesCards,
        }
    }

    /// Legs of the currently selected tier, for states that carry a portfolio.
    pub fn legs(&self) -> Option<&[AllocationLeg]> {
        match self {
            WorkflowState::Portfolio { tier, plans, .. } => plans
                .iter()
                .find(|(t, _)| t == tier)
                .map(|(_, legs)| legs.as_slice()),
            WorkflowState::BuildPortfolio { legs, .. }
            | WorkflowState::Edit { legs, .. }
            | WorkflowState::ReviewPortfolio { legs, .. }
            | WorkflowState::Deposit { legs, .. } => Some(legs),
            _ => None,
        }
    }

    /// Apply `action`. Planning steps draw from `rng`.
    pub fn next<R: Rng + ?Sized>(
        self,
        action: WorkflowAction,
        rng: &mut R,
    ) -> Result<WorkflowState, PortfolioError> {
        let invalid = |state: &WorkflowState| PortfolioError::InvalidTransition {
            state: state.kind().to_string(),
            action: action.to_string(),
        };
        let selected = self.legs().map(<[AllocationLeg]>::to_vec).unwrap_or_default();

        match (self, action) {
            (WorkflowState::Invest { amount, chain_id }, WorkflowAction::Next) => {
                portfolio(amount, chain_id, rng)
            }
            (
                WorkflowState::Portfolio {
                    amount, chain_id, ..
                }
                | WorkflowState::ReviewPortfolio {
                    amount, chain_id, ..
                },
                action,
            ) if matches!(
                action,
                WorkflowAction::Build | WorkflowAction::Edit | WorkflowAction::Deposit
            ) =>
            {
                Ok(match action {
                    WorkflowAction::Build => WorkflowState::BuildPortfolio {
                        amount,
                        legs: selected,
                    },
                    WorkflowAction::Edit => WorkflowState::Edit {
                        amount,
                        chain_id,
                        legs: selected,
                    },
                    _ => WorkflowState::Deposit {
                        amount,
                        chain_id,
                        legs: selected,
                    },
                })
            }
            (
                WorkflowState::Edit {
                    amount,
                    chain_id,
                    legs,
                },
                WorkflowAction::Next,
            ) => {
                composer::validate_allocation(&legs)?;
                Ok(WorkflowState::ReviewPortfolio {
                    amount,
                    chain_id,
                    legs,
                })
            }
            (WorkflowState::Deposit { amount, legs, .. }, WorkflowAction::Build) => {
                Ok(WorkflowState::BuildPortfolio { amount, legs })
            }
            (
                WorkflowState::Deposit {
                    amount, chain_id, ..
                },
                WorkflowAction::Portfolio,
            ) => portfolio(amount, chain_id, rng),
            (WorkflowState::BuildPortfolio { .. }, WorkflowAction::Next) => {
                Ok(WorkflowState::Text {
                    message: "Portfolio built successfully".to_string(),
                })
            }
            (WorkflowState::FindStrategies { tier, chains }, WorkflowAction::Next) => {
                Ok(WorkflowState::StrategiesCards { tier, chains })
            }
            (state, _) => Err(invalid(&state)),
        }
    }
}

fn portfolio<R: Rng + ?Sized>(
    amount: Decimal,
    chain_id: ChainId,
    rng: &mut R,
) -> Result<WorkflowState, PortfolioError> {
    Ok(WorkflowState::Portfolio {
        amount,
        chain_id,
        tier: RiskTier::Low,
        plans: planner::plan_all(chain_id, rng)?,
    })
}
