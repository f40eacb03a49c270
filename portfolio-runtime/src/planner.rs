//! Risk-tiered allocation planning.
//!
//! Each `(chain, tier)` maps to an ordered list of strategies, some with a
//! percentage range. Ranged entries draw a share from the injected RNG; the
//! last matched entry takes whatever is left so the plan always sums to 100.

use rand::Rng;
use tracing::{debug, warn};

use crate::error::PortfolioError;
use crate::registry;
use crate::types::{AllocationLeg, ChainId, RiskTier, StrategyId, chains};

/// One configured slot in a tier's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub strategy: StrategyId,
    /// Inclusive `[min, max]` percentage, or `None` for "whatever remains".
    pub range: Option<(u8, u8)>,
}

const fn ranged(strategy: StrategyId, min: u8, max: u8) -> PlanEntry {
    PlanEntry {
        strategy,
        range: Some((min, max)),
    }
}

const fn rest(strategy: StrategyId) -> PlanEntry {
    PlanEntry {
        strategy,
        range: None,
    }
}

struct ChainPlans {
    chain_id: ChainId,
    low: &'static [PlanEntry],
    medium: &'static [PlanEntry],
    high: &'static [PlanEntry],
}

static PLANS: &[ChainPlans] = &[
    ChainPlans {
        chain_id: chains::BASE,
        low: &[
            ranged(StrategyId::AaveV3Supply, 30, 50),
            rest(StrategyId::UniswapV3SwapLST),
        ],
        medium: &[
            ranged(StrategyId::AaveV3Supply, 15, 30),
            ranged(StrategyId::MorphoSupply, 15, 30),
            rest(StrategyId::UniswapV3SwapLST),
        ],
        high: &[
            ranged(StrategyId::AaveV3Supply, 20, 40),
            ranged(StrategyId::FluidSupply, 20, 40),
            rest(StrategyId::MorphoSupply),
        ],
    },
    ChainPlans {
        chain_id: chains::ARBITRUM,
        low: &[
            ranged(StrategyId::AaveV3Supply, 30, 40),
            rest(StrategyId::UniswapV3SwapLST),
        ],
        medium: &[
            ranged(StrategyId::AaveV3Supply, 40, 60),
            rest(StrategyId::UniswapV3SwapLST),
        ],
        high: &[
            ranged(StrategyId::AaveV3Supply, 60, 80),
            rest(StrategyId::UniswapV3SwapLST),
        ],
    },
];

/// Chains with a planner configuration.
pub fn planned_chains() -> Vec<ChainId> {
    PLANS.iter().map(|p| p.chain_id).collect()
}

/// Configured entries for `(chain_id, tier)`.
pub fn entries(chain_id: ChainId, tier: RiskTier) -> Result<&'static [PlanEntry], PortfolioError> {
    let plans = PLANS
        .iter()
        .find(|p| p.chain_id == chain_id)
        .ok_or(PortfolioError::UnsupportedChain(chain_id))?;
    Ok(match tier {
        RiskTier::Low => plans.low,
        RiskTier::Medium => plans.medium,
        RiskTier::High => plans.high,
    })
}

/// Plan the allocation for one tier.
pub fn plan<R: Rng + ?Sized>(
    chain_id: ChainId,
    tier: RiskTier,
    rng: &mut R,
) -> Result<Vec<AllocationLeg>, PortfolioError> {
    let legs = plan_entries(entries(chain_id, tier)?, chain_id, rng);
    debug!(chain_id, tier = %tier, legs = legs.len(), "Planned allocation");
    Ok(legs)
}

/// Plan every tier for `chain_id`, in `RiskTier::ALL` order.
pub fn plan_all<R: Rng + ?Sized>(
    chain_id: ChainId,
    rng: &mut R,
) -> Result<Vec<(RiskTier, Vec<AllocationLeg>)>, PortfolioError> {
    RiskTier::ALL
        .into_iter()
        .map(|tier| Ok((tier, plan(chain_id, tier, rng)?)))
        .collect()
}

/// Allocate over `entries`, dropping those with no descriptor on `chain_id`.
pub fn plan_entries<R: Rng + ?Sized>(
    entries: &[PlanEntry],
    chain_id: ChainId,
    rng: &mut R,
) -> Vec<AllocationLeg> {
    let matched: Vec<_> = entries
        .iter()
        .filter_map(|entry| match registry::descriptor(entry.strategy, chain_id) {
            Some(descriptor) => Some((descriptor, entry.range)),
            None => {
                warn!(
                    strategy = %entry.strategy,
                    chain_id,
                    "Strategy has no descriptor on chain, dropping from plan"
                );
                None
            }
        })
        .collect();

    let Some(last_index) = matched.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut remainder: i32 = 100;
    let mut legs = Vec::with_capacity(matched.len());
    for (i, (descriptor, range)) in matched.iter().enumerate() {
        let allocation = if i == last_index {
            remainder
        } else if let Some((min, max)) = range {
            let after = (last_index - i) as i32;
            let hi = i32::from(*max).min(remainder - after).max(0);
            let lo = i32::from(*min).min(hi);
            if lo == hi { lo } else { rng.gen_range(lo..=hi) }
        } else {
            0
        };
        remainder -= allocation;
        legs.push(AllocationLeg {
            strategy: descriptor,
            allocation: allocation.clamp(0, 100) as u8,
        });
    }
    legs
}
