//! Multi-strategy call composition.
//!
//! A portfolio is a plain ordered list of `(strategy, percent)` legs. Each
//! leg's builder runs in order with its floored share of the amount and the
//! resulting calls are concatenated without interleaving.

use alloy::primitives::{Address, U256};
use tracing::debug;

use crate::error::PortfolioError;
use crate::strategies::{StrategyHandle, StrategyProvider};
use crate::types::{AllocationLeg, Call, ChainId};

#[derive(Clone)]
pub struct StrategyLeg {
    pub strategy: StrategyHandle,
    pub allocation: u8,
}

impl std::fmt::Debug for StrategyLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyLeg")
            .field("strategy", &self.strategy.id())
            .field("allocation", &self.allocation)
            .finish()
    }
}

/// `floor(amount * percent / 100)`
pub fn leg_amount(amount: U256, allocation: u8) -> U256 {
    amount.saturating_mul(U256::from(allocation)) / U256::from(100u8)
}

/// Leg percentages must add up to exactly 100.
pub fn validate_allocation(legs: &[AllocationLeg]) -> Result<(), PortfolioError> {
    let total: u32 = legs.iter().map(|leg| u32::from(leg.allocation)).sum();
    if total != 100 {
        return Err(PortfolioError::InvalidAllocation(total));
    }
    Ok(())
}

/// Resolve planned legs into call builders on `chain_id`.
pub fn resolve_legs(
    legs: &[AllocationLeg],
    chain_id: ChainId,
    provider: &dyn StrategyProvider,
) -> Result<Vec<StrategyLeg>, PortfolioError> {
    legs.iter()
        .map(|leg| {
            Ok(StrategyLeg {
                strategy: provider.strategy(leg.strategy.id, chain_id)?,
                allocation: leg.allocation,
            })
        })
        .collect()
}

pub async fn compose_invest_calls(
    legs: &[StrategyLeg],
    amount: U256,
    user: Address,
    asset: Option<Address>,
) -> Result<Vec<Call>, PortfolioError> {
    let mut calls = Vec::new();
    for leg in legs {
        let leg_amount = leg_amount(amount, leg.allocation);
        if leg_amount.is_zero() {
            debug!(strategy = %leg.strategy.id(), "Skipping zero-amount invest leg");
            continue;
        }
        let leg_calls = leg
            .strategy
            .invest_calls(leg_amount, user, asset)
            .await?;
        debug!(strategy = %leg.strategy.id(), calls = leg_calls.len(), "Composed invest leg");
        calls.extend(leg_calls);
    }
    non_empty(calls)
}

pub async fn compose_redeem_calls(
    legs: &[StrategyLeg],
    amount: U256,
    user: Address,
    asset: Option<Address>,
) -> Result<Vec<Call>, PortfolioError> {
    let mut calls = Vec::new();
    for leg in legs {
        if leg.allocation == 0 {
            continue;
        }
        let leg_calls = leg
            .strategy
            .redeem_calls(leg_amount(amount, leg.allocation), user, asset)
            .await?;
        debug!(strategy = %leg.strategy.id(), calls = leg_calls.len(), "Composed redeem leg");
        calls.extend(leg_calls);
    }
    non_empty(calls)
}

fn non_empty(calls: Vec<Call>) -> Result<Vec<Call>, PortfolioError> {
    if calls.is_empty() {
        Err(PortfolioError::NoCalls)
    } else {
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use super::*;
    use crate::registry;
    use crate::strategies::Strategy;
    use crate::types::{Position, StrategyDescriptor, StrategyId, chains};

    /// Emits one marker call per invest, tagged with the received amount.
    struct Marker {
        descriptor: &'static StrategyDescriptor,
        to: Address,
        fail: bool,
    }

    #[async_trait]
    impl Strategy for Marker {
        fn descriptor(&self) -> &'static StrategyDescriptor {
            self.descriptor
        }

        async fn invest_calls(
            &self,
            amount: U256,
            _user: Address,
            _asset: Option<Address>,
        ) -> Result<Vec<Call>, PortfolioError> {
            if self.fail {
                return Err(PortfolioError::ChainRead("boom".into()));
            }
            Ok(vec![
                Call::native_transfer(self.to, amount),
                Call::native_transfer(self.to, U256::ZERO),
            ])
        }

        async fn redeem_calls(
            &self,
            _amount: U256,
            _user: Address,
            _asset: Option<Address>,
        ) -> Result<Vec<Call>, PortfolioError> {
            Ok(Vec::new())
        }

        async fn profit_of(
            &self,
            _user: Address,
            _position: &Position,
        ) -> Result<Decimal, PortfolioError> {
            Ok(Decimal::ZERO)
        }
    }

    fn leg(byte: u8, allocation: u8, fail: bool) -> StrategyLeg {
        StrategyLeg {
            strategy: Arc::new(Marker {
                descriptor: registry::descriptor(StrategyId::AaveV3Supply, chains::BASE).unwrap(),
                to: Address::repeat_byte(byte),
                fail,
            }),
            allocation,
        }
    }

    #[test]
    fn test_leg_amount_floors() {
        assert_eq!(leg_amount(U256::from(1000u64), 30), U256::from(300u64));
        assert_eq!(leg_amount(U256::from(995u64), 33), U256::from(328u64));
        assert_eq!(leg_amount(U256::from(10u64), 0), U256::ZERO);
    }

    #[tokio::test]
    async fn test_legs_do_not_interleave() {
        let legs = vec![leg(0xa, 30, false), leg(0xb, 70, false)];
        let calls = compose_invest_calls(&legs, U256::from(1000u64), Address::ZERO, None)
            .await
            .unwrap();

        let targets: Vec<Address> = calls.iter().map(|c| c.to).collect();
        assert_eq!(
            targets,
            vec![
                Address::repeat_byte(0xa),
                Address::repeat_byte(0xa),
                Address::repeat_byte(0xb),
                Address::repeat_byte(0xb),
            ]
        );
        assert_eq!(calls[0].value, Some(U256::from(300u64)));
        assert_eq!(calls[2].value, Some(U256::from(700u64)));
    }

    #[tokio::test]
    async fn test_any_leg_failure_aborts() {
        let legs = vec![leg(0xa, 50, false), leg(0xb, 50, true)];
        let err = compose_invest_calls(&legs, U256::from(1000u64), Address::ZERO, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::ChainRead(_)));
    }

    #[tokio::test]
    async fn test_zero_percent_leg_is_skipped() {
        let legs = vec![leg(0xa, 0, true), leg(0xb, 100, false)];
        let calls = compose_invest_calls(&legs, U256::from(1000u64), Address::ZERO, None)
            .await
            .unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.to == Address::repeat_byte(0xb)));
        assert_eq!(calls[0].value, Some(U256::from(1000u64)));
    }

    #[tokio::test]
    async fn test_leg_rounding_to_zero_is_skipped() {
        // floor(3 * 10 / 100) = 0
        let legs = vec![leg(0xa, 10, false), leg(0xb, 90, false)];
        let calls = compose_invest_calls(&legs, U256::from(3u64), Address::ZERO, None)
            .await
            .unwrap();
        assert!(calls.iter().all(|c| c.to == Address::repeat_byte(0xb)));
    }

    #[test]
    fn test_allocation_must_total_100() {
        let aave = registry::descriptor(StrategyId::AaveV3Supply, chains::ARBITRUM).unwrap();
        let lst = registry::descriptor(StrategyId::UniswapV3SwapLST, chains::ARBITRUM).unwrap();
        let legs = |a: u8, b: u8| {
            vec![
                AllocationLeg {
                    strategy: aave,
                    allocation: a,
                },
                AllocationLeg {
                    strategy: lst,
                    allocation: b,
                },
            ]
        };

        assert!(validate_allocation(&legs(30, 70)).is_ok());
        assert!(validate_allocation(&legs(0, 100)).is_ok());
        assert!(matches!(
            validate_allocation(&legs(30, 30)),
            Err(PortfolioError::InvalidAllocation(60))
        ));
        assert!(matches!(
            validate_allocation(&legs(80, 80)),
            Err(PortfolioError::InvalidAllocation(160))
        ));
        assert!(matches!(
            validate_allocation(&[]),
            Err(PortfolioError::InvalidAllocation(0))
        ));
    }

    #[tokio::test]
    async fn test_empty_composition_is_no_calls() {
        let err = compose_invest_calls(&[], U256::from(1u64), Address::ZERO, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::NoCalls));

        let legs = vec![leg(0xa, 100, false)];
        let err = compose_redeem_calls(&legs, U256::from(1u64), Address::ZERO, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortfolioError::NoCalls));
    }
}
