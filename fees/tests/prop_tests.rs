use proptest::prelude::*;

use tally_fees::{effective_tip, FeeBreakdown, FeeRefundCoordinator, RefundDecision};
use tally_types::Wei;

proptest! {
    /// The tip never exceeds the headroom above the base fee.
    #[test]
    fn effective_tip_is_capped_by_headroom(
        base in 0u128..1_000_000_000_000,
        headroom in 0u128..1_000_000_000_000,
        priority in 0u128..1_000_000_000_000,
    ) {
        let max_fee = base + headroom;
        let priority = priority.min(max_fee);
        let tip = effective_tip(Wei::new(base), Wei::new(max_fee), Wei::new(priority)).unwrap();
        prop_assert_eq!(tip, Wei::new(priority.min(headroom)));
        prop_assert!(Wei::new(base) + tip <= Wei::new(max_fee));
    }

    /// total = base + tip and equals effective price × gas, with no remainder.
    #[test]
    fn total_cost_is_exact(
        base in 0u128..1_000_000_000_000,
        headroom in 0u128..1_000_000_000_000,
        priority in 0u128..1_000_000_000_000,
        gas in 0u64..30_000_000,
    ) {
        let max_fee = base + headroom;
        let priority = priority.min(max_fee);
        let fee = FeeBreakdown::compute(Wei::new(base), Wei::new(max_fee), Wei::new(priority), gas).unwrap();

        prop_assert_eq!(fee.tip_per_gas, Wei::new(priority.min(headroom)));
        prop_assert_eq!(fee.total_cost, fee.base_cost + fee.tip_cost);
        prop_assert_eq!(fee.effective_gas_price().checked_mul_gas(gas), Some(fee.total_cost));
    }

    /// Settlement never creates or destroys value.
    #[test]
    fn settlement_conserves_fee(
        base in 0u128..1_000_000_000_000,
        tip in 0u128..1_000_000_000_000,
        gas in 0u64..30_000_000,
        refund in any::<bool>(),
    ) {
        let fee = FeeBreakdown::from_prices(Wei::new(base), Wei::new(tip), gas).unwrap();
        let decision = if refund { RefundDecision::RefundFull } else { RefundDecision::NoRefund };
        let s = FeeRefundCoordinator::settle(decision, &fee);
        prop_assert_eq!(s.total(), Some(fee.total_cost));
        if refund {
            prop_assert!(s.to_proposer.is_zero() && s.to_treasury.is_zero());
        } else {
            prop_assert_eq!(s.to_proposer, fee.tip_cost);
            prop_assert_eq!(s.to_treasury, fee.base_cost);
        }
    }
}
