//! Fee breakdown of a single transaction.
//!
//! ```text
//! tip       = min(max_priority_fee, max_fee − base_fee)
//! base_cost = base_fee × gas_used
//! tip_cost  = tip × gas_used
//! total     = base_cost + tip_cost
//! ```
//!
//! All values are exact integers; overflow is an error.

use serde::{Deserialize, Serialize};
use tally_types::Wei;

use crate::error::FeeError;

/// Check the fee caps against the block base fee and return the effective
/// tip per gas.
pub fn effective_tip(base_fee: Wei, max_fee: Wei, max_priority_fee: Wei) -> Result<Wei, FeeError> {
    if max_priority_fee > max_fee {
        return Err(FeeError::TipAboveFeeCap {
            tip_cap: max_priority_fee,
            max_fee,
        });
    }
    let headroom = max_fee
        .checked_sub(base_fee)
        .ok_or(FeeError::FeeCapBelowBaseFee { max_fee, base_fee })?;
    Ok(max_priority_fee.min(headroom))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub base_fee_per_gas: Wei,
    pub tip_per_gas: Wei,
    pub gas_used: u64,
    pub base_cost: Wei,
    pub tip_cost: Wei,
    pub total_cost: Wei,
}

impl FeeBreakdown {
    pub fn compute(
        base_fee: Wei,
        max_fee: Wei,
        max_priority_fee: Wei,
        gas_used: u64,
    ) -> Result<Self, FeeError> {
        let tip = effective_tip(base_fee, max_fee, max_priority_fee)?;
        Self::from_prices(base_fee, tip, gas_used)
    }

    /// Breakdown for an already-resolved base fee and tip.
    pub fn from_prices(base_fee: Wei, tip: Wei, gas_used: u64) -> Result<Self, FeeError> {
        let base_cost = base_fee
            .checked_mul_gas(gas_used)
            .ok_or(FeeError::Overflow("base cost"))?;
        let tip_cost = tip
            .checked_mul_gas(gas_used)
            .ok_or(FeeError::Overflow("tip cost"))?;
        let total_cost = base_cost
            .checked_add(tip_cost)
            .ok_or(FeeError::Overflow("total cost"))?;
        Ok(Self {
            base_fee_per_gas: base_fee,
            tip_per_gas: tip,
            gas_used,
            base_cost,
            tip_cost,
            total_cost,
        })
    }

    /// Price per gas actually paid: base fee plus effective tip.
    pub fn effective_gas_price(&self) -> Wei {
        self.base_fee_per_gas + self.tip_per_gas
    }
}
