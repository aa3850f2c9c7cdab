//! Gas accounting.

use tally_types::OracleParams;
use thiserror::Error;

/// Gas charged before execution: the base cost plus a per-byte calldata cost.
pub fn intrinsic_gas(params: &OracleParams, calldata: &[u8]) -> u64 {
    let zeros = calldata.iter().filter(|b| **b == 0).count() as u64;
    let non_zeros = calldata.len() as u64 - zeros;
    params
        .tx_base_gas
        .saturating_add(zeros.saturating_mul(params.calldata_zero_byte_gas))
        .saturating_add(non_zeros.saturating_mul(params.calldata_nonzero_byte_gas))
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("out of gas: needed {needed}, {remaining} remaining")]
pub struct OutOfGas {
    pub needed: u64,
    pub remaining: u64,
}

/// Tracks gas consumed against a transaction's gas limit.
///
/// A failed charge consumes everything that is left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// A meter with `used` gas already consumed, e.g. the intrinsic cost.
    pub fn with_used(limit: u64, used: u64) -> Result<Self, OutOfGas> {
        if used > limit {
            return Err(OutOfGas {
                needed: used,
                remaining: limit,
            });
        }
        Ok(Self { limit, used })
    }

    pub fn charge(&mut self, amount: u64) -> Result<(), OutOfGas> {
        let remaining = self.remaining();
        if amount > remaining {
            self.used = self.limit;
            return Err(OutOfGas {
                needed: amount,
                remaining,
            });
        }
        self.used += amount;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_gas_prices_zero_and_non_zero_bytes() {
        let params = OracleParams::dev_defaults();
        assert_eq!(intrinsic_gas(&params, &[]), 21_000);
        assert_eq!(intrinsic_gas(&params, &[0, 0, 1]), 21_000 + 4 + 4 + 16);
    }

    #[test]
    fn meter_charges_until_exhausted() {
        let mut meter = GasMeter::new(100);
        meter.charge(60).unwrap();
        assert_eq!(meter.remaining(), 40);
        meter.charge(40).unwrap();
        assert_eq!(meter.remaining(), 0);
    }

    #[test]
    fn meter_starts_with_prepaid_gas() {
        let meter = GasMeter::with_used(100, 30).unwrap();
        assert_eq!(meter.used(), 30);
        assert_eq!(meter.remaining(), 70);
        assert_eq!(GasMeter::with_used(100, 100).unwrap().remaining(), 0);
        assert_eq!(
            GasMeter::with_used(100, 101).unwrap_err(),
            OutOfGas { needed: 101, remaining: 100 }
        );
    }

    #[test]
    fn failed_charge_consumes_everything() {
        let mut meter = GasMeter::new(100);
        meter.charge(30).unwrap();
        let err = meter.charge(71).unwrap_err();
        assert_eq!(err, OutOfGas { needed: 71, remaining: 70 });
        assert_eq!(meter.used(), 100);
        assert_eq!(meter.remaining(), 0);
    }
}
