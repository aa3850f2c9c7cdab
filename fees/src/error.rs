use tally_types::Wei;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeError {
    #[error("max fee per gas {max_fee} is below the block base fee {base_fee}")]
    FeeCapBelowBaseFee { max_fee: Wei, base_fee: Wei },

    #[error("max priority fee per gas {tip_cap} exceeds max fee per gas {max_fee}")]
    TipAboveFeeCap { tip_cap: Wei, max_fee: Wei },

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),
}
