use serde::{Deserialize, Serialize};
use tally_fees::{FeeBreakdown, FeeSettlement, RefundDecision};
use tally_oracle::VoteOutcome;
use tally_types::{Address, Round, TxHash, Wei};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
    Failed,
}

/// Outcome of one included transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub from: Address,
    pub is_vote: bool,
    /// Round the transaction executed in.
    pub round: Round,
    pub status: ReceiptStatus,
    pub gas_used: u64,
    pub effective_gas_price: Wei,
    pub fee: FeeBreakdown,
    pub refund: RefundDecision,
    pub settlement: FeeSettlement,
    pub revert_reason: Option<String>,
    /// Set for votes; `None` for transfers.
    pub vote_outcome: Option<VoteOutcome>,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == ReceiptStatus::Success
    }

    /// Net amount the sender paid for gas after any refund.
    pub fn net_cost(&self) -> Wei {
        self.fee.total_cost.saturating_sub(self.settlement.to_sender)
    }
}
