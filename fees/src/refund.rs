//! Refund decision and fee settlement.
//!
//! The decision is a pure function of the admission outcome. Settlement
//! turns a decision and a [`FeeBreakdown`] into the amounts credited to
//! sender, proposer and treasury; they always sum to the total cost.

use serde::{Deserialize, Serialize};
use tally_oracle::{AdmissionVerdict, OracleError};
use tally_types::Wei;

use crate::breakdown::FeeBreakdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundDecision {
    /// Base fee and tip go back to the sender.
    RefundFull,
    /// Base fee to the treasury, tip to the proposer.
    NoRefund,
}

/// Where a transaction's fee ends up. Produced once per transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSettlement {
    pub decision: RefundDecision,
    pub to_sender: Wei,
    pub to_proposer: Wei,
    pub to_treasury: Wei,
}

impl FeeSettlement {
    /// Sum of all credits. Equals the breakdown's total cost.
    pub fn total(&self) -> Option<Wei> {
        self.to_sender
            .checked_add(self.to_proposer)?
            .checked_add(self.to_treasury)
    }

    pub fn is_refund(&self) -> bool {
        self.decision == RefundDecision::RefundFull
    }
}

pub struct FeeRefundCoordinator;

impl FeeRefundCoordinator {
    /// Accepted votes are refunded; rejected votes and every vote error are not.
    pub fn decide(outcome: &Result<AdmissionVerdict, OracleError>) -> RefundDecision {
        match outcome {
            Ok(AdmissionVerdict::Accept) => RefundDecision::RefundFull,
            Ok(AdmissionVerdict::Reject(_)) | Err(_) => RefundDecision::NoRefund,
        }
    }

    /// Split the fee according to `decision`.
    pub fn settle(decision: RefundDecision, fee: &FeeBreakdown) -> FeeSettlement {
        let settlement = match decision {
            RefundDecision::RefundFull => FeeSettlement {
                decision,
                to_sender: fee.total_cost,
                to_proposer: Wei::ZERO,
                to_treasury: Wei::ZERO,
            },
            RefundDecision::NoRefund => FeeSettlement {
                decision,
                to_sender: Wei::ZERO,
                to_proposer: fee.tip_cost,
                to_treasury: fee.base_cost,
            },
        };
        tracing::trace!(?decision, total = %fee.total_cost, "fee settled");
        settlement
    }
}
