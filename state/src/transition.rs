//! The state transition.
//!
//! ```text
//! pre-check ─► buy gas ─► checkpoint ─► execute ─┬─► return unused gas ─► settle fee ─► receipt
//!                                                └─ failed: revert to checkpoint
//! ```
//!
//! Nonce increment and gas purchase happen before the checkpoint, so they
//! survive a failed execution. The vote flag is written after it, so a
//! failed vote never keeps its flag.

use std::sync::Arc;

use tally_fees::{effective_tip, FeeBreakdown, FeeRefundCoordinator, RefundDecision};
use tally_oracle::{
    AdmissionEngine, AdmissionVerdict, OracleError, RoundView, VoteCall, VoteLedger, VoteOutcome,
};
use tally_types::{Address, OracleParams, TxHash, Wei};

use crate::batch::StateBatch;
use crate::block::BlockEnv;
use crate::error::StateError;
use crate::gas::{intrinsic_gas, GasMeter};
use crate::receipt::{Receipt, ReceiptStatus};
use crate::transaction::{Transaction, TxAction};

const OUT_OF_GAS: &str = "out of gas";

struct Execution {
    revert_reason: Option<&'static str>,
    refund: RefundDecision,
    vote_outcome: Option<VoteOutcome>,
}

impl Execution {
    fn succeeded(refund: RefundDecision) -> Self {
        Self {
            revert_reason: None,
            refund,
            vote_outcome: None,
        }
    }

    fn failed(reason: &'static str) -> Self {
        Self {
            revert_reason: Some(reason),
            refund: RefundDecision::NoRefund,
            vote_outcome: None,
        }
    }

    fn with_vote_outcome(self, vote_outcome: Option<VoteOutcome>) -> Self {
        Self {
            vote_outcome,
            ..self
        }
    }
}

pub struct StateTransition {
    params: OracleParams,
    admission: Arc<AdmissionEngine>,
}

impl StateTransition {
    pub fn new(params: OracleParams, admission: Arc<AdmissionEngine>) -> Self {
        Self { params, admission }
    }

    pub fn params(&self) -> &OracleParams {
        &self.params
    }

    pub fn admission(&self) -> &AdmissionEngine {
        &self.admission
    }

    /// Apply `tx` to `batch`.
    ///
    /// `view` is the round view taken once for this transaction. An `Err`
    /// means the transaction is invalid and `batch` is left as it was.
    pub fn apply(
        &self,
        batch: &StateBatch<'_>,
        env: &BlockEnv,
        view: &RoundView,
        tx: &Transaction,
    ) -> Result<Receipt, StateError> {
        let start = batch.checkpoint();
        let result = self.apply_inner(batch, env, view, tx);
        if result.is_err() {
            batch.revert_to(start);
        }
        result
    }

    fn apply_inner(
        &self,
        batch: &StateBatch<'_>,
        env: &BlockEnv,
        view: &RoundView,
        tx: &Transaction,
    ) -> Result<Receipt, StateError> {
        let tx_hash = tx.hash()?;

        // ── Pre-checks ───────────────────────────────────────────────────
        if tx.chain_id != env.chain_id {
            return Err(StateError::WrongChain {
                expected: env.chain_id,
                got: tx.chain_id,
            });
        }
        let sender = batch.account(&tx.from)?;
        if sender.nonce != tx.nonce {
            return Err(StateError::NonceMismatch {
                address: tx.from,
                expected: sender.nonce,
                got: tx.nonce,
            });
        }
        let tip = effective_tip(
            env.base_fee_per_gas,
            tx.max_fee_per_gas,
            tx.max_priority_fee_per_gas,
        )?;
        let intrinsic = intrinsic_gas(&self.params, &tx.calldata()?);
        let mut meter =
            GasMeter::with_used(tx.gas_limit, intrinsic).map_err(|_| StateError::IntrinsicGas {
                limit: tx.gas_limit,
                required: intrinsic,
            })?;
        let max_cost = tx
            .max_fee_per_gas
            .checked_mul_gas(tx.gas_limit)
            .and_then(|gas| gas.checked_add(tx.value()))
            .ok_or(StateError::Overflow("maximum transaction cost"))?;
        if sender.balance < max_cost {
            return Err(StateError::InsufficientFunds {
                address: tx.from,
                needed: max_cost,
                available: sender.balance,
            });
        }

        // ── Buy gas ──────────────────────────────────────────────────────
        let price = env
            .base_fee_per_gas
            .checked_add(tip)
            .ok_or(StateError::Overflow("gas price"))?;
        let prepaid = price
            .checked_mul_gas(tx.gas_limit)
            .ok_or(StateError::Overflow("gas purchase"))?;
        batch.increment_nonce(&tx.from)?;
        batch.debit(&tx.from, prepaid)?;

        // ── Execute ──────────────────────────────────────────────────────
        let checkpoint = batch.checkpoint();
        let execution = match &tx.action {
            TxAction::Transfer { to, value } => self.transfer(batch, &tx.from, to, *value)?,
            TxAction::Vote(call) => self.vote(batch, view, &tx.from, call, tx_hash, &mut meter)?,
        };
        if execution.revert_reason.is_some() {
            batch.revert_to(checkpoint);
        }

        // ── Return unused gas ────────────────────────────────────────────
        let gas_used = meter.used();
        let unused = price
            .checked_mul_gas(meter.remaining())
            .ok_or(StateError::Overflow("gas return"))?;
        batch.credit(&tx.from, unused)?;

        // ── Settle the fee ───────────────────────────────────────────────
        let fee = FeeBreakdown::from_prices(env.base_fee_per_gas, tip, gas_used)?;
        let settlement = FeeRefundCoordinator::settle(execution.refund, &fee);
        batch.credit(&tx.from, settlement.to_sender)?;
        batch.credit(&env.proposer, settlement.to_proposer)?;
        batch.credit(&self.params.treasury_address, settlement.to_treasury)?;

        let status = match execution.revert_reason {
            None => ReceiptStatus::Success,
            Some(_) => ReceiptStatus::Failed,
        };
        tracing::debug!(
            tx = %tx_hash,
            from = %tx.from,
            ?status,
            gas_used,
            refund = ?execution.refund,
            reason = execution.revert_reason.unwrap_or(""),
            "transaction applied"
        );

        Ok(Receipt {
            tx_hash,
            from: tx.from,
            is_vote: tx.is_vote(),
            round: view.round,
            status,
            gas_used,
            effective_gas_price: price,
            fee,
            refund: execution.refund,
            settlement,
            revert_reason: execution.revert_reason.map(str::to_string),
            vote_outcome: execution.vote_outcome,
        })
    }

    fn transfer(
        &self,
        batch: &StateBatch<'_>,
        from: &Address,
        to: &Address,
        value: Wei,
    ) -> Result<Execution, StateError> {
        batch.debit(from, value)?;
        batch.credit(to, value)?;
        Ok(Execution::succeeded(RefundDecision::NoRefund))
    }

    fn vote(
        &self,
        batch: &StateBatch<'_>,
        view: &RoundView,
        voter: &Address,
        call: &VoteCall,
        tx_hash: TxHash,
        meter: &mut GasMeter,
    ) -> Result<Execution, StateError> {
        let read_gas = self
            .params
            .eligibility_read_gas
            .saturating_add(self.params.ledger_read_gas);
        let out_of_gas =
            || Execution::failed(OUT_OF_GAS).with_vote_outcome(Some(VoteOutcome::OutOfGas));
        if meter.charge(read_gas).is_err() {
            return Ok(out_of_gas());
        }

        let ledger = VoteLedger::new(batch);
        let outcome = self.admission.admit(&ledger, view, voter, call, tx_hash);
        let refund = FeeRefundCoordinator::decide(&outcome);
        let vote_outcome = VoteOutcome::from_admission(&outcome);
        let execution = match outcome {
            Ok(AdmissionVerdict::Accept) => {
                let write_gas = self.params.ledger_write_gas.saturating_add(
                    self.params
                        .report_gas
                        .saturating_mul(call.reports.len() as u64),
                );
                if meter.charge(write_gas).is_err() {
                    return Ok(out_of_gas());
                }
                Execution::succeeded(refund)
            }
            Ok(AdmissionVerdict::Reject(reason)) => Execution::failed(reason.as_str()),
            Err(OracleError::Store(e)) => return Err(e.into()),
            Err(e) => Execution::failed(e.revert_reason()),
        };
        Ok(execution.with_vote_outcome(vote_outcome))
    }
}
