//! Round clock — the single source of the current oracle round and epoch.
//!
//! The clock has exactly one writer, [`RoundAdvancer`], held by the block
//! finalization path, and any number of [`RoundReader`]s. Both share a
//! `watch` channel, so every read returns one whole [`RoundView`] and a
//! reader can never observe a round from one update and an epoch from
//! another.
//!
//! Callers that process a transaction take one [`RoundView`] up front and
//! use it for the whole transaction; the clock only moves between blocks.

use serde::{Deserialize, Serialize};
use tally_types::{Epoch, OracleParams, Round};
use tokio::sync::watch;

use crate::error::OracleError;

/// Consistent snapshot of the clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub round: Round,
    pub epoch: Epoch,
    /// Block at which the current round started.
    pub round_start_block: u64,
    /// Block at which the current epoch started.
    pub epoch_start_block: u64,
}

impl RoundView {
    pub fn genesis() -> Self {
        Self::default()
    }
}

/// Round and epoch lengths in blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSchedule {
    vote_period: u64,
    epoch_period: u64,
}

impl RoundSchedule {
    pub fn new(vote_period: u64, epoch_period: u64) -> Result<Self, OracleError> {
        if vote_period == 0 || epoch_period == 0 {
            return Err(OracleError::InvalidSchedule(format!(
                "periods must be non-zero (vote_period={vote_period}, epoch_period={epoch_period})"
            )));
        }
        Ok(Self {
            vote_period,
            epoch_period,
        })
    }

    pub fn from_params(params: &OracleParams) -> Result<Self, OracleError> {
        Self::new(params.vote_period, params.epoch_period)
    }

    pub fn vote_period(&self) -> u64 {
        self.vote_period
    }

    pub fn epoch_period(&self) -> u64 {
        self.epoch_period
    }

    /// The view after finalizing `block_number`, without touching any clock.
    ///
    /// The round advances once a full vote period has elapsed since the
    /// round started, the epoch likewise. Blocks at or before both starts
    /// leave the view unchanged, so replaying a block never moves it twice.
    pub fn advance(&self, current: RoundView, block_number: u64) -> (RoundView, Vec<ClockEvent>) {
        let mut next = current;
        let mut events = Vec::new();
        if block_number <= current.round_start_block && block_number <= current.epoch_start_block
        {
            return (next, events);
        }

        if block_number.saturating_sub(current.round_start_block) >= self.vote_period {
            next.round = current.round.next();
            next.round_start_block = block_number;
            events.push(ClockEvent::RoundAdvanced {
                from: current.round,
                to: next.round,
                at_block: block_number,
            });
        }

        if block_number.saturating_sub(current.epoch_start_block) >= self.epoch_period {
            next.epoch = current.epoch.next();
            next.epoch_start_block = block_number;
            events.push(ClockEvent::EpochAdvanced {
                from: current.epoch,
                to: next.epoch,
                at_block: block_number,
            });
        }
        (next, events)
    }
}

/// A change of round or epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    RoundAdvanced { from: Round, to: Round, at_block: u64 },
    EpochAdvanced { from: Epoch, to: Epoch, at_block: u64 },
}

/// Constructor for the writer/reader pair.
pub struct RoundClock;

impl RoundClock {
    /// Create a clock starting from `initial` (genesis or a persisted view).
    pub fn new(schedule: RoundSchedule, initial: RoundView) -> (RoundAdvancer, RoundReader) {
        let (tx, rx) = watch::channel(initial);
        (RoundAdvancer { schedule, tx }, RoundReader { rx })
    }
}

/// The only handle that can move the clock forward. Not `Clone`.
pub struct RoundAdvancer {
    schedule: RoundSchedule,
    tx: watch::Sender<RoundView>,
}

impl RoundAdvancer {
    /// A new reader of this clock.
    pub fn reader(&self) -> RoundReader {
        RoundReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn view(&self) -> RoundView {
        *self.tx.borrow()
    }

    pub fn schedule(&self) -> RoundSchedule {
        self.schedule
    }

    /// Called once a block is final; publishes [`RoundSchedule::advance`].
    pub fn on_block_finalized(&mut self, block_number: u64) -> Vec<ClockEvent> {
        let (next, events) = self.schedule.advance(self.view(), block_number);
        if !events.is_empty() {
            self.tx.send_replace(next);
            tracing::debug!(
                round = next.round.as_u64(),
                epoch = next.epoch.as_u64(),
                block = block_number,
                "round clock advanced"
            );
        }
        events
    }

    /// Force the round forward outside the block schedule (operator trigger).
    pub fn advance_round(&mut self, at_block: u64) -> ClockEvent {
        let current = self.view();
        let next = RoundView {
            round: current.round.next(),
            round_start_block: at_block.max(current.round_start_block),
            ..current
        };
        self.tx.send_replace(next);
        tracing::info!(round = next.round.as_u64(), "round advanced by external trigger");
        ClockEvent::RoundAdvanced {
            from: current.round,
            to: next.round,
            at_block,
        }
    }
}

/// Read-only handle on the clock.
#[derive(Clone)]
pub struct RoundReader {
    rx: watch::Receiver<RoundView>,
}

impl RoundReader {
    pub fn view(&self) -> RoundView {
        *self.rx.borrow()
    }

    pub fn current_round(&self) -> Round {
        self.rx.borrow().round
    }

    pub fn current_epoch(&self) -> Epoch {
        self.rx.borrow().epoch
    }

    /// Wait until the clock moves, then return the new view.
    pub async fn changed(&mut self) -> Result<RoundView, OracleError> {
        self.rx.changed().await.map_err(|_| OracleError::ClockClosed)?;
        Ok(*self.rx.borrow_and_update())
    }
}
