//! Timer ownership for the journey controller.
//!
//! The controller never sleeps. It arms timers by issuing [`TimerCommand`]s
//! to whichever driver hosts it and only honours completions whose
//! [`TimerId`] is still armed in its [`TimerLedger`].
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::time::Duration;

/// Generation token for one armed timer. Never reused within a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Repeating travel animation step.
    Ticker,
    /// One-shot delay before the outcome reveal.
    Settle,
}

/// Instruction for the hosting driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TimerCommand {
    /// Fire `Tick(id)` every `period` until cancelled.
    StartTicker { id: TimerId, period: Duration },
    /// Fire `SettleElapsed(id)` once after `delay`.
    ScheduleSettle { id: TimerId, delay: Duration },
    Cancel { id: TimerId, kind: TimerKind },
}

impl TimerCommand {
    #[must_use]
    pub const fn id(&self) -> TimerId {
        match self {
            Self::StartTicker { id, .. } | Self::ScheduleSettle { id, .. } | Self::Cancel { id, .. } => {
                *id
            }
        }
    }
}

/// Armed-timer bookkeeping. At most one ticker and one settle at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerLedger {
    next: u64,
    ticker: Option<TimerId>,
    settle: Option<TimerId>,
}

impl TimerLedger {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerId> {
        match kind {
            TimerKind::Ticker => &mut self.ticker,
            TimerKind::Settle => &mut self.settle,
        }
    }

    /// Arm a fresh timer of `kind`. Any previous timer of that kind must
    /// already be cancelled; a leftover is replaced and reported.
    pub fn arm(&mut self, kind: TimerKind) -> (TimerId, Option<TimerId>) {
        self.next = self.next.saturating_add(1);
        let id = TimerId(self.next);
        let replaced = self.slot(kind).replace(id);
        (id, replaced)
    }

    /// Disarm `kind`, returning the id that was armed.
    pub fn disarm(&mut self, kind: TimerKind) -> Option<TimerId> {
        self.slot(kind).take()
    }

    #[must_use]
    pub fn is_armed(&self, kind: TimerKind, id: TimerId) -> bool {
        let armed = match kind {
            TimerKind::Ticker => self.ticker,
            TimerKind::Settle => self.settle,
        };
        armed == Some(id)
    }

    #[must_use]
    pub const fn armed(&self, kind: TimerKind) -> Option<TimerId> {
        match kind {
            TimerKind::Ticker => self.ticker,
            TimerKind::Settle => self.settle,
        }
    }

    /// Disarm everything, returning cancel commands for the driver.
    pub fn disarm_all(&mut self) -> SmallVec<[TimerCommand; 2]> {
        let mut cancels = SmallVec::new();
        for kind in [TimerKind::Ticker, TimerKind::Settle] {
            if let Some(id) = self.disarm(kind) {
                cancels.push(TimerCommand::Cancel { id, kind });
            }
        }
        cancels
    }
}
