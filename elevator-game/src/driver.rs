//! Deterministic simulated-time driver.
//!
//! [`SimulatedDriver`] hosts a [`JourneySession`] on a virtual millisecond
//! clock, executing the session's [`TimerCommand`]s without sleeping. Tests
//! and the headless tester use it to replay journeys exactly.
use crate::audio::AudioSink;
use crate::journey::{
    Dispatch, JourneyError, JourneyEvent, JourneySession, SessionEvent, TimerCommand, TimerId,
    TimerKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledTimer {
    id: TimerId,
    kind: TimerKind,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Pending timers on a virtual clock.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now_ms: u64,
    timers: Vec<ScheduledTimer>,
    cancelled: Vec<(TimerId, TimerKind)>,
}

impl VirtualClock {
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Every cancel command received, in order.
    #[must_use]
    pub fn cancelled(&self) -> &[(TimerId, TimerKind)] {
        &self.cancelled
    }

    pub fn apply(&mut self, commands: &[TimerCommand]) {
        for command in commands {
            match *command {
                TimerCommand::StartTicker { id, period } => {
                    let period_ms = duration_ms(period).max(1);
                    self.timers.push(ScheduledTimer {
                        id,
                        kind: TimerKind::Ticker,
                        due_ms: self.now_ms.saturating_add(period_ms),
                        period_ms: Some(period_ms),
                    });
                }
                TimerCommand::ScheduleSettle { id, delay } => {
                    self.timers.push(ScheduledTimer {
                        id,
                        kind: TimerKind::Settle,
                        due_ms: self.now_ms.saturating_add(duration_ms(delay)),
                        period_ms: None,
                    });
                }
                TimerCommand::Cancel { id, kind } => {
                    self.timers.retain(|timer| timer.id != id);
                    self.cancelled.push((id, kind));
                }
            }
        }
    }

    /// Pop the earliest timer due at or before `deadline`, rescheduling
    /// repeating timers.
    fn pop_due(&mut self, deadline: u64) -> Option<ScheduledTimer> {
        let (index, timer) = self
            .timers
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= deadline)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.id))?;
        self.now_ms = self.now_ms.max(timer.due_ms);
        match timer.period_ms {
            Some(period) => {
                if let Some(slot) = self.timers.get_mut(index) {
                    slot.due_ms = slot.due_ms.saturating_add(period);
                }
            }
            None => {
                self.timers.remove(index);
            }
        }
        Some(timer)
    }

    fn next_due_ms(&self) -> Option<u64> {
        self.timers.iter().map(|timer| timer.due_ms).min()
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Session hosted on a [`VirtualClock`], recording every emitted event.
#[derive(Debug, Clone)]
pub struct SimulatedDriver<A> {
    session: JourneySession<A>,
    clock: VirtualClock,
    events: Vec<JourneyEvent>,
}

impl<A: AudioSink> SimulatedDriver<A> {
    pub fn new(session: JourneySession<A>) -> Self {
        Self {
            session,
            clock: VirtualClock::default(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn session(&self) -> &JourneySession<A> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut JourneySession<A> {
        &mut self.session
    }

    #[must_use]
    pub const fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    #[must_use]
    pub fn events(&self) -> &[JourneyEvent] {
        &self.events
    }

    /// Display values produced by ticks so far.
    #[must_use]
    pub fn stepped_floors(&self) -> Vec<i32> {
        self.events
            .iter()
            .filter_map(JourneyEvent::stepped_floor)
            .collect()
    }

    fn absorb(&mut self, dispatch: Dispatch) {
        self.clock.apply(&dispatch.timers);
        self.events.extend(dispatch.events);
    }

    /// Dispatch a user event at the current virtual time.
    ///
    /// # Errors
    ///
    /// Returns the session's [`JourneyError`]; refusals still record their
    /// events.
    pub fn send(&mut self, event: SessionEvent) -> Result<(), JourneyError> {
        let (dispatch, result) = self.session.dispatch_recorded(event);
        self.absorb(dispatch);
        result
    }

    /// Type a floor number on the keypad. Refused keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`JourneyError::NotPermitted`] outside the input phase.
    pub fn compose(&mut self, keys: &str) -> Result<(), JourneyError> {
        for key in keys.chars() {
            let event = match key {
                '-' => SessionEvent::Minus,
                digit => match digit.to_digit(10).and_then(|d| u8::try_from(d).ok()) {
                    Some(d) => SessionEvent::Digit(d),
                    None => continue,
                },
            };
            self.send(event)?;
        }
        Ok(())
    }

    /// Advance virtual time by `ms`, firing due timers in order.
    ///
    /// # Errors
    ///
    /// Propagates a failed timer dispatch.
    pub fn advance(&mut self, ms: u64) -> Result<(), JourneyError> {
        let deadline = self.clock.now_ms.saturating_add(ms);
        while let Some(timer) = self.clock.pop_due(deadline) {
            self.fire(timer.kind, timer.id)?;
        }
        self.clock.now_ms = deadline;
        Ok(())
    }

    /// Fire timers until none remain armed. Stops after `max_fires`.
    ///
    /// # Errors
    ///
    /// Propagates a failed timer dispatch.
    pub fn run_until_idle(&mut self, max_fires: usize) -> Result<usize, JourneyError> {
        let mut fired = 0;
        while fired < max_fires {
            let Some(due) = self.clock.next_due_ms() else {
                break;
            };
            let Some(timer) = self.clock.pop_due(due) else {
                break;
            };
            self.fire(timer.kind, timer.id)?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Deliver a completion for `id`, whether or not it is still armed.
    ///
    /// # Errors
    ///
    /// Propagates a failed timer dispatch.
    pub fn fire(&mut self, kind: TimerKind, id: TimerId) -> Result<(), JourneyError> {
        let event = match kind {
            TimerKind::Ticker => SessionEvent::Tick(id),
            TimerKind::Settle => SessionEvent::SettleElapsed(id),
        };
        let dispatch = self.session.dispatch(event)?;
        self.absorb(dispatch);
        Ok(())
    }

    /// Tear the session down, cancelling armed timers on the clock.
    pub fn teardown(&mut self) {
        let dispatch = self.session.teardown();
        self.absorb(dispatch);
    }

    pub fn into_session(self) -> JourneySession<A> {
        self.session
    }
}
