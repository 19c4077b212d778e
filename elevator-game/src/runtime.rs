//! Tokio host for a [`JourneySession`].
//!
//! One task owns the session. Commands arrive over an `mpsc` channel, the
//! latest snapshot is published over `watch`, and journey events fan out over
//! `broadcast`. The ticker is an [`Interval`] and the settle delay a pinned
//! [`Sleep`]; cancelling either drops it. Ticker periods below one
//! millisecond are raised to one, since an [`Interval`] cannot tick at zero.
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, Sleep};

use crate::audio::AudioSink;
use crate::constants::LOG_TARGET_RUNTIME;
use crate::journey::{
    Dispatch, JourneyError, JourneyEvent, JourneySession, SessionEvent, SessionSnapshot,
    TimerCommand, TimerId,
};

const COMMAND_CAPACITY: usize = 64;
const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session task is no longer running")]
    Closed,
    #[error(transparent)]
    Journey(#[from] JourneyError),
    #[error("session task failed: {0}")]
    Join(String),
}

enum Command {
    Event(SessionEvent, oneshot::Sender<Result<(), JourneyError>>),
    Shutdown,
}

#[derive(Default)]
struct Timers {
    ticker: Option<(TimerId, Interval)>,
    settle: Option<(TimerId, Pin<Box<Sleep>>)>,
}

impl Timers {
    fn apply(&mut self, commands: &[TimerCommand]) {
        for command in commands {
            match *command {
                TimerCommand::StartTicker { id, period } => {
                    let period = period.max(Duration::from_millis(1));
                    let interval = tokio::time::interval_at(Instant::now() + period, period);
                    self.ticker = Some((id, interval));
                }
                TimerCommand::ScheduleSettle { id, delay } => {
                    self.settle = Some((id, Box::pin(tokio::time::sleep(delay))));
                }
                TimerCommand::Cancel { id, .. } => {
                    if self.ticker.as_ref().is_some_and(|(armed, _)| *armed == id) {
                        self.ticker = None;
                    }
                    if self.settle.as_ref().is_some_and(|(armed, _)| *armed == id) {
                        self.settle = None;
                    }
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<(TimerId, Interval)>) -> TimerId {
    match ticker {
        Some((id, interval)) => {
            interval.tick().await;
            *id
        }
        None => std::future::pending().await,
    }
}

async fn settle_elapsed(settle: &mut Option<(TimerId, Pin<Box<Sleep>>)>) -> TimerId {
    match settle {
        Some((id, sleep)) => {
            sleep.as_mut().await;
            *id
        }
        None => std::future::pending().await,
    }
}

struct Host<A> {
    session: JourneySession<A>,
    timers: Timers,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<JourneyEvent>,
}

impl<A: AudioSink> Host<A> {
    fn absorb(&mut self, dispatch: Dispatch) {
        self.timers.apply(&dispatch.timers);
        for event in dispatch.events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    fn handle(&mut self, event: SessionEvent) -> Result<(), JourneyError> {
        let (dispatch, result) = self.session.dispatch_recorded(event);
        self.absorb(dispatch);
        self.snapshots.send_replace(self.session.snapshot());
        result
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> JourneySession<A> {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Event(event, reply)) => {
                        let result = self.handle(event);
                        // The caller may have stopped waiting.
                        let _ = reply.send(result);
                    }
                    Some(Command::Shutdown) | None => break,
                },
                id = next_tick(&mut self.timers.ticker) => {
                    if let Err(err) = self.handle(SessionEvent::Tick(id)) {
                        log::error!(target: LOG_TARGET_RUNTIME, "tick {} failed: {err}", id.0);
                    }
                }
                id = settle_elapsed(&mut self.timers.settle) => {
                    self.timers.settle = None;
                    if let Err(err) = self.handle(SessionEvent::SettleElapsed(id)) {
                        log::error!(target: LOG_TARGET_RUNTIME, "settle {} failed: {err}", id.0);
                    }
                }
            }
        }
        let dispatch = self.session.teardown();
        self.absorb(dispatch);
        self.snapshots.send_replace(self.session.snapshot());
        log::debug!(target: LOG_TARGET_RUNTIME, "session task stopped");
        self.session
    }
}

/// Handle to a session running on its own tokio task.
///
/// Dropping the handle asks the task to stop. The task still tears the
/// session down, so a moving elevator's loop cue is stopped on the sink.
pub struct SessionRuntime<A: AudioSink + Send + 'static> {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<JourneyEvent>,
    handle: Option<JoinHandle<JourneySession<A>>>,
}

impl<A: AudioSink + Send + 'static> SessionRuntime<A> {
    /// Spawn the session task. Must be called from within a tokio runtime.
    pub fn spawn(session: JourneySession<A>) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let host = Host {
            session,
            timers: Timers::default(),
            snapshots: snapshot_tx,
            events: event_tx.clone(),
        };
        let handle = tokio::spawn(host.run(command_rx));
        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            handle: Some(handle),
        }
    }

    /// Deliver one event and wait for the session to process it.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Journey`] when the session refuses the event
    /// and [`RuntimeError::Closed`] once the task has stopped.
    pub async fn send(&self, event: SessionEvent) -> Result<(), RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Event(event, reply_tx))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        reply_rx.await.map_err(|_| RuntimeError::Closed)??;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<JourneyEvent> {
        self.events.subscribe()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Closed`] if the task stops first.
    pub async fn wait_for<F>(&self, predicate: F) -> Result<SessionSnapshot, RuntimeError>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut receiver = self.snapshots.clone();
        let snapshot = receiver
            .wait_for(predicate)
            .await
            .map_err(|_| RuntimeError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Tear the session down and hand it back.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Join`] if the task panicked or was aborted.
    pub async fn shutdown(mut self) -> Result<JourneySession<A>, RuntimeError> {
        let handle = self.handle.take().ok_or(RuntimeError::Closed)?;
        // A closed channel means the loop is already on its way out.
        let _ = self.commands.send(Command::Shutdown).await;
        handle.await.map_err(|err| RuntimeError::Join(err.to_string()))
    }
}

impl<A: AudioSink + Send + 'static> Drop for SessionRuntime<A> {
    fn drop(&mut self) {
        if self.handle.take().is_some() {
            // A full queue still ends the loop: the sender closes with this handle.
            let _ = self.commands.try_send(Command::Shutdown);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::audio::{AudioCall, AudioCue, RecordingAudio};
    use crate::config::ElevatorCfg;
    use crate::floor::FloorType;
    use crate::journey::{GameStatus, TimerKind};
    use crate::probability::ProbabilityConfig;
    use std::time::Duration;

    fn cfg(weights: ProbabilityConfig) -> ElevatorCfg {
        ElevatorCfg {
            weights,
            ..ElevatorCfg::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn journey_reveals_after_travel_and_settle() {
        let weights = ProbabilityConfig::only(FloorType::Cat);
        let session = JourneySession::with_config(&cfg(weights), 9, RecordingAudio::default());
        let runtime = SessionRuntime::spawn(session);
        let started = Instant::now();
        runtime.send(SessionEvent::Digit(3)).await.unwrap();
        runtime.send(SessionEvent::Confirm).await.unwrap();

        let snapshot = runtime
            .wait_for(|snapshot| snapshot.status == GameStatus::Arrival)
            .await
            .unwrap();
        assert_eq!(snapshot.floor, 3);
        assert_eq!(snapshot.floor_type, FloorType::Cat);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(700), "revealed early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(800), "revealed late: {elapsed:?}");

        let session = runtime.shutdown().await.unwrap();
        assert_eq!(session.audio().played(AudioCue::Cat), 1);
        assert_eq!(session.audio().played(AudioCue::Ding), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn events_stream_each_step() {
        let runtime = SessionRuntime::spawn(JourneySession::new(4));
        let mut events = runtime.subscribe();
        runtime.send(SessionEvent::Minus).await.unwrap();
        runtime.send(SessionEvent::Digit(1)).await.unwrap();
        runtime.send(SessionEvent::Confirm).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            JourneyEvent::Departed { from: 1, target: -1 }
        );
        assert_eq!(events.recv().await.unwrap(), JourneyEvent::Stepped { floor: 0 });
        assert_eq!(events.recv().await.unwrap(), JourneyEvent::Stepped { floor: -1 });
        assert!(matches!(
            events.recv().await.unwrap(),
            JourneyEvent::Resolved { floor: -1, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn refused_events_return_journey_errors() {
        let runtime = SessionRuntime::spawn(JourneySession::new(4));
        let err = runtime.send(SessionEvent::Restart).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Journey(JourneyError::NotPermitted { .. })
        ));
        assert_eq!(runtime.snapshot().status, GameStatus::Input);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_mid_journey_resets_the_session() {
        let runtime = SessionRuntime::spawn(JourneySession::new(8));
        for digit in [5, 0] {
            runtime.send(SessionEvent::Digit(digit)).await.unwrap();
        }
        runtime.send(SessionEvent::Confirm).await.unwrap();
        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(runtime.snapshot().displayed_floor, 4);

        let session = runtime.shutdown().await.unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.status, GameStatus::Input);
        assert_eq!(snapshot.displayed_floor, 1);
        let timers = session.controller().timers();
        assert!(timers.armed(TimerKind::Ticker).is_none());
        assert!(timers.armed(TimerKind::Settle).is_none());
    }

    #[derive(Clone, Default)]
    struct SharedAudio(Arc<Mutex<Vec<AudioCall>>>);

    impl AudioSink for SharedAudio {
        fn play(&mut self, cue: AudioCue) {
            self.0.lock().unwrap().push(AudioCall::Play(cue));
        }

        fn stop(&mut self, cue: AudioCue) {
            self.0.lock().unwrap().push(AudioCall::Stop(cue));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_the_task() {
        let runtime = SessionRuntime::spawn(JourneySession::new(2));
        let mut snapshots = runtime.watch();
        drop(runtime);
        while snapshots.changed().await.is_ok() {}
        assert_eq!(snapshots.borrow().status, GameStatus::Input);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_mid_journey_stops_the_moving_cue() {
        let audio = SharedAudio::default();
        let weights = ProbabilityConfig::only(FloorType::Cat);
        let session = JourneySession::with_config(&cfg(weights), 6, audio.clone());
        let runtime = SessionRuntime::spawn(session);
        let mut snapshots = runtime.watch();
        runtime.send(SessionEvent::Digit(9)).await.unwrap();
        runtime.send(SessionEvent::Confirm).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(snapshots.borrow().status, GameStatus::Moving);

        drop(runtime);
        while snapshots.changed().await.is_ok() {}
        let snapshot = snapshots.borrow().clone();
        assert_eq!(snapshot.status, GameStatus::Input);
        assert_eq!(snapshot.displayed_floor, 1);
        let calls = audio.0.lock().unwrap().clone();
        assert!(calls.contains(&AudioCall::Play(AudioCue::Moving)));
        assert_eq!(calls.last(), Some(&AudioCall::Stop(AudioCue::Moving)));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_tick_period_still_travels() {
        let session_cfg = ElevatorCfg {
            tick_ms: 0,
            ..cfg(ProbabilityConfig::only(FloorType::Cat))
        };
        let session = JourneySession::with_config(&session_cfg, 3, RecordingAudio::default());
        let runtime = SessionRuntime::spawn(session);
        runtime.send(SessionEvent::Digit(5)).await.unwrap();
        runtime.send(SessionEvent::Confirm).await.unwrap();

        let snapshot = runtime
            .wait_for(|snapshot| snapshot.status == GameStatus::Arrival)
            .await
            .unwrap();
        assert_eq!(snapshot.floor, 5);
        assert_eq!(snapshot.displayed_floor, 5);
        runtime.send(SessionEvent::Digit(1)).await.unwrap_err();
    }
}
