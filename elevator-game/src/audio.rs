//! Audio side-channel.
//!
//! The core never owns playback. It asks an [`AudioSink`] to play or stop a
//! cue and moves on; sinks must not block and must swallow their own
//! failures.
use serde::{Deserialize, Serialize};

/// Cue keys understood by the playback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Click,
    /// Looping while the elevator travels.
    Moving,
    Ding,
    Gold,
    Zombie,
    Normal,
    Cat,
    Bomb,
}

impl AudioCue {
    #[must_use]
    pub const fn is_looping(self) -> bool {
        matches!(self, Self::Moving)
    }
}

/// Fire-and-forget playback collaborator.
pub trait AudioSink {
    fn play(&mut self, cue: AudioCue);

    fn stop(&mut self, cue: AudioCue);
}

/// Sink that discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}

    fn stop(&mut self, _cue: AudioCue) {}
}

/// Single recorded playback call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "cue", rename_all = "snake_case")]
pub enum AudioCall {
    Play(AudioCue),
    Stop(AudioCue),
}

/// Sink that records calls in order, for harnesses and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    calls: Vec<AudioCall>,
}

impl RecordingAudio {
    #[must_use]
    pub fn calls(&self) -> &[AudioCall] {
        &self.calls
    }

    #[must_use]
    pub fn played(&self, cue: AudioCue) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == AudioCall::Play(cue))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.calls.push(AudioCall::Play(cue));
    }

    fn stop(&mut self, cue: AudioCue) {
        self.calls.push(AudioCall::Stop(cue));
    }
}

/// Mute gate in front of a sink.
///
/// Tracks whether the looping cue is logically active so that toggling mute
/// mid-journey silences it and unmuting resumes it.
#[derive(Debug, Clone, Default)]
pub struct AudioGate<A> {
    sink: A,
    muted: bool,
    looping: bool,
}

impl<A: AudioSink> AudioGate<A> {
    pub const fn new(sink: A) -> Self {
        Self {
            sink,
            muted: false,
            looping: false,
        }
    }

    #[must_use]
    pub const fn muted(&self) -> bool {
        self.muted
    }

    #[must_use]
    pub const fn sink(&self) -> &A {
        &self.sink
    }

    pub const fn sink_mut(&mut self) -> &mut A {
        &mut self.sink
    }

    pub fn into_sink(self) -> A {
        self.sink
    }

    pub fn play(&mut self, cue: AudioCue) {
        if cue.is_looping() {
            self.looping = true;
        }
        if !self.muted {
            self.sink.play(cue);
        }
    }

    pub fn stop(&mut self, cue: AudioCue) {
        if cue.is_looping() {
            self.looping = false;
        }
        if !self.muted {
            self.sink.stop(cue);
        }
    }

    /// Flip the mute flag, returning the new value.
    pub fn toggle_mute(&mut self) -> bool {
        if self.muted {
            self.muted = false;
            if self.looping {
                self.sink.play(AudioCue::Moving);
            }
        } else {
            if self.looping {
                self.sink.stop(AudioCue::Moving);
            }
            self.muted = true;
        }
        self.muted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_gate_forwards_nothing() {
        let mut gate = AudioGate::new(RecordingAudio::default());
        assert!(gate.toggle_mute());
        gate.play(AudioCue::Click);
        gate.play(AudioCue::Ding);
        gate.stop(AudioCue::Moving);
        assert!(gate.sink().calls().is_empty());
    }

    #[test]
    fn toggling_mute_pauses_and_resumes_loop() {
        let mut gate = AudioGate::new(RecordingAudio::default());
        gate.play(AudioCue::Moving);
        gate.toggle_mute();
        gate.toggle_mute();
        assert_eq!(
            gate.sink().calls(),
            &[
                AudioCall::Play(AudioCue::Moving),
                AudioCall::Stop(AudioCue::Moving),
                AudioCall::Play(AudioCue::Moving),
            ]
        );
    }

    #[test]
    fn loop_stopped_while_muted_is_not_resumed() {
        let mut gate = AudioGate::new(RecordingAudio::default());
        gate.play(AudioCue::Moving);
        gate.toggle_mute();
        gate.stop(AudioCue::Moving);
        gate.toggle_mute();
        assert_eq!(gate.sink().played(AudioCue::Moving), 1);
    }
}
