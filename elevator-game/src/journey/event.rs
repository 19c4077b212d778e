//! Structured events emitted by the journey controller.
//!
//! Drivers and harnesses consume these instead of diffing snapshots; the
//! presentation layer may ignore them entirely.
use serde::{Deserialize, Serialize};

use crate::floor::FloorType;
use crate::journey::GameStatus;
use crate::selector::DrawTrace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JourneyEvent {
    Departed { from: i32, target: i32 },
    /// Display counter moved one floor.
    Stepped { floor: i32 },
    /// Target reached and outcome drawn; reveal follows the settle delay.
    Resolved { floor: i32, trace: DrawTrace },
    Revealed { floor: i32, floor_type: FloorType, status: GameStatus },
    Returned,
    Restarted,
    /// Journey start refused; `key` names the user-facing notice.
    Refused { key: String, message: String },
    /// A completion arrived for a timer that is no longer armed.
    StaleTimer { id: u64 },
}

impl JourneyEvent {
    /// Stepped floor, if this event moved the display counter.
    #[must_use]
    pub const fn stepped_floor(&self) -> Option<i32> {
        match self {
            Self::Stepped { floor } => Some(*floor),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = JourneyEvent::Departed { from: 1, target: 5 };
        let json = serde_json::to_string(&event).expect("serialize");
        assert_eq!(json, r#"{"kind":"departed","from":1,"target":5}"#);
        let restored: JourneyEvent = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, event);
    }

    #[test]
    fn stepped_floor_only_for_steps() {
        assert_eq!(JourneyEvent::Stepped { floor: -2 }.stepped_floor(), Some(-2));
        assert_eq!(JourneyEvent::Returned.stepped_floor(), None);
    }
}
