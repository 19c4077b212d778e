//! Floor outcome categories.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audio::AudioCue;

/// Outcome category revealed when the elevator arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorType {
    #[default]
    Normal,
    Zombie,
    Gold,
    Cat,
    Bomb,
}

impl FloorType {
    /// Selection walk order. Determines tie-breaks at cumulative boundaries.
    pub const PRIORITY: [Self; 5] = [Self::Bomb, Self::Zombie, Self::Gold, Self::Cat, Self::Normal];

    /// Whether arriving on this floor ends the game.
    #[must_use]
    pub const fn ends_game(self) -> bool {
        matches!(self, Self::Bomb)
    }

    /// Audio cue played when the outcome is revealed.
    #[must_use]
    pub const fn reveal_cue(self) -> AudioCue {
        match self {
            Self::Normal => AudioCue::Normal,
            Self::Zombie => AudioCue::Zombie,
            Self::Gold => AudioCue::Gold,
            Self::Cat => AudioCue::Cat,
            Self::Bomb => AudioCue::Bomb,
        }
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Zombie => "zombie",
            Self::Gold => "gold",
            Self::Cat => "cat",
            Self::Bomb => "bomb",
        }
    }

    /// Parse a category from its snake_case key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::PRIORITY
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for FloorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_is_bomb_first_normal_last() {
        assert_eq!(FloorType::PRIORITY[0], FloorType::Bomb);
        assert_eq!(FloorType::PRIORITY[4], FloorType::Normal);
    }

    #[test]
    fn only_bomb_ends_game() {
        for kind in FloorType::PRIORITY {
            assert_eq!(kind.ends_game(), kind == FloorType::Bomb);
        }
    }

    #[test]
    fn keys_parse_back() {
        for kind in FloorType::PRIORITY {
            assert_eq!(FloorType::from_key(kind.key()), Some(kind));
        }
        assert_eq!(FloorType::from_key(" GOLD "), Some(FloorType::Gold));
        assert_eq!(FloorType::from_key("dragon"), None);
        assert_eq!(
            serde_json::to_string(&FloorType::Zombie).unwrap(),
            "\"zombie\""
        );
    }
}
