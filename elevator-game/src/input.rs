//! Keypad composition and target-floor validation.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::FloorRange;
use crate::constants::{MAX_INPUT_LEN, START_FLOOR};

/// Reasons a composed target floor is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FloorInputError {
    #[error("'{0}' is not a floor number")]
    NotANumber(String),
    #[error("floor {value} is out of range ({min} to {max})")]
    OutOfRange { value: i32, min: i32, max: i32 },
}

/// Floor number being composed on the keypad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorInput {
    text: String,
    max_len: usize,
}

impl Default for FloorInput {
    fn default() -> Self {
        Self::with_max_len(MAX_INPUT_LEN)
    }
}

impl FloorInput {
    #[must_use]
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            text: String::with_capacity(max_len),
            max_len: max_len.max(1),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append a digit. Returns false when the digit was refused.
    pub fn push_digit(&mut self, digit: u8) -> bool {
        if digit > 9 || self.text.len() >= self.max_len {
            return false;
        }
        self.text.push(char::from(b'0' + digit));
        true
    }

    /// Start a negative number. Only accepted on an empty composition.
    pub fn push_minus(&mut self) -> bool {
        if !self.text.is_empty() {
            return false;
        }
        self.text.push('-');
        true
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Parse and range-check the composition. Empty means the start floor.
    ///
    /// # Errors
    ///
    /// Returns [`FloorInputError`] when the text does not parse as an integer
    /// or falls outside `range`.
    pub fn parse_target(&self, range: FloorRange) -> Result<i32, FloorInputError> {
        parse_target_floor(&self.text, range)
    }
}

/// Validate raw keypad text against an inclusive floor range.
///
/// Empty text selects floor 1 whatever the configured start floor is;
/// configuration validation keeps floor 1 inside every accepted range.
///
/// # Errors
///
/// Returns [`FloorInputError`] when the text does not parse as an integer or
/// falls outside `range`. Values are never clamped into range.
pub fn parse_target_floor(raw: &str, range: FloorRange) -> Result<i32, FloorInputError> {
    let trimmed = raw.trim();
    let value = if trimmed.is_empty() {
        START_FLOOR
    } else {
        trimmed
            .parse::<i32>()
            .map_err(|_| FloorInputError::NotANumber(trimmed.to_string()))?
    };
    if !range.contains(value) {
        return Err(FloorInputError::OutOfRange {
            value,
            min: range.min,
            max: range.max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(keys: &str) -> FloorInput {
        let mut input = FloorInput::default();
        for key in keys.bytes() {
            if key == b'-' {
                input.push_minus();
            } else {
                input.push_digit(key - b'0');
            }
        }
        input
    }

    #[test]
    fn composition_caps_at_three_characters() {
        let mut input = compose("123");
        assert!(!input.push_digit(4));
        assert_eq!(input.as_str(), "123");

        let mut negative = compose("-12");
        assert!(!negative.push_digit(3));
        assert_eq!(negative.as_str(), "-12");
    }

    #[test]
    fn minus_only_leads_an_empty_composition() {
        let mut input = FloorInput::default();
        assert!(input.push_minus());
        assert!(!input.push_minus());
        assert_eq!(input.as_str(), "-");

        let mut digits = compose("4");
        assert!(!digits.push_minus());
        assert_eq!(digits.as_str(), "4");
    }

    #[test]
    fn non_digits_are_refused() {
        let mut input = FloorInput::default();
        assert!(!input.push_digit(10));
        assert!(input.is_empty());
    }

    #[test]
    fn every_floor_in_range_parses() {
        let range = FloorRange::default();
        for floor in -3..=100 {
            assert_eq!(parse_target_floor(&floor.to_string(), range), Ok(floor));
        }
    }

    #[test]
    fn empty_means_start_floor() {
        assert_eq!(FloorInput::default().parse_target(FloorRange::default()), Ok(1));
    }

    #[test]
    fn out_of_range_and_garbage_are_refused() {
        let range = FloorRange::default();
        assert_eq!(
            parse_target_floor("105", range),
            Err(FloorInputError::OutOfRange {
                value: 105,
                min: -3,
                max: 100
            })
        );
        assert!(matches!(
            parse_target_floor("-4", range),
            Err(FloorInputError::OutOfRange { value: -4, .. })
        ));
        assert!(matches!(
            parse_target_floor("101", range),
            Err(FloorInputError::OutOfRange { value: 101, .. })
        ));
        assert_eq!(
            parse_target_floor("-", range),
            Err(FloorInputError::NotANumber("-".to_string()))
        );
        assert_eq!(parse_target_floor("-0", range), Ok(0));
    }
}
