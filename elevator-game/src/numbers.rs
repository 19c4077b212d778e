//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Round a f64 and clamp it to the u32 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(0.0, max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Rounded percentage of `part` within `total`; zero when `total` is zero.
#[must_use]
pub fn share_percent(part: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    round_f64_to_u32(f64::from(part) / f64::from(total) * 100.0)
}

/// Observed frequency of `hits` within `samples`, as a fraction.
#[must_use]
pub fn frequency(hits: usize, samples: usize) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    let hits = cast::<usize, f64>(hits).unwrap_or(0.0);
    let samples = cast::<usize, f64>(samples).unwrap_or(1.0);
    hits / samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_handles_non_finite_and_negative() {
        assert_eq!(round_f64_to_u32(f64::NAN), 0);
        assert_eq!(round_f64_to_u32(-4.0), 0);
        assert_eq!(round_f64_to_u32(2.5), 3);
        assert_eq!(round_f64_to_u32(f64::INFINITY), 0);
    }

    #[test]
    fn share_percent_rounds_to_nearest() {
        assert_eq!(share_percent(1, 3), 33);
        assert_eq!(share_percent(2, 3), 67);
        assert_eq!(share_percent(5, 0), 0);
        assert_eq!(share_percent(100, 100), 100);
    }

    #[test]
    fn frequency_of_empty_sample_is_zero() {
        assert!(frequency(3, 0).abs() < f64::EPSILON);
        assert!((frequency(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
