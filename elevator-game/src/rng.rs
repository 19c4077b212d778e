//! Seeded randomness behind the elevator doors.
//!
//! A session seed never feeds the generator directly. It is keyed through
//! HMAC-SHA256 with a tag first, so the outcome stream and the tester's
//! phrase seeds cannot collide even when they start from the same number.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

const OUTCOME_TAG: &[u8] = b"outcome";

/// Generator that tallies how often it was asked for randomness.
///
/// The tester reports the tally next to each run; a journey that reveals
/// without moving it never consulted the weight table.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    /// Stream that decides floor outcomes for one session seed. Two sessions
    /// on the same seed reveal the same floors in the same order.
    #[must_use]
    pub fn outcome_stream(seed: u64) -> Self {
        let stream_seed = derive_stream_seed(seed, OUTCOME_TAG);
        Self::wrap(ChaCha8Rng::seed_from_u64(stream_seed))
    }
}

impl<R: RngCore> CountingRng<R> {
    pub const fn wrap(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn counted(&mut self) -> &mut R {
        self.draws = self.draws.saturating_add(1);
        &mut self.rng
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.counted().next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.counted().next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.counted().fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.counted().try_fill_bytes(dest)
    }
}

/// Key `tag` with `seed` and keep the low 8 bytes of the digest.
///
/// Falls back to `seed` itself if the MAC rejects the key, which HMAC never
/// does for an 8-byte key.
#[must_use]
pub fn derive_stream_seed(seed: u64, tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&seed.to_le_bytes()) else {
        return seed;
    };
    mac.update(tag);
    let digest = mac.finalize().into_bytes();
    digest[..8]
        .try_into()
        .map_or(seed, u64::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::FloorType;
    use crate::probability::ProbabilityConfig;
    use crate::selector::draw_floor_type;

    #[test]
    fn outcome_stream_is_deterministic_and_counted() {
        let mut first = CountingRng::outcome_stream(0xFEED_CAFE);
        let mut second = CountingRng::outcome_stream(0xFEED_CAFE);
        assert_eq!(first.next_u32(), second.next_u32());
        assert_eq!(first.next_u64(), second.next_u64());
        assert_eq!(first.draws(), 2);
    }

    #[test]
    fn same_session_seed_replays_the_same_floors() {
        let weights = ProbabilityConfig::default();
        let reveal = |seed| {
            let mut rng = CountingRng::outcome_stream(seed);
            (0..32)
                .map(|_| draw_floor_type(&weights, &mut rng).map(|trace| trace.chosen))
                .collect::<Result<Vec<FloorType>, _>>()
                .unwrap()
        };
        assert_eq!(reveal(77), reveal(77));
        assert_ne!(reveal(77), reveal(78));
    }

    #[test]
    fn tags_separate_streams_from_one_seed() {
        assert_ne!(
            derive_stream_seed(42, OUTCOME_TAG),
            derive_stream_seed(42, b"phrase")
        );
        assert_ne!(derive_stream_seed(1, OUTCOME_TAG), derive_stream_seed(2, OUTCOME_TAG));
    }
}
