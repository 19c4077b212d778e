use elevator_game::numbers::frequency;
use elevator_game::{CountingRng, FloorType, ProbabilityConfig, SelectorError, draw_floor_type};
use rand::SeedableRng;
use rand::rngs::SmallRng;

const SAMPLE_SIZE: usize = 10_000;
const TOLERANCE: f64 = 0.03;

fn tally(weights: &ProbabilityConfig, samples: usize, seed: u64) -> [usize; 5] {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut counts = [0usize; 5];
    for _ in 0..samples {
        let trace = draw_floor_type(weights, &mut rng).expect("weights are non-empty");
        let slot = FloorType::PRIORITY
            .iter()
            .position(|kind| *kind == trace.chosen)
            .expect("known category");
        counts[slot] += 1;
    }
    counts
}

#[test]
fn normal_only_table_always_draws_normal() {
    let weights = ProbabilityConfig {
        bomb: 0,
        zombie: 0,
        gold: 0,
        cat: 0,
        normal: 100,
    };
    let counts = tally(&weights, 1000, 11);
    assert_eq!(counts, [0, 0, 0, 0, 1000]);
}

#[test]
fn equal_weights_draw_each_category_a_fifth_of_the_time() {
    let counts = tally(&ProbabilityConfig::uniform(20), SAMPLE_SIZE, 2024);
    for (kind, hits) in FloorType::PRIORITY.iter().zip(counts) {
        let observed = frequency(hits, SAMPLE_SIZE);
        assert!(
            (observed - 0.2).abs() <= TOLERANCE,
            "{kind} frequency drifted: observed {observed:.4}"
        );
    }
}

#[test]
fn default_table_tracks_configured_shares() {
    let weights = ProbabilityConfig::default();
    let counts = tally(&weights, SAMPLE_SIZE, 99);
    let total = f64::from(weights.total());
    for ((kind, weight), hits) in weights.entries().iter().zip(counts) {
        let expected = f64::from(*weight) / total;
        let observed = frequency(hits, SAMPLE_SIZE);
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "{kind} frequency drifted: expected {expected:.4}, observed {observed:.4}"
        );
    }
}

#[test]
fn zero_weight_categories_are_never_drawn() {
    let weights = ProbabilityConfig {
        bomb: 0,
        zombie: 50,
        gold: 0,
        cat: 50,
        normal: 0,
    };
    let counts = tally(&weights, 2000, 5);
    assert_eq!(counts[0], 0);
    assert_eq!(counts[2], 0);
    assert_eq!(counts[4], 0);
    assert_eq!(counts[1] + counts[3], 2000);
}

#[test]
fn empty_table_is_an_error_not_a_default() {
    let mut rng = CountingRng::outcome_stream(1);
    let err = draw_floor_type(&ProbabilityConfig::uniform(0), &mut rng).unwrap_err();
    assert_eq!(err, SelectorError::EmptyWeightTable);
    assert_eq!(rng.draws(), 0);
}
