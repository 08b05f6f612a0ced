use rand::Rng;

use crate::tunables::PatternTunables;

/// Parameters for the round that follows a correct, non-final round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NextRound {
    pub grid_size: u32,
    pub target_length: u32,
    pub expected_sequence: Vec<u32>,
}

/// Raise the difficulty after a correct round.
///
/// `correct_streak` is the streak including the round just completed.
/// Grid growth stops at `max_grid_size`; a grid started above it is left alone.
pub fn next_round<R: Rng + ?Sized>(
    target_length: u32,
    grid_size: u32,
    latency_secs: f64,
    time_limit_secs: f64,
    correct_streak: u32,
    t: &PatternTunables,
    rng: &mut R,
) -> NextRound {
    let mut target_length = target_length + 1;
    if latency_secs <= t.fast_finish_ratio * time_limit_secs {
        target_length += 1;
    }

    let mut grid_size = grid_size;
    if correct_streak >= t.grid_growth_min_streak && grid_size < t.max_grid_size {
        grid_size += 1;
    }

    NextRound {
        grid_size,
        target_length,
        expected_sequence: sample_sequence(grid_size, target_length, rng),
    }
}

/// `min(target_length, grid_size²)` distinct cells from `[0, grid_size²)`,
/// uniformly sampled without replacement.
pub fn sample_sequence<R: Rng + ?Sized>(grid_size: u32, target_length: u32, rng: &mut R) -> Vec<u32> {
    let cells = grid_size * grid_size;
    let amount = target_length.min(cells);
    rand::seq::index::sample(rng, cells as usize, amount as usize)
        .into_iter()
        .map(|i| i as u32)
        .collect()
}
