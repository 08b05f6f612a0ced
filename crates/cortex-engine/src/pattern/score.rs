use serde::Serialize;

use cortex_core::pattern::Outcome;

use crate::tunables::PatternTunables;

#[derive(Clone, Copy, Debug)]
pub struct ScoreInput {
    pub target_length: u32,
    pub latency_secs: f64,
    pub time_limit_secs: f64,
    /// Streak before this round is counted.
    pub correct_streak: u32,
    pub outcome: Outcome,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: u32,
    pub time_penalty: f64,
    pub raw: f64,
    pub bonus: u32,
    pub multiplier: f64,
    pub score: u32,
}

/// Score one round. Pure; the caller adds `score` to the session total only
/// when the round advances.
pub fn score_round(input: &ScoreInput, t: &PatternTunables) -> ScoreBreakdown {
    let base = input.target_length * t.points_per_cell;
    let time_penalty = (input.latency_secs * t.latency_weight).min(f64::from(base));
    let raw = (f64::from(base) - time_penalty).max(0.0);

    let correct = input.outcome.is_correct();
    let earns_bonus = correct
        && input.correct_streak >= t.streak_bonus_min_streak
        && input.latency_secs <= t.streak_bonus_latency_ratio * input.time_limit_secs;
    let bonus = if earns_bonus { t.streak_bonus } else { 0 };

    let steps = input.correct_streak / t.multiplier_streak_step.max(1);
    let multiplier = 1.0 + f64::from(steps) * t.multiplier_increment;

    let score = if correct {
        ((raw + f64::from(bonus)) * multiplier).floor() as u32
    } else {
        0
    };

    ScoreBreakdown {
        base,
        time_penalty,
        raw,
        bonus,
        multiplier,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(target_length: u32, latency: f64, streak: u32, outcome: Outcome) -> ScoreInput {
        ScoreInput {
            target_length,
            latency_secs: latency,
            time_limit_secs: 5.0,
            correct_streak: streak,
            outcome,
        }
    }

    #[test]
    fn first_correct_round() {
        let s = score_round(&input(3, 1.0, 0, Outcome::Correct), &PatternTunables::default());
        assert_eq!(s.base, 15);
        assert_eq!(s.time_penalty, 2.0);
        assert_eq!(s.raw, 13.0);
        assert_eq!(s.bonus, 0);
        assert_eq!(s.multiplier, 1.0);
        assert_eq!(s.score, 13);
    }

    #[test]
    fn streak_bonus_and_multiplier() {
        let s = score_round(&input(3, 2.0, 3, Outcome::Correct), &PatternTunables::default());
        assert_eq!(s.raw, 11.0);
        assert_eq!(s.bonus, 10);
        assert!((s.multiplier - 1.1).abs() < 1e-9);
        assert_eq!(s.score, 23);
    }

    #[test]
    fn slow_round_misses_bonus() {
        // 3.8s > 0.75 * 5s
        let s = score_round(&input(3, 3.8, 2, Outcome::Correct), &PatternTunables::default());
        assert_eq!(s.bonus, 0);
    }

    #[test]
    fn penalty_saturates_at_base() {
        let s = score_round(&input(2, 29.0, 0, Outcome::Correct), &PatternTunables::default());
        assert_eq!(s.time_penalty, 10.0);
        assert_eq!(s.raw, 0.0);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn incorrect_scores_zero() {
        for outcome in [Outcome::Timeout, Outcome::WrongOrder, Outcome::Mixed] {
            let s = score_round(&input(5, 0.5, 6, outcome), &PatternTunables::default());
            assert_eq!(s.score, 0, "{outcome}");
            assert_eq!(s.bonus, 0);
        }
    }

    #[test]
    fn tunables_are_honored() {
        let t = PatternTunables {
            points_per_cell: 10,
            latency_weight: 0.0,
            ..PatternTunables::default()
        };
        let s = score_round(&input(4, 3.0, 0, Outcome::Correct), &t);
        assert_eq!(s.score, 40);
    }

    proptest! {
        #[test]
        fn score_is_deterministic_and_bounded(
            len in 1u32..40,
            latency in 0.0f64..30.0,
            streak in 0u32..50,
            correct in any::<bool>(),
        ) {
            let outcome = if correct { Outcome::Correct } else { Outcome::WrongOrder };
            let t = PatternTunables::default();
            let a = score_round(&input(len, latency, streak, outcome), &t);
            let b = score_round(&input(len, latency, streak, outcome), &t);
            prop_assert_eq!(a, b);
            prop_assert!(a.time_penalty <= f64::from(a.base));
            prop_assert!(a.raw >= 0.0);
            if !correct {
                prop_assert_eq!(a.score, 0);
            }
        }
    }
}
