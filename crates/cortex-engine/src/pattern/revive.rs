use cortex_core::pattern::{Outcome, RoundRecord};

/// Whether a failed round is turned into a retry of the same round.
///
/// Requires an unused revive and at least `window` logged rounds, the last
/// `window` of which were all correct. A window of zero disables revives.
pub fn revive_eligible(outcome: Outcome, revive_used: bool, log: &[RoundRecord], window: usize) -> bool {
    if outcome.is_correct() || revive_used || window == 0 || log.len() < window {
        return false;
    }
    log[log.len() - window..].iter().all(|r| r.correct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(pattern: &[bool]) -> Vec<RoundRecord> {
        pattern
            .iter()
            .enumerate()
            .map(|(i, &correct)| RoundRecord {
                round_number: i as u32 + 1,
                correct,
                outcome: if correct { Outcome::Correct } else { Outcome::WrongOrder },
                grid_size: 3,
                target_length: 3,
                latency_secs: 1.0,
                base_score: 15,
                time_penalty: 2.0,
                bonus: 0,
                multiplier: 1.0,
                score: if correct { 13 } else { 0 },
                correct_streak_at_time: 0,
                max_streak_so_far: 0,
                projected_final_score: 0,
            })
            .collect()
    }

    #[test]
    fn five_perfect_rounds_then_miss() {
        assert!(revive_eligible(Outcome::WrongOrder, false, &log(&[true; 5]), 5));
    }

    #[test]
    fn only_trailing_window_counts() {
        let l = log(&[false, true, true, true, true, true]);
        assert!(revive_eligible(Outcome::Timeout, false, &l, 5));
        let l = log(&[true, true, true, true, true, false]);
        assert!(!revive_eligible(Outcome::Timeout, false, &l, 5));
    }

    #[test]
    fn needs_full_window() {
        assert!(!revive_eligible(Outcome::Mixed, false, &log(&[true; 4]), 5));
    }

    #[test]
    fn one_shot() {
        assert!(!revive_eligible(Outcome::WrongOrder, true, &log(&[true; 8]), 5));
    }

    #[test]
    fn never_for_correct_rounds() {
        assert!(!revive_eligible(Outcome::Correct, false, &log(&[true; 8]), 5));
    }

    #[test]
    fn zero_window_disables() {
        assert!(!revive_eligible(Outcome::WrongOrder, false, &log(&[true; 8]), 0));
    }
}
