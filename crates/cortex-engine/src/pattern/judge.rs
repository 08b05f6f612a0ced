use cortex_core::pattern::Outcome;

/// Classify a submission. A latency equal to the limit still counts as on time.
pub fn judge(answer: &[u32], expected: &[u32], latency_secs: f64, time_limit_secs: f64) -> Outcome {
    let timed_out = latency_secs > time_limit_secs;
    let wrong_order = answer != expected;
    match (timed_out, wrong_order) {
        (false, false) => Outcome::Correct,
        (true, false) => Outcome::Timeout,
        (false, true) => Outcome::WrongOrder,
        (true, true) => Outcome::Mixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_in_time_is_correct() {
        assert_eq!(judge(&[2, 7, 5], &[2, 7, 5], 1.0, 5.0), Outcome::Correct);
        assert_eq!(judge(&[2, 7, 5], &[2, 7, 5], 5.0, 5.0), Outcome::Correct);
    }

    #[test]
    fn late_but_right_is_timeout() {
        assert_eq!(judge(&[1, 2, 3], &[1, 2, 3], 5.01, 5.0), Outcome::Timeout);
    }

    #[test]
    fn order_and_length_matter() {
        assert_eq!(judge(&[7, 2, 5], &[2, 7, 5], 1.0, 5.0), Outcome::WrongOrder);
        assert_eq!(judge(&[2, 7], &[2, 7, 5], 1.0, 5.0), Outcome::WrongOrder);
        assert_eq!(judge(&[2, 7, 5, 1], &[2, 7, 5], 1.0, 5.0), Outcome::WrongOrder);
    }

    #[test]
    fn late_and_wrong_is_mixed() {
        assert_eq!(judge(&[0], &[2, 7, 5], 9.0, 5.0), Outcome::Mixed);
    }
}
