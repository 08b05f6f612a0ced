use cortex_core::pattern::RoundRecord;

/// Extrapolate the final score: the running total plus the mean logged
/// round score for each round still to play. Informational only.
pub fn project_final_score(cumulative_score: u32, log: &[RoundRecord], round_number: u32, max_rounds: u32) -> u32 {
    let avg = if log.is_empty() {
        0.0
    } else {
        log.iter().map(|r| f64::from(r.score)).sum::<f64>() / log.len() as f64
    };
    let remaining = max_rounds.saturating_sub(round_number);
    (f64::from(cumulative_score) + avg * f64::from(remaining)).floor() as u32
}
