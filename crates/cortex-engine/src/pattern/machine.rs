//! The per-submission state transition. Pure apart from the rng used to draw
//! the next sequence; loading, locking and saving belong to the service.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use cortex_core::pattern::{Outcome, PatternSession, RoundRecord, Winner};

use super::difficulty;
use super::judge::judge;
use super::projection::project_final_score;
use super::revive::revive_eligible;
use super::score::{score_round, ScoreInput};
use super::streak::Streak;
use crate::error::GameError;
use crate::stats::round2;
use crate::tunables::PatternTunables;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub answer: Vec<u32>,
    pub latency_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NextRoundView {
    pub round_number: u32,
    pub grid_size: u32,
    pub sequence: Vec<u32>,
}

/// What the caller sees after a submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundResult {
    /// A revive was consumed; replay the same round.
    Retry {
        round_number: u32,
        sequence: Vec<u32>,
        message: String,
    },
    Advance {
        score_gained: u32,
        total_score: u32,
        record: RoundRecord,
        next_round: NextRoundView,
    },
    Ended {
        correct: bool,
        score_gained: u32,
        total_score: u32,
        record: RoundRecord,
        winner: Winner,
    },
}

impl RoundResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Retry { .. } => "retry",
            Self::Advance { .. } => "advance",
            Self::Ended { .. } => "ended",
        }
    }
}

/// Reject malformed submissions before anything is loaded or written.
pub fn validate_submission(sub: &Submission, t: &PatternTunables) -> Result<(), GameError> {
    if sub.answer.is_empty() {
        return Err(GameError::invalid("answer must not be empty"));
    }
    validate_latency(sub.latency_secs, t.max_latency_secs)
}

pub fn validate_latency(latency_secs: f64, max_latency_secs: f64) -> Result<(), GameError> {
    if !latency_secs.is_finite() || latency_secs < 0.0 || latency_secs > max_latency_secs {
        return Err(GameError::invalid(format!(
            "latency must be within [0, {max_latency_secs}] seconds, got {latency_secs}"
        )));
    }
    Ok(())
}

/// Apply one validated submission to an active session.
///
/// Returns the replacement session and the caller-facing result. The input
/// session is never modified.
pub fn transition<R: Rng + ?Sized>(
    session: &PatternSession,
    sub: &Submission,
    t: &PatternTunables,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (PatternSession, RoundResult) {
    let state = &session.round;
    let outcome = judge(&sub.answer, &state.expected_sequence, sub.latency_secs, state.time_limit_secs);

    if revive_eligible(outcome, state.revive_used, &state.round_log, t.revive_window) {
        let mut next = session.clone();
        next.round.revive_used = true;
        let result = RoundResult::Retry {
            round_number: state.round_number,
            sequence: state.expected_sequence.clone(),
            message: "Revive used! Try the same round again.".into(),
        };
        return (next, result);
    }

    let breakdown = score_round(
        &ScoreInput {
            target_length: state.target_length,
            latency_secs: sub.latency_secs,
            time_limit_secs: state.time_limit_secs,
            correct_streak: state.correct_streak,
            outcome,
        },
        t,
    );
    let streak = Streak::new(state.correct_streak, state.max_streak).advance(outcome);
    let total_score = session.cumulative_score + breakdown.score;
    let projected = project_final_score(total_score, &state.round_log, state.round_number, state.max_rounds);

    let record = RoundRecord {
        round_number: state.round_number,
        correct: outcome.is_correct(),
        outcome,
        grid_size: state.grid_size,
        target_length: state.target_length,
        latency_secs: sub.latency_secs,
        base_score: breakdown.base,
        time_penalty: round2(breakdown.time_penalty),
        bonus: breakdown.bonus,
        multiplier: round2(breakdown.multiplier),
        score: breakdown.score,
        correct_streak_at_time: streak.current,
        max_streak_so_far: streak.max,
        projected_final_score: projected,
    };

    let mut next = session.clone();
    next.cumulative_score = total_score;
    next.round.correct_streak = streak.current;
    next.round.max_streak = streak.max;
    next.round.round_log.push(record.clone());

    if outcome == Outcome::Correct && state.round_number < state.max_rounds {
        let upcoming = difficulty::next_round(
            state.target_length,
            state.grid_size,
            sub.latency_secs,
            state.time_limit_secs,
            streak.current,
            t,
            rng,
        );
        next.round.round_number = state.round_number + 1;
        next.round.grid_size = upcoming.grid_size;
        next.round.target_length = upcoming.target_length;
        next.round.expected_sequence = upcoming.expected_sequence;

        let result = RoundResult::Advance {
            score_gained: breakdown.score,
            total_score,
            record,
            next_round: NextRoundView {
                round_number: next.round.round_number,
                grid_size: next.round.grid_size,
                sequence: next.round.expected_sequence.clone(),
            },
        };
        return (next, result);
    }

    let winner = if outcome.is_correct() && state.round_number >= state.max_rounds {
        Winner::Player
    } else {
        Winner::House
    };
    next.ended_at = Some(now);
    next.winner = Some(winner);

    let result = RoundResult::Ended {
        correct: outcome.is_correct(),
        score_gained: breakdown.score,
        total_score,
        record,
        winner,
    };
    (next, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::pattern::RoundState;
    use cortex_core::{PlayerId, SessionId};
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(target_length: u32, expected: Vec<u32>) -> PatternSession {
        PatternSession {
            id: SessionId::new(),
            owner: PlayerId::from_raw("alice"),
            cumulative_score: 0,
            started_at: Utc::now(),
            ended_at: None,
            winner: None,
            round: RoundState {
                round_number: 1,
                grid_size: 3,
                target_length,
                expected_sequence: expected,
                correct_streak: 0,
                max_streak: 0,
                revive_used: false,
                round_log: Vec::new(),
                time_limit_secs: 5.0,
                max_rounds: 10,
            },
        }
    }

    fn submit(answer: &[u32], latency: f64) -> Submission {
        Submission {
            answer: answer.to_vec(),
            latency_secs: latency,
        }
    }

    fn run(s: &PatternSession, sub: &Submission) -> (PatternSession, RoundResult) {
        transition(s, sub, &PatternTunables::default(), Utc::now(), &mut StdRng::seed_from_u64(1))
    }

    /// Play `n` correct rounds at a slow-but-legal latency.
    fn play_correct(mut s: PatternSession, n: usize) -> PatternSession {
        for _ in 0..n {
            let answer = s.round.expected_sequence.clone();
            s = run(&s, &submit(&answer, 4.0)).0;
        }
        s
    }

    #[test]
    fn correct_first_round_advances() {
        let s = session(3, vec![2, 7, 5]);
        let (next, result) = run(&s, &submit(&[2, 7, 5], 1.0));

        let RoundResult::Advance { score_gained, total_score, record, next_round } = result else {
            panic!("expected advance");
        };
        assert_eq!(score_gained, 13);
        assert_eq!(total_score, 13);
        assert_eq!(record.correct_streak_at_time, 1);
        assert_eq!(record.projected_final_score, 13);
        assert_eq!(next_round.round_number, 2);
        // fast finish: 3 + 2
        assert_eq!(next.round.target_length, 5);
        assert_eq!(next_round.sequence.len(), 5);
        assert_eq!(next.round.round_log.len(), 1);
        assert_eq!(next.cumulative_score, 13);
    }

    #[test]
    fn streak_bonus_round_scores_23() {
        let mut s = session(3, vec![0, 1, 2]);
        s.round.correct_streak = 3;
        s.round.max_streak = 3;
        s.round.round_number = 4;
        let (_, result) = run(&s, &submit(&[0, 1, 2], 2.0));
        let RoundResult::Advance { record, .. } = result else {
            panic!("expected advance");
        };
        assert_eq!(record.bonus, 10);
        assert_eq!(record.multiplier, 1.1);
        assert_eq!(record.score, 23);
    }

    #[test]
    fn wrong_answer_ends_with_house_win() {
        let s = session(3, vec![2, 7, 5]);
        let (next, result) = run(&s, &submit(&[5, 7, 2], 1.0));
        match result {
            RoundResult::Ended { correct, score_gained, winner, record, .. } => {
                assert!(!correct);
                assert_eq!(score_gained, 0);
                assert_eq!(winner, Winner::House);
                assert_eq!(record.outcome, Outcome::WrongOrder);
            }
            other => panic!("expected ended, got {other:?}"),
        }
        assert!(next.is_ended());
        assert_eq!(next.round.correct_streak, 0);
        assert_eq!(next.round.round_log.len(), 1);
    }

    #[test]
    fn revive_after_five_perfect_rounds() {
        let s = play_correct(session(3, vec![2, 7, 5]), 5);
        assert_eq!(s.round.round_number, 6);
        assert_eq!(s.round.correct_streak, 5);

        let expected = s.round.expected_sequence.clone();
        let (revived, result) = run(&s, &submit(&[99], 1.0));
        assert_eq!(
            result,
            RoundResult::Retry {
                round_number: 6,
                sequence: expected.clone(),
                message: "Revive used! Try the same round again.".into(),
            }
        );
        assert!(revived.round.revive_used);
        assert_eq!(revived.round.round_log.len(), 5);
        assert_eq!(revived.round.correct_streak, 5);
        assert_eq!(revived.round.max_streak, 5);
        assert_eq!(revived.round.expected_sequence, expected);
        assert_eq!(revived.cumulative_score, s.cumulative_score);

        // Second miss on the retried round is terminal.
        let (ended, result) = run(&revived, &submit(&[99], 1.0));
        assert!(matches!(result, RoundResult::Ended { winner: Winner::House, .. }));
        assert!(ended.round.revive_used);
        assert_eq!(ended.round.round_log.len(), 6);
    }

    #[test]
    fn correct_final_round_is_player_win() {
        let mut s = session(3, vec![1, 2, 3]);
        s.round.round_number = 10;
        let (next, result) = run(&s, &submit(&[1, 2, 3], 1.0));
        assert!(matches!(result, RoundResult::Ended { correct: true, winner: Winner::Player, .. }));
        assert_eq!(next.winner, Some(Winner::Player));
        assert!(next.ended_at.is_some());
        assert_eq!(next.round.round_number, 10);
    }

    #[test]
    fn full_perfect_game_reaches_player_win() {
        let s = play_correct(session(3, vec![2, 7, 5]), 10);
        assert_eq!(s.winner, Some(Winner::Player));
        assert_eq!(s.round.round_log.len(), 10);
        assert!(s.round.grid_size <= 6);
    }

    #[test]
    fn timeout_is_judged_before_order() {
        let s = session(3, vec![2, 7, 5]);
        let (_, result) = run(&s, &submit(&[2, 7, 5], 6.0));
        let RoundResult::Ended { record, .. } = result else {
            panic!("expected ended");
        };
        assert_eq!(record.outcome, Outcome::Timeout);
    }

    #[test]
    fn validation_rejects_bad_shapes() {
        let t = PatternTunables::default();
        assert!(validate_submission(&submit(&[], 1.0), &t).is_err());
        assert!(validate_submission(&submit(&[1], -0.1), &t).is_err());
        assert!(validate_submission(&submit(&[1], 30.5), &t).is_err());
        assert!(validate_submission(&submit(&[1], f64::NAN), &t).is_err());
        assert!(validate_submission(&submit(&[1], 0.0), &t).is_ok());
        assert!(validate_submission(&submit(&[1], 30.0), &t).is_ok());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let s = session(3, vec![2, 7, 5]);
        let (_, result) = run(&s, &submit(&[2, 7, 5], 1.0));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "advance");
        assert_eq!(json["record"]["outcome"], "correct");
        assert_eq!(json["next_round"]["round_number"], 2);
    }

    proptest! {
        #[test]
        fn invariants_hold_over_random_play(
            plays in prop::collection::vec((any::<bool>(), 0.0f64..8.0), 1..30),
            seed in any::<u64>(),
        ) {
            let t = PatternTunables::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut s = session(3, vec![2, 7, 5]);
            let mut revives = 0;

            for (right, latency) in plays {
                if s.is_ended() {
                    break;
                }
                let answer = if right {
                    s.round.expected_sequence.clone()
                } else {
                    vec![u32::MAX]
                };
                let before = s.clone();
                let (next, result) = transition(&s, &submit(&answer, latency), &t, Utc::now(), &mut rng);

                prop_assert!(next.round.max_streak >= before.round.max_streak);
                prop_assert!(next.round.max_streak >= next.round.correct_streak);
                prop_assert!(next.round.correct_streak <= next.round.round_number);
                prop_assert!(next.cumulative_score >= before.cumulative_score);
                prop_assert!(next.round.grid_size <= t.max_grid_size);
                prop_assert!(!before.round.revive_used || next.round.revive_used);

                match &result {
                    RoundResult::Retry { .. } => {
                        revives += 1;
                        prop_assert_eq!(next.round.round_log.len(), before.round.round_log.len());
                        prop_assert_eq!(next.round.correct_streak, before.round.correct_streak);
                        prop_assert_eq!(next.round.max_streak, before.round.max_streak);
                    }
                    RoundResult::Advance { record, .. } => {
                        prop_assert!(record.correct);
                        prop_assert!(next.round.target_length > before.round.target_length);
                        prop_assert!(next.round.grid_size >= before.round.grid_size);
                        prop_assert_eq!(next.round.round_number, before.round.round_number + 1);
                    }
                    RoundResult::Ended { record, score_gained, .. } => {
                        if !record.correct {
                            prop_assert_eq!(*score_gained, 0);
                        }
                    }
                }
                s = next;
            }
            prop_assert!(revives <= 1);
        }
    }
}
