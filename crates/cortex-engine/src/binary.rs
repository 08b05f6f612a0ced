//! Binary-search duel: the player and a bisecting house take turns guessing
//! a hidden number.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, instrument};

use cortex_core::binary::{BinaryDifficulty, BinaryDuel, BinaryTurn, Feedback};
use cortex_core::pattern::Winner;
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::{BinaryRepo, Database};
use cortex_telemetry::MetricsRecorder;

use crate::error::GameError;
use crate::locks::SessionLocks;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuelStart {
    pub session_id: SessionId,
    pub difficulty: BinaryDifficulty,
    pub range_min: u32,
    pub range_max: u32,
    pub first_turn: Winner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GuessOutcome {
    pub result: Feedback,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_guess: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_result: Option<Feedback>,
    pub winner: Option<Winner>,
    /// Exchanges completed so far.
    pub round: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuelStats {
    pub session_id: SessionId,
    pub winner: Option<Winner>,
    pub total_rounds: u32,
    pub player_guesses: Vec<u32>,
    pub house_guesses: Vec<u32>,
}

/// The house's feasible interval, narrowed only by feedback on the player's guesses.
pub fn house_bounds(duel: &BinaryDuel) -> (u32, u32) {
    duel.turns
        .iter()
        .filter(|t| t.guesser == Winner::Player)
        .fold((duel.range_min, duel.range_max), |(low, high), t| match t.feedback {
            Feedback::TooLow => (low.max(t.guess + 1), high),
            Feedback::TooHigh => (low, high.min(t.guess.saturating_sub(1))),
            Feedback::Correct => (low, high),
        })
}

pub fn new_duel<R: Rng + ?Sized>(
    owner: &PlayerId,
    difficulty: BinaryDifficulty,
    now: DateTime<Utc>,
    rng: &mut R,
) -> BinaryDuel {
    let (range_min, range_max) = difficulty.range();
    BinaryDuel {
        id: SessionId::new(),
        owner: owner.clone(),
        difficulty,
        range_min,
        range_max,
        target: rng.gen_range(range_min..=range_max),
        winner: None,
        turns: Vec::new(),
        started_at: now,
        ended_at: None,
    }
}

/// One exchange: the player's guess, then the house's unless the player hit.
pub fn play_guess(duel: &BinaryDuel, guess: u32, now: DateTime<Utc>) -> (BinaryDuel, GuessOutcome) {
    let mut next = duel.clone();
    let turn = duel.turns.len() as u32;

    let result = Feedback::for_guess(guess, duel.target);
    next.turns.push(BinaryTurn {
        turn: turn + 1,
        guesser: Winner::Player,
        guess,
        feedback: result,
    });

    if result == Feedback::Correct {
        next.winner = Some(Winner::Player);
        next.ended_at = Some(now);
        let outcome = GuessOutcome {
            result,
            house_guess: None,
            house_result: None,
            winner: next.winner,
            round: turn / 2 + 1,
        };
        return (next, outcome);
    }

    let (low, high) = house_bounds(&next);
    let house_guess = low + (high.saturating_sub(low)) / 2;
    let house_result = Feedback::for_guess(house_guess, duel.target);
    next.turns.push(BinaryTurn {
        turn: turn + 2,
        guesser: Winner::House,
        guess: house_guess,
        feedback: house_result,
    });
    if house_result == Feedback::Correct {
        next.winner = Some(Winner::House);
        next.ended_at = Some(now);
    }

    let outcome = GuessOutcome {
        result,
        house_guess: Some(house_guess),
        house_result: Some(house_result),
        winner: next.winner,
        round: (turn + 2) / 2,
    };
    (next, outcome)
}

pub fn stats(duel: &BinaryDuel) -> DuelStats {
    DuelStats {
        session_id: duel.id.clone(),
        winner: duel.winner,
        total_rounds: duel.turns.len() as u32 / 2,
        player_guesses: duel.guesses_by(Winner::Player),
        house_guesses: duel.guesses_by(Winner::House),
    }
}

pub struct BinaryService {
    repo: BinaryRepo,
    locks: SessionLocks,
    metrics: Arc<MetricsRecorder>,
}

impl BinaryService {
    pub fn new(db: Database, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            repo: BinaryRepo::new(db),
            locks: SessionLocks::new(),
            metrics,
        }
    }

    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn start(&self, owner: &PlayerId, difficulty: BinaryDifficulty) -> Result<DuelStart, GameError> {
        let duel = new_duel(owner, difficulty, Utc::now(), &mut rand::thread_rng());
        self.repo.create(&duel)?;
        self.metrics
            .counter_inc("sessions_started", &[("game", GameKind::Binary.as_str())], 1);
        info!(session_id = %duel.id, %difficulty, "binary duel started");
        Ok(DuelStart {
            session_id: duel.id,
            difficulty,
            range_min: duel.range_min,
            range_max: duel.range_max,
            first_turn: Winner::Player,
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn guess(&self, id: &SessionId, owner: &PlayerId, guess: u32) -> Result<GuessOutcome, GameError> {
        self.locks.with_lock(id, || {
            let duel = self.load_owned(id, owner)?;
            if duel.is_ended() {
                return Err(GameError::AlreadyEnded(id.to_string()));
            }
            if guess < duel.range_min || guess > duel.range_max {
                return Err(GameError::invalid(format!(
                    "guess must be within [{}, {}], got {guess}",
                    duel.range_min, duel.range_max
                )));
            }

            let (next, outcome) = play_guess(&duel, guess, Utc::now());
            self.repo.save(&next)?;

            if let Some(winner) = outcome.winner {
                let winner = winner.to_string();
                self.metrics.counter_inc(
                    "sessions_ended",
                    &[("game", GameKind::Binary.as_str()), ("winner", winner.as_str())],
                    1,
                );
                info!(session_id = %id, %winner, turns = next.turns.len(), "binary duel ended");
            }
            Ok(outcome)
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn stats(&self, id: &SessionId, owner: &PlayerId) -> Result<DuelStats, GameError> {
        Ok(stats(&self.load_owned(id, owner)?))
    }

    fn load_owned(&self, id: &SessionId, owner: &PlayerId) -> Result<BinaryDuel, GameError> {
        let duel = self.repo.get(id)?;
        if &duel.owner != owner {
            return Err(GameError::NotFound(format!("binary duel {id}")));
        }
        Ok(duel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn duel(target: u32) -> BinaryDuel {
        let mut d = new_duel(
            &PlayerId::from_raw("alice"),
            BinaryDifficulty::Normal,
            Utc::now(),
            &mut StdRng::seed_from_u64(3),
        );
        d.target = target;
        d
    }

    #[test]
    fn target_within_difficulty_range() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let d = new_duel(&PlayerId::from_raw("a"), BinaryDifficulty::Easy, Utc::now(), &mut rng);
            assert!((1..=50).contains(&d.target));
        }
    }

    #[test]
    fn player_hit_ends_immediately() {
        let (next, out) = play_guess(&duel(42), 42, Utc::now());
        assert_eq!(out.result, Feedback::Correct);
        assert_eq!(out.winner, Some(Winner::Player));
        assert_eq!(out.house_guess, None);
        assert_eq!(next.turns.len(), 1);
        assert!(next.is_ended());
    }

    #[test]
    fn house_bisects_from_player_feedback() {
        let (next, out) = play_guess(&duel(42), 80, Utc::now());
        assert_eq!(out.result, Feedback::TooHigh);
        // bounds [1, 79] -> 40
        assert_eq!(out.house_guess, Some(40));
        assert_eq!(out.house_result, Some(Feedback::TooLow));
        assert_eq!(out.round, 1);
        assert_eq!(next.turns.len(), 2);

        // The house's own too-low does not narrow its bounds; the player's 30 does.
        let (next, out) = play_guess(&next, 30, Utc::now());
        assert_eq!(house_bounds(&next), (31, 79));
        assert_eq!(out.house_guess, Some(55));
        assert_eq!(out.round, 2);
    }

    #[test]
    fn house_can_win() {
        // bounds after 100 too_high: [1, 99] -> 50
        let (next, out) = play_guess(&duel(50), 100, Utc::now());
        assert_eq!(out.winner, Some(Winner::House));
        assert_eq!(next.winner, Some(Winner::House));
        assert_eq!(stats(&next).house_guesses, vec![50]);
    }

    #[test]
    fn service_flow() {
        let svc = BinaryService::new(Database::in_memory().unwrap(), Arc::new(MetricsRecorder::new()));
        let alice = PlayerId::from_raw("alice");
        let start = svc.start(&alice, BinaryDifficulty::Hard).unwrap();
        assert_eq!((start.range_min, start.range_max), (1, 1000));
        assert_eq!(start.first_turn, Winner::Player);

        assert!(matches!(svc.guess(&start.session_id, &alice, 0), Err(GameError::InvalidInput(_))));
        assert!(matches!(svc.guess(&start.session_id, &alice, 1001), Err(GameError::InvalidInput(_))));
        assert!(matches!(
            svc.guess(&start.session_id, &PlayerId::from_raw("bob"), 500),
            Err(GameError::NotFound(_))
        ));

        // Bisecting as the player always finishes within the range's depth.
        let (mut low, mut high) = (1, 1000);
        let mut finished = false;
        for _ in 0..20 {
            let g = (low + high) / 2;
            let out = svc.guess(&start.session_id, &alice, g).unwrap();
            if out.winner.is_some() {
                finished = true;
                break;
            }
            match out.result {
                Feedback::TooLow => low = g + 1,
                Feedback::TooHigh => high = g - 1,
                Feedback::Correct => unreachable!(),
            }
        }
        assert!(finished);
        assert!(matches!(
            svc.guess(&start.session_id, &alice, 1),
            Err(GameError::AlreadyEnded(_))
        ));
        let st = svc.stats(&start.session_id, &alice).unwrap();
        assert!(st.winner.is_some());
        assert!(!st.player_guesses.is_empty());
    }
}
