//! Per-player history of finished sessions across all games.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use cortex_core::binary::{BinaryDuel, Feedback};
use cortex_core::minigame::MinigameSession;
use cortex_core::pattern::{PatternSession, Winner};
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::{BinaryRepo, Database, MinigameRepo, PatternRepo};

use crate::error::GameError;
use crate::stats::{percent, round2};

pub const MAX_HISTORY: u32 = 50;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub session_id: SessionId,
    pub score: u32,
    pub rounds: usize,
    pub accuracy_percent: f64,
    pub winner: Option<Winner>,
    pub duration_secs: f64,
    pub completed_at: DateTime<Utc>,
}

fn duration_secs(started: DateTime<Utc>, ended: DateTime<Utc>) -> f64 {
    round2((ended - started).num_milliseconds().max(0) as f64 / 1000.0)
}

impl HistoryEntry {
    fn from_pattern(s: &PatternSession) -> Option<Self> {
        let ended = s.ended_at?;
        let log = &s.round.round_log;
        Some(Self {
            session_id: s.id.clone(),
            score: s.cumulative_score,
            rounds: log.len(),
            accuracy_percent: percent(log.iter().filter(|r| r.correct).count(), log.len()),
            winner: s.winner,
            duration_secs: duration_secs(s.started_at, ended),
            completed_at: ended,
        })
    }

    /// Duels carry no score; accuracy is the share of the player's guesses that hit.
    fn from_duel(d: &BinaryDuel) -> Option<Self> {
        let ended = d.ended_at?;
        let mine: Vec<_> = d.turns.iter().filter(|t| t.guesser == Winner::Player).collect();
        let hits = mine.iter().filter(|t| t.feedback == Feedback::Correct).count();
        Some(Self {
            session_id: d.id.clone(),
            score: 0,
            rounds: mine.len(),
            accuracy_percent: percent(hits, mine.len()),
            winner: d.winner,
            duration_secs: duration_secs(d.started_at, ended),
            completed_at: ended,
        })
    }

    fn from_minigame(s: &MinigameSession) -> Option<Self> {
        let ended = s.ended_at?;
        Some(Self {
            session_id: s.id.clone(),
            score: s.score,
            rounds: s.state.rounds_played(),
            accuracy_percent: percent(s.state.rounds_correct(), s.state.rounds_played()),
            winner: None,
            duration_secs: duration_secs(s.started_at, ended),
            completed_at: ended,
        })
    }
}

pub struct ProgressService {
    pattern: PatternRepo,
    binary: BinaryRepo,
    minigames: MinigameRepo,
}

impl ProgressService {
    pub fn new(db: Database) -> Self {
        Self {
            pattern: PatternRepo::new(db.clone()),
            binary: BinaryRepo::new(db.clone()),
            minigames: MinigameRepo::new(db),
        }
    }

    /// Most recent finished sessions of `kind`, newest first.
    #[instrument(skip(self), fields(player_id = %owner, kind = %kind))]
    pub fn history(&self, owner: &PlayerId, kind: GameKind, limit: u32) -> Result<Vec<HistoryEntry>, GameError> {
        if !(1..=MAX_HISTORY).contains(&limit) {
            return Err(GameError::invalid(format!(
                "limit must be within [1, {MAX_HISTORY}], got {limit}"
            )));
        }
        let entries = match kind {
            GameKind::Pattern => self
                .pattern
                .list_completed(owner, limit)?
                .iter()
                .filter_map(HistoryEntry::from_pattern)
                .collect(),
            GameKind::Binary => self
                .binary
                .list_completed(owner, limit)?
                .iter()
                .filter_map(HistoryEntry::from_duel)
                .collect(),
            GameKind::Dual | GameKind::Stroop | GameKind::Chunk => self
                .minigames
                .list_completed(owner, kind, limit)?
                .iter()
                .filter_map(HistoryEntry::from_minigame)
                .collect(),
        };
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::{new_duel, play_guess};
    use crate::minigame::new_session;
    use cortex_core::binary::BinaryDifficulty;
    use cortex_core::stroop::{StroopCard, StroopRound, StroopState};
    use cortex_core::minigame::MinigameState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn limit_is_bounded() {
        let svc = ProgressService::new(Database::in_memory().unwrap());
        let alice = PlayerId::from_raw("alice");
        for bad in [0, 51] {
            assert!(matches!(
                svc.history(&alice, GameKind::Pattern, bad),
                Err(GameError::InvalidInput(_))
            ));
        }
        assert!(svc.history(&alice, GameKind::Pattern, 50).unwrap().is_empty());
    }

    #[test]
    fn duel_history_counts_player_guesses() {
        let db = Database::in_memory().unwrap();
        let svc = ProgressService::new(db.clone());
        let repo = BinaryRepo::new(db);
        let alice = PlayerId::from_raw("alice");

        let mut duel = new_duel(&alice, BinaryDifficulty::Normal, Utc::now(), &mut StdRng::seed_from_u64(1));
        duel.target = 42;
        repo.create(&duel).unwrap();
        let (duel, _) = play_guess(&duel, 10, Utc::now());
        let (duel, out) = play_guess(&duel, 42, Utc::now());
        assert_eq!(out.winner, Some(Winner::Player));
        repo.save(&duel).unwrap();

        let history = svc.history(&alice, GameKind::Binary, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rounds, 2);
        assert_eq!(history[0].accuracy_percent, 50.0);
        assert_eq!(history[0].winner, Some(Winner::Player));
        assert_eq!(history[0].score, 0);
    }

    #[test]
    fn minigame_history_only_lists_finished_sessions_of_kind() {
        let db = Database::in_memory().unwrap();
        let svc = ProgressService::new(db.clone());
        let repo = MinigameRepo::new(db);
        let alice = PlayerId::from_raw("alice");
        let card = StroopCard { word: "RED".into(), ink: "BLUE".into() };

        let open = new_session(
            &alice,
            MinigameState::Stroop(StroopState {
                round_number: 1,
                total_rounds: 1,
                card: card.clone(),
                log: Vec::new(),
            }),
        );
        repo.create(&open).unwrap();

        let mut done = new_session(
            &alice,
            MinigameState::Stroop(StroopState {
                round_number: 1,
                total_rounds: 1,
                card: card.clone(),
                log: vec![StroopRound {
                    round_number: 1,
                    card,
                    response: "BLUE".into(),
                    latency_secs: 1.0,
                    correct: true,
                    congruent: false,
                    score: 8,
                }],
            }),
        );
        done.score = 8;
        done.ended_at = Some(done.started_at + chrono::Duration::milliseconds(2500));
        repo.create(&done).unwrap();

        let history = svc.history(&alice, GameKind::Stroop, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].session_id, done.id);
        assert_eq!(history[0].accuracy_percent, 100.0);
        assert_eq!(history[0].duration_secs, 2.5);
        assert!(svc.history(&alice, GameKind::Chunk, 10).unwrap().is_empty());
    }
}
