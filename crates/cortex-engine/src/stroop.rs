//! Stroop colour-word task: name the ink colour, not the word.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use cortex_core::minigame::{MinigameSession, MinigameState};
use cortex_core::stroop::{StroopCard, StroopRound, StroopState, COLORS};
use cortex_core::{GameKind, PlayerId, SessionId};
use cortex_store::{Database, MinigameRepo};
use cortex_telemetry::MetricsRecorder;

use crate::error::GameError;
use crate::locks::SessionLocks;
use crate::minigame;
use crate::pattern::machine::validate_latency;
use crate::stats::{mean, percent, round2, Report};
use crate::tunables::GameConfig;

const CONGRUENT_BASE: f64 = 7.0;
const INCONGRUENT_BASE: f64 = 10.0;
const LATENCY_WEIGHT: f64 = 2.0;
pub const MAX_ROUNDS: u32 = 50;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StroopStart {
    pub rounds: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StroopAnswer {
    pub response: String,
    pub latency_secs: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StroopStarted {
    pub session_id: SessionId,
    pub round_number: u32,
    pub total_rounds: u32,
    pub card: StroopCard,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StroopOutcome {
    pub correct: bool,
    pub congruent: bool,
    pub score_gained: u32,
    pub total_score: u32,
    pub record: StroopRound,
    pub next_card: Option<StroopCard>,
    pub game_over: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StroopStats {
    pub session_id: SessionId,
    pub total_rounds: usize,
    pub correct_answers: usize,
    pub accuracy_percent: f64,
    pub average_latency_secs: f64,
    /// `None` when no incongruent card was shown.
    pub incongruent_accuracy_percent: Option<f64>,
    pub final_score: u32,
}

/// Word and ink drawn independently from the palette.
pub fn draw_card<R: Rng + ?Sized>(rng: &mut R) -> StroopCard {
    StroopCard {
        word: COLORS[rng.gen_range(0..COLORS.len())].to_owned(),
        ink: COLORS[rng.gen_range(0..COLORS.len())].to_owned(),
    }
}

pub fn score_response(card: &StroopCard, response: &str, latency_secs: f64) -> (bool, u32) {
    let correct = response.trim().to_uppercase() == card.ink;
    let base = if card.is_congruent() { CONGRUENT_BASE } else { INCONGRUENT_BASE };
    let penalty = (latency_secs * LATENCY_WEIGHT).min(base);
    let score = if correct { (base - penalty).floor() as u32 } else { 0 };
    (correct, score)
}

pub fn answer<R: Rng + ?Sized>(
    session: &MinigameSession,
    state: &StroopState,
    ans: &StroopAnswer,
    now: DateTime<Utc>,
    rng: &mut R,
) -> (MinigameSession, StroopOutcome) {
    let (correct, score) = score_response(&state.card, &ans.response, ans.latency_secs);
    let record = StroopRound {
        round_number: state.round_number,
        card: state.card.clone(),
        response: ans.response.trim().to_uppercase(),
        latency_secs: ans.latency_secs,
        correct,
        congruent: state.card.is_congruent(),
        score,
    };

    let mut next_state = state.clone();
    next_state.log.push(record.clone());
    let game_over = state.round_number >= state.total_rounds;

    let mut next = session.clone();
    next.score += score;
    let next_card = if game_over {
        next.ended_at = Some(now);
        None
    } else {
        next_state.round_number += 1;
        next_state.card = draw_card(rng);
        Some(next_state.card.clone())
    };

    let outcome = StroopOutcome {
        correct,
        congruent: record.congruent,
        score_gained: score,
        total_score: next.score,
        record,
        next_card,
        game_over,
    };
    next.state = MinigameState::Stroop(next_state);
    (next, outcome)
}

pub fn stats(session: &MinigameSession, state: &StroopState) -> Report<StroopStats> {
    let log = &state.log;
    if log.is_empty() {
        return Report::insufficient("No rounds played.");
    }
    let correct = log.iter().filter(|r| r.correct).count();
    let incongruent: Vec<&StroopRound> = log.iter().filter(|r| !r.congruent).collect();
    let incongruent_correct = incongruent.iter().filter(|r| r.correct).count();
    let times: Vec<f64> = log.iter().map(|r| r.latency_secs).collect();

    Report::Ready(StroopStats {
        session_id: session.id.clone(),
        total_rounds: log.len(),
        correct_answers: correct,
        accuracy_percent: percent(correct, log.len()),
        average_latency_secs: round2(mean(&times)),
        incongruent_accuracy_percent: (!incongruent.is_empty())
            .then(|| percent(incongruent_correct, incongruent.len())),
        final_score: session.score,
    })
}

pub struct StroopService {
    repo: MinigameRepo,
    locks: SessionLocks,
    config: GameConfig,
    metrics: Arc<MetricsRecorder>,
}

impl StroopService {
    pub fn new(db: Database, config: GameConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            repo: MinigameRepo::new(db),
            locks: SessionLocks::new(),
            config,
            metrics,
        }
    }

    #[instrument(skip(self, params), fields(player_id = %owner))]
    pub fn start(&self, owner: &PlayerId, params: StroopStart) -> Result<StroopStarted, GameError> {
        let total_rounds = params.rounds.unwrap_or(self.config.games.stroop_rounds);
        if !(1..=MAX_ROUNDS).contains(&total_rounds) {
            return Err(GameError::invalid(format!(
                "rounds must be within [1, {MAX_ROUNDS}], got {total_rounds}"
            )));
        }
        let card = draw_card(&mut rand::thread_rng());
        let session = minigame::new_session(
            owner,
            MinigameState::Stroop(StroopState {
                round_number: 1,
                total_rounds,
                card: card.clone(),
                log: Vec::new(),
            }),
        );
        self.repo.create(&session)?;

        self.metrics
            .counter_inc("sessions_started", &[("game", GameKind::Stroop.as_str())], 1);
        info!(session_id = %session.id, total_rounds, "stroop session started");
        Ok(StroopStarted {
            session_id: session.id,
            round_number: 1,
            total_rounds,
            card,
        })
    }

    #[instrument(skip(self, ans), fields(session_id = %id, player_id = %owner))]
    pub fn submit(&self, id: &SessionId, owner: &PlayerId, ans: StroopAnswer) -> Result<StroopOutcome, GameError> {
        if ans.response.trim().is_empty() {
            return Err(GameError::invalid("response must not be empty"));
        }
        validate_latency(ans.latency_secs, self.config.pattern.max_latency_secs)?;

        self.locks.with_lock(id, || {
            let session = minigame::load_owned(&self.repo, id, owner, GameKind::Stroop)?;
            if session.is_ended() {
                return Err(GameError::AlreadyEnded(id.to_string()));
            }
            let MinigameState::Stroop(state) = &session.state else {
                return Err(GameError::NotFound(format!("stroop session {id}")));
            };
            let (next, outcome) = answer(&session, state, &ans, Utc::now(), &mut rand::thread_rng());
            self.repo.save(&next)?;

            minigame::record_round(&self.metrics, GameKind::Stroop, ans.latency_secs, outcome.game_over);
            if outcome.game_over {
                info!(session_id = %id, total_score = next.score, "stroop session ended");
            }
            Ok(outcome)
        })
    }

    #[instrument(skip(self), fields(session_id = %id, player_id = %owner))]
    pub fn stats(&self, id: &SessionId, owner: &PlayerId) -> Result<Report<StroopStats>, GameError> {
        let session = minigame::load_owned(&self.repo, id, owner, GameKind::Stroop)?;
        match &session.state {
            MinigameState::Stroop(state) => Ok(stats(&session, state)),
            _ => Err(GameError::NotFound(format!("stroop session {id}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(word: &str, ink: &str) -> StroopCard {
        StroopCard {
            word: word.into(),
            ink: ink.into(),
        }
    }

    #[test]
    fn incongruent_cards_score_higher() {
        assert_eq!(score_response(&card("RED", "BLUE"), "blue", 1.0), (true, 8));
        assert_eq!(score_response(&card("RED", "RED"), " red ", 1.0), (true, 5));
    }

    #[test]
    fn naming_the_word_is_wrong() {
        assert_eq!(score_response(&card("RED", "BLUE"), "RED", 0.5), (false, 0));
    }

    #[test]
    fn penalty_saturates() {
        assert_eq!(score_response(&card("GREEN", "PURPLE"), "purple", 12.0), (true, 0));
        // 10 - 2.6 = 7.4 -> 7
        assert_eq!(score_response(&card("GREEN", "PURPLE"), "purple", 1.3), (true, 7));
    }

    #[test]
    fn draws_from_palette() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let c = draw_card(&mut rng);
            assert!(COLORS.contains(&c.word.as_str()) && COLORS.contains(&c.ink.as_str()));
        }
    }

    #[test]
    fn session_ends_after_total_rounds() {
        let state = StroopState {
            round_number: 1,
            total_rounds: 2,
            card: card("RED", "BLUE"),
            log: Vec::new(),
        };
        let session = minigame::new_session(&PlayerId::from_raw("alice"), MinigameState::Stroop(state.clone()));
        let mut rng = StdRng::seed_from_u64(1);
        let ans = StroopAnswer { response: "BLUE".into(), latency_secs: 1.0 };

        let (s1, out1) = answer(&session, &state, &ans, Utc::now(), &mut rng);
        assert!(!out1.game_over);
        assert!(out1.next_card.is_some());
        assert_eq!(out1.total_score, 8);

        let MinigameState::Stroop(state1) = &s1.state else {
            panic!("not stroop");
        };
        assert_eq!(state1.round_number, 2);
        let (s2, out2) = answer(&s1, state1, &ans, Utc::now(), &mut rng);
        assert!(out2.game_over);
        assert!(out2.next_card.is_none());
        assert!(s2.is_ended());
    }

    #[test]
    fn stats_report_incongruent_accuracy() {
        let mut state = StroopState {
            round_number: 3,
            total_rounds: 5,
            card: card("RED", "RED"),
            log: Vec::new(),
        };
        for (c, correct) in [(card("RED", "RED"), true), (card("RED", "BLUE"), false)] {
            state.log.push(StroopRound {
                round_number: state.log.len() as u32 + 1,
                congruent: c.is_congruent(),
                card: c,
                response: "RED".into(),
                latency_secs: 1.0,
                correct,
                score: 0,
            });
        }
        let session = minigame::new_session(&PlayerId::from_raw("a"), MinigameState::Stroop(state.clone()));
        let st = stats(&session, &state).ready().unwrap();
        assert_eq!(st.accuracy_percent, 50.0);
        assert_eq!(st.incongruent_accuracy_percent, Some(0.0));

        state.log.truncate(1);
        let st = stats(&session, &state).ready().unwrap();
        assert_eq!(st.incongruent_accuracy_percent, None);
    }

    #[test]
    fn service_validates_and_persists() {
        let svc = StroopService::new(
            Database::in_memory().unwrap(),
            GameConfig::default(),
            Arc::new(MetricsRecorder::new()),
        );
        let alice = PlayerId::from_raw("alice");
        assert!(matches!(
            svc.start(&alice, StroopStart { rounds: Some(0) }),
            Err(GameError::InvalidInput(_))
        ));
        let started = svc.start(&alice, StroopStart { rounds: Some(1) }).unwrap();
        assert!(matches!(
            svc.submit(&started.session_id, &alice, StroopAnswer { response: "  ".into(), latency_secs: 1.0 }),
            Err(GameError::InvalidInput(_))
        ));
        let out = svc
            .submit(
                &started.session_id,
                &alice,
                StroopAnswer { response: started.card.ink.clone(), latency_secs: 1.0 },
            )
            .unwrap();
        assert!(out.correct);
        assert!(out.game_over);
        let st = svc.stats(&started.session_id, &alice).unwrap().ready().unwrap();
        assert_eq!(st.total_rounds, 1);
        assert_eq!(st.final_score, out.total_score);
    }
}
