//! Read-only reports over a pattern session's round log.

use serde::Serialize;

use cortex_core::pattern::{Outcome, PatternSession, RoundRecord, Winner};
use cortex_core::{PlayerId, SessionId};

use crate::error::GameError;
use crate::stats::{mean, percent, round2, sample_stddev, Report};

/// Minimum logged rounds before a profile is attempted.
pub const PROFILE_MIN_ROUNDS: usize = 3;
/// Minimum rounds, across all of a player's sessions, for a lifetime profile.
pub const BRAIN_PROFILE_MIN_ROUNDS: usize = 5;

/// Accuracy swing (percentage points) between early and late rounds that
/// marks a learner or a fader within one session.
const SESSION_TREND_THRESHOLD: f64 = 20.0;
/// The same swing measured over a player's whole history.
const LIFETIME_TREND_THRESHOLD: f64 = 15.0;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MistakeBreakdown {
    pub timeout: usize,
    pub wrong_order: usize,
    pub mixed: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatternStats {
    pub session_id: SessionId,
    pub total_rounds: usize,
    pub correct_answers: usize,
    pub accuracy_percent: f64,
    pub average_latency_secs: f64,
    pub latency_stddev: f64,
    pub mistake_breakdown: MistakeBreakdown,
    pub final_target_length: u32,
    pub final_score: u32,
    pub max_streak: u32,
    pub winner: Option<Winner>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatternProgress {
    pub session_id: SessionId,
    pub round_number: u32,
    pub grid_size: u32,
    pub target_length: u32,
    pub sequence: Vec<u32>,
    pub revive_used: bool,
    pub correct_streak: u32,
    pub max_streak: u32,
    pub log_length: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    AccuracyOriented,
    Speedster,
    ReactiveLearner,
    BurstFader,
    BalancedPerformer,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileMetrics {
    pub accuracy_percent: f64,
    pub avg_latency_secs: f64,
    pub latency_stddev: f64,
    pub avg_grid_size: f64,
    pub early_accuracy: f64,
    pub late_accuracy: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatternProfile {
    pub session_id: SessionId,
    pub profile: ProfileKind,
    pub metrics: ProfileMetrics,
}

/// Long-term profile over every pattern round a player has played.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BrainProfile {
    pub player_id: PlayerId,
    pub profile: ProfileKind,
    pub summary: ProfileMetrics,
    /// Late-third accuracy minus early-third accuracy.
    pub learning_trend: f64,
    pub games_analyzed: usize,
    pub rounds_total: usize,
}

fn latencies(log: &[RoundRecord]) -> Vec<f64> {
    log.iter().map(|r| r.latency_secs).collect()
}

fn correct_count(log: &[RoundRecord]) -> usize {
    log.iter().filter(|r| r.correct).count()
}

pub fn stats(session: &PatternSession) -> Report<PatternStats> {
    let log = &session.round.round_log;
    if log.is_empty() {
        return Report::insufficient("No rounds played yet.");
    }

    let times = latencies(log);
    let count = |o: Outcome| log.iter().filter(|r| r.outcome == o).count();

    Report::Ready(PatternStats {
        session_id: session.id.clone(),
        total_rounds: log.len(),
        correct_answers: correct_count(log),
        accuracy_percent: percent(correct_count(log), log.len()),
        average_latency_secs: round2(mean(&times)),
        latency_stddev: round2(sample_stddev(&times)),
        mistake_breakdown: MistakeBreakdown {
            timeout: count(Outcome::Timeout),
            wrong_order: count(Outcome::WrongOrder),
            mixed: count(Outcome::Mixed),
        },
        final_target_length: session.round.target_length,
        final_score: session.cumulative_score,
        max_streak: session.round.max_streak,
        winner: session.winner,
    })
}

/// Live snapshot of an active session.
pub fn progress(session: &PatternSession) -> Result<PatternProgress, GameError> {
    if session.is_ended() {
        return Err(GameError::AlreadyEnded(session.id.to_string()));
    }
    let r = &session.round;
    Ok(PatternProgress {
        session_id: session.id.clone(),
        round_number: r.round_number,
        grid_size: r.grid_size,
        target_length: r.target_length,
        sequence: r.expected_sequence.clone(),
        revive_used: r.revive_used,
        correct_streak: r.correct_streak,
        max_streak: r.max_streak,
        log_length: r.round_log.len(),
    })
}

/// Rule-based classification. Thresholds compare the 2dp-rounded metrics.
pub fn classify(m: &ProfileMetrics) -> ProfileKind {
    classify_with_trend(m, SESSION_TREND_THRESHOLD)
}

fn classify_with_trend(m: &ProfileMetrics, trend_threshold: f64) -> ProfileKind {
    let trend = m.late_accuracy - m.early_accuracy;
    if m.accuracy_percent >= 85.0 && m.avg_latency_secs > 3.0 {
        ProfileKind::AccuracyOriented
    } else if m.avg_latency_secs < 2.2 && m.accuracy_percent < 75.0 {
        ProfileKind::Speedster
    } else if trend > trend_threshold {
        ProfileKind::ReactiveLearner
    } else if trend < -trend_threshold {
        ProfileKind::BurstFader
    } else {
        ProfileKind::BalancedPerformer
    }
}

fn metrics(log: &[&RoundRecord], early: &[&RoundRecord], late: &[&RoundRecord]) -> ProfileMetrics {
    let correct = |rs: &[&RoundRecord]| rs.iter().filter(|r| r.correct).count();
    let times: Vec<f64> = log.iter().map(|r| r.latency_secs).collect();
    let grids: Vec<f64> = log.iter().map(|r| f64::from(r.grid_size)).collect();
    ProfileMetrics {
        accuracy_percent: percent(correct(log), log.len()),
        avg_latency_secs: round2(mean(&times)),
        latency_stddev: round2(sample_stddev(&times)),
        avg_grid_size: round2(mean(&grids)),
        early_accuracy: percent(correct(early), early.len()),
        late_accuracy: percent(correct(late), late.len()),
    }
}

pub fn profile(session: &PatternSession) -> Report<PatternProfile> {
    let log: Vec<&RoundRecord> = session.round.round_log.iter().collect();
    if log.len() < PROFILE_MIN_ROUNDS {
        return Report::insufficient("Not enough data for analysis.");
    }

    let (early, late) = log.split_at(log.len() / 2);
    let metrics = metrics(&log, early, late);
    Report::Ready(PatternProfile {
        session_id: session.id.clone(),
        profile: classify(&metrics),
        metrics,
    })
}

/// Profile across every session in `sessions`, which must be in play order.
/// Early and late are the first and last thirds of the combined rounds.
pub fn brain_profile(player: &PlayerId, sessions: &[PatternSession]) -> Report<BrainProfile> {
    if sessions.is_empty() {
        return Report::insufficient("No pattern games played yet.");
    }
    let log: Vec<&RoundRecord> = sessions.iter().flat_map(|s| &s.round.round_log).collect();
    if log.len() < BRAIN_PROFILE_MIN_ROUNDS {
        return Report::insufficient("Not enough rounds across games to build profile.");
    }

    let third = log.len() / 3;
    let metrics = metrics(&log, &log[..third], &log[log.len() - third..]);
    Report::Ready(BrainProfile {
        player_id: player.clone(),
        profile: classify_with_trend(&metrics, LIFETIME_TREND_THRESHOLD),
        learning_trend: round2(metrics.late_accuracy - metrics.early_accuracy),
        summary: metrics,
        games_analyzed: sessions.len(),
        rounds_total: log.len(),
    })
}
