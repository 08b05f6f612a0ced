use chrono::Utc;
use rusqlite::Connection;
use tracing::instrument;

use cortex_core::ids::{PlayerId, SessionId};
use cortex_core::pattern::{PatternSession, RoundRecord, RoundState};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const SESSION_COLUMNS: &str = "id, owner_id, cumulative_score, started_at, ended_at, winner,
    round_number, grid_size, target_length, expected_sequence, correct_streak, max_streak,
    revive_used, time_limit_secs, max_rounds";

const ROUND_COLUMNS: &str = "round_number, outcome, grid_size, target_length, latency_secs,
    base_score, time_penalty, bonus, multiplier, score, correct_streak_at_time,
    max_streak_so_far, projected_final_score";

/// Persistence for pattern sessions. The session row holds the live round
/// state; completed rounds live in `pattern_rounds`, one row each.
pub struct PatternRepo {
    db: Database,
}

impl PatternRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a freshly started session.
    #[instrument(skip(self, session), fields(session_id = %session.id, player_id = %session.owner))]
    pub fn create(&self, session: &PatternSession) -> Result<(), StoreError> {
        let expected = serde_json::to_string(&session.round.expected_sequence)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_tx(|conn| {
            conn.execute(
                "INSERT INTO pattern_sessions (id, owner_id, cumulative_score, started_at, ended_at, winner,
                    round_number, grid_size, target_length, expected_sequence, correct_streak, max_streak,
                    revive_used, time_limit_secs, max_rounds, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                rusqlite::params![
                    session.id.as_str(),
                    session.owner.as_str(),
                    session.cumulative_score,
                    session.started_at.to_rfc3339(),
                    session.ended_at.map(|t| t.to_rfc3339()),
                    session.winner.map(|w| w.to_string()),
                    session.round.round_number,
                    session.round.grid_size,
                    session.round.target_length,
                    expected,
                    session.round.correct_streak,
                    session.round.max_streak,
                    session.round.revive_used,
                    session.round.time_limit_secs,
                    session.round.max_rounds,
                    now,
                ],
            )?;
            insert_rounds_after(conn, &session.id, &session.round.round_log, 0)
        })
    }

    /// Load a session with its full round log.
    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<PatternSession, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {SESSION_COLUMNS} FROM pattern_sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id.as_str()])?;
            let mut session = match rows.next()? {
                Some(row) => row_to_session(row)?,
                None => return Err(StoreError::NotFound(format!("pattern session {id}"))),
            };
            session.round.round_log = load_rounds(conn, id)?;
            Ok(session)
        })
    }

    /// Persist the post-submission state: the session row is rewritten and
    /// any round records beyond those already stored are appended, atomically.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn save(&self, session: &PatternSession) -> Result<(), StoreError> {
        let expected = serde_json::to_string(&session.round.expected_sequence)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_tx(|conn| {
            let updated = conn.execute(
                "UPDATE pattern_sessions SET
                    cumulative_score = ?1,
                    ended_at = ?2,
                    winner = ?3,
                    round_number = ?4,
                    grid_size = ?5,
                    target_length = ?6,
                    expected_sequence = ?7,
                    correct_streak = ?8,
                    max_streak = ?9,
                    revive_used = ?10,
                    updated_at = ?11
                 WHERE id = ?12",
                rusqlite::params![
                    session.cumulative_score,
                    session.ended_at.map(|t| t.to_rfc3339()),
                    session.winner.map(|w| w.to_string()),
                    session.round.round_number,
                    session.round.grid_size,
                    session.round.target_length,
                    expected,
                    session.round.correct_streak,
                    session.round.max_streak,
                    session.round.revive_used,
                    now,
                    session.id.as_str(),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("pattern session {}", session.id)));
            }

            let stored: u32 = conn.query_row(
                "SELECT COALESCE(MAX(round_number), 0) FROM pattern_rounds WHERE session_id = ?1",
                [session.id.as_str()],
                |row| row.get(0),
            )?;
            insert_rounds_after(conn, &session.id, &session.round.round_log, stored)
        })
    }

    /// Most recently ended sessions for a player, newest first.
    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn list_completed(&self, owner: &PlayerId, limit: u32) -> Result<Vec<PatternSession>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS} FROM pattern_sessions
                 WHERE owner_id = ?1 AND ended_at IS NOT NULL
                 ORDER BY ended_at DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params![owner.as_str(), limit])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            for session in &mut sessions {
                session.round.round_log = load_rounds(conn, &session.id)?;
            }
            Ok(sessions)
        })
    }

    /// Every session a player has started, active or ended, oldest first,
    /// each with its round log.
    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn list_by_owner(&self, owner: &PlayerId) -> Result<Vec<PatternSession>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {SESSION_COLUMNS} FROM pattern_sessions
                 WHERE owner_id = ?1
                 ORDER BY started_at ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([owner.as_str()])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            for session in &mut sessions {
                session.round.round_log = load_rounds(conn, &session.id)?;
            }
            Ok(sessions)
        })
    }
}

fn insert_rounds_after(
    conn: &Connection,
    session_id: &SessionId,
    log: &[RoundRecord],
    already_stored: u32,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "INSERT INTO pattern_rounds (session_id, round_number, outcome, grid_size, target_length,
            latency_secs, base_score, time_penalty, bonus, multiplier, score, correct_streak_at_time,
            max_streak_so_far, projected_final_score)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )?;
    for r in log.iter().filter(|r| r.round_number > already_stored) {
        stmt.execute(rusqlite::params![
            session_id.as_str(),
            r.round_number,
            r.outcome.as_str(),
            r.grid_size,
            r.target_length,
            r.latency_secs,
            r.base_score,
            r.time_penalty,
            r.bonus,
            r.multiplier,
            r.score,
            r.correct_streak_at_time,
            r.max_streak_so_far,
            r.projected_final_score,
        ])?;
    }
    Ok(())
}

fn load_rounds(conn: &Connection, session_id: &SessionId) -> Result<Vec<RoundRecord>, StoreError> {
    let sql = format!(
        "SELECT {ROUND_COLUMNS} FROM pattern_rounds WHERE session_id = ?1 ORDER BY round_number"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([session_id.as_str()])?;
    let mut log = Vec::new();
    while let Some(row) = rows.next()? {
        log.push(row_to_round(row)?);
    }
    Ok(log)
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<PatternSession, StoreError> {
    const T: &str = "pattern_sessions";
    let started_at: String = row_helpers::get(row, 3, T, "started_at")?;
    let ended_at: Option<String> = row_helpers::get_opt(row, 4, T, "ended_at")?;
    let winner: Option<String> = row_helpers::get_opt(row, 5, T, "winner")?;
    let expected: String = row_helpers::get(row, 9, T, "expected_sequence")?;

    Ok(PatternSession {
        id: SessionId::from_raw(row_helpers::get::<String>(row, 0, T, "id")?),
        owner: PlayerId::from_raw(row_helpers::get::<String>(row, 1, T, "owner_id")?),
        cumulative_score: row_helpers::get(row, 2, T, "cumulative_score")?,
        started_at: row_helpers::parse_timestamp(&started_at, T, "started_at")?,
        ended_at: ended_at
            .map(|raw| row_helpers::parse_timestamp(&raw, T, "ended_at"))
            .transpose()?,
        winner: winner
            .map(|raw| row_helpers::parse_enum(&raw, T, "winner"))
            .transpose()?,
        round: RoundState {
            round_number: row_helpers::get(row, 6, T, "round_number")?,
            grid_size: row_helpers::get(row, 7, T, "grid_size")?,
            target_length: row_helpers::get(row, 8, T, "target_length")?,
            expected_sequence: row_helpers::parse_json(&expected, T, "expected_sequence")?,
            correct_streak: row_helpers::get(row, 10, T, "correct_streak")?,
            max_streak: row_helpers::get(row, 11, T, "max_streak")?,
            revive_used: row_helpers::get(row, 12, T, "revive_used")?,
            round_log: Vec::new(),
            time_limit_secs: row_helpers::get(row, 13, T, "time_limit_secs")?,
            max_rounds: row_helpers::get(row, 14, T, "max_rounds")?,
        },
    })
}

fn row_to_round(row: &rusqlite::Row<'_>) -> Result<RoundRecord, StoreError> {
    const T: &str = "pattern_rounds";
    let outcome: String = row_helpers::get(row, 1, T, "outcome")?;
    let outcome: cortex_core::pattern::Outcome = row_helpers::parse_enum(&outcome, T, "outcome")?;

    Ok(RoundRecord {
        round_number: row_helpers::get(row, 0, T, "round_number")?,
        correct: outcome.is_correct(),
        outcome,
        grid_size: row_helpers::get(row, 2, T, "grid_size")?,
        target_length: row_helpers::get(row, 3, T, "target_length")?,
        latency_secs: row_helpers::get(row, 4, T, "latency_secs")?,
        base_score: row_helpers::get(row, 5, T, "base_score")?,
        time_penalty: row_helpers::get(row, 6, T, "time_penalty")?,
        bonus: row_helpers::get(row, 7, T, "bonus")?,
        multiplier: row_helpers::get(row, 8, T, "multiplier")?,
        score: row_helpers::get(row, 9, T, "score")?,
        correct_streak_at_time: row_helpers::get(row, 10, T, "correct_streak_at_time")?,
        max_streak_so_far: row_helpers::get(row, 11, T, "max_streak_so_far")?,
        projected_final_score: row_helpers::get(row, 12, T, "projected_final_score")?,
    })
}
