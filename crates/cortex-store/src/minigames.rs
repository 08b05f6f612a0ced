use chrono::Utc;
use tracing::instrument;

use cortex_core::ids::{PlayerId, SessionId};
use cortex_core::kind::GameKind;
use cortex_core::minigame::{MinigameSession, MinigameState};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const COLUMNS: &str = "id, owner_id, kind, score, started_at, ended_at, state";

/// Sessions for the dual n-back, Stroop and chunking games. Game-specific
/// state is stored as a tagged JSON document in `state`.
pub struct MinigameRepo {
    db: Database,
}

impl MinigameRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, session), fields(session_id = %session.id, kind = %session.kind()))]
    pub fn create(&self, session: &MinigameSession) -> Result<(), StoreError> {
        let state = serde_json::to_string(&session.state)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO minigame_sessions (id, owner_id, kind, score, started_at, ended_at, state, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    session.id.as_str(),
                    session.owner.as_str(),
                    session.kind().as_str(),
                    session.score,
                    session.started_at.to_rfc3339(),
                    session.ended_at.map(|t| t.to_rfc3339()),
                    state,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<MinigameSession, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {COLUMNS} FROM minigame_sessions WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_session(row),
                None => Err(StoreError::NotFound(format!("session {id}"))),
            }
        })
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub fn save(&self, session: &MinigameSession) -> Result<(), StoreError> {
        let state = serde_json::to_string(&session.state)?;
        let now = Utc::now().to_rfc3339();
        self.db.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE minigame_sessions SET score = ?1, ended_at = ?2, state = ?3, updated_at = ?4
                 WHERE id = ?5",
                rusqlite::params![
                    session.score,
                    session.ended_at.map(|t| t.to_rfc3339()),
                    state,
                    now,
                    session.id.as_str(),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("session {}", session.id)));
            }
            Ok(())
        })
    }

    /// Finished sessions of one kind, newest first.
    #[instrument(skip(self), fields(player_id = %owner, kind = %kind))]
    pub fn list_completed(
        &self,
        owner: &PlayerId,
        kind: GameKind,
        limit: u32,
    ) -> Result<Vec<MinigameSession>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM minigame_sessions
                 WHERE owner_id = ?1 AND kind = ?2 AND ended_at IS NOT NULL
                 ORDER BY ended_at DESC LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params![owner.as_str(), kind.as_str(), limit])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }
            Ok(sessions)
        })
    }
}

fn row_to_session(row: &rusqlite::Row<'_>) -> Result<MinigameSession, StoreError> {
    const T: &str = "minigame_sessions";
    let kind: String = row_helpers::get(row, 2, T, "kind")?;
    let kind: GameKind = row_helpers::parse_enum(&kind, T, "kind")?;
    let started_at: String = row_helpers::get(row, 4, T, "started_at")?;
    let ended_at: Option<String> = row_helpers::get_opt(row, 5, T, "ended_at")?;
    let state: String = row_helpers::get(row, 6, T, "state")?;
    let state: MinigameState = row_helpers::parse_json(&state, T, "state")?;

    if state.kind() != kind {
        return Err(StoreError::CorruptRow {
            table: T,
            column: "state",
            detail: format!("state is {} but row kind is {kind}", state.kind()),
        });
    }

    Ok(MinigameSession {
        id: SessionId::from_raw(row_helpers::get::<String>(row, 0, T, "id")?),
        owner: PlayerId::from_raw(row_helpers::get::<String>(row, 1, T, "owner_id")?),
        score: row_helpers::get(row, 3, T, "score")?,
        started_at: row_helpers::parse_timestamp(&started_at, T, "started_at")?,
        ended_at: ended_at
            .map(|raw| row_helpers::parse_timestamp(&raw, T, "ended_at"))
            .transpose()?,
        state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::chunk::ChunkState;
    use cortex_core::stroop::{StroopCard, StroopState};

    fn stroop(owner: &str) -> MinigameSession {
        MinigameSession {
            id: SessionId::new(),
            owner: PlayerId::from_raw(owner),
            score: 0,
            started_at: Utc::now(),
            ended_at: None,
            state: MinigameState::Stroop(StroopState {
                round_number: 1,
                total_rounds: 5,
                card: StroopCard { word: "RED".into(), ink: "GREEN".into() },
                log: Vec::new(),
            }),
        }
    }

    fn chunk(owner: &str) -> MinigameSession {
        MinigameSession {
            id: SessionId::new(),
            owner: PlayerId::from_raw(owner),
            score: 0,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
            state: MinigameState::Chunk(ChunkState {
                round_number: 1,
                total_rounds: 5,
                max_chunk_size: 3,
                sequence: vec![1, 2, 3, 4, 5, 6, 7],
                log: Vec::new(),
            }),
        }
    }

    #[test]
    fn create_get_roundtrip() {
        let repo = MinigameRepo::new(Database::in_memory().unwrap());
        let s = stroop("alice");
        repo.create(&s).unwrap();
        assert_eq!(repo.get(&s.id).unwrap(), s);
    }

    #[test]
    fn save_updates_score_and_state() {
        let repo = MinigameRepo::new(Database::in_memory().unwrap());
        let mut s = stroop("alice");
        repo.create(&s).unwrap();
        s.score = 12;
        if let MinigameState::Stroop(state) = &mut s.state {
            state.round_number = 2;
        }
        repo.save(&s).unwrap();
        assert_eq!(repo.get(&s.id).unwrap(), s);
    }

    #[test]
    fn save_missing_is_not_found() {
        let repo = MinigameRepo::new(Database::in_memory().unwrap());
        assert!(matches!(repo.save(&stroop("alice")), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_completed_filters_by_kind() {
        let repo = MinigameRepo::new(Database::in_memory().unwrap());
        let mut finished_stroop = stroop("alice");
        finished_stroop.ended_at = Some(Utc::now());
        repo.create(&finished_stroop).unwrap();
        repo.create(&chunk("alice")).unwrap();
        repo.create(&chunk("bob")).unwrap();

        let alice = PlayerId::from_raw("alice");
        assert_eq!(repo.list_completed(&alice, GameKind::Chunk, 10).unwrap().len(), 1);
        assert_eq!(repo.list_completed(&alice, GameKind::Stroop, 10).unwrap().len(), 1);
        assert!(repo.list_completed(&alice, GameKind::Dual, 10).unwrap().is_empty());
    }

    #[test]
    fn mismatched_kind_is_corrupt() {
        let db = Database::in_memory().unwrap();
        let repo = MinigameRepo::new(db.clone());
        let s = stroop("alice");
        repo.create(&s).unwrap();
        db.with_conn(|conn| {
            conn.execute("UPDATE minigame_sessions SET kind = 'chunk' WHERE id = ?1", [s.id.as_str()])?;
            Ok(())
        })
        .unwrap();
        assert!(matches!(repo.get(&s.id), Err(StoreError::CorruptRow { column: "state", .. })));
    }
}
