use rusqlite::Connection;
use tracing::instrument;

use cortex_core::binary::{BinaryDuel, BinaryTurn};
use cortex_core::ids::{PlayerId, SessionId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const DUEL_COLUMNS: &str =
    "id, owner_id, difficulty, range_min, range_max, target, winner, started_at, ended_at";

pub struct BinaryRepo {
    db: Database,
}

impl BinaryRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, duel), fields(session_id = %duel.id, player_id = %duel.owner))]
    pub fn create(&self, duel: &BinaryDuel) -> Result<(), StoreError> {
        self.db.with_tx(|conn| {
            conn.execute(
                "INSERT INTO binary_duels (id, owner_id, difficulty, range_min, range_max, target, winner, started_at, ended_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    duel.id.as_str(),
                    duel.owner.as_str(),
                    duel.difficulty.to_string(),
                    duel.range_min,
                    duel.range_max,
                    duel.target,
                    duel.winner.map(|w| w.to_string()),
                    duel.started_at.to_rfc3339(),
                    duel.ended_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            insert_turns_after(conn, &duel.id, &duel.turns, 0)
        })
    }

    #[instrument(skip(self), fields(session_id = %id))]
    pub fn get(&self, id: &SessionId) -> Result<BinaryDuel, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!("SELECT {DUEL_COLUMNS} FROM binary_duels WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([id.as_str()])?;
            let mut duel = match rows.next()? {
                Some(row) => row_to_duel(row)?,
                None => return Err(StoreError::NotFound(format!("binary duel {id}"))),
            };
            duel.turns = load_turns(conn, id)?;
            Ok(duel)
        })
    }

    /// Write the outcome columns and append turns not yet stored.
    #[instrument(skip(self, duel), fields(session_id = %duel.id))]
    pub fn save(&self, duel: &BinaryDuel) -> Result<(), StoreError> {
        self.db.with_tx(|conn| {
            let updated = conn.execute(
                "UPDATE binary_duels SET winner = ?1, ended_at = ?2 WHERE id = ?3",
                rusqlite::params![
                    duel.winner.map(|w| w.to_string()),
                    duel.ended_at.map(|t| t.to_rfc3339()),
                    duel.id.as_str(),
                ],
            )?;
            if updated == 0 {
                return Err(StoreError::NotFound(format!("binary duel {}", duel.id)));
            }
            let stored: u32 = conn.query_row(
                "SELECT COALESCE(MAX(turn), 0) FROM binary_turns WHERE duel_id = ?1",
                [duel.id.as_str()],
                |row| row.get(0),
            )?;
            insert_turns_after(conn, &duel.id, &duel.turns, stored)
        })
    }

    #[instrument(skip(self), fields(player_id = %owner))]
    pub fn list_completed(&self, owner: &PlayerId, limit: u32) -> Result<Vec<BinaryDuel>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {DUEL_COLUMNS} FROM binary_duels
                 WHERE owner_id = ?1 AND ended_at IS NOT NULL
                 ORDER BY ended_at DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(rusqlite::params![owner.as_str(), limit])?;
            let mut duels = Vec::new();
            while let Some(row) = rows.next()? {
                duels.push(row_to_duel(row)?);
            }
            for duel in &mut duels {
                duel.turns = load_turns(conn, &duel.id)?;
            }
            Ok(duels)
        })
    }
}

fn insert_turns_after(
    conn: &Connection,
    duel_id: &SessionId,
    turns: &[BinaryTurn],
    already_stored: u32,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "INSERT INTO binary_turns (duel_id, turn, guesser, guess, feedback) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for t in turns.iter().filter(|t| t.turn > already_stored) {
        stmt.execute(rusqlite::params![
            duel_id.as_str(),
            t.turn,
            t.guesser.to_string(),
            t.guess,
            t.feedback.to_string(),
        ])?;
    }
    Ok(())
}

fn load_turns(conn: &Connection, duel_id: &SessionId) -> Result<Vec<BinaryTurn>, StoreError> {
    const T: &str = "binary_turns";
    let mut stmt = conn.prepare(
        "SELECT turn, guesser, guess, feedback FROM binary_turns WHERE duel_id = ?1 ORDER BY turn",
    )?;
    let mut rows = stmt.query([duel_id.as_str()])?;
    let mut turns = Vec::new();
    while let Some(row) = rows.next()? {
        let guesser: String = row_helpers::get(row, 1, T, "guesser")?;
        let feedback: String = row_helpers::get(row, 3, T, "feedback")?;
        turns.push(BinaryTurn {
            turn: row_helpers::get(row, 0, T, "turn")?,
            guesser: row_helpers::parse_enum(&guesser, T, "guesser")?,
            guess: row_helpers::get(row, 2, T, "guess")?,
            feedback: row_helpers::parse_enum(&feedback, T, "feedback")?,
        });
    }
    Ok(turns)
}

fn row_to_duel(row: &rusqlite::Row<'_>) -> Result<BinaryDuel, StoreError> {
    const T: &str = "binary_duels";
    let difficulty: String = row_helpers::get(row, 2, T, "difficulty")?;
    let winner: Option<String> = row_helpers::get_opt(row, 6, T, "winner")?;
    let started_at: String = row_helpers::get(row, 7, T, "started_at")?;
    let ended_at: Option<String> = row_helpers::get_opt(row, 8, T, "ended_at")?;

    Ok(BinaryDuel {
        id: SessionId::from_raw(row_helpers::get::<String>(row, 0, T, "id")?),
        owner: PlayerId::from_raw(row_helpers::get::<String>(row, 1, T, "owner_id")?),
        difficulty: row_helpers::parse_enum(&difficulty, T, "difficulty")?,
        range_min: row_helpers::get(row, 3, T, "range_min")?,
        range_max: row_helpers::get(row, 4, T, "range_max")?,
        target: row_helpers::get(row, 5, T, "target")?,
        winner: winner
            .map(|raw| row_helpers::parse_enum(&raw, T, "winner"))
            .transpose()?,
        turns: Vec::new(),
        started_at: row_helpers::parse_timestamp(&started_at, T, "started_at")?,
        ended_at: ended_at
            .map(|raw| row_helpers::parse_timestamp(&raw, T, "ended_at"))
            .transpose()?,
    })
}
