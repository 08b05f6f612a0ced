/// SQL DDL for the cortex game database.
/// WAL mode + foreign keys enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS pattern_sessions (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    cumulative_score INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    winner TEXT,
    round_number INTEGER NOT NULL,
    grid_size INTEGER NOT NULL,
    target_length INTEGER NOT NULL,
    expected_sequence TEXT NOT NULL,
    correct_streak INTEGER NOT NULL DEFAULT 0,
    max_streak INTEGER NOT NULL DEFAULT 0,
    revive_used INTEGER NOT NULL DEFAULT 0,
    time_limit_secs REAL NOT NULL,
    max_rounds INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pattern_rounds (
    session_id TEXT NOT NULL REFERENCES pattern_sessions(id) ON DELETE CASCADE,
    round_number INTEGER NOT NULL,
    outcome TEXT NOT NULL,
    grid_size INTEGER NOT NULL,
    target_length INTEGER NOT NULL,
    latency_secs REAL NOT NULL,
    base_score INTEGER NOT NULL,
    time_penalty REAL NOT NULL,
    bonus INTEGER NOT NULL,
    multiplier REAL NOT NULL,
    score INTEGER NOT NULL,
    correct_streak_at_time INTEGER NOT NULL,
    max_streak_so_far INTEGER NOT NULL,
    projected_final_score INTEGER NOT NULL,
    PRIMARY KEY (session_id, round_number)
);

CREATE TABLE IF NOT EXISTS binary_duels (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    difficulty TEXT NOT NULL,
    range_min INTEGER NOT NULL,
    range_max INTEGER NOT NULL,
    target INTEGER NOT NULL,
    winner TEXT,
    started_at TEXT NOT NULL,
    ended_at TEXT
);

CREATE TABLE IF NOT EXISTS binary_turns (
    duel_id TEXT NOT NULL REFERENCES binary_duels(id) ON DELETE CASCADE,
    turn INTEGER NOT NULL,
    guesser TEXT NOT NULL,
    guess INTEGER NOT NULL,
    feedback TEXT NOT NULL,
    PRIMARY KEY (duel_id, turn)
);

CREATE TABLE IF NOT EXISTS minigame_sessions (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    score INTEGER NOT NULL DEFAULT 0,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    state TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pattern_sessions_owner ON pattern_sessions(owner_id, ended_at);
CREATE INDEX IF NOT EXISTS idx_binary_duels_owner ON binary_duels(owner_id, ended_at);
CREATE INDEX IF NOT EXISTS idx_minigame_sessions_owner ON minigame_sessions(owner_id, kind, ended_at);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
