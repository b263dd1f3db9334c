//! SQLite persistence for accounts, feedback, quizzes and recitation sessions.
//!
//! A single connection guarded by an async mutex; every query is short, so
//! handlers simply take the lock for the duration of one repository call.

mod feedback;
mod quizzes;
mod recitation;
mod types;
mod users;

pub use recitation::current_streak;
pub use types::*;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id                TEXT PRIMARY KEY,
    username          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email             TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash     TEXT NOT NULL,
    display_name      TEXT,
    bio               TEXT,
    daily_goal_ayahs  INTEGER NOT NULL DEFAULT 5,
    role              TEXT NOT NULL DEFAULT 'user',
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS feedback (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    category    TEXT NOT NULL,
    rating      INTEGER NOT NULL,
    message     TEXT NOT NULL,
    status      TEXT NOT NULL DEFAULT 'open',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_feedback_user ON feedback(user_id);

CREATE TABLE IF NOT EXISTS quizzes (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    kind        TEXT NOT NULL,
    surah       INTEGER NOT NULL,
    from_ayah   INTEGER NOT NULL,
    to_ayah     INTEGER NOT NULL,
    difficulty  TEXT NOT NULL,
    questions   TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS quiz_attempts (
    id          TEXT PRIMARY KEY,
    quiz_id     TEXT NOT NULL REFERENCES quizzes(id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    correct     INTEGER NOT NULL,
    total       INTEGER NOT NULL,
    percentage  REAL NOT NULL,
    report      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attempts_user ON quiz_attempts(user_id, created_at);

CREATE TABLE IF NOT EXISTS recitation_sessions (
    id             TEXT PRIMARY KEY,
    user_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    surah          INTEGER NOT NULL,
    from_ayah      INTEGER NOT NULL,
    to_ayah        INTEGER NOT NULL,
    mode           TEXT NOT NULL,
    status         TEXT NOT NULL,
    self_rating    INTEGER,
    started_at     TEXT NOT NULL,
    ended_at       TEXT,
    duration_secs  INTEGER
);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON recitation_sessions(user_id, started_at);

CREATE TABLE IF NOT EXISTS recitation_mistakes (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id  TEXT NOT NULL REFERENCES recitation_sessions(id) ON DELETE CASCADE,
    ayah        INTEGER NOT NULL,
    kind        TEXT NOT NULL,
    note        TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS memorized_ayahs (
    user_id       TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    surah         INTEGER NOT NULL,
    ayah          INTEGER NOT NULL,
    memorized_at  TEXT NOT NULL,
    PRIMARY KEY (user_id, surah, ayah)
);
";

pub struct Store {
    conn: Mutex<Connection>,
}

pub type SharedStore = Arc<Store>;

impl Store {
    /// Open (or create) the database file and run migrations.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Invalid(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        tracing::info!("Opened database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the connection.
    async fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self.conn.lock().await;
        f(&mut conn)
    }

    /// Cheap liveness probe for the health endpoint.
    pub async fn ping(&self) -> bool {
        self.with_conn(|c| Ok(c.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?))
            .await
            .is_ok()
    }
}

fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a TEXT column holding one of our enum spellings.
fn enum_col<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    parse(&s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unexpected value {:?}", s).into(),
        )
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned>(s: &str) -> StoreResult<T> {
    serde_json::from_str(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// Map a UNIQUE violation onto `Conflict`, everything else stays a database error.
fn map_unique(err: rusqlite::Error, what: &str) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(format!("{} already exists", what))
        }
        _ => StoreError::Sqlite(err),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn store_with_user(username: &str) -> (Store, User) {
        let store = Store::open_in_memory().unwrap();
        let user = store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "hash".to_string(),
                display_name: None,
                role: UserRole::User,
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_open_on_disk_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested/hifz.db");
        {
            let store = Store::open(&path).unwrap();
            assert!(store.ping().await);
        }
        let store = Store::open(&path).unwrap();
        assert!(store.ping().await);
    }
}
