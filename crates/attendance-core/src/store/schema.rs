//! SQLite schema for the durable attendance ledger.
//!
//! Tables:
//! - `ledger_meta`: single row of deployment constants and the attendance id counter
//! - `sessions`: immutable session records
//! - `claims`: one row per (institution, code, claimant), never updated
//! - `streaks`: per-(institution, claimant) streak state
//! - `attendance_tokens`: minted attendance credentials
//!
//! Unsigned 64-bit values are stored bit-for-bit in SQLite's signed INTEGER.

pub const SCHEMA_VERSION: i64 = 1;

/// DDL for the attendance ledger.
///
/// Schema version: 1
pub const ATTENDANCE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_meta (
    id                  INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version      INTEGER NOT NULL,
    next_attendance_id  INTEGER NOT NULL,
    streak_threshold    INTEGER NOT NULL,
    streak_badge_uri    TEXT NOT NULL,
    created_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS sessions (
    institution      INTEGER NOT NULL,
    code             TEXT NOT NULL,
    seq              INTEGER NOT NULL,
    topic            TEXT NOT NULL,
    date             INTEGER NOT NULL,
    badge_uri        TEXT NOT NULL,
    expires_at       INTEGER NOT NULL,
    active           INTEGER NOT NULL,
    tutor            TEXT NOT NULL,
    PRIMARY KEY (institution, code),
    UNIQUE (institution, seq)
);

CREATE TABLE IF NOT EXISTS claims (
    institution      INTEGER NOT NULL,
    code             TEXT NOT NULL,
    claimant         TEXT NOT NULL,
    attendance_id    INTEGER NOT NULL UNIQUE,
    PRIMARY KEY (institution, code, claimant),
    FOREIGN KEY (institution, code) REFERENCES sessions(institution, code)
);

CREATE TABLE IF NOT EXISTS streaks (
    institution      INTEGER NOT NULL,
    claimant         TEXT NOT NULL,
    last_seq         INTEGER,
    current_streak   INTEGER NOT NULL,
    badge_awarded    INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (institution, claimant)
);

CREATE TABLE IF NOT EXISTS attendance_tokens (
    id               INTEGER PRIMARY KEY,
    owner            TEXT NOT NULL,
    token_uri        TEXT NOT NULL,
    institution      INTEGER NOT NULL,
    code             TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_attendance_tokens_owner
    ON attendance_tokens(owner);
CREATE INDEX IF NOT EXISTS idx_streaks_claimant
    ON streaks(claimant);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(ATTENDANCE_SCHEMA).unwrap();
        conn.execute_batch(ATTENDANCE_SCHEMA).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            tables,
            vec!["attendance_tokens", "claims", "ledger_meta", "sessions", "streaks"]
        );
    }

    #[test]
    fn test_sequence_uniqueness_enforced_by_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(ATTENDANCE_SCHEMA).unwrap();
        let insert = "INSERT INTO sessions (institution, code, seq, topic, date, badge_uri, expires_at, active, tutor) \
                      VALUES (1, ?1, 1, 't', 0, 'u', 10, 1, 'tutor')";
        conn.execute(insert, ["A"]).unwrap();
        assert!(conn.execute(insert, ["B"]).is_err());
    }
}
