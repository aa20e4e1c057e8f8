//! Row access for the SQLite store.
//!
//! Free functions take a borrowed connection so the same reads serve both
//! plain accessors and the rules running inside a transaction.

use crate::credentials::AttendanceCredential;
use crate::errors::StoreError;
use crate::ledger::{ClaimWrite, LedgerTables};
use crate::model::{
    AttendanceId, BadgeUri, ClaimKey, InstitutionId, Principal, Session, SessionCode, Topic,
};
use crate::streak::StreakState;
use rusqlite::{params, Connection, OptionalExtension};

// u64 <-> INTEGER, bit-preserving.
fn to_sql(v: u64) -> i64 {
    v as i64
}

fn from_sql(v: i64) -> u64 {
    v as u64
}

pub(crate) struct Meta {
    pub schema_version: i64,
    pub next_attendance_id: AttendanceId,
    pub streak_threshold: u64,
    pub streak_badge_uri: String,
}

pub(crate) fn read_meta(conn: &Connection) -> Result<Meta, StoreError> {
    let row: Option<(i64, i64, i64, String)> = conn
        .query_row(
            "SELECT schema_version, next_attendance_id, streak_threshold, streak_badge_uri FROM ledger_meta WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;
    let (schema_version, next, threshold, uri) =
        row.ok_or_else(|| StoreError::Corrupt("ledger_meta row missing".to_string()))?;
    Ok(Meta {
        schema_version,
        next_attendance_id: AttendanceId(from_sql(next)),
        streak_threshold: from_sql(threshold),
        streak_badge_uri: uri,
    })
}

/// Insert the meta row unless one exists. Returns true if inserted.
pub(crate) fn init_meta(
    conn: &Connection,
    schema_version: i64,
    streak_threshold: u64,
    streak_badge_uri: &str,
) -> Result<bool, StoreError> {
    let inserted = conn.execute(
        r#"
        INSERT INTO ledger_meta (id, schema_version, next_attendance_id, streak_threshold, streak_badge_uri)
        VALUES (1, ?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO NOTHING
        "#,
        params![
            schema_version,
            to_sql(AttendanceId::FIRST.0),
            to_sql(streak_threshold),
            streak_badge_uri,
        ],
    )?;
    Ok(inserted == 1)
}

type SessionRow = (i64, String, i64, String, i64, String, i64, i64, String);

fn session_from_row(row: SessionRow) -> Result<Session, StoreError> {
    let (institution, code, seq, topic, date, badge_uri, expires_at, active, tutor) = row;
    Ok(Session {
        institution: from_sql(institution),
        code: SessionCode::new(code)?,
        sequence: from_sql(seq),
        topic: Topic::new(topic)?,
        date: from_sql(date),
        badge_uri: BadgeUri::new(badge_uri)?,
        expires_at: from_sql(expires_at),
        active: active != 0,
        tutor: Principal::new(tutor)?,
    })
}

pub(crate) fn read_session(
    conn: &Connection,
    institution: InstitutionId,
    code: &SessionCode,
) -> Result<Option<Session>, StoreError> {
    let row: Option<SessionRow> = conn
        .query_row(
            r#"
            SELECT institution, code, seq, topic, date, badge_uri, expires_at, active, tutor
            FROM sessions WHERE institution = ?1 AND code = ?2
            "#,
            params![to_sql(institution), code.as_str()],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            },
        )
        .optional()?;
    row.map(session_from_row).transpose()
}

pub(crate) fn read_streak(
    conn: &Connection,
    institution: InstitutionId,
    claimant: &Principal,
) -> Result<StreakState, StoreError> {
    let row: Option<(Option<i64>, i64, i64)> = conn
        .query_row(
            "SELECT last_seq, current_streak, badge_awarded FROM streaks WHERE institution = ?1 AND claimant = ?2",
            params![to_sql(institution), claimant.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    Ok(match row {
        Some((last, streak, awarded)) => StreakState {
            last_sequence_claimed: last.map(from_sql),
            current_streak: from_sql(streak),
            badge_awarded: awarded != 0,
        },
        None => StreakState::default(),
    })
}

pub(crate) fn read_attendance(
    conn: &Connection,
    id: AttendanceId,
) -> Result<Option<AttendanceCredential>, StoreError> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT owner, token_uri FROM attendance_tokens WHERE id = ?1",
            [to_sql(id.0)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    match row {
        Some((owner, token_uri)) => Ok(Some(AttendanceCredential {
            id,
            owner: Principal::new(owner)?,
            token_uri,
        })),
        None => Ok(None),
    }
}

pub(crate) fn read_owned_attendance(
    conn: &Connection,
    owner: &Principal,
) -> Result<Vec<AttendanceCredential>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, token_uri FROM attendance_tokens WHERE owner = ?1")?;
    let rows = stmt.query_map([owner.as_str()], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (id, token_uri) = row?;
        out.push(AttendanceCredential {
            id: AttendanceId(from_sql(id)),
            owner: owner.clone(),
            token_uri,
        });
    }
    out.sort_by_key(|c| c.id);
    Ok(out)
}

pub(crate) fn read_badge_institutions(
    conn: &Connection,
    holder: &Principal,
) -> Result<Vec<InstitutionId>, StoreError> {
    let mut stmt =
        conn.prepare("SELECT institution FROM streaks WHERE claimant = ?1 AND badge_awarded = 1")?;
    let mut out = stmt
        .query_map([holder.as_str()], |row| row.get::<_, i64>(0))?
        .map(|r| r.map(from_sql))
        .collect::<Result<Vec<_>, _>>()?;
    out.sort_unstable();
    Ok(out)
}

/// Table access bound to a connection inside an open transaction.
pub(crate) struct TxTables<'c> {
    pub conn: &'c Connection,
    pub streak_threshold: u64,
}

impl LedgerTables for TxTables<'_> {
    type Error = StoreError;

    fn streak_threshold(&self) -> u64 {
        self.streak_threshold
    }

    fn session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, StoreError> {
        read_session(self.conn, institution, code)
    }

    fn sequence_taken(&self, institution: InstitutionId, sequence: u64) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sessions WHERE institution = ?1 AND seq = ?2",
                params![to_sql(institution), to_sql(sequence)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn claim(&self, key: &ClaimKey) -> Result<Option<AttendanceId>, StoreError> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT attendance_id FROM claims WHERE institution = ?1 AND code = ?2 AND claimant = ?3",
                params![to_sql(key.institution), key.code.as_str(), key.claimant.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(|v| AttendanceId(from_sql(v))))
    }

    fn streak(
        &self,
        institution: InstitutionId,
        claimant: &Principal,
    ) -> Result<StreakState, StoreError> {
        read_streak(self.conn, institution, claimant)
    }

    fn next_attendance_id(&self) -> Result<AttendanceId, StoreError> {
        Ok(read_meta(self.conn)?.next_attendance_id)
    }

    fn insert_session(&mut self, session: Session) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO sessions (
                institution, code, seq, topic, date, badge_uri, expires_at, active, tutor
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                to_sql(session.institution),
                session.code.as_str(),
                to_sql(session.sequence),
                session.topic.as_str(),
                to_sql(session.date),
                session.badge_uri.as_str(),
                to_sql(session.expires_at),
                session.active as i32,
                session.tutor.as_str(),
            ],
        )?;
        Ok(())
    }

    fn apply_claim(&mut self, write: ClaimWrite) -> Result<(), StoreError> {
        let ClaimWrite {
            key,
            credential,
            next_id,
            streak,
        } = write;

        self.conn.execute(
            "INSERT INTO claims (institution, code, claimant, attendance_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                to_sql(key.institution),
                key.code.as_str(),
                key.claimant.as_str(),
                to_sql(credential.id.0),
            ],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO attendance_tokens (id, owner, token_uri, institution, code)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                to_sql(credential.id.0),
                credential.owner.as_str(),
                credential.token_uri,
                to_sql(key.institution),
                key.code.as_str(),
            ],
        )?;

        self.conn.execute(
            r#"
            INSERT INTO streaks (institution, claimant, last_seq, current_streak, badge_awarded)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(institution, claimant) DO UPDATE SET
                last_seq = excluded.last_seq,
                current_streak = excluded.current_streak,
                badge_awarded = excluded.badge_awarded
            "#,
            params![
                to_sql(key.institution),
                key.claimant.as_str(),
                streak.last_sequence_claimed.map(to_sql),
                to_sql(streak.current_streak),
                streak.badge_awarded as i32,
            ],
        )?;

        self.conn.execute(
            "UPDATE ledger_meta SET next_attendance_id = ?1 WHERE id = 1",
            [to_sql(next_id.0)],
        )?;
        Ok(())
    }
}
