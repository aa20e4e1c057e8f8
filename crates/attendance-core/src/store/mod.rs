//! AttendanceStore: SQLite-backed attendance ledger.
//!
//! Provides the same rules as [`crate::ledger::MemoryLedger`] with:
//! - Durable sessions, claims, streaks and credentials
//! - Each mutating call in one `BEGIN IMMEDIATE` transaction, rolled back on any failure
//! - Uniqueness additionally enforced by table constraints
//! - Deployment constants recorded once in `ledger_meta`
//! - Read-only handles for accessors that must not create or touch the file

mod schema;
mod tables;

pub use schema::{ATTENDANCE_SCHEMA, SCHEMA_VERSION};

use crate::config::LedgerConfig;
use crate::credentials::AttendanceCredential;
use crate::errors::StoreError;
use crate::ledger::{ops, AttendanceLedger};
use crate::model::{
    AttendanceId, ClaimReceipt, Height, InstitutionId, Principal, Session, SessionCode,
};
use crate::streak::StreakState;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tables::TxTables;
use tracing::{info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed attendance ledger.
#[derive(Clone)]
pub struct AttendanceStore {
    conn: Arc<Mutex<Connection>>,
    streak_threshold: u64,
    streak_badge_uri: String,
}

impl std::fmt::Debug for AttendanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceStore")
            .field("streak_threshold", &self.streak_threshold)
            .field("streak_badge_uri", &self.streak_badge_uri)
            .finish_non_exhaustive()
    }
}

impl AttendanceStore {
    /// Open a file-backed store, initializing it on first use.
    pub fn open(path: &Path, config: &LedgerConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn, config)?;
        info!(path = %path.display(), "opened attendance store");
        Ok(store)
    }

    /// Open an existing store for reads only.
    ///
    /// Never creates the file or writes to it; a missing file or a file
    /// without a ledger fails as a storage error. Mutating calls on the
    /// returned handle fail with [`StoreError::Database`].
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let meta = tables::read_meta(&conn)?;
        check_schema_version(&meta)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            streak_threshold: meta.streak_threshold,
            streak_badge_uri: meta.streak_badge_uri,
        })
    }

    /// Create an in-memory store (for testing).
    pub fn memory(config: &LedgerConfig) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, config)
    }

    /// Create store from existing connection (for multi-connection tests).
    pub fn from_connection(conn: Connection, config: &LedgerConfig) -> Result<Self, StoreError> {
        Self::init_connection(&conn)?;
        let created = tables::init_meta(
            &conn,
            SCHEMA_VERSION,
            config.streak_threshold,
            &config.streak_badge_uri,
        )?;
        let meta = tables::read_meta(&conn)?;
        check_schema_version(&meta)?;
        if !created
            && (meta.streak_threshold != config.streak_threshold
                || meta.streak_badge_uri != config.streak_badge_uri)
        {
            warn!(
                recorded_threshold = meta.streak_threshold,
                configured_threshold = config.streak_threshold,
                recorded_badge_uri = %meta.streak_badge_uri,
                configured_badge_uri = %config.streak_badge_uri,
                "store keeps its recorded constants; configuration differs"
            );
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            streak_threshold: meta.streak_threshold,
            streak_badge_uri: meta.streak_badge_uri,
        })
    }

    fn init_connection(conn: &Connection) -> Result<(), StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        // WAL mode for file-backed DBs (no-op for in-memory)
        let _ = conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()));
        conn.execute_batch(ATTENDANCE_SCHEMA)?;
        Ok(())
    }

    /// Streak threshold recorded at initialization.
    pub fn streak_threshold(&self) -> u64 {
        self.streak_threshold
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection mutex poisoned".to_string()))
    }

    fn in_txn<R>(
        &self,
        f: impl FnOnce(&mut TxTables<'_>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let guard = self.lock()?;
        let conn: &Connection = &guard;

        conn.execute("BEGIN IMMEDIATE", [])?;
        let mut tables = TxTables {
            conn,
            streak_threshold: self.streak_threshold,
        };
        let result = f(&mut tables);

        match &result {
            Ok(_) => {
                if let Err(e) = conn.execute("COMMIT", []) {
                    let _ = conn.execute("ROLLBACK", []);
                    return Err(e.into());
                }
            }
            Err(_) => {
                let _ = conn.execute("ROLLBACK", []);
            }
        }

        result
    }
}

fn check_schema_version(meta: &tables::Meta) -> Result<(), StoreError> {
    if meta.schema_version != SCHEMA_VERSION {
        return Err(StoreError::Corrupt(format!(
            "schema version {} recorded, this build supports {}",
            meta.schema_version, SCHEMA_VERSION
        )));
    }
    Ok(())
}

impl AttendanceLedger for AttendanceStore {
    type Error = StoreError;

    fn create_session(&mut self, session: Session) -> Result<(), StoreError> {
        self.in_txn(|tables| ops::create_session(tables, session))
    }

    fn claim_attendance(
        &mut self,
        institution: InstitutionId,
        code: &SessionCode,
        claimant: &Principal,
        height: Height,
    ) -> Result<ClaimReceipt, StoreError> {
        self.in_txn(|tables| ops::claim_attendance(tables, institution, code, claimant, height))
    }

    fn get_session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, StoreError> {
        let conn = self.lock()?;
        tables::read_session(&conn, institution, code)
    }

    fn streak_state(
        &self,
        claimant: &Principal,
        institution: InstitutionId,
    ) -> Result<StreakState, StoreError> {
        let conn = self.lock()?;
        tables::read_streak(&conn, institution, claimant)
    }

    fn get_next_attendance_id(&self) -> Result<AttendanceId, StoreError> {
        let conn = self.lock()?;
        Ok(tables::read_meta(&conn)?.next_attendance_id)
    }

    fn attendance_credential(
        &self,
        id: AttendanceId,
    ) -> Result<Option<AttendanceCredential>, StoreError> {
        let conn = self.lock()?;
        tables::read_attendance(&conn, id)
    }

    fn attendance_owned_by(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AttendanceCredential>, StoreError> {
        let conn = self.lock()?;
        tables::read_owned_attendance(&conn, owner)
    }

    fn badge_institutions(&self, holder: &Principal) -> Result<Vec<InstitutionId>, StoreError> {
        let conn = self.lock()?;
        tables::read_badge_institutions(&conn, holder)
    }

    fn streak_badge_uri(&self) -> Result<String, StoreError> {
        Ok(self.streak_badge_uri.clone())
    }
}
