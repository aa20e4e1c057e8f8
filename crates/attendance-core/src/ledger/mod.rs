//! The attendance ledger: one rules implementation over two backends.
//!
//! [`AttendanceLedger`] is the public surface. Both [`MemoryLedger`] and
//! [`crate::store::AttendanceStore`] run the same `create-session` and
//! `claim-attendance` rules; every check and computation happens before the
//! first write, so a failed call leaves no trace.

mod memory;
pub(crate) mod ops;

pub use memory::MemoryLedger;

use crate::credentials::{AttendanceCredential, Credential};
use crate::errors::LedgerError;
use crate::model::{
    AttendanceId, ClaimKey, ClaimReceipt, Height, InstitutionId, Principal, Session, SessionCode,
};
use crate::streak::StreakState;

/// Operations and read accessors of an attendance ledger.
///
/// Accessors report absence as `None`, never as an error. The associated
/// error type only carries ledger failures plus whatever the backend itself
/// can suffer (for example storage I/O).
pub trait AttendanceLedger {
    type Error: std::error::Error + From<LedgerError>;

    /// Register a new session. Fails `SessionExists` or `SeqTaken`.
    fn create_session(&mut self, session: Session) -> Result<(), Self::Error>;

    /// Claim attendance for `claimant` at chronological `height`.
    fn claim_attendance(
        &mut self,
        institution: InstitutionId,
        code: &SessionCode,
        claimant: &Principal,
        height: Height,
    ) -> Result<ClaimReceipt, Self::Error>;

    fn get_session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, Self::Error>;

    /// Streak state of `claimant` in `institution`; defaults when no claims exist.
    fn streak_state(
        &self,
        claimant: &Principal,
        institution: InstitutionId,
    ) -> Result<StreakState, Self::Error>;

    fn get_next_attendance_id(&self) -> Result<AttendanceId, Self::Error>;

    fn attendance_credential(
        &self,
        id: AttendanceId,
    ) -> Result<Option<AttendanceCredential>, Self::Error>;

    /// Attendance credentials owned by `owner`, in id order.
    fn attendance_owned_by(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AttendanceCredential>, Self::Error>;

    /// Institutions in which `holder` has been awarded the streak badge, ascending.
    fn badge_institutions(&self, holder: &Principal) -> Result<Vec<InstitutionId>, Self::Error>;

    /// Metadata URI shared by every streak badge.
    fn streak_badge_uri(&self) -> Result<String, Self::Error>;

    fn get_streak(&self, claimant: &Principal, institution: InstitutionId) -> Result<u64, Self::Error> {
        Ok(self.streak_state(claimant, institution)?.current_streak)
    }

    fn get_last_seq(
        &self,
        claimant: &Principal,
        institution: InstitutionId,
    ) -> Result<Option<u64>, Self::Error> {
        Ok(self.streak_state(claimant, institution)?.last_sequence_claimed)
    }

    fn get_streak_awarded(
        &self,
        claimant: &Principal,
        institution: InstitutionId,
    ) -> Result<bool, Self::Error> {
        Ok(self.streak_state(claimant, institution)?.badge_awarded)
    }

    fn get_attendance_owner(&self, id: AttendanceId) -> Result<Option<Principal>, Self::Error> {
        Ok(self.attendance_credential(id)?.map(|c| c.owner))
    }

    fn get_attendance_token_uri(&self, id: AttendanceId) -> Result<Option<String>, Self::Error> {
        Ok(self.attendance_credential(id)?.map(|c| c.token_uri))
    }

    /// The shared streak badge URI. The id is accepted and ignored.
    fn get_streak_token_uri(&self, _any_id: u64) -> Result<String, Self::Error> {
        self.streak_badge_uri()
    }

    /// Every credential `owner` holds: attendance credentials in id order,
    /// then one streak badge per awarding institution.
    fn credentials_of(&self, owner: &Principal) -> Result<Vec<Credential>, Self::Error> {
        let mut out: Vec<Credential> = self
            .attendance_owned_by(owner)?
            .into_iter()
            .map(Credential::Attendance)
            .collect();
        let badge_uri = self.streak_badge_uri()?;
        for institution in self.badge_institutions(owner)? {
            out.push(Credential::StreakBadge {
                institution,
                holder: owner.clone(),
                token_uri: badge_uri.clone(),
            });
        }
        Ok(out)
    }
}

/// Writes produced by one successful claim, applied together.
#[derive(Debug, Clone)]
pub(crate) struct ClaimWrite {
    pub key: ClaimKey,
    pub credential: AttendanceCredential,
    pub next_id: AttendanceId,
    pub streak: StreakState,
}

/// Table access used by the shared rules in [`ops`].
pub(crate) trait LedgerTables {
    type Error: From<LedgerError>;

    fn streak_threshold(&self) -> u64;

    fn session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, Self::Error>;

    fn sequence_taken(&self, institution: InstitutionId, sequence: u64) -> Result<bool, Self::Error>;

    fn claim(&self, key: &ClaimKey) -> Result<Option<AttendanceId>, Self::Error>;

    fn streak(
        &self,
        institution: InstitutionId,
        claimant: &Principal,
    ) -> Result<StreakState, Self::Error>;

    fn next_attendance_id(&self) -> Result<AttendanceId, Self::Error>;

    fn insert_session(&mut self, session: Session) -> Result<(), Self::Error>;

    fn apply_claim(&mut self, write: ClaimWrite) -> Result<(), Self::Error>;
}
