use super::{ops, AttendanceLedger, ClaimWrite, LedgerTables};
use crate::claims::ClaimLedger;
use crate::config::LedgerConfig;
use crate::credentials::{AttendanceCredential, CredentialRegistry};
use crate::errors::LedgerError;
use crate::model::{
    AttendanceId, ClaimKey, ClaimReceipt, Height, InstitutionId, Principal, Session, SessionCode,
};
use crate::registry::SessionRegistry;
use crate::streak::{StreakState, StreakTracker};

/// In-process ledger. Owns every table, including the attendance id counter.
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    sessions: SessionRegistry,
    claims: ClaimLedger,
    streaks: StreakTracker,
    credentials: CredentialRegistry,
    streak_threshold: u64,
}

impl MemoryLedger {
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_constants(config.streak_threshold, config.streak_badge_uri.clone())
    }

    pub fn with_constants(streak_threshold: u64, streak_badge_uri: impl Into<String>) -> Self {
        Self {
            sessions: SessionRegistry::default(),
            claims: ClaimLedger::default(),
            streaks: StreakTracker::default(),
            credentials: CredentialRegistry::new(streak_badge_uri),
            streak_threshold,
        }
    }

    pub fn streak_threshold(&self) -> u64 {
        self.streak_threshold
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(&LedgerConfig::default())
    }
}

impl LedgerTables for MemoryLedger {
    type Error = LedgerError;

    fn streak_threshold(&self) -> u64 {
        self.streak_threshold
    }

    fn session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, LedgerError> {
        Ok(self.sessions.get(institution, code).cloned())
    }

    fn sequence_taken(&self, institution: InstitutionId, sequence: u64) -> Result<bool, LedgerError> {
        Ok(self.sessions.sequence_taken(institution, sequence))
    }

    fn claim(&self, key: &ClaimKey) -> Result<Option<AttendanceId>, LedgerError> {
        Ok(self.claims.get(key))
    }

    fn streak(
        &self,
        institution: InstitutionId,
        claimant: &Principal,
    ) -> Result<StreakState, LedgerError> {
        Ok(self.streaks.get(institution, claimant))
    }

    fn next_attendance_id(&self) -> Result<AttendanceId, LedgerError> {
        Ok(self.credentials.next_id())
    }

    fn insert_session(&mut self, session: Session) -> Result<(), LedgerError> {
        self.sessions.insert(session);
        Ok(())
    }

    fn apply_claim(&mut self, write: ClaimWrite) -> Result<(), LedgerError> {
        let ClaimWrite {
            key,
            credential,
            next_id,
            streak,
        } = write;
        let institution = key.institution;
        let claimant = key.claimant.clone();
        if !self.claims.record(key, credential.id) {
            return Err(LedgerError::DupClaim);
        }
        self.credentials.store(credential, next_id);
        self.streaks.put(institution, claimant, streak);
        Ok(())
    }
}

impl AttendanceLedger for MemoryLedger {
    type Error = LedgerError;

    fn create_session(&mut self, session: Session) -> Result<(), LedgerError> {
        ops::create_session(self, session)
    }

    fn claim_attendance(
        &mut self,
        institution: InstitutionId,
        code: &SessionCode,
        claimant: &Principal,
        height: Height,
    ) -> Result<ClaimReceipt, LedgerError> {
        ops::claim_attendance(self, institution, code, claimant, height)
    }

    fn get_session(
        &self,
        institution: InstitutionId,
        code: &SessionCode,
    ) -> Result<Option<Session>, LedgerError> {
        Ok(self.sessions.get(institution, code).cloned())
    }

    fn streak_state(
        &self,
        claimant: &Principal,
        institution: InstitutionId,
    ) -> Result<StreakState, LedgerError> {
        Ok(self.streaks.get(institution, claimant))
    }

    fn get_next_attendance_id(&self) -> Result<AttendanceId, LedgerError> {
        Ok(self.credentials.next_id())
    }

    fn attendance_credential(
        &self,
        id: AttendanceId,
    ) -> Result<Option<AttendanceCredential>, LedgerError> {
        Ok(self.credentials.attendance(id).cloned())
    }

    fn attendance_owned_by(
        &self,
        owner: &Principal,
    ) -> Result<Vec<AttendanceCredential>, LedgerError> {
        Ok(self.credentials.owned_by(owner).cloned().collect())
    }

    fn badge_institutions(&self, holder: &Principal) -> Result<Vec<InstitutionId>, LedgerError> {
        Ok(self.streaks.awarded_institutions(holder))
    }

    fn streak_badge_uri(&self) -> Result<String, LedgerError> {
        Ok(self.credentials.streak_badge_uri().to_string())
    }
}
