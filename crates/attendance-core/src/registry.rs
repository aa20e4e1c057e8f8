//! Session registry: sessions keyed by (institution, code).
//!
//! Within one institution both the code and the sequence number are unique
//! across every session ever created. The two checks are independent; when a
//! request collides on both, the code collision is reported.

use crate::errors::LedgerError;
use crate::model::{InstitutionId, Session, SessionCode};
use std::collections::BTreeMap;

/// Uniqueness check for a new session, given what the registry already holds.
pub fn check_new_session(code_exists: bool, sequence_taken: bool) -> Result<(), LedgerError> {
    if code_exists {
        return Err(LedgerError::SessionExists);
    }
    if sequence_taken {
        return Err(LedgerError::SeqTaken);
    }
    Ok(())
}

/// In-memory session registry.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<(InstitutionId, SessionCode), Session>,
    sequences: BTreeMap<(InstitutionId, u64), SessionCode>,
}

impl SessionRegistry {
    pub fn get(&self, institution: InstitutionId, code: &SessionCode) -> Option<&Session> {
        self.sessions.get(&(institution, code.clone()))
    }

    pub fn sequence_taken(&self, institution: InstitutionId, sequence: u64) -> bool {
        self.sequences.contains_key(&(institution, sequence))
    }

    /// Insert after [`check_new_session`] has passed.
    pub(crate) fn insert(&mut self, session: Session) {
        self.sequences.insert(
            (session.institution, session.sequence),
            session.code.clone(),
        );
        self.sessions
            .insert((session.institution, session.code.clone()), session);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
