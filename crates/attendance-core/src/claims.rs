//! Claim ledger: at most one claim per (institution, code, claimant).

use crate::errors::LedgerError;
use crate::model::{AttendanceId, ClaimKey, Height, Session};
use std::collections::BTreeMap;

/// Validate a claim against its session and any prior claim.
///
/// Checks run in contract order: existence, active flag, expiry, duplicate.
pub fn check_claimable<'a>(
    session: Option<&'a Session>,
    height: Height,
    prior_claim: Option<AttendanceId>,
) -> Result<&'a Session, LedgerError> {
    let session = session.ok_or(LedgerError::NoSession)?;
    if !session.active {
        return Err(LedgerError::Inactive);
    }
    if session.is_expired_at(height) {
        return Err(LedgerError::Expired);
    }
    if prior_claim.is_some() {
        return Err(LedgerError::DupClaim);
    }
    Ok(session)
}

/// In-memory claim records. Never overwritten once written.
#[derive(Debug, Clone, Default)]
pub struct ClaimLedger {
    claims: BTreeMap<ClaimKey, AttendanceId>,
}

impl ClaimLedger {
    pub fn get(&self, key: &ClaimKey) -> Option<AttendanceId> {
        self.claims.get(key).copied()
    }

    /// Record a claim. Returns false, leaving the existing record, if the key is taken.
    pub(crate) fn record(&mut self, key: ClaimKey, id: AttendanceId) -> bool {
        match self.claims.entry(key) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
