//! Credential registry: numbered attendance credentials and the shared streak badge.
//!
//! Attendance credentials are minted one per successful claim, numbered from 1
//! in strict issuance order. The streak badge is not a numbered collection: a
//! holder is recorded by the `badge_awarded` flag of their streak state and
//! every holder shares one metadata URI fixed at ledger initialization.

use crate::errors::LedgerError;
use crate::model::{AttendanceId, InstitutionId, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default metadata URI shared by every streak badge.
pub const DEFAULT_STREAK_BADGE_URI: &str = "https://orange-official-walrus-920.mypinata.cloud/ipfs/bafkreieiczngwybf5wgltiumh66j2cgawcm2gy5b5ph5hl7676kg3iixqa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CredentialKind {
    Attendance,
    StreakBadge,
}

/// A minted attendance credential. Owner and URI are immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttendanceCredential {
    pub id: AttendanceId,
    pub owner: Principal,
    pub token_uri: String,
}

/// Any credential a principal can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Credential {
    Attendance(AttendanceCredential),
    #[serde(rename_all = "kebab-case")]
    StreakBadge {
        institution: InstitutionId,
        holder: Principal,
        token_uri: String,
    },
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Attendance(_) => CredentialKind::Attendance,
            Self::StreakBadge { .. } => CredentialKind::StreakBadge,
        }
    }

    pub fn owner(&self) -> &Principal {
        match self {
            Self::Attendance(c) => &c.owner,
            Self::StreakBadge { holder, .. } => holder,
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            Self::Attendance(c) => &c.token_uri,
            Self::StreakBadge { token_uri, .. } => token_uri,
        }
    }
}

/// Reserve the next attendance id.
///
/// Returns the id to mint and the counter value after minting, or
/// `MintFailed` when the counter cannot advance.
pub fn reserve_attendance_id(next: AttendanceId) -> Result<(AttendanceId, AttendanceId), LedgerError> {
    let after = next.successor().ok_or(LedgerError::MintFailed)?;
    Ok((next, after))
}

/// In-memory credential registry.
#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    next_id: AttendanceId,
    attendance: BTreeMap<AttendanceId, AttendanceCredential>,
    streak_badge_uri: String,
}

impl CredentialRegistry {
    pub fn new(streak_badge_uri: impl Into<String>) -> Self {
        Self {
            next_id: AttendanceId::FIRST,
            attendance: BTreeMap::new(),
            streak_badge_uri: streak_badge_uri.into(),
        }
    }

    pub fn next_id(&self) -> AttendanceId {
        self.next_id
    }

    pub fn attendance(&self, id: AttendanceId) -> Option<&AttendanceCredential> {
        self.attendance.get(&id)
    }

    pub fn streak_badge_uri(&self) -> &str {
        &self.streak_badge_uri
    }

    /// Attendance credentials owned by `owner`, in id order.
    pub fn owned_by(&self, owner: &Principal) -> impl Iterator<Item = &AttendanceCredential> + '_ {
        let owner = owner.clone();
        self.attendance.values().filter(move |c| c.owner == owner)
    }

    /// Store a credential whose id came from [`reserve_attendance_id`].
    pub(crate) fn store(&mut self, credential: AttendanceCredential, next_id: AttendanceId) {
        self.attendance.insert(credential.id, credential);
        self.next_id = next_id;
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, next_id: AttendanceId) {
        self.next_id = next_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_advances_counter() {
        assert_eq!(
            reserve_attendance_id(AttendanceId(1)),
            Ok((AttendanceId(1), AttendanceId(2)))
        );
        assert_eq!(
            reserve_attendance_id(AttendanceId(u64::MAX)),
            Err(LedgerError::MintFailed)
        );
    }

    #[test]
    fn test_credential_shared_capability() {
        let student = Principal::new("student").unwrap();
        let attendance = Credential::Attendance(AttendanceCredential {
            id: AttendanceId(1),
            owner: student.clone(),
            token_uri: "ipfs://badge-2".to_string(),
        });
        let badge = Credential::StreakBadge {
            institution: 9,
            holder: student.clone(),
            token_uri: DEFAULT_STREAK_BADGE_URI.to_string(),
        };

        assert_eq!(attendance.kind(), CredentialKind::Attendance);
        assert_eq!(badge.kind(), CredentialKind::StreakBadge);
        assert_eq!(attendance.owner(), &student);
        assert_eq!(badge.owner(), &student);
        assert_eq!(attendance.token_uri(), "ipfs://badge-2");
        assert_eq!(badge.token_uri(), DEFAULT_STREAK_BADGE_URI);
    }

    #[test]
    fn test_registry_lists_owned_in_id_order() {
        let mut registry = CredentialRegistry::new(DEFAULT_STREAK_BADGE_URI);
        let a = Principal::new("a").unwrap();
        let b = Principal::new("b").unwrap();
        for (owner, uri) in [(&a, "ipfs://1"), (&b, "ipfs://2"), (&a, "ipfs://3")] {
            let (id, next) = reserve_attendance_id(registry.next_id()).unwrap();
            registry.store(
                AttendanceCredential {
                    id,
                    owner: owner.clone(),
                    token_uri: uri.to_string(),
                },
                next,
            );
        }
        let ids: Vec<u64> = registry.owned_by(&a).map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(registry.next_id(), AttendanceId(4));
    }
}
