//! Domain types shared by every ledger component.

use crate::errors::ArgumentError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant namespace under which session codes and sequence numbers are unique.
pub type InstitutionId = u64;

/// Point on the host chronology used for expiry checks.
pub type Height = u64;

/// ASCII string with a fixed maximum byte length.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoundedAscii<const MAX: usize>(String);

impl<const MAX: usize> BoundedAscii<MAX> {
    pub const MAX_LEN: usize = MAX;

    pub fn new(value: impl Into<String>) -> Result<Self, ArgumentError> {
        let value = value.into();
        if !value.is_ascii() {
            return Err(ArgumentError::NotAscii);
        }
        if value.len() > MAX {
            return Err(ArgumentError::TooLong {
                len: value.len(),
                max: MAX,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const MAX: usize> TryFrom<String> for BoundedAscii<MAX> {
    type Error = ArgumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> TryFrom<&str> for BoundedAscii<MAX> {
    type Error = ArgumentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<const MAX: usize> From<BoundedAscii<MAX>> for String {
    fn from(value: BoundedAscii<MAX>) -> Self {
        value.0
    }
}

impl<const MAX: usize> fmt::Display for BoundedAscii<MAX> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short session code, unique per institution.
pub type SessionCode = BoundedAscii<32>;

/// Session topic.
pub type Topic = BoundedAscii<64>;

/// Metadata reference (URI) attached to a session and copied onto its credentials.
pub type BadgeUri = BoundedAscii<256>;

/// Opaque caller identity (tutor or student).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    pub const MAX_LEN: usize = 128;

    pub fn new(value: impl Into<String>) -> Result<Self, ArgumentError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ArgumentError::InvalidPrincipal {
                reason: "empty".to_string(),
            });
        }
        if value.len() > Self::MAX_LEN {
            return Err(ArgumentError::InvalidPrincipal {
                reason: format!("longer than {} bytes", Self::MAX_LEN),
            });
        }
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ArgumentError::InvalidPrincipal {
                reason: "contains whitespace or control characters".to_string(),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Principal {
    type Error = ArgumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a minted attendance credential. Issued from 1 upwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AttendanceId(pub u64);

impl AttendanceId {
    pub const FIRST: AttendanceId = AttendanceId(1);

    /// The id after this one, or `None` when the counter is exhausted.
    pub fn successor(self) -> Option<AttendanceId> {
        self.0.checked_add(1).map(AttendanceId)
    }
}

impl fmt::Display for AttendanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered class session, stored verbatim as supplied at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Session {
    pub institution: InstitutionId,
    pub code: SessionCode,
    #[serde(rename = "seq")]
    pub sequence: u64,
    pub topic: Topic,
    /// Opaque creation tag; never interpreted.
    pub date: u64,
    pub badge_uri: BadgeUri,
    pub expires_at: Height,
    pub active: bool,
    pub tutor: Principal,
}

impl Session {
    /// Whether a claim at `height` falls after the validity window.
    pub fn is_expired_at(&self, height: Height) -> bool {
        height > self.expires_at
    }
}

/// Identity of a claim: one per (institution, code, claimant).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimKey {
    pub institution: InstitutionId,
    pub code: SessionCode,
    pub claimant: Principal,
}

/// Successful `claim-attendance` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClaimReceipt {
    pub attendance_id: AttendanceId,
    pub new_streak: u64,
    pub streak_awarded: bool,
}
