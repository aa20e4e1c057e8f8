//! Error types for the attendance ledger.
//!
//! [`LedgerError`] is the closed set of contract failures. Each variant carries
//! a stable numeric code that boundary collaborators match on; the codes never
//! change meaning between releases.

/// Ledger failures. These are the only ways a ledger operation can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum LedgerError {
    #[error("No such session code (ERR-NO-SESSION)")]
    NoSession,

    #[error("Duplicate claim: attendance already claimed for this session (ERR-DUP-CLAIM)")]
    DupClaim,

    #[error("Session is inactive (ERR-INACTIVE)")]
    Inactive,

    #[error("Session expired (ERR-EXPIRED)")]
    Expired,

    #[error("Sequence number already taken for this institution (ERR-SEQ-TAKEN)")]
    SeqTaken,

    #[error("Session with this code already exists (ERR-SESSION-EXISTS)")]
    SessionExists,

    #[error("Mint failed (ERR-MINT-FAILED)")]
    MintFailed,
}

impl LedgerError {
    pub const ALL: [LedgerError; 7] = [
        LedgerError::NoSession,
        LedgerError::DupClaim,
        LedgerError::Inactive,
        LedgerError::Expired,
        LedgerError::SeqTaken,
        LedgerError::SessionExists,
        LedgerError::MintFailed,
    ];

    /// Stable numeric code, part of the external contract.
    pub fn code(&self) -> u32 {
        match self {
            Self::NoSession => 100,
            Self::DupClaim => 101,
            Self::Inactive => 102,
            Self::Expired => 103,
            Self::SeqTaken => 104,
            Self::SessionExists => 105,
            Self::MintFailed => 106,
        }
    }

    /// Reverse lookup of [`LedgerError::code`].
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Short constant-style name, e.g. `ERR-DUP-CLAIM`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoSession => "ERR-NO-SESSION",
            Self::DupClaim => "ERR-DUP-CLAIM",
            Self::Inactive => "ERR-INACTIVE",
            Self::Expired => "ERR-EXPIRED",
            Self::SeqTaken => "ERR-SEQ-TAKEN",
            Self::SessionExists => "ERR-SESSION-EXISTS",
            Self::MintFailed => "ERR-MINT-FAILED",
        }
    }
}

/// Rejected operation arguments.
///
/// Raised while building typed arguments, before any ledger operation runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("value is {len} bytes, exceeds maximum of {max}")]
    TooLong { len: usize, max: usize },

    #[error("value contains non-ASCII characters")]
    NotAscii,

    #[error("invalid principal: {reason}")]
    InvalidPrincipal { reason: String },

    #[error("unknown operation: {op}")]
    UnknownOperation { op: String },

    #[error("{op} takes {expected} argument(s), got {got}")]
    Arity {
        op: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ArgumentError {
    pub(crate) fn invalid(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors from the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A contract failure; the transaction was rolled back.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt ledger data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// The ledger code, if this is a contract failure.
    pub fn ledger_code(&self) -> Option<u32> {
        match self {
            Self::Ledger(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<ArgumentError> for StoreError {
    fn from(e: ArgumentError) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid environment override {var}: {message}")]
    Env { var: String, message: String },

    #[error("invalid config: {message}")]
    Invalid { message: String },
}
