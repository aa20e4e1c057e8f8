//! Attendance ledger for class sessions.
//!
//! This crate provides:
//!
//! - A session registry keyed by (institution, code) with unique sequence numbers
//! - Exactly-once attendance claims, each minting a numbered attendance credential
//! - Per-institution streak tracking with a one-time streak badge award
//! - An in-memory ledger and a durable SQLite store running the same rules
//! - A positional submit/query interface with stable numeric error codes
//!
//! # Quick Start
//!
//! ```
//! use attendance_core::{AttendanceLedger, MemoryLedger, Principal, Session, SessionCode};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ledger = MemoryLedger::default();
//! ledger.create_session(Session {
//!     institution: 1,
//!     code: SessionCode::new("CODE2")?,
//!     sequence: 2,
//!     topic: "Intro".try_into()?,
//!     date: 20250101,
//!     badge_uri: "ipfs://badge-2".try_into()?,
//!     expires_at: 50,
//!     active: true,
//!     tutor: Principal::new("tutor")?,
//! })?;
//!
//! let student = Principal::new("student")?;
//! let receipt = ledger.claim_attendance(1, &SessionCode::new("CODE2")?, &student, 10)?;
//! assert_eq!(receipt.attendance_id.0, 1);
//! assert_eq!(receipt.new_streak, 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Error codes
//!
//! | Code | Condition |
//! |------|-----------|
//! | 100 | `NoSession` |
//! | 101 | `DupClaim` |
//! | 102 | `Inactive` |
//! | 103 | `Expired` |
//! | 104 | `SeqTaken` |
//! | 105 | `SessionExists` |
//! | 106 | `MintFailed` |

pub mod claims;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod height;
pub mod interface;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod store;
pub mod streak;

// Re-export main types
pub use config::{ChainConfig, LedgerConfig};
pub use credentials::{
    AttendanceCredential, Credential, CredentialKind, CredentialRegistry, DEFAULT_STREAK_BADGE_URI,
};
pub use errors::{ArgumentError, ConfigError, LedgerError, StoreError};
pub use height::{
    blocks_covering, blocks_to_minutes, humanize_blocks, humanize_minutes, minutes_to_blocks,
    DurationPreset, FixedHeight, HeightOracle, WallClockHeight, BLOCK_TIME_MINUTES,
};
pub use interface::{query, submit, Call, CallOutcome, Query, QueryValue, Response};
pub use ledger::{AttendanceLedger, MemoryLedger};
pub use model::{
    AttendanceId, BadgeUri, BoundedAscii, ClaimKey, ClaimReceipt, Height, InstitutionId,
    Principal, Session, SessionCode, Topic,
};
pub use store::AttendanceStore;
pub use streak::{StreakState, DEFAULT_STREAK_THRESHOLD};
