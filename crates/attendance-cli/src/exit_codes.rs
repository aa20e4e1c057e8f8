//! Exit codes for the `attendance` binary.
//! These codes are part of the public contract.

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 2; // Storage, config or I/O failure
pub const USAGE_ERROR: i32 = 64; // Bad command line or operation arguments

/// A rejected ledger operation exits with its ledger code (100-106).
pub fn ledger_failure(code: u32) -> i32 {
    i32::try_from(code).unwrap_or(INTERNAL_ERROR)
}
