//! `attendance explain <code>` - describe a ledger error code.

use super::{usage_error, ExplainArgs};
use crate::exit_codes::SUCCESS;
use attendance_core::LedgerError;

pub fn run(args: &ExplainArgs) -> i32 {
    match LedgerError::from_code(args.code) {
        Some(e) => {
            println!("{}: {}", e.code(), e);
            SUCCESS
        }
        None => usage_error(format!(
            "unknown error code {} (known: {})",
            args.code,
            known_codes()
        )),
    }
}

fn known_codes() -> String {
    LedgerError::ALL
        .iter()
        .map(|e| e.code().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
