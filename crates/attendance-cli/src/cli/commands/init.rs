//! `attendance init` - create the ledger database and record its constants.

use super::{respond, Globals};
use attendance_core::{AttendanceLedger, AttendanceStore, StoreError};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct LedgerSummary {
    db: String,
    streak_threshold: u64,
    streak_badge_uri: String,
    next_attendance_id: u64,
}

pub fn run(globals: &Globals) -> anyhow::Result<i32> {
    let config = globals.load_config()?;
    let store = globals.open_store(&config)?;
    let summary = summarize(&store, globals);
    if let Ok(s) = &summary {
        info!(
            db = %s.db,
            streak_threshold = s.streak_threshold,
            next_attendance_id = s.next_attendance_id,
            "ledger ready"
        );
    }
    respond(summary)
}

fn summarize(store: &AttendanceStore, globals: &Globals) -> Result<LedgerSummary, StoreError> {
    Ok(LedgerSummary {
        db: globals.db.display().to_string(),
        streak_threshold: store.streak_threshold(),
        streak_badge_uri: store.streak_badge_uri()?,
        next_attendance_id: store.get_next_attendance_id()?.0,
    })
}
