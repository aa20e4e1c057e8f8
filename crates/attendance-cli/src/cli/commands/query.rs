//! `attendance query <op> [args...]` - evaluate a read-only accessor.
//!
//! Arguments are positional in contract order, e.g.
//! `attendance query get-streak ST1STUDENT 1`. The ledger must already exist;
//! it is opened read-only.

use super::{respond, usage_error, Globals, QueryArgs};
use attendance_core::{query, Query};

pub fn run(globals: &Globals, args: QueryArgs) -> anyhow::Result<i32> {
    let q = match Query::from_positional(&args.op, args.args.as_slice()) {
        Ok(q) => q,
        Err(e) => return Ok(usage_error(e)),
    };
    let store = globals.open_store_read_only()?;
    respond(query(&store, &q))
}
