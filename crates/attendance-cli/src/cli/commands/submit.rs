//! `attendance submit <op> [args...] --caller <principal>` - apply a state-changing
//! operation given by name, with positional arguments in contract order.

use super::{respond, usage_error, Globals, SubmitArgs};
use attendance_core::{submit, Call, Principal};
use tracing::debug;

pub fn run(globals: &Globals, args: SubmitArgs) -> anyhow::Result<i32> {
    let call = match Call::from_positional(&args.op, args.args.as_slice()) {
        Ok(call) => call,
        Err(e) => return Ok(usage_error(e)),
    };
    let caller = match Principal::new(args.caller) {
        Ok(p) => p,
        Err(e) => return Ok(usage_error(e)),
    };

    let config = globals.load_config()?;
    let height = globals.current_height(&config);
    debug!(op = call.op_name(), height, "parsed positional call");

    let mut store = globals.open_store(&config)?;
    respond(submit(&mut store, call, &caller, height))
}
