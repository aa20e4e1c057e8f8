//! `attendance claim` - claim attendance for a session as a student.

use super::{respond, usage_error, ClaimArgs, Globals};
use attendance_core::{submit, ArgumentError, Call, Principal, SessionCode};

pub fn run(globals: &Globals, args: ClaimArgs) -> anyhow::Result<i32> {
    let config = globals.load_config()?;
    let height = globals.current_height(&config);

    let (call, student) = match build_call(args) {
        Ok(built) => built,
        Err(e) => return Ok(usage_error(e)),
    };

    let mut store = globals.open_store(&config)?;
    respond(submit(&mut store, call, &student, height))
}

fn build_call(args: ClaimArgs) -> Result<(Call, Principal), ArgumentError> {
    let student = Principal::new(args.student)?;
    let call = Call::ClaimAttendance {
        institution: args.institution,
        code: SessionCode::new(args.code)?,
    };
    Ok((call, student))
}
