//! `attendance create-session` - register a class session.
//!
//! Usage:
//!   attendance create-session --institution 1 --code W1D1 --seq 1 --topic Intro \
//!     --badge-uri ipfs://... --tutor ST1... (--expires-at H | --expires-in 2h | --preset 1d)

use super::{respond, usage_error, CreateSessionArgs, Globals};
use anyhow::{anyhow, bail};
use attendance_core::{
    blocks_covering, humanize_minutes, submit, ArgumentError, BadgeUri, Call, Principal,
    SessionCode, Topic,
};
use tracing::info;

pub fn run(globals: &Globals, args: CreateSessionArgs) -> anyhow::Result<i32> {
    let config = globals.load_config()?;
    let height = globals.current_height(&config);

    let expires_at = match resolve_expiry(&args, height, config.chain.block_time_minutes) {
        Ok(h) => h,
        Err(e) => return Ok(usage_error(e)),
    };
    info!(
        height,
        expires_at,
        window = %humanize_minutes(
            expires_at
                .saturating_sub(height)
                .saturating_mul(config.chain.block_time_minutes)
        ),
        "resolved session expiry"
    );

    let (call, tutor) = match build_call(args, expires_at) {
        Ok(built) => built,
        Err(e) => return Ok(usage_error(e)),
    };

    let mut store = globals.open_store(&config)?;
    respond(submit(&mut store, call, &tutor, height))
}

/// Absolute expiry height from whichever expiry option was given.
fn resolve_expiry(
    args: &CreateSessionArgs,
    height: u64,
    block_time_minutes: u64,
) -> anyhow::Result<u64> {
    let blocks = match (args.expires_at, args.expires_in, args.preset) {
        (Some(at), _, _) => return Ok(at),
        (None, Some(d), _) => blocks_covering(d.as_secs().div_ceil(60), block_time_minutes),
        (None, None, Some(preset)) => preset.blocks_at(block_time_minutes),
        (None, None, None) => bail!("one of --expires-at, --expires-in or --preset is required"),
    };
    height
        .checked_add(blocks)
        .ok_or_else(|| anyhow!("expiry height overflows: {height} + {blocks}"))
}

fn build_call(args: CreateSessionArgs, expires_at: u64) -> Result<(Call, Principal), ArgumentError> {
    let tutor = Principal::new(args.tutor)?;
    let call = Call::CreateSession {
        institution: args.institution,
        code: SessionCode::new(args.code)?,
        seq: args.seq,
        topic: Topic::new(args.topic)?,
        date: args.date,
        badge_uri: BadgeUri::new(args.badge_uri)?,
        expires_at,
        active: !args.inactive,
        tutor: tutor.clone(),
    };
    Ok((call, tutor))
}
