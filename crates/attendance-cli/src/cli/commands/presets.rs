//! `attendance presets` - list the named session durations at the configured block time.

use super::{print_json, Globals};
use crate::exit_codes::SUCCESS;
use attendance_core::{humanize_minutes, DurationPreset};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PresetRow {
    preset: &'static str,
    blocks: u64,
    approx: String,
}

pub fn run(globals: &Globals) -> anyhow::Result<i32> {
    let block_time = globals.load_config()?.chain.block_time_minutes;
    let rows: Vec<PresetRow> = DurationPreset::ALL
        .iter()
        .map(|p| {
            let blocks = p.blocks_at(block_time);
            PresetRow {
                preset: p.as_str(),
                blocks,
                approx: humanize_minutes(blocks.saturating_mul(block_time)),
            }
        })
        .collect();
    print_json(&rows)?;
    Ok(SUCCESS)
}
