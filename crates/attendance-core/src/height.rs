//! Chronological height: the progress marker used for session expiry.
//!
//! The ledger itself only compares heights. Boundary code resolves the
//! current height through a [`HeightOracle`] and converts human durations
//! into block counts with the helpers below.

use crate::config::ChainConfig;
use crate::errors::ArgumentError;
use crate::model::Height;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approximate minutes per block on the host chain.
pub const BLOCK_TIME_MINUTES: u64 = 10;

/// Source of the current chronological height.
pub trait HeightOracle {
    fn current_height(&self) -> Height;
}

/// A height pinned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeight(pub Height);

impl HeightOracle for FixedHeight {
    fn current_height(&self) -> Height {
        self.0
    }
}

/// Height derived from wall-clock time: whole block intervals since genesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallClockHeight {
    genesis: DateTime<Utc>,
    block_time_minutes: u64,
}

impl WallClockHeight {
    pub fn new(genesis: DateTime<Utc>, block_time_minutes: u64) -> Self {
        Self {
            genesis,
            block_time_minutes: block_time_minutes.max(1),
        }
    }

    pub fn from_config(chain: &ChainConfig) -> Self {
        Self::new(chain.genesis, chain.block_time_minutes)
    }

    /// Height at `now`. Instants before genesis map to height 0.
    pub fn height_at(&self, now: DateTime<Utc>) -> Height {
        let elapsed = now.signed_duration_since(self.genesis).num_minutes();
        if elapsed <= 0 {
            return 0;
        }
        elapsed as u64 / self.block_time_minutes
    }
}

impl HeightOracle for WallClockHeight {
    fn current_height(&self) -> Height {
        self.height_at(Utc::now())
    }
}

/// Total minutes covered by `blocks` (approximate).
pub fn blocks_to_minutes(blocks: u64) -> u64 {
    blocks.saturating_mul(BLOCK_TIME_MINUTES)
}

/// Blocks needed to cover `minutes`, rounded up, never less than one.
pub fn minutes_to_blocks(minutes: u64) -> u64 {
    blocks_covering(minutes, BLOCK_TIME_MINUTES)
}

/// [`minutes_to_blocks`] for a chain with a different block time.
pub fn blocks_covering(minutes: u64, block_time_minutes: u64) -> u64 {
    minutes.div_ceil(block_time_minutes.max(1)).max(1)
}

/// "~N minutes", "~N hours" or "~N days" for a block count at the default block time.
pub fn humanize_blocks(blocks: u64) -> String {
    humanize_minutes(blocks_to_minutes(blocks))
}

/// "~N minutes", "~N hours" or "~N days".
pub fn humanize_minutes(minutes: u64) -> String {
    if minutes < 60 {
        return format!("~{minutes} {}", plural(minutes, "minute"));
    }
    let hours = minutes as f64 / 60.0;
    if hours < 24.0 {
        let rounded = hours.round() as u64;
        return format!("~{rounded} {}", plural(rounded, "hour"));
    }
    let days = (hours / 24.0).round() as u64;
    format!("~{days} {}", plural(days, "day"))
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}

/// Named session durations offered to tutors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DurationPreset {
    #[serde(rename = "10m")]
    TenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "1d")]
    OneDay,
}

impl DurationPreset {
    pub const ALL: [DurationPreset; 4] = [
        DurationPreset::TenMinutes,
        DurationPreset::OneHour,
        DurationPreset::SixHours,
        DurationPreset::OneDay,
    ];

    pub fn minutes(self) -> u64 {
        match self {
            Self::TenMinutes => 10,
            Self::OneHour => 60,
            Self::SixHours => 6 * 60,
            Self::OneDay => 24 * 60,
        }
    }

    /// Blocks at the default block time: 1, 6, 36 and 144.
    pub fn blocks(self) -> u64 {
        self.blocks_at(BLOCK_TIME_MINUTES)
    }

    /// Blocks covering the preset on a chain with `block_time_minutes` blocks.
    pub fn blocks_at(self, block_time_minutes: u64) -> u64 {
        blocks_covering(self.minutes(), block_time_minutes)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TenMinutes => "10m",
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::OneDay => "1d",
        }
    }
}

impl fmt::Display for DurationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationPreset {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ArgumentError::invalid("preset", format!("unknown preset {s:?}")))
    }
}
