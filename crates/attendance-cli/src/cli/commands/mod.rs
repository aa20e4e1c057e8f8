use super::args::*;
use crate::exit_codes::{self, SUCCESS, USAGE_ERROR};
use anyhow::Context;
use attendance_core::{
    AttendanceStore, HeightOracle, LedgerConfig, Response, StoreError, WallClockHeight,
};
use serde::Serialize;
use std::path::PathBuf;

pub mod claim;
pub mod explain;
pub mod init;
pub mod presets;
pub mod query;
pub mod session;
pub mod submit;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let globals = Globals {
        db: cli.db,
        config: cli.config,
        height: cli.height,
    };
    match cli.cmd {
        Command::Init => init::run(&globals),
        Command::CreateSession(args) => session::run(&globals, args),
        Command::Claim(args) => claim::run(&globals, args),
        Command::Query(args) => query::run(&globals, args),
        Command::Submit(args) => submit::run(&globals, args),
        Command::Explain(args) => Ok(explain::run(&args)),
        Command::Presets => presets::run(&globals),
    }
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub db: PathBuf,
    pub config: Option<PathBuf>,
    pub height: Option<u64>,
}

impl Globals {
    pub fn load_config(&self) -> anyhow::Result<LedgerConfig> {
        LedgerConfig::load(self.config.as_deref()).context("failed to load ledger config")
    }

    pub fn open_store(&self, config: &LedgerConfig) -> anyhow::Result<AttendanceStore> {
        AttendanceStore::open(&self.db, config)
            .with_context(|| format!("failed to open ledger: {}", self.db.display()))
    }

    /// Read-only handle on an existing ledger; never creates `--db`.
    pub fn open_store_read_only(&self) -> anyhow::Result<AttendanceStore> {
        AttendanceStore::open_read_only(&self.db)
            .with_context(|| format!("failed to open ledger read-only: {}", self.db.display()))
    }

    /// `--height` if given, else the wall-clock height for the configured chain.
    pub fn current_height(&self, config: &LedgerConfig) -> u64 {
        match self.height {
            Some(h) => h,
            None => WallClockHeight::from_config(&config.chain).current_height(),
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Print a ledger result in the contract shape and map it to an exit code.
///
/// Storage failures are not ledger results; they propagate as errors.
pub(crate) fn respond<T: Serialize>(result: Result<T, StoreError>) -> anyhow::Result<i32> {
    match result {
        Ok(value) => {
            print_json(&Response::Ok(value))?;
            Ok(SUCCESS)
        }
        Err(StoreError::Ledger(e)) => {
            print_json(&Response::<T>::Err(e.code()))?;
            Ok(exit_codes::ledger_failure(e.code()))
        }
        Err(e) => Err(anyhow::Error::new(e).context("ledger storage failure")),
    }
}

/// Report a rejected argument and return the usage exit code.
pub(crate) fn usage_error(e: impl std::fmt::Display) -> i32 {
    eprintln!("error: {e}");
    USAGE_ERROR
}
