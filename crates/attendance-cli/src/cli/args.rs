use attendance_core::DurationPreset;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "attendance",
    version,
    about = "Attendance ledger: class sessions, exactly-once claims, streaks and credentials"
)]
pub struct Cli {
    /// Ledger database file
    #[arg(long, global = true, env = "ATTENDANCE_DB", default_value = "attendance.db")]
    pub db: PathBuf,

    /// YAML config file (streak threshold, badge URI, chain timing)
    #[arg(long, global = true, env = "ATTENDANCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Current chronological height (default: derived from the wall clock)
    #[arg(long, global = true, env = "ATTENDANCE_HEIGHT")]
    pub height: Option<u64>,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the ledger database and record its constants
    Init,
    /// Register a class session
    CreateSession(CreateSessionArgs),
    /// Claim attendance for a session
    Claim(ClaimArgs),
    /// Evaluate a read-only accessor by name
    Query(QueryArgs),
    /// Submit an operation by name with positional arguments
    Submit(SubmitArgs),
    /// Print the message for a numeric error code
    Explain(ExplainArgs),
    /// List session duration presets
    Presets,
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("expiry")
        .required(true)
        .args(["expires_at", "expires_in", "preset"])
))]
pub struct CreateSessionArgs {
    #[arg(long)]
    pub institution: u64,

    /// Session code, unique within the institution
    #[arg(long)]
    pub code: String,

    /// Sequence number, unique within the institution
    #[arg(long)]
    pub seq: u64,

    #[arg(long)]
    pub topic: String,

    /// Opaque creation tag, e.g. 20250101
    #[arg(long, default_value_t = 0)]
    pub date: u64,

    /// Metadata URI copied onto every attendance credential of this session
    #[arg(long)]
    pub badge_uri: String,

    /// Absolute expiry height
    #[arg(long)]
    pub expires_at: Option<u64>,

    /// Expiry relative to the current height, e.g. "90m" or "2h"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub expires_in: Option<Duration>,

    /// Named duration: 10m, 1h, 6h or 1d
    #[arg(long)]
    pub preset: Option<DurationPreset>,

    /// Create the session closed to claims
    #[arg(long)]
    pub inactive: bool,

    /// Issuing tutor
    #[arg(long, env = "ATTENDANCE_CALLER")]
    pub tutor: String,
}

#[derive(Args, Debug)]
pub struct ClaimArgs {
    #[arg(long)]
    pub institution: u64,

    #[arg(long)]
    pub code: String,

    /// Claiming student
    #[arg(long, env = "ATTENDANCE_CALLER")]
    pub student: String,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Accessor name, e.g. get-streak
    pub op: String,

    /// Positional arguments in contract order
    pub args: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Operation name: create-session or claim-attendance
    pub op: String,

    /// Positional arguments in contract order
    pub args: Vec<String>,

    /// Identity submitting the operation
    #[arg(long, env = "ATTENDANCE_CALLER")]
    pub caller: String,
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    /// Numeric error code, e.g. 101
    pub code: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_trailing_options_are_not_positional_arguments() {
        let cli = Cli::try_parse_from([
            "attendance",
            "submit",
            "claim-attendance",
            "1",
            "W1D1",
            "--caller",
            "ST1STUDENT",
        ])
        .unwrap();
        match cli.cmd {
            Command::Submit(args) => {
                assert_eq!(args.op, "claim-attendance");
                assert_eq!(args.args, ["1", "W1D1"]);
                assert_eq!(args.caller, "ST1STUDENT");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "attendance",
            "query",
            "get-streak",
            "ST1STUDENT",
            "1",
            "--quiet",
            "--db",
            "other.db",
        ])
        .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.db, PathBuf::from("other.db"));
        match cli.cmd {
            Command::Query(args) => assert_eq!(args.args, ["ST1STUDENT", "1"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_create_session_requires_one_expiry() {
        let base = [
            "attendance",
            "create-session",
            "--institution",
            "1",
            "--code",
            "CODE1",
            "--seq",
            "1",
            "--topic",
            "Intro",
            "--badge-uri",
            "ipfs://badge",
            "--tutor",
            "tutor",
        ];
        assert!(Cli::try_parse_from(base).is_err());

        let mut with_preset = base.to_vec();
        with_preset.extend(["--preset", "1h"]);
        let cli = Cli::try_parse_from(with_preset).unwrap();
        match cli.cmd {
            Command::CreateSession(args) => {
                assert_eq!(args.preset, Some(DurationPreset::OneHour));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let mut both = base.to_vec();
        both.extend(["--preset", "1h", "--expires-at", "10"]);
        assert!(Cli::try_parse_from(both).is_err());
    }
}
