//! Submit and query interface for boundary collaborators.
//!
//! Operations are identified by stable kebab-case names and take positional
//! primitive arguments, or a JSON object tagged by `op`:
//!
//! ```json
//! {"op": "claim-attendance", "institution": 1, "code": "CODE2"}
//! ```
//!
//! Submitted calls carry a caller identity; queries do not.

use crate::credentials::Credential;
use crate::errors::{ArgumentError, LedgerError};
use crate::ledger::AttendanceLedger;
use crate::model::{
    AttendanceId, BadgeUri, ClaimReceipt, Height, InstitutionId, Principal, Session, SessionCode,
    Topic,
};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

/// A state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Call {
    #[serde(rename_all = "kebab-case")]
    CreateSession {
        institution: InstitutionId,
        code: SessionCode,
        seq: u64,
        topic: Topic,
        date: u64,
        badge_uri: BadgeUri,
        expires_at: Height,
        active: bool,
        tutor: Principal,
    },
    #[serde(rename_all = "kebab-case")]
    ClaimAttendance {
        institution: InstitutionId,
        code: SessionCode,
    },
}

impl Call {
    pub const OPERATIONS: [&'static str; 2] = ["create-session", "claim-attendance"];

    pub fn op_name(&self) -> &'static str {
        match self {
            Self::CreateSession { .. } => "create-session",
            Self::ClaimAttendance { .. } => "claim-attendance",
        }
    }

    /// Build a call from its name and positional arguments.
    ///
    /// `create-session`: institution code seq topic date badge-uri expires-at active tutor
    /// `claim-attendance`: institution code
    pub fn from_positional<S: AsRef<str>>(op: &str, args: &[S]) -> Result<Self, ArgumentError> {
        match op {
            "create-session" => {
                let a = arity(op, args, 9)?;
                Ok(Self::CreateSession {
                    institution: uint("institution", a[0])?,
                    code: SessionCode::new(a[1])?,
                    seq: uint("seq", a[2])?,
                    topic: Topic::new(a[3])?,
                    date: uint("date", a[4])?,
                    badge_uri: BadgeUri::new(a[5])?,
                    expires_at: uint("expires-at", a[6])?,
                    active: boolean("active", a[7])?,
                    tutor: Principal::new(a[8])?,
                })
            }
            "claim-attendance" => {
                let a = arity(op, args, 2)?;
                Ok(Self::ClaimAttendance {
                    institution: uint("institution", a[0])?,
                    code: SessionCode::new(a[1])?,
                })
            }
            _ => Err(ArgumentError::UnknownOperation { op: op.to_string() }),
        }
    }
}

/// A read-only accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Query {
    GetSession {
        institution: InstitutionId,
        code: SessionCode,
    },
    GetStreak {
        claimant: Principal,
        institution: InstitutionId,
    },
    GetLastSeq {
        claimant: Principal,
        institution: InstitutionId,
    },
    GetStreakAwarded {
        claimant: Principal,
        institution: InstitutionId,
    },
    GetNextAttendanceId,
    GetAttendanceOwner {
        id: AttendanceId,
    },
    GetAttendanceTokenUri {
        id: AttendanceId,
    },
    #[serde(rename_all = "kebab-case")]
    GetStreakTokenUri {
        any_id: u64,
    },
    GetCredentials {
        owner: Principal,
    },
}

impl Query {
    pub const OPERATIONS: [&'static str; 9] = [
        "get-session",
        "get-streak",
        "get-last-seq",
        "get-streak-awarded",
        "get-next-attendance-id",
        "get-attendance-owner",
        "get-attendance-token-uri",
        "get-streak-token-uri",
        "get-credentials",
    ];

    pub fn op_name(&self) -> &'static str {
        match self {
            Self::GetSession { .. } => "get-session",
            Self::GetStreak { .. } => "get-streak",
            Self::GetLastSeq { .. } => "get-last-seq",
            Self::GetStreakAwarded { .. } => "get-streak-awarded",
            Self::GetNextAttendanceId => "get-next-attendance-id",
            Self::GetAttendanceOwner { .. } => "get-attendance-owner",
            Self::GetAttendanceTokenUri { .. } => "get-attendance-token-uri",
            Self::GetStreakTokenUri { .. } => "get-streak-token-uri",
            Self::GetCredentials { .. } => "get-credentials",
        }
    }

    /// Build a query from its name and positional arguments, in contract order.
    pub fn from_positional<S: AsRef<str>>(op: &str, args: &[S]) -> Result<Self, ArgumentError> {
        match op {
            "get-session" => {
                let a = arity(op, args, 2)?;
                Ok(Self::GetSession {
                    institution: uint("institution", a[0])?,
                    code: SessionCode::new(a[1])?,
                })
            }
            "get-streak" | "get-last-seq" | "get-streak-awarded" => {
                let a = arity(op, args, 2)?;
                let claimant = Principal::new(a[0])?;
                let institution = uint("institution", a[1])?;
                Ok(match op {
                    "get-streak" => Self::GetStreak {
                        claimant,
                        institution,
                    },
                    "get-last-seq" => Self::GetLastSeq {
                        claimant,
                        institution,
                    },
                    _ => Self::GetStreakAwarded {
                        claimant,
                        institution,
                    },
                })
            }
            "get-next-attendance-id" => {
                arity(op, args, 0)?;
                Ok(Self::GetNextAttendanceId)
            }
            "get-attendance-owner" => {
                let a = arity(op, args, 1)?;
                Ok(Self::GetAttendanceOwner {
                    id: AttendanceId(uint("id", a[0])?),
                })
            }
            "get-attendance-token-uri" => {
                let a = arity(op, args, 1)?;
                Ok(Self::GetAttendanceTokenUri {
                    id: AttendanceId(uint("id", a[0])?),
                })
            }
            "get-streak-token-uri" => {
                let a = arity(op, args, 1)?;
                Ok(Self::GetStreakTokenUri {
                    any_id: uint("id", a[0])?,
                })
            }
            "get-credentials" => {
                let a = arity(op, args, 1)?;
                Ok(Self::GetCredentials {
                    owner: Principal::new(a[0])?,
                })
            }
            _ => Err(ArgumentError::UnknownOperation { op: op.to_string() }),
        }
    }
}

/// Successful result of a submitted [`Call`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Serializes as `true`.
    SessionCreated,
    Claimed(ClaimReceipt),
}

impl Serialize for CallOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::SessionCreated => serializer.serialize_bool(true),
            Self::Claimed(receipt) => receipt.serialize(serializer),
        }
    }
}

/// Result of a [`Query`]. Absent values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Session(Option<Session>),
    Uint(u64),
    MaybeUint(Option<u64>),
    Bool(bool),
    Owner(Option<Principal>),
    Uri(Option<String>),
    Credentials(Vec<Credential>),
}

/// Contract-shaped envelope: `{"ok": value}` or `{"err": code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Response<T> {
    Ok(T),
    Err(u32),
}

impl<T> Response<T> {
    pub fn from_ledger(result: Result<T, LedgerError>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) => Self::Err(e.code()),
        }
    }
}

/// Apply `call` on behalf of `caller` at `height`.
///
/// The caller is the claimant for `claim-attendance`. For `create-session`
/// the tutor is taken from the call's arguments and is not compared to the
/// caller.
pub fn submit<L: AttendanceLedger>(
    ledger: &mut L,
    call: Call,
    caller: &Principal,
    height: Height,
) -> Result<CallOutcome, L::Error> {
    debug!(op = call.op_name(), caller = %caller, height, "submit");
    match call {
        Call::CreateSession {
            institution,
            code,
            seq,
            topic,
            date,
            badge_uri,
            expires_at,
            active,
            tutor,
        } => {
            ledger.create_session(Session {
                institution,
                code,
                sequence: seq,
                topic,
                date,
                badge_uri,
                expires_at,
                active,
                tutor,
            })?;
            Ok(CallOutcome::SessionCreated)
        }
        Call::ClaimAttendance { institution, code } => ledger
            .claim_attendance(institution, &code, caller, height)
            .map(CallOutcome::Claimed),
    }
}

/// Evaluate a read-only accessor.
pub fn query<L: AttendanceLedger>(ledger: &L, query: &Query) -> Result<QueryValue, L::Error> {
    Ok(match query {
        Query::GetSession { institution, code } => {
            QueryValue::Session(ledger.get_session(*institution, code)?)
        }
        Query::GetStreak {
            claimant,
            institution,
        } => QueryValue::Uint(ledger.get_streak(claimant, *institution)?),
        Query::GetLastSeq {
            claimant,
            institution,
        } => QueryValue::MaybeUint(ledger.get_last_seq(claimant, *institution)?),
        Query::GetStreakAwarded {
            claimant,
            institution,
        } => QueryValue::Bool(ledger.get_streak_awarded(claimant, *institution)?),
        Query::GetNextAttendanceId => QueryValue::Uint(ledger.get_next_attendance_id()?.0),
        Query::GetAttendanceOwner { id } => QueryValue::Owner(ledger.get_attendance_owner(*id)?),
        Query::GetAttendanceTokenUri { id } => {
            QueryValue::Uri(ledger.get_attendance_token_uri(*id)?)
        }
        Query::GetStreakTokenUri { any_id } => {
            QueryValue::Uri(Some(ledger.get_streak_token_uri(*any_id)?))
        }
        Query::GetCredentials { owner } => QueryValue::Credentials(ledger.credentials_of(owner)?),
    })
}

fn arity<'a, S: AsRef<str>>(
    op: &str,
    args: &'a [S],
    expected: usize,
) -> Result<Vec<&'a str>, ArgumentError> {
    if args.len() != expected {
        return Err(ArgumentError::Arity {
            op: op.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(args.iter().map(AsRef::as_ref).collect())
}

fn uint(name: &str, value: &str) -> Result<u64, ArgumentError> {
    let digits = value.strip_prefix('u').unwrap_or(value);
    digits
        .parse()
        .map_err(|e: std::num::ParseIntError| ArgumentError::invalid(name, e))
}

fn boolean(name: &str, value: &str) -> Result<bool, ArgumentError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ArgumentError::invalid(
            name,
            format!("expected true or false, got {other:?}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    fn create_args(code: &str, seq: &str) -> Vec<String> {
        [
            "1",
            code,
            seq,
            "Intro",
            "20250101",
            "ipfs://badge",
            "u100",
            "true",
            "tutor",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn test_positional_create_session() {
        let call = Call::from_positional("create-session", &create_args("CODE1", "1")).unwrap();
        match &call {
            Call::CreateSession {
                expires_at, active, ..
            } => {
                assert_eq!(*expires_at, 100);
                assert!(*active);
            }
            other => panic!("unexpected call: {other:?}"),
        }
        assert_eq!(call.op_name(), "create-session");
    }

    #[test]
    fn test_positional_rejects_bad_arguments() {
        assert!(matches!(
            Call::from_positional("claim-attendance", &["1"]),
            Err(ArgumentError::Arity {
                expected: 2,
                got: 1,
                ..
            })
        ));
        assert!(matches!(
            Call::from_positional("claim-attendance", &["-1", "CODE"]),
            Err(ArgumentError::InvalidValue { .. })
        ));
        assert!(matches!(
            Call::from_positional("claim-attendance", &["1", "X".repeat(33).as_str()]),
            Err(ArgumentError::TooLong { .. })
        ));
        assert!(matches!(
            Query::from_positional("get-everything", &[] as &[&str]),
            Err(ArgumentError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn test_every_query_name_parses() {
        for op in Query::OPERATIONS {
            let args: &[&str] = match op {
                "get-next-attendance-id" => &[],
                "get-session" => &["1", "CODE"],
                "get-streak" | "get-last-seq" | "get-streak-awarded" => &["student", "1"],
                "get-credentials" => &["student"],
                _ => &["1"],
            };
            let q = Query::from_positional(op, args).unwrap();
            assert_eq!(q.op_name(), op);
        }
    }

    #[test]
    fn test_every_call_name_parses() {
        for op in Call::OPERATIONS {
            let args = match op {
                "create-session" => create_args("CODE1", "1"),
                _ => vec!["1".to_string(), "CODE1".to_string()],
            };
            let call = Call::from_positional(op, &args).unwrap();
            assert_eq!(call.op_name(), op);
            assert!(matches!(
                Call::from_positional(op, &[] as &[&str]),
                Err(ArgumentError::Arity { got: 0, .. })
            ));
        }
    }

    #[test]
    fn test_json_call_is_tagged_by_op() {
        let call: Call = serde_json::from_str(
            r#"{"op": "claim-attendance", "institution": 1, "code": "CODE2"}"#,
        )
        .unwrap();
        assert_eq!(
            call,
            Call::ClaimAttendance {
                institution: 1,
                code: SessionCode::new("CODE2").unwrap(),
            }
        );
        let q: Query = serde_json::from_str(r#"{"op": "get-next-attendance-id"}"#).unwrap();
        assert_eq!(q, Query::GetNextAttendanceId);
    }

    #[test]
    fn test_submit_and_query_contract_shapes() {
        let mut ledger = MemoryLedger::default();
        let tutor = Principal::new("tutor").unwrap();
        let student = Principal::new("student").unwrap();

        let created = submit(
            &mut ledger,
            Call::from_positional("create-session", &create_args("CODE2", "2")).unwrap(),
            &tutor,
            0,
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(Response::Ok(created)).unwrap(),
            serde_json::json!({"ok": true})
        );

        let claim = Call::from_positional("claim-attendance", &["1", "CODE2"]).unwrap();
        let claimed = submit(&mut ledger, claim.clone(), &student, 10).unwrap();
        assert_eq!(
            serde_json::to_value(Response::Ok(claimed)).unwrap(),
            serde_json::json!({"ok": {"attendance-id": 1, "new-streak": 1, "streak-awarded": false}})
        );

        let dup = Response::from_ledger(submit(&mut ledger, claim, &student, 10));
        assert_eq!(
            serde_json::to_value(dup).unwrap(),
            serde_json::json!({"err": 101})
        );

        let owner = query(&ledger, &Query::GetAttendanceOwner { id: AttendanceId(1) }).unwrap();
        assert_eq!(serde_json::to_value(owner).unwrap(), serde_json::json!("student"));
        let missing = query(&ledger, &Query::GetAttendanceOwner { id: AttendanceId(2) }).unwrap();
        assert_eq!(serde_json::to_value(missing).unwrap(), serde_json::Value::Null);
        let last = query(
            &ledger,
            &Query::GetLastSeq {
                claimant: student,
                institution: 1,
            },
        )
        .unwrap();
        assert_eq!(last, QueryValue::MaybeUint(Some(2)));

        let badge_uri = query(&ledger, &Query::GetStreakTokenUri { any_id: 42 }).unwrap();
        assert_eq!(
            badge_uri,
            QueryValue::Uri(Some(crate::DEFAULT_STREAK_BADGE_URI.to_string()))
        );

        let held = query(
            &ledger,
            &Query::GetCredentials {
                owner: Principal::new("student").unwrap(),
            },
        )
        .unwrap();
        let held = serde_json::to_value(held).unwrap();
        assert_eq!(held[0]["kind"], "attendance");
        assert_eq!(held[0]["id"], 1);
        assert_eq!(held[0]["token-uri"], "ipfs://badge");
    }
}
