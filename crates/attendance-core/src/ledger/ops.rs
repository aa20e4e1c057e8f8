//! `create-session` and `claim-attendance` rules, shared by every backend.

use super::{ClaimWrite, LedgerTables};
use crate::claims::check_claimable;
use crate::credentials::{reserve_attendance_id, AttendanceCredential};
use crate::errors::LedgerError;
use crate::model::{ClaimKey, ClaimReceipt, Height, InstitutionId, Principal, Session, SessionCode};
use crate::registry::check_new_session;
use tracing::{debug, info};

fn rejected<E: From<LedgerError>>(
    op: &'static str,
    institution: InstitutionId,
    code: &SessionCode,
    err: LedgerError,
) -> E {
    debug!(
        op,
        institution,
        session = %code,
        error_code = err.code(),
        error = %err,
        "operation rejected"
    );
    err.into()
}

pub(crate) fn create_session<T: LedgerTables>(
    tables: &mut T,
    session: Session,
) -> Result<(), T::Error> {
    let code_exists = tables
        .session(session.institution, &session.code)?
        .is_some();
    let sequence_taken = tables.sequence_taken(session.institution, session.sequence)?;
    check_new_session(code_exists, sequence_taken)
        .map_err(|e| rejected("create-session", session.institution, &session.code, e))?;

    let (institution, code, sequence, expires_at) = (
        session.institution,
        session.code.clone(),
        session.sequence,
        session.expires_at,
    );
    tables.insert_session(session)?;
    info!(
        institution,
        session = %code,
        seq = sequence,
        expires_at,
        "session created"
    );
    Ok(())
}

pub(crate) fn claim_attendance<T: LedgerTables>(
    tables: &mut T,
    institution: InstitutionId,
    code: &SessionCode,
    claimant: &Principal,
    height: Height,
) -> Result<ClaimReceipt, T::Error> {
    let key = ClaimKey {
        institution,
        code: code.clone(),
        claimant: claimant.clone(),
    };

    let session = tables.session(institution, code)?;
    let prior = match session {
        Some(_) => tables.claim(&key)?,
        None => None,
    };
    let session = check_claimable(session.as_ref(), height, prior)
        .map_err(|e| rejected("claim-attendance", institution, code, e))?;

    let advance = tables
        .streak(institution, claimant)?
        .advance(session.sequence, tables.streak_threshold());
    let (attendance_id, next_id) = reserve_attendance_id(tables.next_attendance_id()?)
        .map_err(|e| rejected("claim-attendance", institution, code, e))?;

    tables.apply_claim(ClaimWrite {
        key,
        credential: AttendanceCredential {
            id: attendance_id,
            owner: claimant.clone(),
            token_uri: session.badge_uri.to_string(),
        },
        next_id,
        streak: advance.state,
    })?;

    info!(
        institution,
        session = %code,
        claimant = %claimant,
        attendance_id = attendance_id.0,
        streak = advance.state.current_streak,
        "attendance claimed"
    );
    if advance.newly_awarded {
        info!(
            institution,
            claimant = %claimant,
            streak = advance.state.current_streak,
            "streak badge awarded"
        );
    }

    Ok(ClaimReceipt {
        attendance_id,
        new_streak: advance.state.current_streak,
        streak_awarded: advance.newly_awarded,
    })
}
