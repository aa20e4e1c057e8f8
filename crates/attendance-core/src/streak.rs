//! Streak tracker: per-(institution, claimant) consecutive-attendance state.
//!
//! A claim continues the streak only when its session sequence number is
//! exactly one past the claimant's previously claimed sequence in the same
//! institution. The first claim in an institution starts a streak of 1. Any
//! other claim (a gap, a repeat of a lower number, an out-of-order claim)
//! resets the streak to 1.
//!
//! The badge flag flips false to true the first time the streak reaches the
//! threshold and is never cleared, so a claimant is awarded at most once per
//! institution.

use crate::model::{InstitutionId, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default streak length that awards the badge.
pub const DEFAULT_STREAK_THRESHOLD: u64 = 15;

/// Running streak state for one claimant in one institution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StreakState {
    /// `None` until the first claim.
    pub last_sequence_claimed: Option<u64>,
    pub current_streak: u64,
    pub badge_awarded: bool,
}

/// Outcome of applying one claim to a [`StreakState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakAdvance {
    pub state: StreakState,
    /// True only on the claim that first crosses the threshold.
    pub newly_awarded: bool,
}

impl StreakState {
    /// Whether claiming `sequence` continues the current run.
    pub fn continues_with(&self, sequence: u64) -> bool {
        match self.last_sequence_claimed {
            None => true,
            Some(last) => last.checked_add(1) == Some(sequence),
        }
    }

    /// Apply a claim of `sequence` and evaluate the badge threshold.
    ///
    /// Pure: the caller decides when (and whether) to persist the result.
    pub fn advance(&self, sequence: u64, threshold: u64) -> StreakAdvance {
        let current_streak = if self.continues_with(sequence) {
            self.current_streak.saturating_add(1)
        } else {
            1
        };
        let newly_awarded = !self.badge_awarded && current_streak >= threshold;

        StreakAdvance {
            state: StreakState {
                last_sequence_claimed: Some(sequence),
                current_streak,
                badge_awarded: self.badge_awarded || newly_awarded,
            },
            newly_awarded,
        }
    }
}

/// In-memory streak table keyed by (institution, claimant).
#[derive(Debug, Clone, Default)]
pub struct StreakTracker {
    states: BTreeMap<(InstitutionId, Principal), StreakState>,
}

impl StreakTracker {
    /// Stored state, or the default "no claims yet" state.
    pub fn get(&self, institution: InstitutionId, claimant: &Principal) -> StreakState {
        self.states
            .get(&(institution, claimant.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn put(&mut self, institution: InstitutionId, claimant: Principal, state: StreakState) {
        self.states.insert((institution, claimant), state);
    }

    /// Institutions in which `claimant` holds the badge.
    pub fn awarded_institutions(&self, claimant: &Principal) -> Vec<InstitutionId> {
        self.states
            .iter()
            .filter(|((_, who), state)| who == claimant && state.badge_awarded)
            .map(|((inst, _), _)| *inst)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_all(seqs: &[u64], threshold: u64) -> Vec<StreakAdvance> {
        let mut state = StreakState::default();
        let mut out = Vec::new();
        for &seq in seqs {
            let adv = state.advance(seq, threshold);
            state = adv.state;
            out.push(adv);
        }
        out
    }

    #[test]
    fn test_first_claim_starts_at_one_regardless_of_sequence() {
        let adv = StreakState::default().advance(2, DEFAULT_STREAK_THRESHOLD);
        assert_eq!(adv.state.current_streak, 1);
        assert_eq!(adv.state.last_sequence_claimed, Some(2));
        assert!(!adv.newly_awarded);
    }

    #[test]
    fn test_consecutive_claims_grow() {
        let streaks: Vec<u64> = claim_all(&[1, 2, 3, 4, 5], DEFAULT_STREAK_THRESHOLD)
            .iter()
            .map(|a| a.state.current_streak)
            .collect();
        assert_eq!(streaks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_gap_resets_to_one() {
        let advs = claim_all(&[1, 2, 4], DEFAULT_STREAK_THRESHOLD);
        assert_eq!(advs[2].state.current_streak, 1);
        assert_eq!(advs[2].state.last_sequence_claimed, Some(4));
    }

    #[test]
    fn test_out_of_order_resets_to_one() {
        let advs = claim_all(&[3, 4, 2, 3], DEFAULT_STREAK_THRESHOLD);
        let streaks: Vec<u64> = advs.iter().map(|a| a.state.current_streak).collect();
        assert_eq!(streaks, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_award_exactly_on_threshold_crossing() {
        let seqs: Vec<u64> = (1..=15).collect();
        let advs = claim_all(&seqs, 15);
        for adv in &advs[..14] {
            assert!(!adv.newly_awarded);
            assert!(!adv.state.badge_awarded);
        }
        assert!(advs[14].newly_awarded);
        assert!(advs[14].state.badge_awarded);
    }

    #[test]
    fn test_award_is_once_and_survives_reset() {
        let mut seqs: Vec<u64> = (1..=16).collect();
        seqs.push(40);
        seqs.extend(41..=60);
        let advs = claim_all(&seqs, 15);
        let awards = advs.iter().filter(|a| a.newly_awarded).count();
        assert_eq!(awards, 1);
        assert!(advs.iter().skip(14).all(|a| a.state.badge_awarded));
    }

    #[test]
    fn test_sequence_at_max_does_not_overflow() {
        let state = StreakState {
            last_sequence_claimed: Some(u64::MAX),
            current_streak: 3,
            badge_awarded: false,
        };
        let adv = state.advance(0, 15);
        assert_eq!(adv.state.current_streak, 1);
    }

    #[test]
    fn test_tracker_defaults_and_awarded_listing() {
        let mut tracker = StreakTracker::default();
        let student = Principal::new("student").unwrap();
        assert_eq!(tracker.get(1, &student), StreakState::default());

        tracker.put(
            4,
            student.clone(),
            StreakState {
                last_sequence_claimed: Some(15),
                current_streak: 15,
                badge_awarded: true,
            },
        );
        tracker.put(
            2,
            student.clone(),
            StreakState {
                last_sequence_claimed: Some(1),
                current_streak: 1,
                badge_awarded: false,
            },
        );
        assert_eq!(tracker.awarded_institutions(&student), vec![4]);
    }
}
