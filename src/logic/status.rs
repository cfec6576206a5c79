//! Tournament status derived from match statuses.

use crate::models::{GameMatch, MatchStatus, TournamentStatus};

/// Status a tournament should have given its matches. Only match statuses are read.
///
/// All completed → completed; any ongoing or completed → ongoing; otherwise open.
/// No matches at all is open.
pub fn derive_status(matches: &[GameMatch]) -> TournamentStatus {
    if matches.is_empty() {
        return TournamentStatus::Open;
    }
    if matches.iter().all(|m| m.status == MatchStatus::Completed) {
        TournamentStatus::Completed
    } else if matches.iter().any(|m| m.status != MatchStatus::Scheduled) {
        TournamentStatus::Ongoing
    } else {
        TournamentStatus::Open
    }
}

/// Stored tournament status that disagreed with its matches before a mutation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ConsistencyWarning {
    pub stored: TournamentStatus,
    pub expected: TournamentStatus,
}

/// Compare the stored status against the matches as they were before a mutation.
/// An admin `scheduled` on a not-yet-started tournament is not stale.
pub fn check_consistency(stored: TournamentStatus, matches_before: &[GameMatch]) -> Option<ConsistencyWarning> {
    let expected = derive_status(matches_before);
    if stored == expected || (stored == TournamentStatus::Scheduled && expected == TournamentStatus::Open) {
        return None;
    }
    Some(ConsistencyWarning { stored, expected })
}

/// New stored status after a mutation. An admin `scheduled` holds until play starts.
pub fn next_status(stored: TournamentStatus, matches_after: &[GameMatch]) -> TournamentStatus {
    match derive_status(matches_after) {
        TournamentStatus::Open if stored == TournamentStatus::Scheduled => TournamentStatus::Scheduled,
        derived => derived,
    }
}
