//! Integration tests for deriving the tournament status from its matches.

use esports_tournament_web::logic::{check_consistency, next_status, ConsistencyWarning};
use esports_tournament_web::{derive_status, GameMatch, MatchStatus, Slot, TournamentStatus};
use uuid::Uuid;

fn matches_with(statuses: &[MatchStatus]) -> Vec<GameMatch> {
    let tid = Uuid::new_v4();
    statuses
        .iter()
        .enumerate()
        .map(|(i, &status)| {
            let mut m = GameMatch::new(tid, 1, i as u32, Slot::Empty, Slot::Empty);
            m.status = status;
            m
        })
        .collect()
}

#[test]
fn no_matches_is_open() {
    assert_eq!(derive_status(&[]), TournamentStatus::Open);
}

#[test]
fn status_follows_the_matches() {
    use MatchStatus::*;
    assert_eq!(derive_status(&matches_with(&[Scheduled, Scheduled])), TournamentStatus::Open);
    assert_eq!(derive_status(&matches_with(&[Ongoing, Scheduled])), TournamentStatus::Ongoing);
    assert_eq!(derive_status(&matches_with(&[Completed, Scheduled])), TournamentStatus::Ongoing);
    assert_eq!(derive_status(&matches_with(&[Completed, Completed])), TournamentStatus::Completed);
}

#[test]
fn stale_status_is_reported() {
    let done = matches_with(&[MatchStatus::Completed]);
    assert_eq!(check_consistency(TournamentStatus::Completed, &done), None);
    assert_eq!(
        check_consistency(TournamentStatus::Ongoing, &done),
        Some(ConsistencyWarning {
            stored: TournamentStatus::Ongoing,
            expected: TournamentStatus::Completed,
        })
    );
}

#[test]
fn admin_schedule_is_kept_until_play_starts() {
    let waiting = matches_with(&[MatchStatus::Scheduled]);
    assert_eq!(check_consistency(TournamentStatus::Scheduled, &waiting), None);
    assert_eq!(next_status(TournamentStatus::Scheduled, &waiting), TournamentStatus::Scheduled);
    assert_eq!(next_status(TournamentStatus::Scheduled, &[]), TournamentStatus::Scheduled);

    let started = matches_with(&[MatchStatus::Ongoing]);
    assert_eq!(next_status(TournamentStatus::Scheduled, &started), TournamentStatus::Ongoing);
    assert_eq!(next_status(TournamentStatus::Completed, &waiting), TournamentStatus::Open);
}
