//! Integration tests for the match state machine: status moves, finalize, reset and detail edits.

use esports_tournament_web::logic::{apply_details, finalize, set_status, MatchDetailsPatch};
use esports_tournament_web::logic::match_state::{reset, start_veto};
use esports_tournament_web::{
    generate_bracket, Bracket, GameMatch, GameType, MapResult, MatchFormat, MatchStatus,
    Participant, Seeding, Slot, Tournament, TournamentError,
};

fn four_player_bracket() -> (Bracket, Vec<Participant>) {
    let t = Tournament::new("Cup", GameType::Bracket1v1, 8);
    let p: Vec<Participant> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| Participant::new(t.id, *n))
        .collect();
    let bracket = generate_bracket(&t, GameType::Bracket1v1, &p, Seeding::Registration).unwrap();
    (bracket, p)
}

fn at(bracket: &Bracket, round: u32, index: u32) -> &GameMatch {
    &bracket.matches[bracket.position_at(round, index).unwrap()]
}

#[test]
fn finalize_moves_the_winner_into_the_next_round() {
    let (mut bracket, p) = four_player_bracket();
    let first = at(&bracket, 1, 0).id;
    let touched = finalize(&mut bracket, first, 13, 7).unwrap();
    assert_eq!(touched.len(), 2);

    let done = at(&bracket, 1, 0);
    assert_eq!(done.status, MatchStatus::Completed);
    assert_eq!(done.winner, Some(p[0].id));
    assert_eq!((done.score_a, done.score_b), (13, 7));
    assert_eq!(at(&bracket, 2, 0).side_a, Slot::Participant(p[0].id));

    // Odd match index feeds side B
    let second = at(&bracket, 1, 1).id;
    finalize(&mut bracket, second, 0, 2).unwrap();
    assert_eq!(at(&bracket, 2, 0).side_b, Slot::Participant(p[3].id));
}

#[test]
fn final_match_has_nowhere_to_advance() {
    let (mut bracket, p) = four_player_bracket();
    for index in 0..2 {
        let id = at(&bracket, 1, index).id;
        finalize(&mut bracket, id, 2, 1).unwrap();
    }
    let last = at(&bracket, 2, 0).id;
    let touched = finalize(&mut bracket, last, 1, 2).unwrap();
    assert_eq!(touched.len(), 1);
    assert_eq!(at(&bracket, 2, 0).winner, Some(p[2].id));
}

#[test]
fn tied_score_is_rejected_and_leaves_the_match_alone() {
    let (mut bracket, _) = four_player_bracket();
    let id = at(&bracket, 1, 0).id;
    let before = bracket.clone();
    assert!(matches!(
        finalize(&mut bracket, id, 1, 1),
        Err(TournamentError::TiedScore)
    ));
    assert_eq!(bracket, before);
}

#[test]
fn finalize_requires_two_participants() {
    let (mut bracket, _) = four_player_bracket();
    let pending = at(&bracket, 2, 0).id;
    assert!(matches!(
        finalize(&mut bracket, pending, 2, 0),
        Err(TournamentError::SideNotReady)
    ));

    let t = Tournament::new("Cup", GameType::Bracket1v1, 8);
    let p: Vec<Participant> = ["A", "B", "C"].iter().map(|n| Participant::new(t.id, *n)).collect();
    let mut bracket = generate_bracket(&t, GameType::Bracket1v1, &p, Seeding::Registration).unwrap();
    let bye_match = bracket.matches.iter().find(|m| m.has_bye()).unwrap().id;
    assert!(matches!(
        finalize(&mut bracket, bye_match, 2, 0),
        Err(TournamentError::MatchAlreadyCompleted)
    ));
}

#[test]
fn completed_match_cannot_be_finalized_again() {
    let (mut bracket, _) = four_player_bracket();
    let id = at(&bracket, 1, 0).id;
    finalize(&mut bracket, id, 2, 0).unwrap();
    assert!(matches!(
        finalize(&mut bracket, id, 0, 2),
        Err(TournamentError::MatchAlreadyCompleted)
    ));
}

#[test]
fn refinalizing_after_the_next_match_was_played_is_rejected() {
    let (mut bracket, _) = four_player_bracket();
    for index in 0..2 {
        let id = at(&bracket, 1, index).id;
        finalize(&mut bracket, id, 2, 0).unwrap();
    }
    let last = at(&bracket, 2, 0).id;
    finalize(&mut bracket, last, 2, 1).unwrap();

    let first_pos = bracket.position_at(1, 0).unwrap();
    reset(&mut bracket.matches[first_pos]);
    let first = bracket.matches[first_pos].id;
    assert!(matches!(
        finalize(&mut bracket, first, 0, 2),
        Err(TournamentError::NextMatchAlreadyPlayed)
    ));
    // The same winner may be recorded again
    finalize(&mut bracket, first, 2, 1).unwrap();
}

#[test]
fn finalize_rejects_the_free_for_all_lobby() {
    let tid = Tournament::new("FFA", GameType::FreeForAll, 8).id;
    let lobby = GameMatch::lobby(tid);
    let id = lobby.id;
    let mut bracket = Bracket::new(vec![lobby]);
    assert!(matches!(
        finalize(&mut bracket, id, 2, 0),
        Err(TournamentError::NotBracketMode)
    ));
}

#[test]
fn reset_clears_results_but_keeps_the_advanced_winner() {
    let (mut bracket, p) = four_player_bracket();
    let pos = bracket.position_at(1, 0).unwrap();
    let id = bracket.matches[pos].id;
    start_veto(&mut bracket.matches[pos]).unwrap();
    finalize(&mut bracket, id, 2, 0).unwrap();

    reset(&mut bracket.matches[pos]);
    let game = &bracket.matches[pos];
    assert_eq!(game.status, MatchStatus::Scheduled);
    assert_eq!((game.score_a, game.score_b), (0, 0));
    assert_eq!(game.winner, None);
    assert!(!game.veto_started);
    assert_eq!(at(&bracket, 2, 0).side_a, Slot::Participant(p[0].id));
}

#[test]
fn reset_of_a_bye_match_completes_it_again() {
    let t = Tournament::new("Cup", GameType::Bracket1v1, 8);
    let p: Vec<Participant> = ["A", "B", "C"].iter().map(|n| Participant::new(t.id, *n)).collect();
    let mut bracket = generate_bracket(&t, GameType::Bracket1v1, &p, Seeding::Registration).unwrap();
    let pos = bracket.matches.iter().position(|m| m.has_bye()).unwrap();

    reset(&mut bracket.matches[pos]);
    let game = &bracket.matches[pos];
    assert_eq!(game.status, MatchStatus::Completed);
    assert_eq!(game.winner, Some(p[2].id));
    assert_eq!(at(&bracket, 2, 0).side_b, Slot::Participant(p[2].id));
}

#[test]
fn status_only_moves_forward() {
    let (mut bracket, _) = four_player_bracket();
    let game = &mut bracket.matches[0];
    assert!(!set_status(game, MatchStatus::Scheduled).unwrap());
    assert!(set_status(game, MatchStatus::Ongoing).unwrap());
    assert!(matches!(
        set_status(game, MatchStatus::Scheduled),
        Err(TournamentError::InvalidTransition {
            from: MatchStatus::Ongoing,
            to: MatchStatus::Scheduled
        })
    ));
    assert!(matches!(
        set_status(game, MatchStatus::Completed),
        Err(TournamentError::FinalizeRequired)
    ));
    assert_eq!(game.status, MatchStatus::Ongoing);
}

#[test]
fn lobby_completes_through_status_without_a_winner() {
    let tid = Tournament::new("FFA", GameType::FreeForAll, 8).id;
    let mut lobby = GameMatch::lobby(tid);
    assert!(set_status(&mut lobby, MatchStatus::Completed).unwrap());
    assert_eq!(lobby.status, MatchStatus::Completed);
    assert_eq!(lobby.winner, None);
}

#[test]
fn details_patch_reads_camel_case_and_null_time() {
    let patch: MatchDetailsPatch = serde_json::from_value(serde_json::json!({
        "scheduledTime": null,
        "valoPartyCode": "  ABC123 ",
        "matchFormat": "BO3"
    }))
    .unwrap();
    assert_eq!(patch.scheduled_time, Some(None));
    assert_eq!(patch.format, Some(MatchFormat::Bo3));
    assert!(patch.notes.is_none());

    let empty: MatchDetailsPatch = serde_json::from_value(serde_json::json!({})).unwrap();
    assert_eq!(empty.scheduled_time, None);
}

#[test]
fn apply_details_reports_party_code_changes() {
    let (mut bracket, _) = four_player_bracket();
    let game = &mut bracket.matches[0];
    let patch = MatchDetailsPatch {
        party_code: Some(" XYZ ".to_string()),
        notes: Some("late start".to_string()),
        ..Default::default()
    };
    let change = apply_details(game, patch.clone()).unwrap();
    assert!(change.party_code_changed);
    assert!(!change.series_changed);
    assert_eq!(game.party_code, "XYZ");
    assert_eq!(game.notes, "late start");

    let change = apply_details(game, patch).unwrap();
    assert!(!change.party_code_changed);
}

#[test]
fn apply_details_recomputes_the_series_score() {
    let (mut bracket, _) = four_player_bracket();
    let game = &mut bracket.matches[0];
    let patch = MatchDetailsPatch {
        format: Some(MatchFormat::Bo3),
        map_results: Some(vec![MapResult::new(13, 5), MapResult::new(9, 13), MapResult::new(13, 11)]),
        ..Default::default()
    };
    let change = apply_details(game, patch).unwrap();
    assert!(change.series_changed);
    assert_eq!((game.score_a, game.score_b), (2, 1));
}

#[test]
fn apply_details_is_atomic() {
    let (mut bracket, _) = four_player_bracket();
    let game = &mut bracket.matches[0];
    let before = game.clone();
    let patch = MatchDetailsPatch {
        notes: Some("changed".to_string()),
        format: Some(MatchFormat::Bo1),
        map_results: Some(vec![MapResult::new(13, 5), MapResult::new(13, 5)]),
        ..Default::default()
    };
    assert!(matches!(
        apply_details(game, patch),
        Err(TournamentError::MapIndexOutOfRange { index: 1, max: 1 })
    ));
    assert_eq!(*game, before);
}

#[test]
fn series_edit_cannot_flip_a_completed_winner() {
    let (mut bracket, _) = four_player_bracket();
    let id = at(&bracket, 1, 0).id;
    let pos = bracket.position_at(1, 0).unwrap();
    finalize(&mut bracket, id, 1, 0).unwrap();

    let flip = MatchDetailsPatch {
        map_results: Some(vec![MapResult::new(5, 13)]),
        ..Default::default()
    };
    assert!(matches!(
        apply_details(&mut bracket.matches[pos], flip),
        Err(TournamentError::MatchAlreadyCompleted)
    ));

    let keep = MatchDetailsPatch {
        map_results: Some(vec![MapResult::new(13, 3)]),
        ..Default::default()
    };
    apply_details(&mut bracket.matches[pos], keep).unwrap();
}

#[test]
fn veto_cannot_start_on_a_completed_match() {
    let (mut bracket, _) = four_player_bracket();
    let id = at(&bracket, 1, 0).id;
    finalize(&mut bracket, id, 2, 0).unwrap();
    let pos = bracket.position(id).unwrap();
    assert!(matches!(
        start_veto(&mut bracket.matches[pos]),
        Err(TournamentError::MatchAlreadyCompleted)
    ));
}
