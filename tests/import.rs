//! Integration tests for mapping an external match result onto a match's two sides.

use esports_tournament_web::external::{ExternalMatch, ExternalPlayer, ExternalRounds, ExternalStats, ExternalTeam};
use esports_tournament_web::logic::{identify_teams, import_external_result};
use esports_tournament_web::{
    GameMatch, MapResult, MatchFormat, MatchStatus, PlayerKey, Side, Slot, TournamentError,
};
use uuid::Uuid;

fn player(name: &str, team: &str, kills: u32, score: u32) -> ExternalPlayer {
    ExternalPlayer {
        name: name.to_string(),
        team_id: team.to_string(),
        stats: ExternalStats {
            kills,
            deaths: 10,
            assists: 2,
            score,
        },
        agent: Some("sova".to_string()),
    }
}

fn team(id: &str, won: u32, lost: u32) -> ExternalTeam {
    ExternalTeam {
        team_id: id.to_string(),
        rounds: ExternalRounds { won, lost },
    }
}

/// Red plays as side A (alice, bob), Blue as side B (carol, dave).
fn payload() -> ExternalMatch {
    ExternalMatch {
        players: vec![
            player("Carol#EU1", "blue", 15, 4000),
            player("alice", "red", 20, 5000),
            player("Bob", "red", 12, 3000),
            player("dave", "blue", 9, 2000),
        ],
        teams: vec![team("blue", 8, 13), team("red", 13, 8)],
    }
}

fn bracket_match() -> GameMatch {
    GameMatch::new(
        Uuid::new_v4(),
        1,
        0,
        Slot::Participant(Uuid::new_v4()),
        Slot::Participant(Uuid::new_v4()),
    )
}

#[test]
fn teams_are_identified_from_side_a_roster() {
    let mapping = identify_teams(&payload(), &["Alice", "Bob"], &["Carol", "Dave"]).unwrap();
    assert_eq!(mapping.side_a, "red");
    assert_eq!(mapping.side_b, "blue");
}

#[test]
fn side_b_roster_is_the_fallback() {
    let mapping = identify_teams(&payload(), &["Zed", "Yan"], &["carol"]).unwrap();
    assert_eq!(mapping.side_a, "red");
    assert_eq!(mapping.side_b, "blue");
}

#[test]
fn unknown_rosters_are_an_error() {
    assert!(matches!(
        identify_teams(&payload(), &["Zed"], &["Yan"]),
        Err(TournamentError::TeamsUnidentifiable)
    ));
}

#[test]
fn single_team_payload_is_malformed() {
    let mut one_team = payload();
    one_team.players.retain(|p| p.team_id == "red");
    one_team.teams.retain(|t| t.team_id == "red");
    let err = identify_teams(&one_team, &["alice"], &[]).unwrap_err();
    assert!(matches!(err, TournamentError::External(_)));
}

#[test]
fn import_writes_map_score_and_player_stats() {
    let mut game = bracket_match();
    let summary = import_external_result(
        &mut game,
        &["Alice", "Bob", "Eve"],
        &["Carol", "Dave"],
        &payload(),
        0,
    )
    .unwrap();

    assert_eq!(summary.map_index, 0);
    assert_eq!(summary.unmatched, vec!["Eve".to_string()]);
    assert_eq!(summary.matched.len(), 4);

    assert_eq!(game.map_results[0].a, 13);
    assert_eq!(game.map_results[0].b, 8);
    assert_eq!((game.score_a, game.score_b), (1, 0));

    let a0 = &game.map_player_stats[0][&PlayerKey::new(Side::A, 0)];
    assert_eq!(a0.kills, 20);
    assert_eq!(a0.rounds_played, 21);
    assert_eq!(a0.acs, 238);
    assert_eq!(a0.agent_id.as_deref(), Some("sova"));

    // name#tag matches on the name part
    assert_eq!(game.player_stats[&PlayerKey::new(Side::B, 0)].kills, 15);
}

#[test]
fn reimporting_the_same_map_is_idempotent() {
    let mut game = bracket_match();
    import_external_result(&mut game, &["alice", "bob"], &["carol", "dave"], &payload(), 1).unwrap();
    let once = game.clone();
    import_external_result(&mut game, &["alice", "bob"], &["carol", "dave"], &payload(), 1).unwrap();
    assert_eq!(game, once);
    assert_eq!(game.map_results.len(), 2);
}

#[test]
fn failed_import_leaves_the_match_untouched() {
    let mut game = bracket_match();
    game.format = MatchFormat::Bo1;
    let before = game.clone();
    let result = import_external_result(&mut game, &["alice"], &["carol"], &payload(), 1);
    assert!(matches!(
        result,
        Err(TournamentError::MapIndexOutOfRange { index: 1, max: 1 })
    ));
    assert_eq!(game, before);
}

/// Completed BO3 that side B won on map 0.
fn completed_for_side_b() -> GameMatch {
    let mut game = bracket_match();
    game.format = MatchFormat::Bo3;
    game.map_results = vec![MapResult::new(8, 13)];
    game.score_b = 1;
    game.status = MatchStatus::Completed;
    game.winner = game.side_b.participant();
    game
}

#[test]
fn import_cannot_flip_the_winner_of_a_completed_match() {
    let mut game = completed_for_side_b();
    let before = game.clone();
    let result = import_external_result(&mut game, &["alice", "bob"], &["carol", "dave"], &payload(), 0);
    assert!(matches!(result, Err(TournamentError::MatchAlreadyCompleted)));
    assert_eq!(game, before);
}

#[test]
fn import_cannot_tie_a_completed_series() {
    let mut game = completed_for_side_b();
    let before = game.clone();
    let result = import_external_result(&mut game, &["alice", "bob"], &["carol", "dave"], &payload(), 1);
    assert!(matches!(result, Err(TournamentError::MatchAlreadyCompleted)));
    assert_eq!(game, before);
}

#[test]
fn import_matching_the_recorded_winner_is_accepted() {
    let mut game = completed_for_side_b();
    // Rosters swapped: red now plays side B and keeps it winning
    import_external_result(&mut game, &["carol", "dave"], &["alice", "bob"], &payload(), 1).unwrap();
    assert_eq!((game.score_a, game.score_b), (0, 2));
    assert_eq!(game.status, MatchStatus::Completed);
    assert_eq!(game.winner, game.side_b.participant());
}

#[test]
fn payload_reads_provider_json() {
    let json = r#"{
        "players": [{"name": "alice", "team_id": "red", "stats": {"kills": 3}}],
        "teams": [{"team_id": "red", "rounds": {"won": 13, "lost": 2}}, {"team_id": "blue"}]
    }"#;
    let parsed: ExternalMatch = serde_json::from_str(json).unwrap();
    assert_eq!(parsed.players[0].stats.kills, 3);
    assert_eq!(parsed.players[0].agent, None);
    assert_eq!(parsed.team("blue").unwrap().rounds, ExternalRounds::default());
    assert_eq!(parsed.team_ids(), vec!["red", "blue"]);
}
