//! Import of an external match result onto the two known sides of a match.

use crate::external::{ExternalMatch, ProviderError};
use crate::logic::match_state::check_completed_series;
use crate::logic::scores;
use crate::models::{GameMatch, MapPlayerStats, PlayerKey, PlayerStatRecord, Side, TournamentError};

/// External team id found for each side.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TeamMapping {
    pub side_a: String,
    pub side_b: String,
}

impl TeamMapping {
    fn team_for(&self, side: Side) -> &str {
        match side {
            Side::A => &self.side_a,
            Side::B => &self.side_b,
        }
    }
}

/// Outcome of an import, for the caller to show which roster slots got stats.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImportSummary {
    pub map_index: usize,
    pub matched: Vec<PlayerKey>,
    /// Roster names with no external player.
    pub unmatched: Vec<String>,
}

/// Case-insensitive comparison; a `name#tag` external id matches on its name part too.
fn names_match(external: &str, roster: &str) -> bool {
    let roster = roster.trim().to_lowercase();
    let external = external.trim().to_lowercase();
    external == roster || external.split('#').next() == Some(roster.as_str())
}

fn find_team_of(payload: &ExternalMatch, roster: &[&str]) -> Option<String> {
    payload
        .players
        .iter()
        .find(|p| roster.iter().any(|name| names_match(&p.name, name)))
        .map(|p| p.team_id.clone())
}

fn other_team(payload: &ExternalMatch, team_id: &str) -> Result<String, TournamentError> {
    payload
        .team_ids()
        .into_iter()
        .find(|id| *id != team_id)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Malformed("only one team in the external match".into()).into())
}

/// Work out which external team is which side.
///
/// The first external player matching a side-A roster name fixes side A's team and
/// side B gets the other one. If nobody matches side A, side B's roster is tried the
/// same way. Neither matching is an error rather than a guess.
pub fn identify_teams(
    payload: &ExternalMatch,
    roster_a: &[&str],
    roster_b: &[&str],
) -> Result<TeamMapping, TournamentError> {
    if let Some(side_a) = find_team_of(payload, roster_a) {
        let side_b = other_team(payload, &side_a)?;
        log::debug!("External team {} identified as side A by roster", side_a);
        return Ok(TeamMapping { side_a, side_b });
    }
    if let Some(side_b) = find_team_of(payload, roster_b) {
        let side_a = other_team(payload, &side_b)?;
        log::debug!("External team {} identified as side B by roster", side_b);
        return Ok(TeamMapping { side_a, side_b });
    }
    Err(TournamentError::TeamsUnidentifiable)
}

/// Copy one external map result into `game` at `map_index`: per-player stats for every
/// rostered player found, and the map's round score. On a completed match the new
/// series score may not tie or flip the recorded winner.
pub fn import_external_result(
    game: &mut GameMatch,
    roster_a: &[&str],
    roster_b: &[&str],
    payload: &ExternalMatch,
    map_index: usize,
) -> Result<ImportSummary, TournamentError> {
    let mapping = identify_teams(payload, roster_a, roster_b)?;
    let rounds_of = |team_id: &str| {
        payload
            .team(team_id)
            .map(|t| t.rounds)
            .ok_or_else(|| ProviderError::Malformed(format!("no round totals for team {team_id}")))
    };
    let rounds_a = rounds_of(&mapping.side_a)?;
    let rounds_b = rounds_of(&mapping.side_b)?;
    let total_rounds = rounds_a.won + rounds_a.lost;

    let mut summary = ImportSummary {
        map_index,
        ..ImportSummary::default()
    };
    let mut delta = MapPlayerStats::new();
    for (side, roster) in [(Side::A, roster_a), (Side::B, roster_b)] {
        let team_id = mapping.team_for(side);
        for (index, name) in roster.iter().enumerate() {
            let found = payload
                .players
                .iter()
                .find(|p| p.team_id == team_id && names_match(&p.name, name));
            let Some(player) = found else {
                log::debug!("No external stats for roster player '{}' on side {:?}", name, side);
                summary.unmatched.push((*name).to_string());
                continue;
            };
            let stats = player.stats;
            let mut record =
                PlayerStatRecord::new(stats.kills, stats.deaths, stats.assists, stats.score, total_rounds);
            record.agent_id.clone_from(&player.agent);
            let key = PlayerKey::new(side, index);
            summary.matched.push(key.clone());
            delta.insert(key, record);
        }
    }

    let mut updated = game.clone();
    scores::merge_player_stats(&mut updated, map_index, delta)?;
    scores::apply_map_result(&mut updated, map_index, rounds_a.won, rounds_b.won)?;
    check_completed_series(&updated)?;
    *game = updated;
    Ok(summary)
}
