//! Score reconciliation: per-map results, series score and aggregate player stats.
//!
//! Every write rebuilds the derived values (series score, aggregate stats) from the
//! stored per-map data, so submitting a map twice or out of order gives the same result.

use crate::models::{
    GameMatch, MapPlayerStats, MapResult, PlayerKey, PlayerStatRecord, Side, TournamentError,
};
use serde::Serialize;

fn check_map_index(game: &GameMatch, map_index: usize) -> Result<(), TournamentError> {
    let max = game.format.max_maps();
    if map_index >= max {
        return Err(TournamentError::MapIndexOutOfRange {
            index: map_index,
            max,
        });
    }
    Ok(())
}

fn check_map_count(game: &GameMatch, count: usize) -> Result<(), TournamentError> {
    match count.checked_sub(1) {
        Some(last) => check_map_index(game, last),
        None => Ok(()),
    }
}

/// Write (or overwrite) one map's round score and recompute the series score.
pub fn apply_map_result(
    game: &mut GameMatch,
    map_index: usize,
    score_a: u32,
    score_b: u32,
) -> Result<(), TournamentError> {
    check_map_index(game, map_index)?;
    if game.map_results.len() <= map_index {
        game.map_results.resize(map_index + 1, MapResult::default());
    }
    game.map_results[map_index] = MapResult::new(score_a, score_b);
    recompute_series(game);
    Ok(())
}

/// Replace every map result at once (admin edit).
pub fn replace_map_results(game: &mut GameMatch, results: Vec<MapResult>) -> Result<(), TournamentError> {
    check_map_count(game, results.len())?;
    game.map_results = results;
    recompute_series(game);
    Ok(())
}

/// Series score: maps won by each side. Tied maps count for neither.
pub fn series_score(results: &[MapResult]) -> (u32, u32) {
    results.iter().fold((0, 0), |(a, b), map| match map.winner() {
        Some(Side::A) => (a + 1, b),
        Some(Side::B) => (a, b + 1),
        None => (a, b),
    })
}

pub fn recompute_series(game: &mut GameMatch) {
    let (a, b) = series_score(&game.map_results);
    game.score_a = a;
    game.score_b = b;
}

/// Write per-player stats for one map, then rebuild the match aggregate.
///
/// Entries for players not in `delta` keep their stored values for that map.
pub fn merge_player_stats(
    game: &mut GameMatch,
    map_index: usize,
    delta: MapPlayerStats,
) -> Result<(), TournamentError> {
    check_map_index(game, map_index)?;
    if game.map_player_stats.len() <= map_index {
        game.map_player_stats.resize_with(map_index + 1, MapPlayerStats::new);
    }
    for (key, mut record) in delta {
        record.recompute_acs();
        game.map_player_stats[map_index].insert(key, record);
    }
    rebuild_player_stats(game);
    Ok(())
}

/// Replace every map's player stats at once (admin edit).
pub fn replace_map_player_stats(
    game: &mut GameMatch,
    stats: Vec<MapPlayerStats>,
) -> Result<(), TournamentError> {
    check_map_count(game, stats.len())?;
    game.map_player_stats = stats;
    for map in &mut game.map_player_stats {
        map.values_mut().for_each(PlayerStatRecord::recompute_acs);
    }
    rebuild_player_stats(game);
    Ok(())
}

/// Field-wise sum of every stored map entry per player key.
pub fn aggregate_player_stats(per_map: &[MapPlayerStats]) -> MapPlayerStats {
    let mut aggregate = MapPlayerStats::new();
    for map in per_map {
        for (key, record) in map {
            aggregate.entry(key.clone()).or_default().absorb(record);
        }
    }
    aggregate
}

pub fn rebuild_player_stats(game: &mut GameMatch) {
    game.player_stats = aggregate_player_stats(&game.map_player_stats);
}

/// One player's series totals, keyed by roster slot.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatePlayer {
    pub player_key: PlayerKey,
    #[serde(flatten)]
    pub stats: PlayerStatRecord,
}

/// Read-only view of a match's stats.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchStatsView {
    pub per_map_stats: Vec<MapPlayerStats>,
    pub series_scores: Vec<MapResult>,
    /// Best average combat score first.
    pub aggregate_players: Vec<AggregatePlayer>,
}

/// Project a match's stored stats. The aggregate is rebuilt from the per-map data
/// rather than read from the stored copy.
pub fn parse_player_stats(game: &GameMatch) -> MatchStatsView {
    let mut aggregate_players: Vec<AggregatePlayer> = aggregate_player_stats(&game.map_player_stats)
        .into_iter()
        .map(|(player_key, stats)| AggregatePlayer { player_key, stats })
        .collect();
    aggregate_players.sort_by(|x, y| {
        y.stats
            .acs
            .cmp(&x.stats.acs)
            .then(y.stats.kills.cmp(&x.stats.kills))
            .then(x.player_key.cmp(&y.player_key))
    });
    MatchStatsView {
        per_map_stats: game.map_player_stats.clone(),
        series_scores: game.map_results.clone(),
        aggregate_players,
    }
}
