//! Match state machine: status progress, finalize with winner advancement, reset and detail edits.

use crate::logic::scores;
use crate::models::{
    Bracket, GameMatch, MapPlayerStats, MapResult, MatchFormat, MatchId, MatchStatus, Side, Slot,
    TournamentError,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Move a match forward (scheduled → ongoing → completed). Returns whether anything changed.
///
/// Bracket matches only record progress here; they are completed through [`finalize`].
/// The free-for-all lobby is completed here and gets no winner.
pub fn set_status(game: &mut GameMatch, status: MatchStatus) -> Result<bool, TournamentError> {
    if game.status == status {
        return Ok(false);
    }
    if status < game.status {
        return Err(TournamentError::InvalidTransition {
            from: game.status,
            to: status,
        });
    }
    if status == MatchStatus::Completed && !game.is_lobby() {
        return Err(TournamentError::FinalizeRequired);
    }
    game.status = status;
    Ok(true)
}

/// Record the final series score, pick the winner and move them into the next round.
///
/// Returns the arena positions of every match that changed (the finalized match first).
pub fn finalize(
    bracket: &mut Bracket,
    match_id: MatchId,
    score_a: u32,
    score_b: u32,
) -> Result<Vec<usize>, TournamentError> {
    let pos = bracket
        .position(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;
    let game = &bracket.matches[pos];
    if game.is_lobby() {
        return Err(TournamentError::NotBracketMode);
    }
    if game.status == MatchStatus::Completed {
        return Err(TournamentError::MatchAlreadyCompleted);
    }
    let (Some(a), Some(b)) = (game.participant_on(Side::A), game.participant_on(Side::B)) else {
        return Err(TournamentError::SideNotReady);
    };
    if score_a == score_b {
        return Err(TournamentError::TiedScore);
    }
    let winner = if score_a > score_b { a } else { b };

    let target = advancement_position(bracket, pos);
    if let Some((target_pos, side)) = target {
        let next = &bracket.matches[target_pos];
        if next.status == MatchStatus::Completed && next.slot(side) != Slot::Participant(winner) {
            return Err(TournamentError::NextMatchAlreadyPlayed);
        }
    }

    let game = &mut bracket.matches[pos];
    game.score_a = score_a;
    game.score_b = score_b;
    game.winner = Some(winner);
    game.status = MatchStatus::Completed;

    let mut touched = vec![pos];
    if let Some((target_pos, side)) = target {
        *bracket.matches[target_pos].slot_mut(side) = Slot::Participant(winner);
        touched.push(target_pos);
    }
    Ok(touched)
}

/// Arena position and side of the next-round slot fed by the match at `pos`.
pub(crate) fn advancement_position(bracket: &Bracket, pos: usize) -> Option<(usize, Side)> {
    let (round, index, side) = bracket.matches[pos].advancement_target();
    bracket.position_at(round, index).map(|target| (target, side))
}

/// Write `slot` into the next-round match fed by `pos`. Returns the target position.
/// The target is not resolved further, even when its other side is a BYE.
pub(crate) fn advance_slot(bracket: &mut Bracket, pos: usize, slot: Slot) -> Option<usize> {
    let (target, side) = advancement_position(bracket, pos)?;
    *bracket.matches[target].slot_mut(side) = slot;
    Some(target)
}

/// Slot a BYE match carries forward, once both of its sides are known.
pub(crate) fn bye_carry(game: &GameMatch) -> Option<Slot> {
    match (game.side_a, game.side_b) {
        (Slot::Empty, _) | (_, Slot::Empty) => None,
        (Slot::Bye, other) | (other, Slot::Bye) => Some(other),
        _ => None,
    }
}

/// Reset a match to scheduled with no scores or stats. A winner already moved into
/// the next round stays there.
///
/// A BYE match cannot be played, so it completes again right away with the present
/// side as winner.
pub fn reset(game: &mut GameMatch) {
    game.clear_results();
    if let Some(carried) = bye_carry(game) {
        game.status = MatchStatus::Completed;
        game.winner = carried.participant();
    }
}

/// A completed bracket match must keep a series lead for its recorded winner.
pub(crate) fn check_completed_series(game: &GameMatch) -> Result<(), TournamentError> {
    if game.status != MatchStatus::Completed || game.is_lobby() || game.has_bye() {
        return Ok(());
    }
    let leader = match game.score_a.cmp(&game.score_b) {
        std::cmp::Ordering::Greater => game.participant_on(Side::A),
        std::cmp::Ordering::Less => game.participant_on(Side::B),
        std::cmp::Ordering::Equal => None,
    };
    if leader.is_none() || leader != game.winner {
        return Err(TournamentError::MatchAlreadyCompleted);
    }
    Ok(())
}

/// Partial edit of a match's admin-managed fields. Absent fields are left as they are.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDetailsPatch {
    /// `null` clears the time, absence keeps it.
    #[serde(default, deserialize_with = "present")]
    pub scheduled_time: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, rename = "valoPartyCode")]
    pub party_code: Option<String>,
    #[serde(default, rename = "matchFormat")]
    pub format: Option<MatchFormat>,
    #[serde(default, rename = "seriesScores")]
    pub map_results: Option<Vec<MapResult>>,
    #[serde(default)]
    pub map_player_stats: Option<Vec<MapPlayerStats>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// What an applied [`MatchDetailsPatch`] changed that callers may want to announce.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DetailsChange {
    pub party_code_changed: bool,
    pub series_changed: bool,
}

/// Apply a patch atomically: on error the match is left untouched.
///
/// Series edits on a completed bracket match may not tie it or flip its winner.
pub fn apply_details(game: &mut GameMatch, patch: MatchDetailsPatch) -> Result<DetailsChange, TournamentError> {
    let mut updated = game.clone();
    let mut change = DetailsChange::default();

    if let Some(format) = patch.format {
        updated.format = format;
    }
    let max = updated.format.max_maps();
    if let Some(results) = patch.map_results {
        scores::replace_map_results(&mut updated, results)?;
        change.series_changed = true;
    } else if updated.map_results.len() > max {
        return Err(TournamentError::MapIndexOutOfRange {
            index: updated.map_results.len() - 1,
            max,
        });
    }
    if let Some(stats) = patch.map_player_stats {
        scores::replace_map_player_stats(&mut updated, stats)?;
    }
    if let Some(time) = patch.scheduled_time {
        updated.scheduled_time = time;
    }
    if let Some(notes) = patch.notes {
        updated.notes = notes;
    }
    if let Some(code) = patch.party_code {
        let code = code.trim().to_string();
        change.party_code_changed = code != updated.party_code;
        updated.party_code = code;
    }

    if change.series_changed {
        check_completed_series(&updated)?;
    }

    *game = updated;
    Ok(change)
}

/// Flag the map veto as started.
pub fn start_veto(game: &mut GameMatch) -> Result<(), TournamentError> {
    if game.status == MatchStatus::Completed {
        return Err(TournamentError::MatchAlreadyCompleted);
    }
    game.veto_started = true;
    Ok(())
}
