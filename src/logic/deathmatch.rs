//! Free-for-all standings and final placements.

use crate::models::{Participant, ParticipantId, Tournament, TournamentError};
use serde::Serialize;
use std::cmp::Ordering;

/// Order by K/D (kills when there are no deaths), then raw kills, best first.
pub fn compare_participants(x: &Participant, y: &Participant) -> Ordering {
    y.kd_ratio()
        .total_cmp(&x.kd_ratio())
        .then(y.kills.cmp(&x.kills))
}

/// Participants ranked best first. Equal participants keep their registration order.
pub fn rank_participants(participants: &[Participant]) -> Vec<&Participant> {
    let mut ranked: Vec<&Participant> = participants.iter().collect();
    ranked.sort_by(|x, y| compare_participants(x, y));
    ranked
}

/// One row of the standings table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub rank: u32,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub kills: u32,
    pub deaths: u32,
    pub kd: f64,
    pub placement: Option<u32>,
}

pub fn standings(participants: &[Participant]) -> Vec<Standing> {
    rank_participants(participants)
        .into_iter()
        .zip(1..)
        .map(|(p, rank)| Standing {
            rank,
            participant_id: p.id,
            display_name: p.display_name.clone(),
            kills: p.kills,
            deaths: p.deaths,
            kd: (p.kd_ratio() * 100.0).round() / 100.0,
            placement: p.placement,
        })
        .collect()
}

/// Standings as CSV with a header row.
pub fn standings_csv(rows: &[Standing]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Record winner and runner-up. Returns positions of participants whose placement changed.
///
/// Match documents are not touched; the lobby is completed separately.
pub fn finalize_placements(
    tournament: &mut Tournament,
    participants: &mut [Participant],
    winner_id: ParticipantId,
    runner_up_id: ParticipantId,
) -> Result<Vec<usize>, TournamentError> {
    if !tournament.game_type.is_free_for_all() {
        return Err(TournamentError::NotFreeForAll);
    }
    if winner_id == runner_up_id {
        return Err(TournamentError::InvalidPlacement);
    }
    for id in [winner_id, runner_up_id] {
        if !participants.iter().any(|p| p.id == id) {
            return Err(TournamentError::ParticipantNotFound(id));
        }
    }

    let mut changed = Vec::new();
    for (pos, p) in participants.iter_mut().enumerate() {
        let placement = if p.id == winner_id {
            Some(1)
        } else if p.id == runner_up_id {
            Some(2)
        } else {
            None
        };
        if p.placement != placement {
            p.placement = placement;
            changed.push(pos);
        }
    }
    tournament.winner_id = Some(winner_id);
    tournament.runner_up_id = Some(runner_up_id);
    Ok(changed)
}
