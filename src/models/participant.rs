//! Participant (registration) and roster data structures.

use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (used in match slots and lookups).
pub type ParticipantId = Uuid;

/// One rostered player of a team registration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    #[serde(default)]
    pub tag: String,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// A registration in a tournament: a solo player or a team.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub display_name: String,
    /// Ordered roster for team modes, empty for solo.
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
    #[serde(default)]
    pub payment_confirmed: bool,
    /// Free-for-all counters, zero until an admin or the standings flow sets them.
    #[serde(default)]
    pub kills: u32,
    #[serde(default)]
    pub deaths: u32,
    /// Final placement (1 = winner) once a free-for-all is finalized.
    #[serde(default)]
    pub placement: Option<u32>,
}

impl Participant {
    /// Create a new participant with the given name. Counters start at zero.
    pub fn new(tournament_id: TournamentId, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            display_name: display_name.into(),
            roster: Vec::new(),
            payment_confirmed: false,
            kills: 0,
            deaths: 0,
            placement: None,
        }
    }

    pub fn with_roster(mut self, roster: Vec<RosterEntry>) -> Self {
        self.roster = roster;
        self
    }

    /// Names used when matching external stats. Solo registrations have no
    /// roster, so the display name stands in as the single entry.
    pub fn roster_names(&self) -> Vec<&str> {
        if self.roster.is_empty() {
            vec![self.display_name.as_str()]
        } else {
            self.roster.iter().map(|r| r.name.as_str()).collect()
        }
    }

    /// Kill/death ratio, using kills as the ratio when there are no deaths.
    pub fn kd_ratio(&self) -> f64 {
        if self.deaths == 0 {
            f64::from(self.kills)
        } else {
            f64::from(self.kills) / f64::from(self.deaths)
        }
    }

    pub fn set_score(&mut self, kills: u32, deaths: u32) {
        self.kills = kills;
        self.deaths = deaths;
    }
}
