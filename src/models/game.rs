//! Match (game), slots, sides and the bracket arena.

use crate::models::participant::ParticipantId;
use crate::models::stats::{MapPlayerStats, MapResult};
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

const BYE: &str = "BYE";
const LOBBY: &str = "LOBBY";

/// One of the two bracket sides of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    A,
    B,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub(crate) fn key_prefix(self) -> &'static str {
        match self {
            Side::A => "a",
            Side::B => "b",
        }
    }
}

/// Content of a match side. Persisted as the participant id, `"BYE"`, `"LOBBY"` or null.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Option<String>", into = "Option<String>")]
pub enum Slot {
    /// Waiting for the winner of a feeding match.
    #[default]
    Empty,
    Bye,
    /// Free-for-all: every participant, no bracket sides.
    Lobby,
    Participant(ParticipantId),
}

impl Slot {
    pub fn participant(self) -> Option<ParticipantId> {
        match self {
            Slot::Participant(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_bye(self) -> bool {
        self == Slot::Bye
    }
}

impl TryFrom<Option<String>> for Slot {
    type Error = uuid::Error;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(Slot::Empty),
            Some(BYE) => Ok(Slot::Bye),
            Some(LOBBY) => Ok(Slot::Lobby),
            Some(id) => Ok(Slot::Participant(id.parse()?)),
        }
    }
}

impl From<Slot> for Option<String> {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Empty => None,
            Slot::Bye => Some(BYE.to_string()),
            Slot::Lobby => Some(LOBBY.to_string()),
            Slot::Participant(id) => Some(id.to_string()),
        }
    }
}

/// Progress of a match. Declared in forward order.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Ongoing,
    Completed,
}

/// Series length of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum MatchFormat {
    #[default]
    Auto,
    #[serde(rename = "BO1")]
    Bo1,
    #[serde(rename = "BO3")]
    Bo3,
    #[serde(rename = "BO5")]
    Bo5,
}

impl MatchFormat {
    /// Most maps a series of this format can contain. `Auto` allows the longest series.
    pub fn max_maps(self) -> usize {
        match self {
            MatchFormat::Bo1 => 1,
            MatchFormat::Bo3 => 3,
            MatchFormat::Auto | MatchFormat::Bo5 => 5,
        }
    }
}

/// A single match document.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    #[serde(alias = "$id")]
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based round number.
    pub round: u32,
    /// Position within the round.
    pub match_index: u32,
    #[serde(rename = "teamA", alias = "sideA", default)]
    pub side_a: Slot,
    #[serde(rename = "teamB", alias = "sideB", default)]
    pub side_b: Slot,
    #[serde(default)]
    pub status: MatchStatus,
    /// Series score (maps won), not a single map's rounds.
    #[serde(default)]
    pub score_a: u32,
    #[serde(default)]
    pub score_b: u32,
    #[serde(default)]
    pub winner: Option<ParticipantId>,
    #[serde(rename = "matchFormat", default)]
    pub format: MatchFormat,
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(rename = "valoPartyCode", default)]
    pub party_code: String,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "seriesScores", with = "json_string", default)]
    pub map_results: Vec<MapResult>,
    #[serde(with = "json_string", default)]
    pub map_player_stats: Vec<MapPlayerStats>,
    /// Aggregate over `map_player_stats`, rebuilt on every stats merge.
    #[serde(with = "json_string", default)]
    pub player_stats: MapPlayerStats,
    #[serde(default)]
    pub veto_started: bool,
}

impl GameMatch {
    pub fn new(tournament_id: TournamentId, round: u32, match_index: u32, side_a: Slot, side_b: Slot) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            match_index,
            side_a,
            side_b,
            status: MatchStatus::Scheduled,
            score_a: 0,
            score_b: 0,
            winner: None,
            format: MatchFormat::Auto,
            scheduled_time: None,
            party_code: String::new(),
            notes: String::new(),
            map_results: Vec::new(),
            map_player_stats: Vec::new(),
            player_stats: MapPlayerStats::new(),
            veto_started: false,
        }
    }

    /// The single shared match of a free-for-all tournament.
    pub fn lobby(tournament_id: TournamentId) -> Self {
        Self::new(tournament_id, 1, 0, Slot::Lobby, Slot::Empty)
    }

    pub fn is_lobby(&self) -> bool {
        self.side_a == Slot::Lobby || self.side_b == Slot::Lobby
    }

    pub fn has_bye(&self) -> bool {
        self.side_a.is_bye() || self.side_b.is_bye()
    }

    pub fn slot(&self, side: Side) -> Slot {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.side_a,
            Side::B => &mut self.side_b,
        }
    }

    pub fn participant_on(&self, side: Side) -> Option<ParticipantId> {
        self.slot(side).participant()
    }

    /// Which side the recorded winner sits on.
    pub fn winner_side(&self) -> Option<Side> {
        let winner = self.winner?;
        [Side::A, Side::B]
            .into_iter()
            .find(|&side| self.participant_on(side) == Some(winner))
    }

    /// Match and side of the next round that this match's winner moves into.
    pub fn advancement_target(&self) -> (u32, u32, Side) {
        let side = if self.match_index % 2 == 0 { Side::A } else { Side::B };
        (self.round + 1, self.match_index / 2, side)
    }

    /// Back to scheduled with scores, winner and stats cleared.
    pub fn clear_results(&mut self) {
        self.status = MatchStatus::Scheduled;
        self.score_a = 0;
        self.score_b = 0;
        self.winner = None;
        self.map_results.clear();
        self.map_player_stats.clear();
        self.player_stats.clear();
        self.veto_started = false;
    }
}

/// Every match of one tournament in a flat arena, addressed by position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Bracket {
    pub matches: Vec<GameMatch>,
}

impl Bracket {
    pub fn new(matches: Vec<GameMatch>) -> Self {
        Self { matches }
    }

    pub fn position(&self, id: MatchId) -> Option<usize> {
        self.matches.iter().position(|m| m.id == id)
    }

    pub fn position_at(&self, round: u32, match_index: u32) -> Option<usize> {
        self.matches
            .iter()
            .position(|m| m.round == round && m.match_index == match_index)
    }

    pub fn rounds(&self) -> u32 {
        self.matches.iter().map(|m| m.round).max().unwrap_or(0)
    }

    pub fn round(&self, round: u32) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(move |m| m.round == round)
    }

    pub fn into_matches(self) -> Vec<GameMatch> {
        self.matches
    }
}

/// Fields stored as JSON text inside the document (legacy schema), read back
/// from either that text or an inline value.
mod json_string {
    use serde::de::{DeserializeOwned, Error as _};
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
        let text = serde_json::to_string(value).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: DeserializeOwned + Default,
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(T::default()),
            serde_json::Value::String(text) if text.trim().is_empty() => Ok(T::default()),
            serde_json::Value::String(text) => serde_json::from_str(&text).map_err(D::Error::custom),
            inline => serde_json::from_value(inline).map_err(D::Error::custom),
        }
    }
}
