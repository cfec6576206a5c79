//! Tournament, its status and the error type shared by every operation.

use crate::external::ProviderError;
use crate::models::game::{MatchId, MatchStatus};
use crate::models::participant::ParticipantId;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    /// Scores are equal; a series needs a winner.
    #[error("Scores are tied; a match needs a winner")]
    TiedScore,
    #[error("Need at least 2 participants to generate a bracket (have {count})")]
    NotEnoughParticipants { count: usize },
    #[error("Bracket is already generated; reset it first")]
    BracketAlreadyGenerated,
    /// No external player matched either roster.
    #[error("Could not identify either team in the external match")]
    TeamsUnidentifiable,
    /// A side is a BYE or still waiting for its participant.
    #[error("Both sides of the match must be participants")]
    SideNotReady,
    #[error("Match is already completed; reset it first")]
    MatchAlreadyCompleted,
    #[error("Cannot move a match from {from:?} to {to:?}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
    /// Bracket matches are completed through finalize, which also picks the winner.
    #[error("Bracket matches are completed by submitting a final score")]
    FinalizeRequired,
    #[error("Map {index} is outside the series (at most {max} maps)")]
    MapIndexOutOfRange { index: usize, max: usize },
    /// The next-round match was already played with another participant in the slot.
    #[error("Next round match is already completed; reset it first")]
    NextMatchAlreadyPlayed,
    #[error("Winner and runner-up must be two different participants of the tournament")]
    InvalidPlacement,
    #[error("Only bracket tournaments support this action")]
    NotBracketMode,
    #[error("Only free-for-all tournaments support this action")]
    NotFreeForAll,
    #[error("Tournament not found")]
    TournamentNotFound(Uuid),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Participant not found")]
    ParticipantNotFound(ParticipantId),
    #[error("Match stats provider: {0}")]
    External(#[from] ProviderError),
    #[error("Store: {0}")]
    Store(#[from] StoreError),
    #[error("Standings export: {0}")]
    Export(#[from] csv::Error),
}

/// Coarse classification of a [`TournamentError`] for callers that map errors to responses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    External,
    Internal,
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TournamentError::TournamentNotFound(_)
            | TournamentError::MatchNotFound(_)
            | TournamentError::ParticipantNotFound(_) => ErrorKind::NotFound,
            TournamentError::External(_) => ErrorKind::External,
            TournamentError::Store(_) | TournamentError::Export(_) => ErrorKind::Internal,
            _ => ErrorKind::Validation,
        }
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Format of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum GameType {
    #[default]
    #[serde(rename = "bracket-1v1")]
    Bracket1v1,
    #[serde(rename = "bracket-2v2")]
    Bracket2v2,
    #[serde(rename = "bracket-3v3")]
    Bracket3v3,
    #[serde(rename = "bracket-5v5")]
    Bracket5v5,
    #[serde(rename = "free-for-all")]
    FreeForAll,
}

impl GameType {
    pub fn is_free_for_all(self) -> bool {
        self == GameType::FreeForAll
    }

    /// Players per side; 1 for solo formats.
    pub fn team_size(self) -> usize {
        match self {
            GameType::Bracket1v1 | GameType::FreeForAll => 1,
            GameType::Bracket2v2 => 2,
            GameType::Bracket3v3 => 3,
            GameType::Bracket5v5 => 5,
        }
    }
}

/// Current phase of the tournament.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Registrations open, nothing played.
    #[default]
    Open,
    /// Set by an admin ahead of the start.
    Scheduled,
    Ongoing,
    Completed,
}

/// Tournament document. Matches and participants are stored separately.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    #[serde(alias = "$id")]
    pub id: TournamentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub game_type: GameType,
    #[serde(default)]
    pub status: TournamentStatus,
    /// True iff matches exist for this tournament.
    #[serde(default)]
    pub bracket_generated: bool,
    #[serde(default)]
    pub max_participants: u32,
    /// Free-for-all placements.
    #[serde(default)]
    pub winner_id: Option<ParticipantId>,
    #[serde(default)]
    pub runner_up_id: Option<ParticipantId>,
}

impl Tournament {
    /// Create a new open tournament without a bracket.
    pub fn new(name: impl Into<String>, game_type: GameType, max_participants: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            game_type,
            status: TournamentStatus::Open,
            bracket_generated: false,
            max_participants,
            winner_id: None,
            runner_up_id: None,
        }
    }

    /// Forget the bracket: no matches, back to open.
    pub fn clear_bracket(&mut self) {
        self.bracket_generated = false;
        self.status = TournamentStatus::Open;
        self.winner_id = None;
        self.runner_up_id = None;
    }
}
