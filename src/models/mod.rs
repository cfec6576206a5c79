//! Data structures for the esports tournament: participants, matches, stats, tournament state.

mod game;
mod participant;
mod stats;
mod tournament;

pub use game::{Bracket, GameMatch, MatchFormat, MatchId, MatchStatus, Side, Slot};
pub use participant::{Participant, ParticipantId, RosterEntry};
pub use stats::{MapPlayerStats, MapResult, PlayerKey, PlayerStatRecord};
pub use tournament::{
    ErrorKind, GameType, Tournament, TournamentError, TournamentId, TournamentStatus,
};
