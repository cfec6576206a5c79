//! Esports tournament web app: library with models, bracket/match lifecycle logic and the engine.

pub mod config;
pub mod engine;
pub mod external;
pub mod logic;
pub mod models;
pub mod store;

pub use config::Config;
pub use engine::{Engine, EngineSettings};
pub use logic::{
    apply_map_result, derive_status, finalize, generate_bracket, merge_player_stats,
    parse_player_stats, rank_participants, set_status, ConfirmationGate, GateOutcome, GateRegistry,
    MatchDetailsPatch, Seeding,
};
pub use models::{
    Bracket, ErrorKind, GameMatch, GameType, MapPlayerStats, MapResult, MatchFormat, MatchId,
    MatchStatus, Participant, ParticipantId, PlayerKey, PlayerStatRecord, RosterEntry, Side, Slot,
    Tournament, TournamentError, TournamentId, TournamentStatus,
};
pub use store::{MemoryStore, Store, StoreError};
