//! Tournament business logic: bracket generation, match lifecycle, scores, standings.

pub mod bracket;
pub mod confirm;
pub mod deathmatch;
pub mod import;
pub mod match_state;
pub mod scores;
pub mod status;

pub use bracket::{generate_bracket, Seeding};
pub use confirm::{ConfirmationGate, GateOutcome, GatePhase, GateRegistry, Press};
pub use deathmatch::{finalize_placements, rank_participants, standings, standings_csv, Standing};
pub use import::{identify_teams, import_external_result, ImportSummary, TeamMapping};
pub use match_state::{apply_details, finalize, set_status, DetailsChange, MatchDetailsPatch};
pub use scores::{
    apply_map_result, merge_player_stats, parse_player_stats, series_score, AggregatePlayer,
    MatchStatsView,
};
pub use status::{check_consistency, derive_status, next_status, ConsistencyWarning};
