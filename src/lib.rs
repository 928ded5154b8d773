//! Tournament broadcast overlay core: map-pool draft sequencing and bracket progression.

pub mod config;
pub mod logic;
pub mod models;
pub mod session;

pub use config::AppConfig;
pub use logic::{
    compute_state, import_teams, on_match_completed, read_teams, record_choice, set_completed,
    set_scores, start_match, transfer_slot, undo_choice, update_win_conditions, BracketEvent,
    DraftError, DraftEvent, DraftOrder, DraftPhase, DraftSession, DraftState, IllegalMoveReason,
    ImportError,
};
pub use models::{
    Choice, ChoiceType, GameMatch, Ladder, LadderError, MatchId, Player, Round, RoundBeatmap, Team,
    TeamColour, TeamId, TeamSlot,
};
pub use session::{AutoAdvance, BroadcastSession, Screen, SessionId};
