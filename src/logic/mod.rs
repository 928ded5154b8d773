//! Tournament business logic: draft sequencing, bracket progression, team import.

pub mod draft;
pub mod import;
pub mod progression;

pub use draft::{
    compute_state, match_state, pick_quota, quota, record_choice, undo_choice, DraftError, DraftEvent,
    DraftOrder, DraftPhase, DraftSession, DraftState, IllegalMoveReason, BAN_QUOTA, PROTECT_QUOTA,
};
pub use import::{import_teams, read_teams, ImportError};
pub use progression::{
    on_match_completed, set_completed, set_scores, start_match, transfer_slot,
    update_win_conditions, BracketEvent,
};
