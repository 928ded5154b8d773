//! Data structures for the bracket: teams, rounds, matches, draft choices and the ladder.

mod choice;
mod game;
mod ladder;
mod player;
mod round;

pub use choice::{Choice, ChoiceType, TeamColour};
pub use game::{GameMatch, MatchId, TeamSlot};
pub use ladder::{Ladder, LadderError};
pub use player::{Player, Team, TeamId};
pub use round::{Round, RoundBeatmap};
