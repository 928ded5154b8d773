//! Match (game) and its team slots.

use crate::models::choice::Choice;
use crate::models::player::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable ordering key of a match within the ladder. Also decides slot placement downstream.
pub type MatchId = i32;

/// Which team slot of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSlot {
    #[default]
    One,
    Two,
}

impl TeamSlot {
    pub fn other(self) -> Self {
        match self {
            TeamSlot::One => TeamSlot::Two,
            TeamSlot::Two => TeamSlot::One,
        }
    }
}

/// A bracket match between two (possibly not yet known) teams.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    /// None until a team qualifies into this slot.
    pub team_1: Option<TeamId>,
    pub team_2: Option<TeamId>,
    pub team_1_score: u32,
    pub team_2_score: u32,
    pub completed: bool,
    /// Name of the round this match belongs to.
    pub round: Option<String>,
    /// Next match for the winner.
    pub progression: Option<MatchId>,
    /// Next match for the loser.
    pub losers_progression: Option<MatchId>,
    /// Whether this match is part of the loser bracket.
    #[serde(default)]
    pub losers: bool,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub picks_bans: Vec<Choice>,
}

impl GameMatch {
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            team_1: None,
            team_2: None,
            team_1_score: 0,
            team_2_score: 0,
            completed: false,
            round: None,
            progression: None,
            losers_progression: None,
            losers: false,
            date: Utc::now(),
            picks_bans: Vec::new(),
        }
    }

    pub fn with_teams(mut self, team_1: impl Into<TeamId>, team_2: impl Into<TeamId>) -> Self {
        self.team_1 = Some(team_1.into());
        self.team_2 = Some(team_2.into());
        self
    }

    pub fn in_round(mut self, round: impl Into<String>) -> Self {
        self.round = Some(round.into());
        self
    }

    pub fn team(&self, slot: TeamSlot) -> Option<&TeamId> {
        match slot {
            TeamSlot::One => self.team_1.as_ref(),
            TeamSlot::Two => self.team_2.as_ref(),
        }
    }

    pub fn team_mut(&mut self, slot: TeamSlot) -> &mut Option<TeamId> {
        match slot {
            TeamSlot::One => &mut self.team_1,
            TeamSlot::Two => &mut self.team_2,
        }
    }

    /// Slot currently holding `team`, if any.
    pub fn slot_of(&self, team: &str) -> Option<TeamSlot> {
        if self.team_1.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(team)) {
            Some(TeamSlot::One)
        } else if self.team_2.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(team)) {
            Some(TeamSlot::Two)
        } else {
            None
        }
    }

    /// Both team slots are filled.
    pub fn has_teams(&self) -> bool {
        self.team_1.is_some() && self.team_2.is_some()
    }

    /// "AAA vs BBB" style pair, with "TBD" for unset slots.
    pub fn acronyms(&self) -> (String, String) {
        let show = |t: &Option<TeamId>| t.clone().unwrap_or_else(|| "TBD".to_string());
        (show(&self.team_1), show(&self.team_2))
    }

    /// Whether the current scores end the match for the given best-of.
    ///
    /// A match ends once every map of the best-of is played, or as soon as one side
    /// scores above `best_of / 2` (instant win). A best-of of zero never completes.
    pub fn evaluate_completed(&self, best_of: u32) -> bool {
        let instant_win = best_of / 2;
        best_of > 0
            && (self.team_1_score.saturating_add(self.team_2_score) >= best_of
                || self.team_1_score > instant_win
                || self.team_2_score > instant_win)
    }

    /// Slot with the higher score; `None` on a tie.
    pub fn winning_slot(&self) -> Option<TeamSlot> {
        use std::cmp::Ordering::*;
        match self.team_1_score.cmp(&self.team_2_score) {
            Greater => Some(TeamSlot::One),
            Less => Some(TeamSlot::Two),
            Equal => None,
        }
    }

    pub fn winner(&self) -> Option<&TeamId> {
        self.winning_slot().and_then(|s| self.team(s))
    }

    pub fn loser(&self) -> Option<&TeamId> {
        self.winning_slot().and_then(|s| self.team(s.other()))
    }

    /// Reset scores for a fresh start of play. The draft is left untouched.
    pub fn start(&mut self) {
        self.team_1_score = 0;
        self.team_2_score = 0;
        self.completed = false;
    }
}
