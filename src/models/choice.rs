//! Draft choices: protects, bans and picks made against a round's pool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the scoreboard a team plays on.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamColour {
    Red,
    Blue,
}

impl TeamColour {
    pub fn opposite(self) -> Self {
        match self {
            TeamColour::Red => TeamColour::Blue,
            TeamColour::Blue => TeamColour::Red,
        }
    }
}

impl fmt::Display for TeamColour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamColour::Red => write!(f, "red"),
            TeamColour::Blue => write!(f, "blue"),
        }
    }
}

/// Kind of draft action.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceType {
    Protect,
    Ban,
    Pick,
}

impl fmt::Display for ChoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChoiceType::Protect => write!(f, "protect"),
            ChoiceType::Ban => write!(f, "ban"),
            ChoiceType::Pick => write!(f, "pick"),
        }
    }
}

/// A single draft action recorded on a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub beatmap_id: u64,
    pub slot: String,
    /// `None` for choices not attributed to a team (e.g. loaded from an older bracket file).
    pub team: Option<TeamColour>,
    #[serde(rename = "type")]
    pub kind: ChoiceType,
}

impl Choice {
    pub fn new(beatmap_id: u64, slot: impl Into<String>, team: TeamColour, kind: ChoiceType) -> Self {
        Self {
            beatmap_id,
            slot: slot.into(),
            team: Some(team),
            kind,
        }
    }

    pub fn is_slot(&self, slot: &str) -> bool {
        self.slot.eq_ignore_ascii_case(slot)
    }
}
