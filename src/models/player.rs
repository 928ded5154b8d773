//! Player and Team data structures.

use serde::{Deserialize, Serialize};

/// Teams are keyed by their acronym (unique, case-insensitive, within a ladder).
pub type TeamId = String;

/// A rostered player. Ranks are optional since not every player has one fetched.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub username: String,
    pub rank: Option<u32>,
    pub country_rank: Option<u32>,
}

impl Player {
    /// Create an unranked player with the given username.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            rank: None,
            country_rank: None,
        }
    }

    pub fn with_rank(mut self, rank: u32, country_rank: Option<u32>) -> Self {
        self.rank = Some(rank);
        self.country_rank = country_rank;
        self
    }
}

/// A team taking part in the tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    /// Short identity shown on scoreboards, e.g. "USA".
    pub acronym: TeamId,
    pub full_name: String,
    /// Flag reference (texture name), resolved by the presentation layer.
    pub flag: String,
    /// Seed as entered by staff, e.g. "#1" or "Top 8".
    pub seed: String,
    pub players: Vec<Player>,
}

impl Team {
    /// Create a team with no players. Display fields start empty.
    pub fn new(acronym: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            full_name: full_name.into(),
            ..Self::default()
        }
    }

    /// True when `acronym` names this team (case-insensitive).
    pub fn is(&self, acronym: &str) -> bool {
        self.acronym.eq_ignore_ascii_case(acronym)
    }

    /// Mean rank over the players that have one, `None` when nobody is ranked.
    pub fn average_rank(&self) -> Option<f64> {
        let ranks: Vec<u32> = self.players.iter().filter_map(|p| p.rank).collect();
        if ranks.is_empty() {
            return None;
        }
        let total: u64 = ranks.iter().map(|&r| u64::from(r)).sum();
        Some(total as f64 / ranks.len() as f64)
    }

    /// Add a player to the roster, ignoring duplicates by username.
    pub fn add_player(&mut self, player: Player) {
        if self
            .players
            .iter()
            .any(|p| p.username.eq_ignore_ascii_case(&player.username))
        {
            return;
        }
        self.players.push(player);
    }
}
