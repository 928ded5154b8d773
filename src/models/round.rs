//! Round and its beatmap pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A beatmap in a round's pool, tagged with its slot label (e.g. `NM3`, `HR2`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundBeatmap {
    pub id: u64,
    pub slot: String,
}

impl RoundBeatmap {
    pub fn new(id: u64, slot: impl Into<String>) -> Self {
        Self {
            id,
            slot: slot.into(),
        }
    }

    /// Mod category: the first two characters of the slot, uppercased (`hr2` -> `HR`).
    pub fn mod_category(&self) -> String {
        self.slot.chars().take(2).collect::<String>().to_ascii_uppercase()
    }
}

/// A bracket round (e.g. "Quarterfinals") with its format and pool.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Always odd; defines the win threshold.
    pub best_of: u32,
    /// Bans per team as announced for the round. The draft itself uses fixed quotas.
    pub ban_count: u32,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub beatmaps: Vec<RoundBeatmap>,
}

impl Round {
    pub fn new(name: impl Into<String>, best_of: u32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            best_of,
            ban_count: 2,
            start_date: None,
            beatmaps: Vec::new(),
        }
    }

    /// Replace the pool with `(beatmap id, slot)` pairs.
    pub fn with_beatmaps<I, S>(mut self, beatmaps: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        self.beatmaps = beatmaps
            .into_iter()
            .map(|(id, slot)| RoundBeatmap::new(id, slot))
            .collect();
        self
    }

    /// Best-of must be odd and at least 1.
    pub fn has_valid_best_of(&self) -> bool {
        self.best_of % 2 == 1
    }

    /// Scores above this end the match early.
    pub fn instant_win_threshold(&self) -> u32 {
        self.best_of / 2
    }

    pub fn points_to_win(&self) -> u32 {
        self.instant_win_threshold() + 1
    }

    /// Find a pool entry by slot label (case-insensitive).
    pub fn beatmap(&self, slot: &str) -> Option<&RoundBeatmap> {
        self.beatmaps.iter().find(|b| b.slot.eq_ignore_ascii_case(slot))
    }

    /// Pool grouped by mod category, in order of first appearance.
    pub fn pool_by_mod(&self) -> Vec<(String, Vec<&RoundBeatmap>)> {
        let mut groups: Vec<(String, Vec<&RoundBeatmap>)> = Vec::new();
        for beatmap in &self.beatmaps {
            let category = beatmap.mod_category();
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, maps)) => maps.push(beatmap),
                None => groups.push((category, vec![beatmap])),
            }
        }
        groups
    }
}
