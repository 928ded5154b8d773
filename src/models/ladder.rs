//! Ladder: the bracket repository shared by the draft and progression logic.

use crate::models::game::{GameMatch, MatchId, TeamSlot};
use crate::models::player::{Team, TeamId};
use crate::models::round::Round;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while editing the bracket.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum LadderError {
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Match {0} already exists")]
    DuplicateMatch(MatchId),
    #[error("Round '{0}' not found")]
    RoundNotFound(String),
    #[error("A round named '{0}' already exists")]
    DuplicateRound(String),
    #[error("Team '{0}' not found")]
    TeamNotFound(String),
    #[error("A team with acronym '{0}' already exists")]
    DuplicateTeam(String),
    #[error("Team acronym must not be blank")]
    BlankAcronym,
    #[error("Best-of must be an odd number (got {0})")]
    InvalidBestOf(u32),
    #[error("Match {0} cannot progress into itself")]
    SelfProgression(MatchId),
    #[error("Match {0} needs both teams set before it can be played")]
    TeamsNotSet(MatchId),
}

/// Full bracket: teams, rounds, matches and which match is on air.
///
/// Matches refer to teams by acronym, to rounds by name and to each other by id,
/// so the ladder is the single owner of every entity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ladder {
    pub teams: Vec<Team>,
    pub rounds: Vec<Round>,
    pub matches: Vec<GameMatch>,
    pub current_match: Option<MatchId>,
}

impl Ladder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team(&self, acronym: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.is(acronym))
    }

    pub fn round(&self, name: &str) -> Option<&Round> {
        self.rounds.iter().find(|r| r.name == name)
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn get_match_mut(&mut self, id: MatchId) -> Option<&mut GameMatch> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Round of the given match, if it has one configured.
    pub fn round_of(&self, id: MatchId) -> Option<&Round> {
        let name = self.get_match(id)?.round.as_deref()?;
        self.round(name)
    }

    /// Add a team. Acronyms are unique (case-insensitive) and must not be blank.
    pub fn add_team(&mut self, mut team: Team) -> Result<(), LadderError> {
        team.acronym = team.acronym.trim().to_string();
        if team.acronym.is_empty() {
            return Err(LadderError::BlankAcronym);
        }
        if self.team(&team.acronym).is_some() {
            return Err(LadderError::DuplicateTeam(team.acronym));
        }
        self.teams.push(team);
        Ok(())
    }

    /// Add a round. Names are unique; best-of must be odd.
    pub fn add_round(&mut self, round: Round) -> Result<(), LadderError> {
        if !round.has_valid_best_of() {
            return Err(LadderError::InvalidBestOf(round.best_of));
        }
        if self.round(&round.name).is_some() {
            return Err(LadderError::DuplicateRound(round.name));
        }
        self.rounds.push(round);
        Ok(())
    }

    /// Add a match. Ids are unique; referenced teams and round must exist.
    pub fn add_match(&mut self, game: GameMatch) -> Result<(), LadderError> {
        if self.get_match(game.id).is_some() {
            return Err(LadderError::DuplicateMatch(game.id));
        }
        for acronym in [&game.team_1, &game.team_2].into_iter().flatten() {
            if self.team(acronym).is_none() {
                return Err(LadderError::TeamNotFound(acronym.clone()));
            }
        }
        if let Some(name) = &game.round {
            if self.round(name).is_none() {
                return Err(LadderError::RoundNotFound(name.clone()));
            }
        }
        self.matches.push(game);
        Ok(())
    }

    /// Remove a match and detach every progression that pointed at it.
    pub fn remove_match(&mut self, id: MatchId) -> Result<GameMatch, LadderError> {
        let idx = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or(LadderError::MatchNotFound(id))?;
        let removed = self.matches.remove(idx);
        for m in &mut self.matches {
            if m.progression == Some(id) {
                m.progression = None;
            }
            if m.losers_progression == Some(id) {
                m.losers_progression = None;
            }
        }
        if self.current_match == Some(id) {
            self.current_match = None;
        }
        Ok(removed)
    }

    fn check_team(&self, team: &Option<TeamId>) -> Result<(), LadderError> {
        match team {
            Some(acronym) if self.team(acronym).is_none() => {
                Err(LadderError::TeamNotFound(acronym.clone()))
            }
            _ => Ok(()),
        }
    }

    /// Manually set (or clear) one team slot of a match.
    pub fn set_team(
        &mut self,
        id: MatchId,
        slot: TeamSlot,
        team: Option<TeamId>,
    ) -> Result<(), LadderError> {
        self.check_team(&team)?;
        let game = self.get_match_mut(id).ok_or(LadderError::MatchNotFound(id))?;
        *game.team_mut(slot) = team;
        self.release_unplayable_current();
        Ok(())
    }

    /// Set both team slots of a match. Nothing is written unless both teams and the match exist.
    pub fn set_teams(
        &mut self,
        id: MatchId,
        team_1: Option<TeamId>,
        team_2: Option<TeamId>,
    ) -> Result<(), LadderError> {
        self.check_team(&team_1)?;
        self.check_team(&team_2)?;
        let game = self.get_match_mut(id).ok_or(LadderError::MatchNotFound(id))?;
        game.team_1 = team_1;
        game.team_2 = team_2;
        self.release_unplayable_current();
        Ok(())
    }

    /// Point `source`'s winner (or loser, when `losers`) at `target`.
    pub fn set_progression(
        &mut self,
        source: MatchId,
        target: MatchId,
        losers: bool,
    ) -> Result<(), LadderError> {
        if source == target {
            return Err(LadderError::SelfProgression(source));
        }
        if self.get_match(target).is_none() {
            return Err(LadderError::MatchNotFound(target));
        }
        let game = self
            .get_match_mut(source)
            .ok_or(LadderError::MatchNotFound(source))?;
        if losers {
            game.losers_progression = Some(target);
        } else {
            game.progression = Some(target);
        }
        Ok(())
    }

    pub fn clear_progression(&mut self, source: MatchId, losers: bool) -> Result<(), LadderError> {
        let game = self
            .get_match_mut(source)
            .ok_or(LadderError::MatchNotFound(source))?;
        if losers {
            game.losers_progression = None;
        } else {
            game.progression = None;
        }
        Ok(())
    }

    /// Put a match on air. Both team slots must be filled.
    pub fn set_current_match(&mut self, id: MatchId) -> Result<(), LadderError> {
        let game = self.get_match(id).ok_or(LadderError::MatchNotFound(id))?;
        if !game.has_teams() {
            return Err(LadderError::TeamsNotSet(id));
        }
        self.current_match = Some(id);
        Ok(())
    }

    pub fn current_match(&self) -> Option<&GameMatch> {
        self.current_match.and_then(|id| self.get_match(id))
    }

    /// Take the current match off air if it lost a team. Returns the released match id.
    pub fn release_unplayable_current(&mut self) -> Option<MatchId> {
        let id = self.current_match?;
        if self.get_match(id).is_some_and(GameMatch::has_teams) {
            return None;
        }
        self.current_match = None;
        log::info!("match {} is missing a team, no longer current", id);
        Some(id)
    }
}
