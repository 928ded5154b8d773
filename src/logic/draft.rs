//! Map-pool draft: protect, ban and pick sequencing.
//!
//! The draft state is never tracked incrementally. Every query and every mutation
//! recomputes it from the match's full choice list, so an undo anywhere in the
//! history (including across a phase boundary) lands on the same state a fresh
//! replay would produce.

use crate::models::{Choice, ChoiceType, GameMatch, Ladder, MatchId, Round, TeamColour};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Protects per draft (one per team).
pub const PROTECT_QUOTA: usize = 2;
/// Bans per draft (two per team).
pub const BAN_QUOTA: usize = 4;

/// Picks per draft: every map of the best-of except the tiebreaker.
pub fn pick_quota(best_of: u32) -> usize {
    best_of.saturating_sub(1) as usize
}

/// Why a move was rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IllegalMoveReason {
    /// The other team is due to act.
    WrongTeam,
    /// The action kind does not belong to the current phase.
    WrongPhase,
    /// Every quota is filled.
    DraftComplete,
    /// The slot already has a choice on it.
    SlotTaken,
    /// The round's pool has no such slot.
    SlotNotInPool,
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IllegalMoveReason::WrongTeam => write!(f, "not this team's turn"),
            IllegalMoveReason::WrongPhase => write!(f, "not allowed in the current phase"),
            IllegalMoveReason::DraftComplete => write!(f, "the draft is already complete"),
            IllegalMoveReason::SlotTaken => write!(f, "slot already chosen"),
            IllegalMoveReason::SlotNotInPool => write!(f, "slot is not in the round's pool"),
        }
    }
}

/// Errors that can occur while drafting. None of them leave the choice list modified.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum DraftError {
    #[error("Illegal {kind} by {team} on {slot}: {reason}")]
    IllegalMove {
        team: TeamColour,
        kind: ChoiceType,
        slot: String,
        reason: IllegalMoveReason,
    },
    #[error("No choice on slot {0}")]
    NotFound(String),
    #[error("Draft order is not configured for this match")]
    UnconfiguredDraft,
    #[error("First {phase} must go to {expected} (configured {configured})")]
    InconsistentOrder {
        phase: ChoiceType,
        expected: TeamColour,
        configured: TeamColour,
    },
    #[error("Match {0} has no round configured")]
    NoRound(MatchId),
    #[error("No match is selected for drafting")]
    NoActiveMatch,
    #[error("Match {0} not found")]
    MatchNotFound(MatchId),
    #[error("Match {0} needs both teams set before drafting")]
    TeamsNotSet(MatchId),
}

/// Draft phase. Advances monotonically as choices are added.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftPhase {
    Protect,
    Ban,
    Pick,
    /// All quotas filled; nobody may act.
    Complete,
}

impl DraftPhase {
    /// The action kind this phase accepts.
    pub fn choice_type(self) -> Option<ChoiceType> {
        match self {
            DraftPhase::Protect => Some(ChoiceType::Protect),
            DraftPhase::Ban => Some(ChoiceType::Ban),
            DraftPhase::Pick => Some(ChoiceType::Pick),
            DraftPhase::Complete => None,
        }
    }
}

/// Which team opens each phase. Set by the operator per match before any action.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct DraftOrder {
    pub first_protect: Option<TeamColour>,
    pub first_ban: Option<TeamColour>,
    pub first_pick: Option<TeamColour>,
}

impl DraftOrder {
    /// Full order derived from the first protector: bans open with the other team,
    /// picks open with the team that did not open bans.
    pub fn from_first_protect(first_protect: TeamColour) -> Self {
        let first_ban = first_protect.opposite();
        Self {
            first_protect: Some(first_protect),
            first_ban: Some(first_ban),
            first_pick: Some(first_ban.opposite()),
        }
    }

    /// Coin flip for the first protector.
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = if rng.gen_bool(0.5) {
            TeamColour::Red
        } else {
            TeamColour::Blue
        };
        Self::from_first_protect(first)
    }

    pub fn first_actor(&self, kind: ChoiceType) -> Option<TeamColour> {
        match kind {
            ChoiceType::Protect => self.first_protect,
            ChoiceType::Ban => self.first_ban,
            ChoiceType::Pick => self.first_pick,
        }
    }

    /// All three colours are set and each phase opens with the complement of the
    /// previous phase's opener.
    pub fn validate(&self) -> Result<(), DraftError> {
        let (Some(protect), Some(ban), Some(pick)) =
            (self.first_protect, self.first_ban, self.first_pick)
        else {
            return Err(DraftError::UnconfiguredDraft);
        };
        if ban != protect.opposite() {
            return Err(DraftError::InconsistentOrder {
                phase: ChoiceType::Ban,
                expected: protect.opposite(),
                configured: ban,
            });
        }
        if pick != ban.opposite() {
            return Err(DraftError::InconsistentOrder {
                phase: ChoiceType::Pick,
                expected: ban.opposite(),
                configured: pick,
            });
        }
        Ok(())
    }
}

/// Derived draft state: current phase and who may act next.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub phase: DraftPhase,
    /// `None` once the draft is complete.
    pub next_team: Option<TeamColour>,
}

impl DraftState {
    /// Whether `team` may perform `kind` right now.
    pub fn allows(&self, team: TeamColour, kind: ChoiceType) -> bool {
        self.phase.choice_type() == Some(kind) && self.next_team == Some(team)
    }
}

/// Total choices of `kind` in a draft for the given best-of.
pub fn quota(kind: ChoiceType, best_of: u32) -> usize {
    match kind {
        ChoiceType::Protect => PROTECT_QUOTA,
        ChoiceType::Ban => BAN_QUOTA,
        ChoiceType::Pick => pick_quota(best_of),
    }
}

/// Compute the draft state from scratch.
///
/// 1. Count choices by kind against the fixed quotas.
/// 2. Phase is the first kind whose quota is not yet filled.
/// 3. The phase's first actor opens it; afterwards the team opposite the most
///    recent choice of that kind acts, unless that team already holds its half
///    of the quota (possible after an undo out of order), in which case the
///    other team acts.
pub fn compute_state(
    choices: &[Choice],
    best_of: u32,
    order: &DraftOrder,
) -> Result<DraftState, DraftError> {
    order.validate()?;

    let count = |kind: ChoiceType| choices.iter().filter(|c| c.kind == kind).count();
    let phase = [ChoiceType::Protect, ChoiceType::Ban, ChoiceType::Pick]
        .into_iter()
        .find(|&kind| count(kind) < quota(kind, best_of))
        .map_or(DraftPhase::Complete, |kind| match kind {
            ChoiceType::Protect => DraftPhase::Protect,
            ChoiceType::Ban => DraftPhase::Ban,
            ChoiceType::Pick => DraftPhase::Pick,
        });

    let next_team = match phase.choice_type() {
        None => None,
        Some(kind) => {
            let first = order.first_actor(kind).ok_or(DraftError::UnconfiguredDraft)?;
            let in_phase = count(kind);
            let last = choices.iter().rev().find(|c| c.kind == kind);
            let due = match last.and_then(|c| c.team) {
                Some(last_team) => last_team.opposite(),
                // Unattributed history: fall back to strict alternation by count.
                None if in_phase % 2 == 0 => first,
                None => first.opposite(),
            };
            let share = quota(kind, best_of) / 2;
            let used = |team: TeamColour| {
                choices
                    .iter()
                    .filter(|c| c.kind == kind && c.team == Some(team))
                    .count()
            };
            Some(if used(due) >= share && used(due.opposite()) < share {
                due.opposite()
            } else {
                due
            })
        }
    };

    Ok(DraftState { phase, next_team })
}

/// Draft state of a match within its round.
pub fn match_state(
    game: &GameMatch,
    round: &Round,
    order: &DraftOrder,
) -> Result<DraftState, DraftError> {
    compute_state(&game.picks_bans, round.best_of, order)
}

/// Record a choice if it is the currently allowed move. Returns the new state.
pub fn record_choice(
    game: &mut GameMatch,
    round: &Round,
    order: &DraftOrder,
    team: TeamColour,
    kind: ChoiceType,
    slot: &str,
) -> Result<DraftState, DraftError> {
    let illegal = |reason| DraftError::IllegalMove {
        team,
        kind,
        slot: slot.to_string(),
        reason,
    };

    let state = match_state(game, round, order)?;
    if state.phase == DraftPhase::Complete {
        return Err(illegal(IllegalMoveReason::DraftComplete));
    }
    if state.phase.choice_type() != Some(kind) {
        return Err(illegal(IllegalMoveReason::WrongPhase));
    }
    if state.next_team != Some(team) {
        return Err(illegal(IllegalMoveReason::WrongTeam));
    }
    let beatmap = round
        .beatmap(slot)
        .ok_or_else(|| illegal(IllegalMoveReason::SlotNotInPool))?;
    if game.picks_bans.iter().any(|c| c.is_slot(slot)) {
        return Err(illegal(IllegalMoveReason::SlotTaken));
    }

    game.picks_bans
        .push(Choice::new(beatmap.id, beatmap.slot.clone(), team, kind));
    let state = match_state(game, round, order)?;
    log::debug!("match {}: {} {} {} -> {:?}", game.id, team, kind, beatmap.slot, state);
    Ok(state)
}

/// Remove the choice on `slot`, wherever it sits in the history. Returns the removed
/// choice and the recomputed state.
pub fn undo_choice(
    game: &mut GameMatch,
    round: &Round,
    order: &DraftOrder,
    slot: &str,
) -> Result<(Choice, DraftState), DraftError> {
    order.validate()?;
    let idx = game
        .picks_bans
        .iter()
        .position(|c| c.is_slot(slot))
        .ok_or_else(|| DraftError::NotFound(slot.to_string()))?;
    let removed = game.picks_bans.remove(idx);
    let state = match_state(game, round, order)?;
    log::debug!("match {}: undo {} {} -> {:?}", game.id, removed.kind, removed.slot, state);
    Ok((removed, state))
}

/// Change notifications for the presentation layer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DraftEvent {
    ChoiceRecorded { choice: Choice },
    ChoiceRemoved { choice: Choice },
    PhaseChanged {
        from: Option<DraftPhase>,
        to: DraftPhase,
    },
    NextTeamChanged {
        from: Option<TeamColour>,
        to: Option<TeamColour>,
    },
}

fn state_events(before: Option<DraftState>, after: DraftState) -> Vec<DraftEvent> {
    let mut events = Vec::new();
    let from_phase = before.map(|s| s.phase);
    if from_phase != Some(after.phase) {
        events.push(DraftEvent::PhaseChanged {
            from: from_phase,
            to: after.phase,
        });
    }
    let from_team = before.and_then(|s| s.next_team);
    if before.is_none() || from_team != after.next_team {
        events.push(DraftEvent::NextTeamChanged {
            from: from_team,
            to: after.next_team,
        });
    }
    events
}

fn match_and_round(
    ladder: &mut Ladder,
    id: MatchId,
) -> Result<(&mut GameMatch, &Round), DraftError> {
    let Ladder {
        rounds, matches, ..
    } = ladder;
    let game = matches
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or(DraftError::MatchNotFound(id))?;
    let name = game.round.as_deref().ok_or(DraftError::NoRound(id))?;
    let round = rounds
        .iter()
        .find(|r| r.name == name)
        .ok_or(DraftError::NoRound(id))?;
    Ok((game, round))
}

/// Draft bookkeeping owned by the map-pool screen.
///
/// Holds the operator's order for the active match and the last computed state,
/// which is only ever replaced, never patched.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DraftSession {
    match_id: Option<MatchId>,
    order: DraftOrder,
    state: Option<DraftState>,
}

impl DraftSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_id(&self) -> Option<MatchId> {
        self.match_id
    }

    pub fn order(&self) -> DraftOrder {
        self.order
    }

    pub fn state(&self) -> Option<DraftState> {
        self.state
    }

    /// Forget everything: the active match changed.
    pub fn reset_for(&mut self, match_id: Option<MatchId>) {
        self.match_id = match_id;
        self.order = DraftOrder::default();
        self.state = None;
    }

    /// Seed the draft order for the active match.
    pub fn configure(
        &mut self,
        ladder: &Ladder,
        order: DraftOrder,
    ) -> Result<Vec<DraftEvent>, DraftError> {
        order.validate()?;
        let id = self.match_id.ok_or(DraftError::NoActiveMatch)?;
        let game = ladder.get_match(id).ok_or(DraftError::MatchNotFound(id))?;
        let round = ladder.round_of(id).ok_or(DraftError::NoRound(id))?;
        let state = match_state(game, round, &order)?;
        self.order = order;
        Ok(self.replace_state(state))
    }

    /// Recompute the state from the ladder without mutating anything.
    pub fn refresh(&mut self, ladder: &Ladder) -> Result<Vec<DraftEvent>, DraftError> {
        let id = self.match_id.ok_or(DraftError::NoActiveMatch)?;
        let game = ladder.get_match(id).ok_or(DraftError::MatchNotFound(id))?;
        let round = ladder.round_of(id).ok_or(DraftError::NoRound(id))?;
        let state = match_state(game, round, &self.order)?;
        Ok(self.replace_state(state))
    }

    pub fn record(
        &mut self,
        ladder: &mut Ladder,
        team: TeamColour,
        kind: ChoiceType,
        slot: &str,
    ) -> Result<Vec<DraftEvent>, DraftError> {
        let id = self.match_id.ok_or(DraftError::NoActiveMatch)?;
        let (game, round) = match_and_round(ladder, id)?;
        if !game.has_teams() {
            return Err(DraftError::TeamsNotSet(id));
        }
        let state = record_choice(game, round, &self.order, team, kind, slot)?;
        let mut events = Vec::new();
        if let Some(choice) = game.picks_bans.last() {
            events.push(DraftEvent::ChoiceRecorded {
                choice: choice.clone(),
            });
        }
        events.extend(self.replace_state(state));
        Ok(events)
    }

    pub fn undo(&mut self, ladder: &mut Ladder, slot: &str) -> Result<Vec<DraftEvent>, DraftError> {
        let id = self.match_id.ok_or(DraftError::NoActiveMatch)?;
        let (game, round) = match_and_round(ladder, id)?;
        let (choice, state) = undo_choice(game, round, &self.order, slot)?;
        let mut events = vec![DraftEvent::ChoiceRemoved { choice }];
        events.extend(self.replace_state(state));
        Ok(events)
    }

    fn replace_state(&mut self, state: DraftState) -> Vec<DraftEvent> {
        let events = state_events(self.state, state);
        self.state = Some(state);
        events
    }
}
