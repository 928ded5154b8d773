//! Bracket progression: moving a finished match's winner and loser into the matches downstream.

use crate::models::{GameMatch, Ladder, LadderError, MatchId, TeamId, TeamSlot};
use serde::Serialize;

/// Change notifications for the presentation layer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BracketEvent {
    CompletionChanged {
        match_id: MatchId,
        completed: bool,
    },
    WinnerDetermined {
        match_id: MatchId,
        winner: TeamId,
        loser: TeamId,
    },
    TeamTransferred {
        from: MatchId,
        to: MatchId,
        slot: TeamSlot,
        team: TeamId,
    },
    SlotCleared {
        from: MatchId,
        to: MatchId,
        slot: TeamSlot,
        team: TeamId,
    },
    /// The on-air match lost a team and is no longer current.
    CurrentMatchReleased { match_id: MatchId },
}

/// The parts of a source match propagation needs, copied out so the ladder can be mutated.
struct Source {
    id: MatchId,
    completed: bool,
    teams: Vec<TeamId>,
    winner: Option<TeamId>,
    loser: Option<TeamId>,
    progression: Option<MatchId>,
    losers_progression: Option<MatchId>,
}

impl Source {
    fn of(game: &GameMatch) -> Self {
        Self {
            id: game.id,
            completed: game.completed,
            teams: [&game.team_1, &game.team_2]
                .into_iter()
                .flatten()
                .cloned()
                .collect(),
            winner: game.winner().cloned(),
            loser: game.loser().cloned(),
            progression: game.progression,
            losers_progression: game.losers_progression,
        }
    }
}

/// Propagate a match's result downstream.
///
/// Completed: winner goes to `progression`, loser to `losers_progression`.
/// Not completed: this match's teams are removed from both destinations, so a score
/// correction that un-completes a match leaves no stale team behind.
/// A missing destination is a normal terminal case (e.g. grand final). Only an
/// unknown source id is an error.
pub fn on_match_completed(ladder: &mut Ladder, id: MatchId) -> Result<Vec<BracketEvent>, LadderError> {
    let source = Source::of(ladder.get_match(id).ok_or(LadderError::MatchNotFound(id))?);
    let mut events = Vec::new();

    if !source.completed {
        for destination in [source.progression, source.losers_progression]
            .into_iter()
            .flatten()
        {
            events.extend(clear_teams(ladder, source.id, destination, &source.teams));
        }
        return Ok(events);
    }

    let (Some(winner), Some(loser)) = (source.winner.clone(), source.loser.clone()) else {
        log::warn!(
            "match {} is completed but has no clear winner (tie or unset team), skipping progression",
            id
        );
        return Ok(events);
    };
    events.push(BracketEvent::WinnerDetermined {
        match_id: id,
        winner: winner.clone(),
        loser: loser.clone(),
    });

    // A corrected result may have swapped winner and loser.
    if source.progression != source.losers_progression {
        if let Some(destination) = source.progression {
            events.extend(clear_teams(ladder, id, destination, std::slice::from_ref(&loser)));
        }
        if let Some(destination) = source.losers_progression {
            events.extend(clear_teams(ladder, id, destination, std::slice::from_ref(&winner)));
        }
    }

    events.extend(transfer_slot(ladder, id, source.progression, &winner));
    events.extend(transfer_slot(ladder, id, source.losers_progression, &loser));
    Ok(events)
}

/// Write `team` into a slot of `destination`, unless it already holds it.
///
/// Progression flowing upward (destination id below the source id) prefers `Team2`,
/// otherwise `Team1`. An occupied preferred slot sends the team to the other slot.
pub fn transfer_slot(
    ladder: &mut Ladder,
    source: MatchId,
    destination: Option<MatchId>,
    team: &TeamId,
) -> Option<BracketEvent> {
    let destination = destination?;
    let Some(game) = ladder.get_match_mut(destination) else {
        log::warn!("match {} progresses into missing match {}", source, destination);
        return None;
    };
    if game.slot_of(team).is_some() {
        return None;
    }

    let preferred = if destination < source {
        TeamSlot::Two
    } else {
        TeamSlot::One
    };
    let slot = if game.team(preferred).is_some() {
        preferred.other()
    } else {
        preferred
    };
    if let Some(previous) = game.team(slot) {
        log::warn!(
            "match {} overwrites {} in match {} with {}",
            source,
            previous,
            destination,
            team
        );
    }

    *game.team_mut(slot) = Some(team.clone());
    log::info!("match {}: {} -> match {} ({:?})", source, team, destination, slot);
    Some(BracketEvent::TeamTransferred {
        from: source,
        to: destination,
        slot,
        team: team.clone(),
    })
}

fn clear_teams(
    ladder: &mut Ladder,
    source: MatchId,
    destination: MatchId,
    teams: &[TeamId],
) -> Vec<BracketEvent> {
    let Some(game) = ladder.get_match_mut(destination) else {
        return Vec::new();
    };
    let mut events = Vec::new();
    for team in teams {
        if let Some(slot) = game.slot_of(team) {
            *game.team_mut(slot) = None;
            log::info!("match {}: cleared {} from match {}", source, team, destination);
            events.push(BracketEvent::SlotCleared {
                from: source,
                to: destination,
                slot,
                team: team.clone(),
            });
        }
    }
    if !events.is_empty() && ladder.current_match == Some(destination) {
        if let Some(match_id) = ladder.release_unplayable_current() {
            events.push(BracketEvent::CurrentMatchReleased { match_id });
        }
    }
    events
}

/// Re-evaluate `completed` from the scores, then propagate.
///
/// Without a round the best-of is unknown and `completed` is left as it is.
pub fn update_win_conditions(
    ladder: &mut Ladder,
    id: MatchId,
) -> Result<Vec<BracketEvent>, LadderError> {
    let best_of = ladder.round_of(id).map(|r| r.best_of);
    let game = ladder
        .get_match_mut(id)
        .ok_or(LadderError::MatchNotFound(id))?;

    let mut events = Vec::new();
    if let Some(best_of) = best_of {
        let completed = game.evaluate_completed(best_of);
        if completed != game.completed {
            game.completed = completed;
            events.push(BracketEvent::CompletionChanged {
                match_id: id,
                completed,
            });
        }
    }
    events.extend(on_match_completed(ladder, id)?);
    Ok(events)
}

/// Enter scores for a match and propagate the outcome.
pub fn set_scores(
    ladder: &mut Ladder,
    id: MatchId,
    team_1_score: u32,
    team_2_score: u32,
) -> Result<Vec<BracketEvent>, LadderError> {
    let game = ladder
        .get_match_mut(id)
        .ok_or(LadderError::MatchNotFound(id))?;
    game.team_1_score = team_1_score;
    game.team_2_score = team_2_score;
    update_win_conditions(ladder, id)
}

/// Operator override of the completed flag (e.g. forfeits), followed by propagation.
pub fn set_completed(
    ladder: &mut Ladder,
    id: MatchId,
    completed: bool,
) -> Result<Vec<BracketEvent>, LadderError> {
    let game = ladder
        .get_match_mut(id)
        .ok_or(LadderError::MatchNotFound(id))?;
    let mut events = Vec::new();
    if game.completed != completed {
        game.completed = completed;
        events.push(BracketEvent::CompletionChanged {
            match_id: id,
            completed,
        });
    }
    events.extend(on_match_completed(ladder, id)?);
    Ok(events)
}

/// Restart a match: zero scores, un-complete it and pull its teams back out of downstream slots.
pub fn start_match(ladder: &mut Ladder, id: MatchId) -> Result<Vec<BracketEvent>, LadderError> {
    let game = ladder
        .get_match_mut(id)
        .ok_or(LadderError::MatchNotFound(id))?;
    let was_completed = game.completed;
    game.start();
    let mut events = Vec::new();
    if was_completed {
        events.push(BracketEvent::CompletionChanged {
            match_id: id,
            completed: false,
        });
    }
    events.extend(on_match_completed(ladder, id)?);
    Ok(events)
}
