//! Broadcast session: one overlay's ladder, its draft screen and the on-air screen.
//!
//! All mutations go through `&mut BroadcastSession`, so there is a single writer;
//! observers only ever see the state between two calls.

use crate::logic::{
    self, BracketEvent, DraftError, DraftEvent, DraftOrder, DraftSession, DraftState,
};
use crate::models::{ChoiceType, Ladder, LadderError, MatchId, TeamColour, TeamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Which overlay screen is on air.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Ladder,
    MapPool,
    Gameplay,
}

/// One-shot delayed task that can be cancelled.
///
/// Each schedule bumps a generation counter; a task that fires must check
/// [`AutoAdvance::is_current`] before acting, which also covers the window
/// between the timer elapsing and the task getting hold of the session.
#[derive(Debug, Default)]
pub struct AutoAdvance {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl AutoAdvance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `make(generation)` after `delay`, replacing any pending task.
    /// Must be called from within a tokio runtime.
    pub fn schedule<F, Fut>(&mut self, delay: Duration, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let generation = self.generation;
        let task = make(generation);
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
        generation
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && self.generation == generation
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Mark the task for `generation` as done. Returns false if it was superseded.
    pub fn complete(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.handle = None;
        true
    }
}

impl Drop for AutoAdvance {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// State of one overlay: bracket, draft screen and the screen on air.
#[derive(Debug, Serialize)]
pub struct BroadcastSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub ladder: Ladder,
    pub draft: DraftSession,
    pub screen: Screen,
    #[serde(skip)]
    auto_advance: AutoAdvance,
}

impl BroadcastSession {
    pub fn new(ladder: Ladder) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            ladder,
            draft: DraftSession::new(),
            screen: Screen::default(),
            auto_advance: AutoAdvance::new(),
        }
    }

    /// Put a match on air. Changing the match resets the draft screen and cancels any
    /// pending auto-advance, which belonged to the previous match.
    pub fn set_current_match(&mut self, id: MatchId) -> Result<(), LadderError> {
        let previous = self.ladder.current_match;
        self.ladder.set_current_match(id)?;
        if previous != Some(id) {
            self.auto_advance.cancel();
            self.draft.reset_for(Some(id));
            log::info!("session {}: current match {:?} -> {}", self.id, previous, id);
        }
        Ok(())
    }

    pub fn configure_draft(&mut self, order: DraftOrder) -> Result<Vec<DraftEvent>, DraftError> {
        self.draft.configure(&self.ladder, order)
    }

    pub fn draft_state(&mut self) -> Result<DraftState, DraftError> {
        self.draft.refresh(&self.ladder)?;
        self.draft.state().ok_or(DraftError::UnconfiguredDraft)
    }

    pub fn record_choice(
        &mut self,
        team: TeamColour,
        kind: ChoiceType,
        slot: &str,
    ) -> Result<Vec<DraftEvent>, DraftError> {
        let events = self.draft.record(&mut self.ladder, team, kind, slot)?;
        self.auto_advance.cancel();
        Ok(events)
    }

    pub fn undo_choice(&mut self, slot: &str) -> Result<Vec<DraftEvent>, DraftError> {
        let events = self.draft.undo(&mut self.ladder, slot)?;
        self.auto_advance.cancel();
        Ok(events)
    }

    pub fn set_scores(
        &mut self,
        id: MatchId,
        team_1_score: u32,
        team_2_score: u32,
    ) -> Result<Vec<BracketEvent>, LadderError> {
        let events = logic::set_scores(&mut self.ladder, id, team_1_score, team_2_score)?;
        self.follow_current_match();
        Ok(events)
    }

    pub fn set_completed(
        &mut self,
        id: MatchId,
        completed: bool,
    ) -> Result<Vec<BracketEvent>, LadderError> {
        let events = logic::set_completed(&mut self.ladder, id, completed)?;
        self.follow_current_match();
        Ok(events)
    }

    pub fn start_match(&mut self, id: MatchId) -> Result<Vec<BracketEvent>, LadderError> {
        let events = logic::start_match(&mut self.ladder, id)?;
        self.follow_current_match();
        Ok(events)
    }

    pub fn set_teams(
        &mut self,
        id: MatchId,
        team_1: Option<TeamId>,
        team_2: Option<TeamId>,
    ) -> Result<(), LadderError> {
        self.ladder.set_teams(id, team_1, team_2)?;
        self.follow_current_match();
        Ok(())
    }

    /// Drop the draft screen and any pending auto-advance once the ladder took the
    /// drafted match off air.
    fn follow_current_match(&mut self) {
        if self.draft.match_id() != self.ladder.current_match {
            self.auto_advance.cancel();
            self.draft.reset_for(self.ladder.current_match);
            log::info!("session {}: draft match released", self.id);
        }
    }

    /// Manual screen change; overrides any pending auto-advance.
    pub fn set_screen(&mut self, screen: Screen) {
        self.auto_advance.cancel();
        self.screen = screen;
    }

    /// Schedule the switch to gameplay. See [`BroadcastSession::auto_advance_fired`].
    pub fn schedule_auto_advance<F, Fut>(&mut self, delay: Duration, make: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.auto_advance.schedule(delay, make)
    }

    pub fn auto_advance_pending(&self) -> bool {
        self.auto_advance.is_pending()
    }

    /// Called by the fired timer. Switches to gameplay unless the timer was superseded.
    pub fn auto_advance_fired(&mut self, generation: u64) -> bool {
        if !self.auto_advance.complete(generation) {
            log::debug!("session {}: stale auto-advance {} ignored", self.id, generation);
            return false;
        }
        self.screen = Screen::Gameplay;
        log::info!("session {}: auto-advanced to gameplay", self.id);
        true
    }
}

/// Whether a batch of draft events contains a recorded pick.
pub fn contains_pick(events: &[DraftEvent]) -> bool {
    events.iter().any(|e| {
        matches!(e, DraftEvent::ChoiceRecorded { choice } if choice.kind == ChoiceType::Pick)
    })
}
