//! Integration tests for the map-pool draft: sequencing, validation and undo.

use tournament_overlay::logic::{match_state, pick_quota, BAN_QUOTA, PROTECT_QUOTA};
use tournament_overlay::{
    compute_state, record_choice, undo_choice, Choice, ChoiceType, DraftError, DraftEvent,
    DraftOrder, DraftPhase, DraftSession, DraftState, GameMatch, IllegalMoveReason, Ladder, Round,
    Team, TeamColour,
};

use ChoiceType::{Ban, Pick, Protect};
use TeamColour::{Blue, Red};

const SLOTS: [&str; 20] = [
    "NM1", "NM2", "NM3", "NM4", "NM5", "NM6", "HD1", "HD2", "HD3", "HR1", "HR2", "HR3", "DT1",
    "DT2", "DT3", "DT4", "FM1", "FM2", "FM3", "TB",
];

fn round(best_of: u32) -> Round {
    Round::new("Grand Finals", best_of).with_beatmaps(
        SLOTS
            .iter()
            .enumerate()
            .map(|(i, slot)| (1000 + i as u64, *slot)),
    )
}

fn free_slot(game: &GameMatch, round: &Round) -> String {
    round
        .beatmaps
        .iter()
        .find(|b| !game.picks_bans.iter().any(|c| c.is_slot(&b.slot)))
        .expect("pool exhausted")
        .slot
        .clone()
}

/// Perform whatever move is currently allowed, on the next unused slot.
fn step(game: &mut GameMatch, round: &Round, order: &DraftOrder) -> DraftState {
    let state = match_state(game, round, order).unwrap();
    let kind = state.phase.choice_type().expect("draft already complete");
    let team = state.next_team.unwrap();
    let slot = free_slot(game, round);
    record_choice(game, round, order, team, kind, &slot).unwrap()
}

fn acting(game: &GameMatch, kind: ChoiceType) -> Vec<TeamColour> {
    game.picks_bans
        .iter()
        .filter(|c| c.kind == kind)
        .map(|c| c.team.unwrap())
        .collect()
}

#[test]
fn best_of_13_full_draft_order() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    assert_eq!(order.first_ban, Some(Blue));
    assert_eq!(order.first_pick, Some(Red));

    let mut game = GameMatch::new(1);
    let total = PROTECT_QUOTA + BAN_QUOTA + pick_quota(13);
    assert_eq!(total, 18);
    let mut last = None;
    for _ in 0..total {
        last = Some(step(&mut game, &round, &order));
    }

    assert_eq!(acting(&game, Protect), vec![Red, Blue]);
    assert_eq!(acting(&game, Ban), vec![Blue, Red, Blue, Red]);
    let picks = acting(&game, Pick);
    assert_eq!(picks.len(), 12);
    for (i, team) in picks.iter().enumerate() {
        assert_eq!(*team, if i % 2 == 0 { Red } else { Blue });
    }
    assert_eq!(
        last,
        Some(DraftState {
            phase: DraftPhase::Complete,
            next_team: None
        })
    );
}

#[test]
fn draft_complete_rejects_further_moves() {
    let round = round(3);
    let order = DraftOrder::from_first_protect(Blue);
    let mut game = GameMatch::new(1);
    for _ in 0..(2 + 4 + 2) {
        step(&mut game, &round, &order);
    }
    let err = record_choice(&mut game, &round, &order, Red, Pick, "TB").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::DraftComplete,
            ..
        }
    ));
    assert_eq!(game.picks_bans.len(), 8);
}

#[test]
fn best_of_1_completes_after_bans() {
    let round = round(1);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);
    let mut last = None;
    for _ in 0..6 {
        last = Some(step(&mut game, &round, &order));
    }
    assert_eq!(last.unwrap().phase, DraftPhase::Complete);
}

#[test]
fn unconfigured_order_rejects_everything() {
    let round = round(13);
    let mut game = GameMatch::new(1);
    let order = DraftOrder {
        first_protect: Some(Red),
        first_ban: None,
        first_pick: Some(Red),
    };
    assert_eq!(
        compute_state(&game.picks_bans, 13, &order),
        Err(DraftError::UnconfiguredDraft)
    );
    assert_eq!(
        record_choice(&mut game, &round, &order, Red, Protect, "NM1"),
        Err(DraftError::UnconfiguredDraft)
    );
    assert!(game.picks_bans.is_empty());
}

#[test]
fn order_must_follow_boundary_rule() {
    let order = DraftOrder {
        first_protect: Some(Red),
        first_ban: Some(Red),
        first_pick: Some(Blue),
    };
    assert_eq!(
        order.validate(),
        Err(DraftError::InconsistentOrder {
            phase: Ban,
            expected: Blue,
            configured: Red,
        })
    );

    let order = DraftOrder {
        first_protect: Some(Red),
        first_ban: Some(Blue),
        first_pick: Some(Blue),
    };
    assert!(matches!(
        order.validate(),
        Err(DraftError::InconsistentOrder { phase: Pick, .. })
    ));
}

#[test]
fn rolled_order_is_consistent() {
    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        assert_eq!(DraftOrder::roll(&mut rng).validate(), Ok(()));
    }
}

#[test]
fn wrong_team_and_wrong_phase_are_rejected() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);

    let err = record_choice(&mut game, &round, &order, Blue, Protect, "NM1").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::WrongTeam,
            ..
        }
    ));

    let err = record_choice(&mut game, &round, &order, Red, Ban, "NM1").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::WrongPhase,
            ..
        }
    ));

    // A team may not act twice in a row within a phase.
    record_choice(&mut game, &round, &order, Red, Protect, "NM1").unwrap();
    let err = record_choice(&mut game, &round, &order, Red, Protect, "NM2").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::WrongTeam,
            ..
        }
    ));
    assert_eq!(game.picks_bans.len(), 1);
}

#[test]
fn slot_must_be_in_pool_and_unused() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);

    let err = record_choice(&mut game, &round, &order, Red, Protect, "EZ1").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::SlotNotInPool,
            ..
        }
    ));

    record_choice(&mut game, &round, &order, Red, Protect, "hr1").unwrap();
    assert_eq!(game.picks_bans[0].slot, "HR1");
    assert_eq!(game.picks_bans[0].beatmap_id, 1009);

    let err = record_choice(&mut game, &round, &order, Blue, Protect, "HR1").unwrap_err();
    assert!(matches!(
        err,
        DraftError::IllegalMove {
            reason: IllegalMoveReason::SlotTaken,
            ..
        }
    ));
}

#[test]
fn undo_across_protect_ban_boundary() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);
    record_choice(&mut game, &round, &order, Red, Protect, "NM1").unwrap();
    let state = record_choice(&mut game, &round, &order, Blue, Protect, "NM2").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Blue) });
    let state = record_choice(&mut game, &round, &order, Blue, Ban, "HD1").unwrap();
    assert_eq!(state.next_team, Some(Red));

    let (removed, state) = undo_choice(&mut game, &round, &order, "HD1").unwrap();
    assert_eq!(removed.kind, Ban);
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Blue) });

    let (_, state) = undo_choice(&mut game, &round, &order, "NM2").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Protect, next_team: Some(Blue) });

    let state = record_choice(&mut game, &round, &order, Blue, Protect, "NM2").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Blue) });
}

#[test]
fn undo_two_boundary_crossing_actions_in_a_row() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Blue);
    let mut game = GameMatch::new(1);
    for _ in 0..7 {
        step(&mut game, &round, &order);
    }
    // 2 protects, 4 bans, 1 pick.
    let state = match_state(&game, &round, &order).unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Pick, next_team: Some(Red) });

    let first_pick = game.picks_bans[6].slot.clone();
    let last_ban = game.picks_bans[5].slot.clone();
    let last_protect = game.picks_bans[1].slot.clone();

    let (_, state) = undo_choice(&mut game, &round, &order, &first_pick).unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Pick, next_team: Some(Blue) });

    let (_, state) = undo_choice(&mut game, &round, &order, &last_ban).unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Blue) });

    let (_, state) = undo_choice(&mut game, &round, &order, &last_protect).unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Protect, next_team: Some(Red) });

    // Same result as recomputing the remaining history from scratch.
    assert_eq!(compute_state(&game.picks_bans, 13, &order).unwrap(), state);
}

#[test]
fn undo_mid_ban_phase_keeps_bans_even() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);
    record_choice(&mut game, &round, &order, Red, Protect, "NM1").unwrap();
    record_choice(&mut game, &round, &order, Blue, Protect, "NM2").unwrap();
    record_choice(&mut game, &round, &order, Blue, Ban, "HD1").unwrap();
    record_choice(&mut game, &round, &order, Red, Ban, "HD2").unwrap();
    record_choice(&mut game, &round, &order, Blue, Ban, "HD3").unwrap();

    // Blue has used both of its bans once Red's is removed.
    let (_, state) = undo_choice(&mut game, &round, &order, "HD2").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Red) });
    let state = record_choice(&mut game, &round, &order, Red, Ban, "HR1").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Ban, next_team: Some(Red) });

    assert!(matches!(
        record_choice(&mut game, &round, &order, Blue, Ban, "HR2"),
        Err(DraftError::IllegalMove {
            reason: IllegalMoveReason::WrongTeam,
            ..
        })
    ));
    let state = record_choice(&mut game, &round, &order, Red, Ban, "HR2").unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Pick, next_team: Some(Red) });
    assert_eq!(acting(&game, Ban), vec![Blue, Blue, Red, Red]);
}

#[test]
fn undo_missing_slot_is_not_found() {
    let round = round(13);
    let order = DraftOrder::from_first_protect(Red);
    let mut game = GameMatch::new(1);
    record_choice(&mut game, &round, &order, Red, Protect, "NM1").unwrap();
    assert_eq!(
        undo_choice(&mut game, &round, &order, "NM2"),
        Err(DraftError::NotFound("NM2".to_string()))
    );
    assert_eq!(game.picks_bans.len(), 1);
}

#[test]
fn unattributed_history_alternates_by_count() {
    let order = DraftOrder::from_first_protect(Red);
    let mut choice = Choice::new(1, "NM1", Red, Protect);
    choice.team = None;
    let state = compute_state(&[choice], 13, &order).unwrap();
    assert_eq!(state, DraftState { phase: DraftPhase::Protect, next_team: Some(Blue) });
}

fn ladder_with_match() -> Ladder {
    let mut ladder = Ladder::new();
    ladder.add_team(Team::new("AAA", "Team A")).unwrap();
    ladder.add_team(Team::new("BBB", "Team B")).unwrap();
    ladder.add_round(round(13)).unwrap();
    ladder
        .add_match(GameMatch::new(1).with_teams("AAA", "BBB").in_round("Grand Finals"))
        .unwrap();
    ladder
}

#[test]
fn session_requires_active_match() {
    let ladder = ladder_with_match();
    let mut session = DraftSession::new();
    assert_eq!(
        session.configure(&ladder, DraftOrder::from_first_protect(Red)),
        Err(DraftError::NoActiveMatch)
    );
}

#[test]
fn session_emits_state_changes() {
    let mut ladder = ladder_with_match();
    let mut session = DraftSession::new();
    session.reset_for(Some(1));

    let events = session
        .configure(&ladder, DraftOrder::from_first_protect(Red))
        .unwrap();
    assert_eq!(
        events,
        vec![
            DraftEvent::PhaseChanged { from: None, to: DraftPhase::Protect },
            DraftEvent::NextTeamChanged { from: None, to: Some(Red) },
        ]
    );

    let events = session.record(&mut ladder, Red, Protect, "NM1").unwrap();
    assert!(matches!(events[0], DraftEvent::ChoiceRecorded { .. }));
    assert_eq!(
        events[1],
        DraftEvent::NextTeamChanged { from: Some(Red), to: Some(Blue) }
    );

    let events = session.record(&mut ladder, Blue, Protect, "NM2").unwrap();
    assert!(events.contains(&DraftEvent::PhaseChanged {
        from: Some(DraftPhase::Protect),
        to: DraftPhase::Ban,
    }));
    // Bans open with Blue, so the acting team does not change across the boundary.
    assert!(!events
        .iter()
        .any(|e| matches!(e, DraftEvent::NextTeamChanged { .. })));

    let events = session.undo(&mut ladder, "NM2").unwrap();
    assert!(matches!(events[0], DraftEvent::ChoiceRemoved { .. }));
    assert_eq!(
        session.state(),
        Some(DraftState { phase: DraftPhase::Protect, next_team: Some(Blue) })
    );
    assert_eq!(ladder.get_match(1).unwrap().picks_bans.len(), 1);
}

#[test]
fn session_reset_forgets_order() {
    let ladder = ladder_with_match();
    let mut session = DraftSession::new();
    session.reset_for(Some(1));
    session
        .configure(&ladder, DraftOrder::from_first_protect(Red))
        .unwrap();
    session.reset_for(Some(2));
    assert_eq!(session.order(), DraftOrder::default());
    assert_eq!(session.state(), None);
}

#[test]
fn session_match_without_round() {
    let mut ladder = ladder_with_match();
    ladder.add_match(GameMatch::new(2).with_teams("AAA", "BBB")).unwrap();
    let mut session = DraftSession::new();
    session.reset_for(Some(2));
    assert_eq!(
        session.configure(&ladder, DraftOrder::from_first_protect(Red)),
        Err(DraftError::NoRound(2))
    );
}

#[test]
fn session_refuses_match_missing_a_team() {
    let mut ladder = ladder_with_match();
    let mut session = DraftSession::new();
    session.reset_for(Some(1));
    session
        .configure(&ladder, DraftOrder::from_first_protect(Red))
        .unwrap();
    ladder.get_match_mut(1).unwrap().team_2 = None;

    assert_eq!(
        session.record(&mut ladder, Red, Protect, "NM1"),
        Err(DraftError::TeamsNotSet(1))
    );
    assert!(ladder.get_match(1).unwrap().picks_bans.is_empty());
}
