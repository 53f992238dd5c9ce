//! Integration tests for round advancement, bye adjustment and reconciliation.

mod common;

use ladder_tournament_web::models::{cents, MatchStatus, MatchUpdate, Money};
use ladder_tournament_web::{
    advance_round, reconcile, AdvanceOutcome, MemoryStore, Multiplicity, PlayerId, RoundId,
    RoundKind, RoundStatus, TournamentError, TournamentId, TournamentStore,
};

fn round_total(store: &MemoryStore, id: TournamentId, round_id: RoundId) -> Money {
    store
        .load_round(id, round_id)
        .unwrap()
        .matches
        .iter()
        .map(|m| m.payout_amount)
        .sum()
}

#[test]
fn completed_round_starts_the_next_one() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let first = store.load_current_round(id).unwrap().unwrap().round;

    let outcome = common::play_current_round(&mut store, id).unwrap();
    let rounds = store.load_rounds(id).unwrap();
    assert_eq!(
        outcome,
        AdvanceOutcome::NextRound {
            round_id: rounds[1].id,
            adjusted: false
        }
    );
    assert_eq!(rounds[0].id, first.id);
    assert_eq!(rounds[0].status, RoundStatus::Completed);
    assert_eq!(rounds[1].status, RoundStatus::InProgress);
}

#[test]
fn incomplete_round_does_not_advance() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let round = store.load_current_round(id).unwrap().unwrap();
    assert_eq!(
        advance_round(&mut store, id, round.round.id).unwrap(),
        AdvanceOutcome::RoundIncomplete
    );
    assert_eq!(
        store.load_round(id, round.round.id).unwrap().round.status,
        RoundStatus::InProgress
    );
}

#[test]
fn advancing_the_same_boundary_twice_changes_nothing() {
    let (mut store, id) = common::started(6, Multiplicity::Single);
    let first = store.load_current_round(id).unwrap().unwrap().round.id;
    common::play_current_round(&mut store, id);
    let before_matches = store.load_matches(id).unwrap();
    let before_stats = store.load_all_player_stats(id).unwrap();

    let outcome = advance_round(&mut store, id, first).unwrap();
    assert!(matches!(outcome, AdvanceOutcome::NextRound { adjusted: false, .. }));
    assert_eq!(store.load_matches(id).unwrap(), before_matches);
    assert_eq!(store.load_all_player_stats(id).unwrap(), before_stats);
}

/// Six players, single round robin, better seed always wins:
/// P5 takes its third loss in round 3, so round 4 loses its P5 match
/// and P1 (now unpaired) gets a bye.
#[test]
fn elimination_removes_matches_and_inserts_a_bye() {
    let (mut store, id) = common::started(6, Multiplicity::Single);
    let p1 = common::player(&store, id, "P1");
    let p5 = common::player(&store, id, "P5");

    for _ in 0..2 {
        let outcome = common::play_current_round(&mut store, id).unwrap();
        assert!(matches!(outcome, AdvanceOutcome::NextRound { adjusted: false, .. }));
    }
    let outcome = common::play_current_round(&mut store, id).unwrap();
    let round_id = match outcome {
        AdvanceOutcome::NextRound {
            round_id,
            adjusted: true,
        } => round_id,
        other => panic!("expected an adjusted round, got {other:?}"),
    };
    assert!(store.load_player_stat(id, p5).unwrap().eliminated);

    let round = store.load_round(id, round_id).unwrap();
    assert_eq!(round.round.sequence, 4);
    assert!(round.matches.iter().all(|m| !m.involves(p5)));
    let regular: Vec<_> = round.matches.iter().filter(|m| !m.is_bye).collect();
    let byes: Vec<_> = round.matches.iter().filter(|m| m.is_bye).collect();
    assert_eq!(regular.len(), 2);
    assert_eq!(byes.len(), 1);
    assert_eq!(byes[0].player_one, p1);

    // Payouts recomputed over the same 90.00 pool: 2.5 units -> 36.00 / 18.00.
    assert!(regular.iter().all(|m| m.payout_amount == cents(3_600)));
    assert_eq!(byes[0].payout_amount, cents(1_800));
    assert_eq!(round_total(&store, id, round_id), round.round.prize_pool);

    // The bye was awarded when the round started.
    let p1_stat = store.load_player_stat(id, p1).unwrap();
    assert_eq!(p1_stat.byes, 1);
    assert!(byes[0].processed);
}

#[test]
fn even_field_drops_the_bye_and_pairs_everyone() {
    // Seven players: round 2 has a scheduled bye. Eliminating P6 makes the
    // field even, so that bye must go.
    let (mut store, id) = common::started(7, Multiplicity::Single);
    let rounds = store.load_rounds(id).unwrap();
    let next = store.load_round(id, rounds[1].id).unwrap();
    assert!(next.matches.iter().any(|m| m.is_bye));

    // Force P6 to the elimination threshold before round 1 closes.
    let p6 = common::player(&store, id, "P6");
    store
        .update_player_stat(
            id,
            p6,
            &ladder_tournament_web::models::StatUpdate {
                add_losses: 2,
                ..Default::default()
            },
        )
        .unwrap();
    common::play_current_round(&mut store, id);

    let active = store.load_active_players(id).unwrap();
    let round = store.load_round(id, rounds[1].id).unwrap();
    if active.len() % 2 == 0 {
        assert!(round.matches.iter().all(|m| !m.is_bye));
    } else {
        assert_eq!(round.matches.iter().filter(|m| m.is_bye).count(), 1);
    }
    // Every active player is scheduled exactly once.
    for s in &active {
        let count = round.matches.iter().filter(|m| m.involves(s.player_id)).count();
        assert_eq!(count, 1, "{} scheduled {} times", s.name, count);
    }
    assert_eq!(round_total(&store, id, rounds[1].id), round.round.prize_pool);
}

#[test]
fn reconcile_applies_unprocessed_results() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let round = store.load_current_round(id).unwrap().unwrap();
    let seeds = common::seeds(&store, id);

    // Results written straight to the match records, never applied to stats.
    for m in &round.matches {
        let result = common::lower_seed_wins(&seeds, m);
        store
            .update_match(
                id,
                m.id,
                &MatchUpdate {
                    status: Some(MatchStatus::Completed),
                    winner: Some(result.winner),
                    loser: result.loser,
                    ..MatchUpdate::default()
                },
            )
            .unwrap();
    }

    let report = reconcile(&mut store, id).unwrap();
    assert_eq!(report.processed.len(), 2);
    assert!(matches!(report.advancement, Some(AdvanceOutcome::NextRound { .. })));
    let wins: u32 = store.load_all_player_stats(id).unwrap().iter().map(|s| s.wins).sum();
    assert_eq!(wins, 2);

    let second = reconcile(&mut store, id).unwrap();
    assert!(second.is_noop());
}

#[test]
fn failed_step_rolls_back_every_write() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let before = store.load_all_player_stats(id).unwrap();
    let p0 = common::player(&store, id, "P0");

    let err = store
        .transaction(id, |store| {
            store.update_player_stat(
                id,
                p0,
                &ladder_tournament_web::models::StatUpdate {
                    add_wins: 5,
                    ..Default::default()
                },
            )?;
            Err::<(), _>(TournamentError::InvariantViolation("boom".into()))
        })
        .unwrap_err();
    assert!(matches!(err, TournamentError::InvariantViolation(_)));
    assert_eq!(store.load_all_player_stats(id).unwrap(), before);
}

#[test]
fn round_robin_rounds_keep_their_pools() {
    let (mut store, id) = common::started(6, Multiplicity::Single);
    for _ in 0..4 {
        common::play_current_round(&mut store, id);
    }
    for round in store.load_rounds(id).unwrap() {
        if round.kind == RoundKind::RoundRobin && round.status == RoundStatus::Completed {
            assert_eq!(round_total(&store, id, round.id), round.prize_pool, "{}", round.name);
        }
    }
}

#[test]
fn reconcile_derives_a_missing_loser() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let m = store.load_current_round(id).unwrap().unwrap().matches[0].clone();
    let winner = m.player_one;
    let other = m.player_two.unwrap();
    store
        .update_match(
            id,
            m.id,
            &MatchUpdate {
                status: Some(MatchStatus::Completed),
                winner: Some(winner),
                ..MatchUpdate::default()
            },
        )
        .unwrap();

    let report = reconcile(&mut store, id).unwrap();
    assert_eq!(report.processed, vec![m.id]);
    assert!(report.advancement.is_none());

    let stored = store.load_match(id, m.id).unwrap();
    assert!(stored.processed);
    assert_eq!(stored.loser, Some(other));
    assert_eq!(store.load_player_stat(id, winner).unwrap().wins, 1);
    assert_eq!(store.load_player_stat(id, other).unwrap().losses, 1);
}

#[test]
fn reconcile_rejects_a_winner_from_another_match() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    let round = store.load_current_round(id).unwrap().unwrap();
    let m = &round.matches[0];
    let outsider = round.matches[1].player_one;
    store
        .update_match(
            id,
            m.id,
            &MatchUpdate {
                status: Some(MatchStatus::Completed),
                winner: Some(outsider),
                ..MatchUpdate::default()
            },
        )
        .unwrap();

    assert!(matches!(
        reconcile(&mut store, id),
        Err(TournamentError::InvalidResult(_))
    ));
    assert!(!store.load_match(id, m.id).unwrap().processed);
    let stat = store.load_player_stat(id, outsider).unwrap();
    assert_eq!((stat.wins, stat.total_payout), (0, cents(0)));
}

/// Eight players; P5, P6 and P7 go out in round 1, which strips round 2 of
/// the P2-P7, P3-P6 and P4-P5 matches and leaves P2, P3 and P4 unscheduled
/// with five players still active.
fn strip_round_two(byes: &[(&str, u32)]) -> (MemoryStore, TournamentId) {
    let (mut store, id) = common::started(8, Multiplicity::Single);
    for name in ["P5", "P6", "P7"] {
        let p = common::player(&store, id, name);
        store
            .update_player_stat(
                id,
                p,
                &ladder_tournament_web::models::StatUpdate {
                    add_losses: 2,
                    ..Default::default()
                },
            )
            .unwrap();
    }
    for (name, count) in byes {
        let p = common::player(&store, id, name);
        store
            .update_player_stat(
                id,
                p,
                &ladder_tournament_web::models::StatUpdate {
                    add_byes: *count,
                    ..Default::default()
                },
            )
            .unwrap();
    }
    let outcome = common::play_current_round(&mut store, id).unwrap();
    assert!(matches!(outcome, AdvanceOutcome::NextRound { adjusted: true, .. }));
    assert_eq!(store.load_active_players(id).unwrap().len(), 5);
    (store, id)
}

fn bye_and_new_pair(store: &MemoryStore, id: TournamentId) -> (PlayerId, (PlayerId, PlayerId)) {
    let round = store.load_current_round(id).unwrap().unwrap();
    assert_eq!(round.round.sequence, 2);
    let byes: Vec<_> = round.matches.iter().filter(|m| m.is_bye).collect();
    assert_eq!(byes.len(), 1);
    let p0 = common::player(store, id, "P0");
    let added: Vec<_> = round
        .matches
        .iter()
        .filter(|m| !m.is_bye && !m.involves(p0))
        .collect();
    assert_eq!(added.len(), 1);
    (
        byes[0].player_one,
        (added[0].player_one, added[0].player_two.unwrap()),
    )
}

#[test]
fn new_bye_goes_to_the_fewest_byes() {
    let (store, id) = strip_round_two(&[("P2", 1), ("P3", 1)]);
    let (bye, pair) = bye_and_new_pair(&store, id);
    assert_eq!(bye, common::player(&store, id, "P4"));
    assert_eq!(
        pair,
        (common::player(&store, id, "P2"), common::player(&store, id, "P3"))
    );
}

#[test]
fn equal_byes_fall_back_to_seed_order() {
    let (store, id) = strip_round_two(&[("P2", 1)]);
    let (bye, pair) = bye_and_new_pair(&store, id);
    assert_eq!(bye, common::player(&store, id, "P3"));
    assert_eq!(
        pair,
        (common::player(&store, id, "P2"), common::player(&store, id, "P4"))
    );

    let (store, id) = strip_round_two(&[]);
    let (bye, _) = bye_and_new_pair(&store, id);
    assert_eq!(bye, common::player(&store, id, "P2"));
}
