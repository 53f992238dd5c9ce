//! Integration tests for round-robin schedule generation.

mod common;

use ladder_tournament_web::logic::{round_count, round_robin_schedule};
use ladder_tournament_web::{
    generate_bracket, Multiplicity, PlayerId, RoundKind, RoundStatus, TournamentError,
    TournamentStatus, TournamentStore,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

fn ids(n: usize) -> Vec<PlayerId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

#[test]
fn rejects_fewer_than_two_players() {
    assert_eq!(
        round_robin_schedule(&ids(1), Multiplicity::Single),
        Err(TournamentError::InsufficientPlayers { found: 1 })
    );
    assert_eq!(
        round_robin_schedule(&[], Multiplicity::Double),
        Err(TournamentError::InsufficientPlayers { found: 0 })
    );
}

#[test]
fn every_pair_meets_once_per_cycle() {
    for n in 2..=11 {
        for multiplicity in [Multiplicity::Single, Multiplicity::Double, Multiplicity::Triple] {
            let players = ids(n);
            let rounds = round_robin_schedule(&players, multiplicity).unwrap();
            let m = multiplicity.cycles();
            let expected = if n % 2 == 0 { m * (n - 1) } else { m * n };
            assert_eq!(rounds.len(), expected, "n={n} m={m}");
            assert_eq!(round_count(n, multiplicity), expected);

            let mut meetings: HashMap<(PlayerId, PlayerId), usize> = HashMap::new();
            for round in &rounds {
                assert_eq!(round.pairings.len(), n / 2);
                assert_eq!(round.bye.is_some(), n % 2 == 1);
                // Everyone appears exactly once per round.
                let mut seen = HashSet::new();
                for (a, b) in &round.pairings {
                    assert_ne!(a, b);
                    assert!(seen.insert(*a) && seen.insert(*b));
                    let key = if a < b { (*a, *b) } else { (*b, *a) };
                    *meetings.entry(key).or_default() += 1;
                }
                if let Some(bye) = round.bye {
                    assert!(seen.insert(bye));
                }
                assert_eq!(seen.len(), n);
            }
            assert_eq!(meetings.len(), n * (n - 1) / 2);
            assert!(meetings.values().all(|&count| count == m), "n={n} m={m}");
        }
    }
}

#[test]
fn byes_are_spread_evenly_in_seed_order() {
    for n in [3, 5, 7, 9] {
        let players = ids(n);
        let rounds = round_robin_schedule(&players, Multiplicity::Triple).unwrap();
        let byes: Vec<PlayerId> = rounds.iter().filter_map(|r| r.bye).collect();
        // First cycle hands out byes in seed order.
        assert_eq!(&byes[..n], &players[..]);
        let mut counts: HashMap<PlayerId, usize> = HashMap::new();
        for b in byes {
            *counts.entry(b).or_default() += 1;
        }
        assert!(counts.values().all(|&c| c == 3));
    }
}

#[test]
fn later_cycles_swap_sides() {
    let players = ids(4);
    let rounds = round_robin_schedule(&players, Multiplicity::Double).unwrap();
    let (first, second) = rounds.split_at(3);
    for (a, b) in first.iter().zip(second) {
        let flipped: Vec<_> = b.pairings.iter().map(|(x, y)| (*y, *x)).collect();
        assert_eq!(a.pairings, flipped);
    }
}

#[test]
fn five_players_single_round_robin_bracket() {
    let (store, id) = common::started(5, Multiplicity::Single);
    let rounds = store.load_rounds(id).unwrap();
    assert_eq!(rounds.len(), 5);

    let mut bye_players = Vec::new();
    for round in &rounds {
        assert_eq!(round.kind, RoundKind::RoundRobin);
        let full = store.load_round(id, round.id).unwrap();
        assert_eq!(full.matches.iter().filter(|m| !m.is_bye).count(), 2);
        let byes: Vec<_> = full.matches.iter().filter(|m| m.is_bye).collect();
        assert_eq!(byes.len(), 1);
        assert!(byes[0].player_two.is_none());
        bye_players.push(byes[0].player_one);
    }
    let expected: Vec<PlayerId> = (0..5)
        .map(|i| common::player(&store, id, &format!("P{i}")))
        .collect();
    assert_eq!(bye_players, expected);
}

#[test]
fn six_players_double_round_robin_bracket() {
    let (store, id) = common::started(6, Multiplicity::Double);
    let rounds = store.load_rounds(id).unwrap();
    assert_eq!(rounds.len(), 10);
    for round in &rounds {
        let full = store.load_round(id, round.id).unwrap();
        assert_eq!(full.matches.len(), 3);
        assert!(full.matches.iter().all(|m| !m.is_bye));
    }
    assert_eq!(rounds[0].status, RoundStatus::InProgress);
    assert!(rounds[1..].iter().all(|r| r.status == RoundStatus::Pending));

    let t = store.load_tournament(id).unwrap();
    assert_eq!(t.status, TournamentStatus::InProgress);
    assert_eq!(t.original_player_count, 6);
    assert_eq!(store.load_all_player_stats(id).unwrap().len(), 6);
}

#[test]
fn bracket_needs_two_registered_players() {
    let (mut store, id) = common::registered(1, Multiplicity::Single);
    assert_eq!(
        generate_bracket(&mut store, id, false).unwrap_err(),
        TournamentError::InsufficientPlayers { found: 1 }
    );
    // Rolled back: still in registration, no stats.
    let t = store.load_tournament(id).unwrap();
    assert_eq!(t.status, TournamentStatus::Registration);
    assert!(store.load_all_player_stats(id).unwrap().is_empty());
}

#[test]
fn bracket_cannot_be_generated_twice() {
    let (mut store, id) = common::started(4, Multiplicity::Single);
    assert_eq!(
        generate_bracket(&mut store, id, true).unwrap_err(),
        TournamentError::InvalidState
    );
}

#[test]
fn shuffled_bracket_keeps_every_player() {
    let (mut store, id) = common::registered(8, Multiplicity::Single);
    generate_bracket(&mut store, id, true).unwrap();
    let t = store.load_tournament(id).unwrap();
    let stats = store.load_all_player_stats(id).unwrap();
    assert_eq!(stats.len(), 8);
    for (seed, p) in t.registered.iter().enumerate() {
        assert_eq!(stats[seed].player_id, p.id);
        assert_eq!(stats[seed].seed, seed as u32);
    }
}

#[test]
fn generated_bracket_has_the_expected_round_count() {
    for n in [2, 3, 7, 10] {
        for multiplicity in [Multiplicity::Single, Multiplicity::Triple] {
            let (store, id) = common::started(n, multiplicity);
            let rounds = store.load_rounds(id).unwrap();
            assert_eq!(rounds.len(), round_count(n, multiplicity), "n={n}");
        }
    }
}
