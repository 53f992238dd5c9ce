//! Shared helpers for integration tests.
#![allow(dead_code)]

use ladder_tournament_web::models::cents;
use ladder_tournament_web::{
    generate_bracket, submit_result, AdvanceOutcome, EliminationRules, GameMatch, MatchResult,
    MemoryStore, Multiplicity, PlayerId, PrizeSettings, Tournament, TournamentId, TournamentStore,
};
use std::collections::HashMap;

/// Tournament with players P0..P{n-1} in registration, pool 1000.00 with 100.00 reserved.
pub fn registered(n: usize, multiplicity: Multiplicity) -> (MemoryStore, TournamentId) {
    let prizes = PrizeSettings::new(cents(100_000), cents(10_000));
    let mut t = Tournament::new("Friday Ladder", prizes, EliminationRules::default(), multiplicity).unwrap();
    for i in 0..n {
        t.register_player(format!("P{i}")).unwrap();
    }
    let id = t.id;
    let mut store = MemoryStore::new();
    store.save_tournament(&t).unwrap();
    (store, id)
}

/// Registered tournament with its bracket generated (seed order = registration order).
pub fn started(n: usize, multiplicity: Multiplicity) -> (MemoryStore, TournamentId) {
    let (mut store, id) = registered(n, multiplicity);
    generate_bracket(&mut store, id, false).unwrap();
    (store, id)
}

/// Player id by registration name.
pub fn player(store: &MemoryStore, id: TournamentId, name: &str) -> PlayerId {
    store
        .load_all_player_stats(id)
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap()
        .player_id
}

pub fn seeds(store: &MemoryStore, id: TournamentId) -> HashMap<PlayerId, u32> {
    store
        .load_all_player_stats(id)
        .unwrap()
        .iter()
        .map(|s| (s.player_id, s.seed))
        .collect()
}

/// Result where the better (lower) seed wins.
pub fn lower_seed_wins(seeds: &HashMap<PlayerId, u32>, m: &GameMatch) -> MatchResult {
    let other = m.player_two.unwrap();
    let (winner, loser) = if seeds[&m.player_one] < seeds[&other] {
        (m.player_one, other)
    } else {
        (other, m.player_one)
    };
    MatchResult {
        match_id: m.id,
        winner,
        loser: Some(loser),
        score: "3-1".into(),
    }
}

/// Play every pending match of the current round with the lower seed winning.
/// Returns the advancement triggered by the round's last result.
pub fn play_current_round(store: &mut MemoryStore, id: TournamentId) -> Option<AdvanceOutcome> {
    let round = store.load_current_round(id).unwrap()?;
    let seeds = seeds(store, id);
    let mut advancement = None;
    for m in round.matches.iter().filter(|m| !m.is_completed()) {
        let report = submit_result(store, id, &lower_seed_wins(&seeds, m)).unwrap();
        if report.advancement.is_some() {
            advancement = report.advancement;
        }
    }
    advancement
}
