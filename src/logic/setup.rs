//! Setup: turn the registered player list into a round-robin bracket and start round 1.

use crate::logic::prizes::allocate_flat;
use crate::logic::results::{process_match_result, MatchResult};
use crate::logic::schedule::{round_count, round_robin_schedule};
use crate::models::{
    floor_cents, GameMatch, MatchStatus, PlayerId, PlayerStat, Round, RoundId, RoundKind,
    RoundStatus, RoundWithMatches, TournamentError, TournamentId, TournamentStatus,
};
use crate::store::TournamentStore;
use rand::seq::SliceRandom;
use rust_decimal::Decimal;

/// Generate the bracket (Registration -> InProgress) and start the first round.
///
/// 1. Optionally shuffle the seed order.
/// 2. Create one `PlayerStat` per registered player.
/// 3. Create every round-robin round with flat payouts from the round-robin budget.
/// 4. Start round 1 (its bye, if any, is awarded immediately).
pub fn generate_bracket<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    shuffle: bool,
) -> Result<RoundWithMatches, TournamentError> {
    store.transaction(tournament_id, |store| {
        let mut tournament = store.load_tournament(tournament_id)?;
        if tournament.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState);
        }
        let n = tournament.registered.len();
        if n < 2 {
            return Err(TournamentError::InsufficientPlayers { found: n });
        }
        if shuffle {
            tournament.registered.shuffle(&mut rand::thread_rng());
        }

        let stats: Vec<PlayerStat> = tournament
            .registered
            .iter()
            .enumerate()
            .map(|(seed, p)| PlayerStat::new(tournament_id, p, seed as u32))
            .collect();
        let order: Vec<PlayerId> = tournament.registered.iter().map(|p| p.id).collect();
        let schedule = round_robin_schedule(&order, tournament.multiplicity)?;
        let expected = round_count(n, tournament.multiplicity);
        if schedule.len() != expected {
            log::warn!("Schedule for {} players has {} rounds", n, schedule.len());
            return Err(TournamentError::InvariantViolation(format!(
                "expected {expected} round-robin rounds, generated {}",
                schedule.len()
            )));
        }

        let budget = tournament.prizes.round_robin_budget();
        let per_round = floor_cents(budget / Decimal::from(schedule.len() as u64));

        tournament.status = TournamentStatus::InProgress;
        tournament.original_player_count = n as u32;
        store.save_tournament(&tournament)?;
        store.insert_player_stats(tournament_id, stats)?;

        let mut first_round = None;
        for (idx, scheduled) in schedule.iter().enumerate() {
            let round = Round::new(tournament_id, RoundKind::RoundRobin, idx as u32 + 1, per_round);
            let mut matches: Vec<GameMatch> = scheduled
                .pairings
                .iter()
                .enumerate()
                .map(|(i, (a, b))| GameMatch::new(round.id, i as u32 + 1, *a, *b))
                .collect();
            if let Some(p) = scheduled.bye {
                matches.push(GameMatch::bye(round.id, matches.len() as u32 + 1, p));
            }
            allocate_flat(round.prize_pool, &mut matches)?;
            store.save_round(&round)?;
            store.save_matches(tournament_id, matches)?;
            if first_round.is_none() {
                first_round = Some(round.id);
            }
        }

        let first_round = first_round.ok_or(TournamentError::InsufficientPlayers { found: n })?;
        log::info!(
            "Bracket generated for {}: {} players, {} rounds, {} per round",
            tournament.name,
            n,
            schedule.len(),
            per_round
        );
        start_round(store, tournament_id, first_round)?;
        store.load_round(tournament_id, first_round)
    })
}

/// Mark a round in progress and award its pending bye matches.
pub fn start_round<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    round_id: RoundId,
) -> Result<(), TournamentError> {
    store.mark_round_status(tournament_id, round_id, RoundStatus::InProgress)?;
    let round = store.load_round(tournament_id, round_id)?;
    for bye in round
        .matches
        .iter()
        .filter(|m| m.is_bye && m.status == MatchStatus::Pending)
    {
        process_match_result(
            store,
            tournament_id,
            &MatchResult {
                match_id: bye.id,
                winner: bye.player_one,
                loser: None,
                score: "BYE".into(),
            },
        )?;
    }
    Ok(())
}
