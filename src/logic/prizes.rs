//! Prize allocation: flat per-round payouts and the escalating final-phase schedule.
//!
//! All amounts are cents-snapped `Decimal`s; both modes conserve their pool exactly.

use crate::models::{
    floor_cents, round_cents, GameMatch, Money, TournamentError, TournamentId, TournamentStatus,
};
use crate::store::TournamentStore;
use rust_decimal::Decimal;

/// Flat per-match rates for one round.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FlatRates {
    pub per_match: Money,
    pub per_bye: Money,
}

/// Rates for `regular` matches and `byes` bye matches sharing `pool`; a bye weighs half.
pub fn flat_rates(pool: Money, regular: usize, byes: usize) -> FlatRates {
    let units = Decimal::from(regular as u64) + Decimal::from(byes as u64) / Decimal::TWO;
    if units.is_zero() {
        return FlatRates {
            per_match: Decimal::ZERO,
            per_bye: Decimal::ZERO,
        };
    }
    let per_match = floor_cents(pool / units);
    FlatRates {
        per_match,
        per_bye: floor_cents(per_match / Decimal::TWO),
    }
}

/// Set `payout_amount` on every match so the round sums to `pool` exactly.
///
/// The flooring remainder goes to the last regular match, or the last match
/// when the round only holds byes.
pub fn allocate_flat(pool: Money, matches: &mut [GameMatch]) -> Result<(), TournamentError> {
    if matches.is_empty() {
        return Ok(());
    }
    let byes = matches.iter().filter(|m| m.is_bye).count();
    let rates = flat_rates(pool, matches.len() - byes, byes);
    for m in matches.iter_mut() {
        m.payout_amount = if m.is_bye { rates.per_bye } else { rates.per_match };
    }

    let distributed: Money = matches.iter().map(|m| m.payout_amount).sum();
    let remainder = pool - distributed;
    if remainder < Decimal::ZERO {
        return Err(TournamentError::InvariantViolation(format!(
            "flat payouts {distributed} exceed round pool {pool}"
        )));
    }
    let absorber = match matches.iter().rposition(|m| !m.is_bye) {
        Some(idx) => idx,
        None => matches.len() - 1,
    };
    matches[absorber].payout_amount += remainder;

    let total: Money = matches.iter().map(|m| m.payout_amount).sum();
    if total != pool {
        log::warn!("Flat allocation drifted: {} vs pool {}", total, pool);
        return Err(TournamentError::InvariantViolation(format!(
            "flat payouts sum to {total}, round pool is {pool}"
        )));
    }
    Ok(())
}

/// Escalating payout slots for a final phase among `active_players`.
///
/// `2 × active_players` slots bound the match count under 2-loss elimination.
/// Slot weights rise linearly from 1.0 to 1.5; each slot is its share of `pool`
/// rounded to the cent and the last slot absorbs the remainder. A slot never
/// pushes the running total past the pool, so tiny pools cannot produce a
/// negative last slot.
pub fn escalating_schedule(pool: Money, active_players: usize) -> Result<Vec<Money>, TournamentError> {
    if pool < Decimal::ZERO {
        return Err(TournamentError::InvariantViolation(format!(
            "final phase pool is negative: {pool}"
        )));
    }
    let slots = active_players * 2;
    if slots == 0 {
        return Ok(Vec::new());
    }

    let half = Decimal::new(5, 1);
    let weights: Vec<Decimal> = (0..slots)
        .map(|i| {
            if slots == 1 {
                Decimal::ONE
            } else {
                Decimal::ONE + Decimal::from(i as u64) / Decimal::from((slots - 1) as u64) * half
            }
        })
        .collect();
    let weight_sum: Decimal = weights.iter().copied().sum();

    let mut payouts = Vec::with_capacity(slots);
    let mut running = Decimal::ZERO;
    for w in &weights[..slots - 1] {
        let share = round_cents(*w / weight_sum * pool).min(pool - running);
        running += share;
        payouts.push(share);
    }
    payouts.push(pool - running);
    Ok(payouts)
}

/// Total already paid to players of the tournament.
pub fn paid_out<S: TournamentStore>(store: &S, tournament_id: TournamentId) -> Result<Money, TournamentError> {
    Ok(store
        .load_all_player_stats(tournament_id)?
        .iter()
        .map(|s| s.total_payout)
        .sum())
}

/// Payouts never exceed the pool; the first-place reserve only counts once awarded.
pub fn ensure_within_pool<S: TournamentStore>(store: &S, tournament_id: TournamentId) -> Result<(), TournamentError> {
    let tournament = store.load_tournament(tournament_id)?;
    let paid = paid_out(store, tournament_id)?;
    let first_place_paid =
        tournament.status == TournamentStatus::Completed && tournament.prizes.award_first_place_prize;
    let limit = if first_place_paid {
        tournament.prizes.total_prize_pool
    } else {
        tournament.prizes.distributable()
    };
    if paid > limit {
        log::warn!("Tournament {} paid {} against a limit of {}", tournament_id, paid, limit);
        return Err(TournamentError::InvariantViolation(format!(
            "paid out {paid}, more than the {limit} available"
        )));
    }
    Ok(())
}
