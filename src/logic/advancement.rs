//! Round advancement: close a completed round, fix up the next round's byes and
//! pairings against the current active set, and hand off to the final phase.

use crate::logic::elimination::sweep_eliminations;
use crate::logic::final_phase::{advance_final_phase, enter_final_phase};
use crate::logic::prizes::allocate_flat;
use crate::logic::results::apply_completed_match;
use crate::logic::setup::start_round;
use crate::models::{
    GameMatch, MatchId, MatchStatus, MatchUpdate, Money, PlayerId, PlayerStat, RoundId, RoundKind,
    RoundStatus, RoundWithMatches, TournamentError, TournamentId, TournamentStatus,
};
use crate::store::TournamentStore;
use serde::Serialize;
use std::collections::HashSet;

/// What a round boundary led to.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Some matches in the round are still pending.
    RoundIncomplete,
    /// The next round-robin round is in progress; `adjusted` if its matches changed.
    NextRound { round_id: RoundId, adjusted: bool },
    FinalPhaseStarted { round_id: RoundId },
    FinalPhaseContinued { round_id: RoundId },
    Completed {
        winner: Option<PlayerId>,
        final_award: Money,
    },
}

/// Advance past `round_id` if all of its matches are completed.
///
/// Safe to call repeatedly for the same boundary: a round whose successor is
/// already running is left as is.
pub fn advance_round<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    round_id: RoundId,
) -> Result<AdvanceOutcome, TournamentError> {
    store.transaction(tournament_id, |store| {
        let tournament = store.load_tournament(tournament_id)?;
        match tournament.status {
            TournamentStatus::Registration => return Err(TournamentError::InvalidState),
            TournamentStatus::Completed => {
                log::debug!("Tournament {} already completed", tournament_id);
                return Ok(AdvanceOutcome::Completed {
                    winner: tournament.winner,
                    final_award: tournament.final_award.unwrap_or_default(),
                });
            }
            TournamentStatus::InProgress => {}
        }

        let current = store.load_round(tournament_id, round_id)?;
        if !current.all_completed() {
            return Ok(AdvanceOutcome::RoundIncomplete);
        }

        // Catch up on results recorded without being applied.
        for m in current.matches.iter().filter(|m| !m.processed) {
            apply_completed_match(store, tournament_id, m.id)?;
        }
        sweep_eliminations(store, tournament_id, current.round.kind)?;
        let active = store.load_active_players(tournament_id)?;

        match current.round.kind {
            RoundKind::RoundRobin => advance_round_robin(store, tournament_id, &current, &active),
            RoundKind::FinalPhase => advance_final_phase(store, tournament_id, &current, &active),
        }
    })
}

fn advance_round_robin<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    current: &RoundWithMatches,
    active: &[PlayerStat],
) -> Result<AdvanceOutcome, TournamentError> {
    let tournament = store.load_tournament(tournament_id)?;
    let threshold = tournament.final_phase_threshold();
    let next = store
        .load_rounds(tournament_id)?
        .into_iter()
        .find(|r| r.kind == RoundKind::RoundRobin && r.sequence == current.round.sequence + 1);

    let next = match next {
        Some(next) if active.len() > threshold => next,
        Some(_) => return enter_final_phase(store, tournament_id, current.round.id),
        None => {
            log::info!("Round robin exhausted with {} players left", active.len());
            return enter_final_phase(store, tournament_id, current.round.id);
        }
    };

    if next.status != RoundStatus::Pending {
        log::debug!("{} already started; nothing to adjust", next.name);
        if current.round.status != RoundStatus::Completed {
            store.mark_round_status(tournament_id, current.round.id, RoundStatus::Completed)?;
        }
        return Ok(AdvanceOutcome::NextRound {
            round_id: next.id,
            adjusted: false,
        });
    }

    let upcoming = store.load_round(tournament_id, next.id)?;
    let adjusted = adjust_round(store, tournament_id, &upcoming, active)?;
    let adjusted = recompute_payouts(store, tournament_id, next.id)? || adjusted;
    ensure_only_active(&store.load_round(tournament_id, next.id)?, active)?;

    store.mark_round_status(tournament_id, current.round.id, RoundStatus::Completed)?;
    start_round(store, tournament_id, next.id)?;
    log::info!(
        "{} completed; {} started with {} active players{}",
        current.round.name,
        next.name,
        active.len(),
        if adjusted { " (adjusted)" } else { "" }
    );
    Ok(AdvanceOutcome::NextRound {
        round_id: next.id,
        adjusted,
    })
}

/// Reconcile a pending round's matches with the active set.
///
/// Drops matches with eliminated players, keeps at most one bye (none when the
/// active count is even), gives a new bye to the unscheduled player with the
/// fewest byes so far (then seed order) when needed, and pairs the remaining
/// unscheduled players in seed order. Returns whether anything changed.
///
/// Only players left without a match are bye candidates; pairings that are
/// still valid are never broken up to move the bye.
fn adjust_round<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    upcoming: &RoundWithMatches,
    active: &[PlayerStat],
) -> Result<bool, TournamentError> {
    let active_ids: HashSet<PlayerId> = active.iter().map(|s| s.player_id).collect();
    let mut keep: Vec<&GameMatch> = Vec::new();
    let mut delete: Vec<MatchId> = Vec::new();
    let mut bye_kept = false;

    for m in &upcoming.matches {
        let stale = m.players().any(|p| !active_ids.contains(&p));
        let surplus_bye = m.is_bye && (active.len() % 2 == 0 || bye_kept);
        if stale || surplus_bye {
            delete.push(m.id);
        } else {
            bye_kept |= m.is_bye;
            keep.push(m);
        }
    }

    let scheduled: HashSet<PlayerId> = keep.iter().flat_map(|m| m.players()).collect();
    let mut unscheduled: Vec<&PlayerStat> = active
        .iter()
        .filter(|s| !scheduled.contains(&s.player_id))
        .collect();

    let mut next_number = keep.iter().map(|m| m.match_number).max().unwrap_or(0) + 1;
    let mut bye_player = None;
    if unscheduled.len() % 2 == 1 {
        let idx = unscheduled
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| (s.byes, s.seed))
            .map(|(i, _)| i)
            .ok_or_else(|| TournamentError::InvariantViolation("no bye candidate".into()))?;
        bye_player = Some(unscheduled.remove(idx).player_id);
    }

    let mut added: Vec<GameMatch> = Vec::new();
    for pair in unscheduled.chunks_exact(2) {
        added.push(GameMatch::new(
            upcoming.round.id,
            next_number,
            pair[0].player_id,
            pair[1].player_id,
        ));
        next_number += 1;
    }
    if let Some(p) = bye_player {
        added.push(GameMatch::bye(upcoming.round.id, next_number, p));
    }

    if delete.is_empty() && added.is_empty() {
        return Ok(false);
    }
    log::info!(
        "{}: removed {} match(es), added {}",
        upcoming.round.name,
        delete.len(),
        added.len()
    );
    store.delete_matches(tournament_id, &delete)?;
    store.save_matches(tournament_id, added)?;
    Ok(true)
}

/// Re-run flat allocation over the round's fixed pool; writes only changed amounts.
fn recompute_payouts<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    round_id: RoundId,
) -> Result<bool, TournamentError> {
    let round = store.load_round(tournament_id, round_id)?;
    let mut matches = round.matches.clone();
    allocate_flat(round.round.prize_pool, &mut matches)?;

    let mut changed = false;
    for (before, after) in round.matches.iter().zip(&matches) {
        if before.payout_amount == after.payout_amount {
            continue;
        }
        if before.status != MatchStatus::Pending {
            return Err(TournamentError::InvariantViolation(format!(
                "payout of completed match {} would change",
                before.id
            )));
        }
        store.update_match(
            tournament_id,
            before.id,
            &MatchUpdate {
                payout_amount: Some(after.payout_amount),
                ..MatchUpdate::default()
            },
        )?;
        changed = true;
    }
    Ok(changed)
}

/// Every player in `round` must be active.
pub(crate) fn ensure_only_active(round: &RoundWithMatches, active: &[PlayerStat]) -> Result<(), TournamentError> {
    let active_ids: HashSet<PlayerId> = active.iter().map(|s| s.player_id).collect();
    if let Some(p) = round
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Pending)
        .flat_map(|m| m.players())
        .find(|p| !active_ids.contains(p))
    {
        log::warn!("Eliminated player {} scheduled in {}", p, round.round.name);
        return Err(TournamentError::InvariantViolation(format!(
            "player {p} is not active but scheduled in {}",
            round.round.name
        )));
    }
    Ok(())
}
