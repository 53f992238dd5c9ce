//! Final phase ("Cash Climb"): transition from round robin, winner-stays-on
//! scheduling, escalating payouts, and crowning the champion.

use crate::logic::advancement::{ensure_only_active, AdvanceOutcome};
use crate::logic::prizes::{escalating_schedule, ensure_within_pool, paid_out};
use crate::logic::setup::start_round;
use crate::models::{
    FinalPhase, GameMatch, MatchStatus, PlayerId, PlayerStat, Round, RoundId, RoundKind, RoundStatus,
    RoundWithMatches, StatUpdate, Tournament, TournamentError, TournamentId,
};
use crate::store::TournamentStore;
use chrono::Utc;
use rust_decimal::Decimal;

/// Switch from round robin to the final phase after `from_round`.
///
/// Unplayed round-robin rounds are skipped, survivors are re-seeded by
/// standings with `koh_wins = wins` and `koh_losses = 0`, the escalating
/// schedule is computed once over `pool − paid − first place`, and the first
/// phase round is scheduled. With fewer than two survivors the tournament is
/// already decided and is completed instead.
pub fn enter_final_phase<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    from_round: RoundId,
) -> Result<AdvanceOutcome, TournamentError> {
    let mut tournament = store.load_tournament(tournament_id)?;
    if tournament.final_phase.is_some() {
        log::debug!("Final phase already started for {}", tournament_id);
        let latest = latest_final_round(store, tournament_id)?.ok_or_else(|| {
            TournamentError::InvariantViolation("final phase has no rounds".into())
        })?;
        return Ok(AdvanceOutcome::FinalPhaseStarted {
            round_id: latest.round.id,
        });
    }

    store.mark_round_status(tournament_id, from_round, RoundStatus::Completed)?;
    skip_unplayed_rounds(store, tournament_id)?;

    let active = store.load_active_players(tournament_id)?;
    if active.len() < 2 {
        log::info!(
            "{} player(s) left at the transition; tournament decided",
            active.len()
        );
        return complete_tournament(store, tournament_id, active.first().map(|s| s.player_id));
    }

    let mut seeded = active.clone();
    seeded.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.total_payout.cmp(&a.total_payout))
            .then_with(|| a.seed.cmp(&b.seed))
    });
    for (idx, stat) in seeded.iter().enumerate() {
        store.update_player_stat(
            tournament_id,
            stat.player_id,
            &StatUpdate {
                enter_final_phase: Some((stat.wins, idx as u32)),
                ..StatUpdate::default()
            },
        )?;
    }

    let paid = paid_out(store, tournament_id)?;
    let pool = tournament.prizes.total_prize_pool - paid - tournament.prizes.first_place_prize;
    if pool < Decimal::ZERO {
        log::warn!("Round robin overpaid: {} paid of {}", paid, tournament.prizes.total_prize_pool);
        return Err(TournamentError::InvariantViolation(format!(
            "final phase pool is negative ({pool})"
        )));
    }
    let schedule = escalating_schedule(pool, active.len())?;
    tournament.final_phase = Some(FinalPhase::new(pool, schedule));
    let round_id = schedule_final_round(store, &mut tournament)?;
    log::info!(
        "Cash Climb started for {} with {} players, pool {}",
        tournament.name,
        active.len(),
        pool
    );
    Ok(AdvanceOutcome::FinalPhaseStarted { round_id })
}

/// Close a completed final-phase round: crown the sole survivor or schedule
/// the next phase round.
pub(crate) fn advance_final_phase<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    current: &RoundWithMatches,
    active: &[PlayerStat],
) -> Result<AdvanceOutcome, TournamentError> {
    if current.round.status != RoundStatus::Completed {
        store.mark_round_status(tournament_id, current.round.id, RoundStatus::Completed)?;
    }
    let later = store
        .load_rounds(tournament_id)?
        .into_iter()
        .find(|r| r.kind == RoundKind::FinalPhase && r.sequence > current.round.sequence);
    if let Some(later) = later {
        log::debug!("{} already scheduled", later.name);
        return Ok(AdvanceOutcome::FinalPhaseContinued { round_id: later.id });
    }

    if active.len() <= 1 {
        return complete_tournament(store, tournament_id, active.first().map(|s| s.player_id));
    }
    let mut tournament = store.load_tournament(tournament_id)?;
    let round_id = schedule_final_round(store, &mut tournament)?;
    Ok(AdvanceOutcome::FinalPhaseContinued { round_id })
}

/// Create and start the next phase round, assigning escalating slots to its
/// matches in order.
fn schedule_final_round<S: TournamentStore>(
    store: &mut S,
    tournament: &mut Tournament,
) -> Result<RoundId, TournamentError> {
    let tournament_id = tournament.id;
    let mut active = store.load_active_players(tournament_id)?;
    active.sort_by_key(|s| (s.final_seed.unwrap_or(u32::MAX), s.seed));
    let previous = last_final_match(store, tournament_id)?;

    let phase = tournament
        .final_phase
        .as_mut()
        .ok_or_else(|| TournamentError::InvariantViolation("final phase not started".into()))?;
    let sequence = phase.rounds_played + 1;
    let pairings = final_pairings(previous.as_ref(), &active, sequence);
    if pairings.is_empty() {
        return Err(TournamentError::InvariantViolation(format!(
            "no final phase pairing for {} players",
            active.len()
        )));
    }

    let mut round = Round::new(tournament_id, RoundKind::FinalPhase, sequence, Decimal::ZERO);
    let mut matches = Vec::with_capacity(pairings.len());
    for (idx, (a, b)) in pairings.into_iter().enumerate() {
        let slot = phase.schedule.get(phase.next_slot).copied().ok_or_else(|| {
            TournamentError::InvariantViolation("escalating schedule exhausted".into())
        })?;
        phase.next_slot += 1;
        let mut game = GameMatch::new(round.id, idx as u32 + 1, a, b);
        game.payout_amount = slot;
        round.prize_pool += slot;
        matches.push(game);
    }
    phase.rounds_played = sequence;

    store.save_round(&round)?;
    store.save_matches(tournament_id, matches)?;
    store.save_tournament(tournament)?;
    ensure_only_active(&store.load_round(tournament_id, round.id)?, &active)?;
    start_round(store, tournament_id, round.id)?;
    log::info!("{} scheduled with {} active players", round.name, active.len());
    Ok(round.id)
}

/// Pairings for a phase round among `active` (in final seed order).
///
/// - 2 players: one direct match.
/// - 3 players: winner stays on; the standing winner faces whoever sat out the
///   previous match. Without a previous result the top two seeds play.
/// - 4 or more: consecutive pairs, the order rotating by one each phase round;
///   with an odd count the last player sits out.
pub fn final_pairings(
    previous: Option<&GameMatch>,
    active: &[PlayerStat],
    phase_round: u32,
) -> Vec<(PlayerId, PlayerId)> {
    let mut ids: Vec<PlayerId> = active.iter().map(|s| s.player_id).collect();
    match ids.len() {
        0 | 1 => Vec::new(),
        2 => vec![(ids[0], ids[1])],
        3 => {
            let standing = previous
                .and_then(|m| m.winner)
                .filter(|w| ids.contains(w));
            match standing {
                Some(champ) => {
                    let sat_out = ids
                        .iter()
                        .copied()
                        .filter(|p| *p != champ)
                        .find(|p| !previous.is_some_and(|m| m.involves(*p)));
                    let challenger =
                        sat_out.or_else(|| ids.iter().copied().find(|p| *p != champ));
                    challenger.map(|c| vec![(champ, c)]).unwrap_or_default()
                }
                None => vec![(ids[0], ids[1])],
            }
        }
        len => {
            ids.rotate_left((phase_round.saturating_sub(1) as usize) % len);
            ids.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
        }
    }
}

/// Crown `champion` (if any): award every unassigned escalating slot (plus the
/// first-place prize when configured) and mark the tournament completed.
pub(crate) fn complete_tournament<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    champion: Option<PlayerId>,
) -> Result<AdvanceOutcome, TournamentError> {
    let mut tournament = store.load_tournament(tournament_id)?;
    let award = match tournament.final_phase.as_mut() {
        Some(phase) => {
            let remaining = phase.unassigned();
            phase.next_slot = phase.schedule.len();
            remaining
        }
        None => {
            tournament.prizes.total_prize_pool
                - paid_out(store, tournament_id)?
                - tournament.prizes.first_place_prize
        }
    };
    if award < Decimal::ZERO {
        return Err(TournamentError::InvariantViolation(format!(
            "final award is negative ({award})"
        )));
    }

    match champion {
        Some(champ) => {
            let mut payout = award;
            if tournament.prizes.award_first_place_prize {
                payout += tournament.prizes.first_place_prize;
            }
            store.update_player_stat(
                tournament_id,
                champ,
                &StatUpdate {
                    add_payout: payout,
                    ..StatUpdate::default()
                },
            )?;
        }
        None => log::warn!("No champion for {}; {} left undistributed", tournament_id, award),
    }

    tournament.winner = champion;
    tournament.final_award = Some(award);
    store.save_tournament(&tournament)?;
    store.mark_tournament_completed(tournament_id, Utc::now())?;
    ensure_within_pool(store, tournament_id)?;
    log::info!(
        "{} completed; champion {:?} awarded {}",
        tournament.name,
        champion,
        award
    );
    Ok(AdvanceOutcome::Completed {
        winner: champion,
        final_award: award,
    })
}

/// Drop unplayed round-robin rounds once the final phase begins.
fn skip_unplayed_rounds<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
) -> Result<(), TournamentError> {
    for round in store.load_rounds(tournament_id)? {
        if round.kind != RoundKind::RoundRobin || round.status != RoundStatus::Pending {
            continue;
        }
        let pending: Vec<_> = store
            .load_round(tournament_id, round.id)?
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Pending)
            .map(|m| m.id)
            .collect();
        store.delete_matches(tournament_id, &pending)?;
        store.mark_round_status(tournament_id, round.id, RoundStatus::Skipped)?;
    }
    Ok(())
}

fn latest_final_round<S: TournamentStore>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<Option<RoundWithMatches>, TournamentError> {
    let latest = store
        .load_rounds(tournament_id)?
        .into_iter()
        .filter(|r| r.kind == RoundKind::FinalPhase)
        .max_by_key(|r| r.sequence);
    match latest {
        Some(r) => store.load_round(tournament_id, r.id).map(Some),
        None => Ok(None),
    }
}

/// Most recent completed final-phase match.
fn last_final_match<S: TournamentStore>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<Option<GameMatch>, TournamentError> {
    Ok(latest_final_round(store, tournament_id)?.and_then(|round| {
        round
            .matches
            .into_iter()
            .filter(|m| m.is_completed())
            .max_by_key(|m| m.match_number)
    }))
}
