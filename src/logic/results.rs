//! Match result processing: record an outcome and apply it to player stats exactly once.

use crate::models::{
    GameMatch, MatchId, MatchStatus, MatchUpdate, PlayerId, PlayerStat, RoundKind, RoundStatus,
    StatUpdate, TournamentError, TournamentId, TournamentStatus,
};
use crate::store::TournamentStore;
use serde::{Deserialize, Serialize};

/// A submitted result. `loser` is omitted for byes and may be omitted for
/// regular matches (it is then the other player).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: MatchId,
    pub winner: PlayerId,
    #[serde(default)]
    pub loser: Option<PlayerId>,
    #[serde(default)]
    pub score: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOutcome {
    Applied,
    /// The match was already applied; nothing changed.
    AlreadyProcessed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessedMatch {
    pub outcome: ProcessOutcome,
    pub game: GameMatch,
    pub kind: RoundKind,
    /// Current stats of the match's players (winner first).
    pub stats: Vec<PlayerStat>,
}

/// Record `result` on its match and apply it to player stats.
///
/// A second call for the same match is a no-op that reports
/// [`ProcessOutcome::AlreadyProcessed`].
pub fn process_match_result<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    result: &MatchResult,
) -> Result<ProcessedMatch, TournamentError> {
    let game = store.load_match(tournament_id, result.match_id)?;
    if game.processed {
        return already_processed(store, tournament_id, game);
    }

    let tournament = store.load_tournament(tournament_id)?;
    if tournament.status != TournamentStatus::InProgress {
        return Err(TournamentError::InvalidState);
    }
    let round = store.load_round(tournament_id, game.round_id)?.round;
    if round.status != RoundStatus::InProgress {
        return Err(TournamentError::InvalidState);
    }

    let loser = resolve_loser(&game, result)?;
    if game.is_completed() {
        // Completed but unprocessed: the recorded outcome stands.
        if game.winner != Some(result.winner) {
            return Err(TournamentError::InvalidResult(
                "match already has a different recorded winner".into(),
            ));
        }
    } else {
        let score = if result.score.trim().is_empty() && game.is_bye {
            "BYE".to_string()
        } else {
            result.score.trim().to_string()
        };
        store.update_match(
            tournament_id,
            game.id,
            &MatchUpdate {
                status: Some(MatchStatus::Completed),
                winner: Some(result.winner),
                loser,
                score: Some(score),
                ..MatchUpdate::default()
            },
        )?;
    }

    apply_completed_match(store, tournament_id, game.id)
}

/// Apply a completed match's recorded outcome to stats if not yet applied.
/// Used directly by the reconciliation sweep.
pub fn apply_completed_match<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
) -> Result<ProcessedMatch, TournamentError> {
    let game = store.load_match(tournament_id, match_id)?;
    if game.processed {
        return already_processed(store, tournament_id, game);
    }
    let winner = match (game.status, game.winner) {
        (MatchStatus::Completed, Some(w)) => w,
        _ => {
            return Err(TournamentError::InvalidResult(
                "match has no recorded winner".into(),
            ))
        }
    };
    let loser = recorded_loser(&game, winner)?;
    let kind = store.load_round(tournament_id, game.round_id)?.round.kind;

    let mut winner_update = StatUpdate {
        add_payout: game.payout_amount,
        ..StatUpdate::default()
    };
    match kind {
        RoundKind::RoundRobin => winner_update.add_wins = 1,
        RoundKind::FinalPhase => winner_update.add_koh_wins = 1,
    }
    if game.is_bye {
        winner_update.add_byes = 1;
    }
    // Check both players exist before the first write.
    store.load_player_stat(tournament_id, winner)?;
    if let Some(loser) = loser {
        store.load_player_stat(tournament_id, loser)?;
    }

    let mut stats = vec![store.update_player_stat(tournament_id, winner, &winner_update)?];
    if let Some(loser) = loser {
        let loser_update = match kind {
            RoundKind::RoundRobin => StatUpdate {
                add_losses: 1,
                ..StatUpdate::default()
            },
            RoundKind::FinalPhase => StatUpdate {
                add_koh_losses: 1,
                ..StatUpdate::default()
            },
        };
        stats.push(store.update_player_stat(tournament_id, loser, &loser_update)?);
    }

    let game = store.update_match(
        tournament_id,
        game.id,
        &MatchUpdate {
            loser,
            processed: Some(true),
            ..MatchUpdate::default()
        },
    )?;
    log::debug!(
        "Applied match {} (winner {}, payout {})",
        game.id,
        winner,
        game.payout_amount
    );
    Ok(ProcessedMatch {
        outcome: ProcessOutcome::Applied,
        game,
        kind,
        stats,
    })
}

fn already_processed<S: TournamentStore>(
    store: &S,
    tournament_id: TournamentId,
    game: GameMatch,
) -> Result<ProcessedMatch, TournamentError> {
    log::debug!("Match {} already processed; skipping", game.id);
    let kind = store.load_round(tournament_id, game.round_id)?.round.kind;
    let mut stats = Vec::new();
    for pid in game.winner.into_iter().chain(game.loser) {
        stats.push(store.load_player_stat(tournament_id, pid)?);
    }
    Ok(ProcessedMatch {
        outcome: ProcessOutcome::AlreadyProcessed,
        game,
        kind,
        stats,
    })
}

/// Loser implied by a stored outcome. The recorded winner must play the match,
/// and a recorded loser, if any, must be the other player.
fn recorded_loser(game: &GameMatch, winner: PlayerId) -> Result<Option<PlayerId>, TournamentError> {
    if !game.involves(winner) {
        log::warn!("Match {} records winner {} who is not playing it", game.id, winner);
        return Err(TournamentError::InvalidResult(format!(
            "recorded winner of match {} is not playing it",
            game.id
        )));
    }
    if game.is_bye {
        return match game.loser {
            Some(_) => Err(TournamentError::InvalidResult(format!(
                "bye {} records a loser",
                game.id
            ))),
            None => Ok(None),
        };
    }
    let other = game
        .players()
        .find(|p| *p != winner)
        .ok_or_else(|| TournamentError::InvalidResult(format!("match {} has a single player", game.id)))?;
    match game.loser {
        Some(loser) if loser != other => Err(TournamentError::InvalidResult(format!(
            "recorded loser of match {} is not the winner's opponent",
            game.id
        ))),
        _ => Ok(Some(other)),
    }
}

/// Validate winner/loser against the match and return the loser.
fn resolve_loser(game: &GameMatch, result: &MatchResult) -> Result<Option<PlayerId>, TournamentError> {
    if game.is_bye {
        if result.winner != game.player_one {
            return Err(TournamentError::InvalidResult(
                "bye winner must be the bye's player".into(),
            ));
        }
        if result.loser.is_some() {
            return Err(TournamentError::InvalidResult("a bye has no loser".into()));
        }
        return Ok(None);
    }
    if !game.involves(result.winner) {
        return Err(TournamentError::InvalidResult(
            "winner is not playing this match".into(),
        ));
    }
    let other = game
        .players()
        .find(|p| *p != result.winner)
        .ok_or_else(|| TournamentError::InvalidResult("match has a single player".into()))?;
    match result.loser {
        Some(loser) if loser != other => Err(TournamentError::InvalidResult(
            "loser is not the winner's opponent".into(),
        )),
        _ => Ok(Some(other)),
    }
}
