//! Elimination tracking: flag players whose phase loss counter reached the threshold.

use crate::models::{PlayerId, PlayerStat, RoundKind, StatUpdate, TournamentError, TournamentId};
use crate::store::TournamentStore;
use chrono::Utc;

/// Re-evaluate `candidates` after a match in a `kind` round. Returns players
/// newly eliminated by this call. Already-eliminated players are left alone.
pub fn apply_eliminations<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    kind: RoundKind,
    candidates: &[PlayerId],
) -> Result<Vec<PlayerStat>, TournamentError> {
    let threshold = store.load_tournament(tournament_id)?.rules.threshold(kind);
    let mut eliminated = Vec::new();
    for &pid in candidates {
        let stat = store.load_player_stat(tournament_id, pid)?;
        let losses = match kind {
            RoundKind::RoundRobin => stat.losses,
            RoundKind::FinalPhase => stat.koh_losses,
        };
        if stat.eliminated || losses < threshold {
            continue;
        }
        let update = StatUpdate {
            eliminated_at: Some(Utc::now()),
            ..StatUpdate::default()
        };
        let stat = store.update_player_stat(tournament_id, pid, &update)?;
        log::info!(
            "{} eliminated with {} losses ({:?})",
            stat.name,
            losses,
            kind
        );
        eliminated.push(stat);
    }
    Ok(eliminated)
}

/// Re-evaluate every active player.
pub fn sweep_eliminations<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    kind: RoundKind,
) -> Result<Vec<PlayerStat>, TournamentError> {
    let active: Vec<PlayerId> = store
        .load_active_players(tournament_id)?
        .iter()
        .map(|s| s.player_id)
        .collect();
    apply_eliminations(store, tournament_id, kind, &active)
}
