//! Periodic consistency repair: apply completed-but-unprocessed matches and
//! advance a round left complete but not advanced.

use crate::logic::advancement::{advance_round, AdvanceOutcome};
use crate::logic::elimination::apply_eliminations;
use crate::logic::results::{apply_completed_match, ProcessOutcome};
use crate::models::{MatchId, PlayerId, RoundStatus, TournamentError, TournamentId, TournamentStatus};
use crate::store::TournamentStore;
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub processed: Vec<MatchId>,
    pub eliminated: Vec<PlayerId>,
    pub advancement: Option<AdvanceOutcome>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.processed.is_empty() && self.eliminated.is_empty() && self.advancement.is_none()
    }
}

/// Idempotent sweep over one tournament.
pub fn reconcile<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
) -> Result<ReconcileReport, TournamentError> {
    store.transaction(tournament_id, |store| {
        let mut report = ReconcileReport::default();
        if store.load_tournament(tournament_id)?.status != TournamentStatus::InProgress {
            return Ok(report);
        }

        let backlog: Vec<MatchId> = store
            .load_matches(tournament_id)?
            .iter()
            .filter(|m| m.is_completed() && !m.processed)
            .map(|m| m.id)
            .collect();
        for match_id in backlog {
            let processed = apply_completed_match(store, tournament_id, match_id)?;
            if processed.outcome != ProcessOutcome::Applied {
                continue;
            }
            report.processed.push(match_id);
            let players: Vec<_> = processed.game.players().collect();
            let eliminated = apply_eliminations(store, tournament_id, processed.kind, &players)?;
            report.eliminated.extend(eliminated.iter().map(|s| s.player_id));
        }

        if let Some(current) = store.load_current_round(tournament_id)? {
            if current.round.status == RoundStatus::InProgress && current.all_completed() {
                report.advancement = Some(advance_round(store, tournament_id, current.round.id)?);
            }
        }
        if !report.is_noop() {
            log::info!(
                "Reconciled tournament {}: {} match(es) applied, {} eliminated",
                tournament_id,
                report.processed.len(),
                report.eliminated.len()
            );
        }
        Ok(report)
    })
}
