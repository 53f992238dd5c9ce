//! Result submission: processor, elimination tracker and round advancement in one transaction.

use crate::logic::advancement::{advance_round, AdvanceOutcome};
use crate::logic::elimination::apply_eliminations;
use crate::logic::prizes::ensure_within_pool;
use crate::logic::results::{process_match_result, MatchResult, ProcessOutcome};
use crate::models::{PlayerStat, TournamentError, TournamentId};
use crate::store::TournamentStore;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub outcome: ProcessOutcome,
    /// Stats of the match's players after the result (winner first).
    pub stats: Vec<PlayerStat>,
    pub eliminated: Vec<PlayerStat>,
    /// Present when the result completed its round.
    pub advancement: Option<AdvanceOutcome>,
}

/// Submit one match result. Nothing is written unless every step succeeds.
pub fn submit_result<S: TournamentStore>(
    store: &mut S,
    tournament_id: TournamentId,
    result: &MatchResult,
) -> Result<SubmissionReport, TournamentError> {
    store.transaction(tournament_id, |store| {
        let processed = process_match_result(store, tournament_id, result)?;
        if processed.outcome == ProcessOutcome::AlreadyProcessed {
            return Ok(SubmissionReport {
                outcome: processed.outcome,
                stats: processed.stats,
                eliminated: Vec::new(),
                advancement: None,
            });
        }

        let players: Vec<_> = processed.game.players().collect();
        let eliminated = apply_eliminations(store, tournament_id, processed.kind, &players)?;

        let round = store.load_round(tournament_id, processed.game.round_id)?;
        let advancement = if round.all_completed() {
            Some(advance_round(store, tournament_id, round.round.id)?)
        } else {
            None
        };
        ensure_within_pool(store, tournament_id)?;

        let mut stats = Vec::with_capacity(processed.stats.len());
        for s in &processed.stats {
            stats.push(store.load_player_stat(tournament_id, s.player_id)?);
        }
        Ok(SubmissionReport {
            outcome: processed.outcome,
            stats,
            eliminated,
            advancement,
        })
    })
}
