//! Persistence boundary: the record-store contract the engine runs against.
//!
//! The engine never holds records across calls; every step loads what it needs,
//! writes through this trait, and relies on [`TournamentStore::transaction`] for
//! all-or-nothing semantics per advancement step.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    GameMatch, MatchId, MatchUpdate, PlayerId, PlayerStat, Round, RoundId, RoundStatus,
    RoundWithMatches, StatUpdate, Tournament, TournamentError, TournamentId,
};
use chrono::{DateTime, Utc};

pub trait TournamentStore {
    fn load_tournament(&self, tournament_id: TournamentId) -> Result<Tournament, TournamentError>;

    /// Insert or replace the tournament record.
    fn save_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError>;

    /// Non-eliminated players, in seed order.
    fn load_active_players(&self, tournament_id: TournamentId) -> Result<Vec<PlayerStat>, TournamentError> {
        Ok(self
            .load_all_player_stats(tournament_id)?
            .into_iter()
            .filter(|s| !s.eliminated)
            .collect())
    }

    /// Every player stat, in seed order.
    fn load_all_player_stats(&self, tournament_id: TournamentId) -> Result<Vec<PlayerStat>, TournamentError>;

    fn load_player_stat(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> Result<PlayerStat, TournamentError> {
        self.load_all_player_stats(tournament_id)?
            .into_iter()
            .find(|s| s.player_id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))
    }

    fn insert_player_stats(
        &mut self,
        tournament_id: TournamentId,
        stats: Vec<PlayerStat>,
    ) -> Result<(), TournamentError>;

    /// Apply an increment-style update and return the new record.
    fn update_player_stat(
        &mut self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        update: &StatUpdate,
    ) -> Result<PlayerStat, TournamentError>;

    /// All rounds: round robin by sequence, then final phase by sequence.
    fn load_rounds(&self, tournament_id: TournamentId) -> Result<Vec<Round>, TournamentError>;

    fn load_round(
        &self,
        tournament_id: TournamentId,
        round_id: RoundId,
    ) -> Result<RoundWithMatches, TournamentError>;

    /// The in-progress round, else the earliest pending one.
    fn load_current_round(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Option<RoundWithMatches>, TournamentError> {
        let rounds = self.load_rounds(tournament_id)?;
        let current = rounds
            .iter()
            .find(|r| r.status == RoundStatus::InProgress)
            .or_else(|| rounds.iter().find(|r| r.status == RoundStatus::Pending));
        match current {
            Some(r) => self.load_round(tournament_id, r.id).map(Some),
            None => Ok(None),
        }
    }

    /// Insert or replace a round record.
    fn save_round(&mut self, round: &Round) -> Result<(), TournamentError>;

    fn mark_round_status(
        &mut self,
        tournament_id: TournamentId,
        round_id: RoundId,
        status: RoundStatus,
    ) -> Result<(), TournamentError>;

    fn load_match(&self, tournament_id: TournamentId, match_id: MatchId) -> Result<GameMatch, TournamentError>;

    /// Every match of the tournament.
    fn load_matches(&self, tournament_id: TournamentId) -> Result<Vec<GameMatch>, TournamentError>;

    fn save_matches(&mut self, tournament_id: TournamentId, matches: Vec<GameMatch>) -> Result<(), TournamentError>;

    fn update_match(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
        update: &MatchUpdate,
    ) -> Result<GameMatch, TournamentError>;

    fn delete_matches(&mut self, tournament_id: TournamentId, match_ids: &[MatchId]) -> Result<(), TournamentError>;

    fn mark_tournament_completed(
        &mut self,
        tournament_id: TournamentId,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), TournamentError>;

    /// Run `f` so that either all of its writes to this tournament persist or none do.
    fn transaction<T, F>(&mut self, tournament_id: TournamentId, f: F) -> Result<T, TournamentError>
    where
        F: FnOnce(&mut Self) -> Result<T, TournamentError>;
}
