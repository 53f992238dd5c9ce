//! In-memory store. A transaction snapshots the tournament's records and
//! restores them if the closure fails.

use super::TournamentStore;
use crate::models::{
    GameMatch, MatchId, MatchUpdate, PlayerId, PlayerStat, Round, RoundId, RoundKind, RoundStatus,
    RoundWithMatches, StatUpdate, Tournament, TournamentError, TournamentId, TournamentStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct TournamentRecords {
    tournament: Tournament,
    stats: Vec<PlayerStat>,
    rounds: Vec<Round>,
    matches: Vec<GameMatch>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tournaments: HashMap<TournamentId, TournamentRecords>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tournament_ids(&self) -> Vec<TournamentId> {
        self.tournaments.keys().copied().collect()
    }

    fn records(&self, id: TournamentId) -> Result<&TournamentRecords, TournamentError> {
        self.tournaments
            .get(&id)
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    fn records_mut(&mut self, id: TournamentId) -> Result<&mut TournamentRecords, TournamentError> {
        self.tournaments
            .get_mut(&id)
            .ok_or(TournamentError::TournamentNotFound(id))
    }
}

fn round_order(round: &Round) -> (u8, u32) {
    let phase = match round.kind {
        RoundKind::RoundRobin => 0,
        RoundKind::FinalPhase => 1,
    };
    (phase, round.sequence)
}

impl TournamentStore for MemoryStore {
    fn load_tournament(&self, tournament_id: TournamentId) -> Result<Tournament, TournamentError> {
        Ok(self.records(tournament_id)?.tournament.clone())
    }

    fn save_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError> {
        match self.tournaments.get_mut(&tournament.id) {
            Some(records) => records.tournament = tournament.clone(),
            None => {
                self.tournaments.insert(
                    tournament.id,
                    TournamentRecords {
                        tournament: tournament.clone(),
                        stats: Vec::new(),
                        rounds: Vec::new(),
                        matches: Vec::new(),
                    },
                );
            }
        }
        Ok(())
    }

    fn load_all_player_stats(&self, tournament_id: TournamentId) -> Result<Vec<PlayerStat>, TournamentError> {
        let mut stats = self.records(tournament_id)?.stats.clone();
        stats.sort_by_key(|s| s.seed);
        Ok(stats)
    }

    fn insert_player_stats(
        &mut self,
        tournament_id: TournamentId,
        stats: Vec<PlayerStat>,
    ) -> Result<(), TournamentError> {
        let records = self.records_mut(tournament_id)?;
        for stat in stats {
            if records.stats.iter().any(|s| s.player_id == stat.player_id) {
                return Err(TournamentError::Persistence(format!(
                    "duplicate player stat for {}",
                    stat.player_id
                )));
            }
            records.stats.push(stat);
        }
        Ok(())
    }

    fn update_player_stat(
        &mut self,
        tournament_id: TournamentId,
        player_id: PlayerId,
        update: &StatUpdate,
    ) -> Result<PlayerStat, TournamentError> {
        let stat = self
            .records_mut(tournament_id)?
            .stats
            .iter_mut()
            .find(|s| s.player_id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        update.apply(stat);
        Ok(stat.clone())
    }

    fn load_rounds(&self, tournament_id: TournamentId) -> Result<Vec<Round>, TournamentError> {
        let mut rounds = self.records(tournament_id)?.rounds.clone();
        rounds.sort_by_key(round_order);
        Ok(rounds)
    }

    fn load_round(
        &self,
        tournament_id: TournamentId,
        round_id: RoundId,
    ) -> Result<RoundWithMatches, TournamentError> {
        let records = self.records(tournament_id)?;
        let round = records
            .rounds
            .iter()
            .find(|r| r.id == round_id)
            .cloned()
            .ok_or(TournamentError::RoundNotFound(round_id))?;
        let mut matches: Vec<GameMatch> = records
            .matches
            .iter()
            .filter(|m| m.round_id == round_id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| m.match_number);
        Ok(RoundWithMatches { round, matches })
    }

    fn save_round(&mut self, round: &Round) -> Result<(), TournamentError> {
        let records = self.records_mut(round.tournament_id)?;
        match records.rounds.iter_mut().find(|r| r.id == round.id) {
            Some(existing) => *existing = round.clone(),
            None => records.rounds.push(round.clone()),
        }
        Ok(())
    }

    fn mark_round_status(
        &mut self,
        tournament_id: TournamentId,
        round_id: RoundId,
        status: RoundStatus,
    ) -> Result<(), TournamentError> {
        let round = self
            .records_mut(tournament_id)?
            .rounds
            .iter_mut()
            .find(|r| r.id == round_id)
            .ok_or(TournamentError::RoundNotFound(round_id))?;
        round.status = status;
        Ok(())
    }

    fn load_match(&self, tournament_id: TournamentId, match_id: MatchId) -> Result<GameMatch, TournamentError> {
        self.records(tournament_id)?
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .cloned()
            .ok_or(TournamentError::MatchNotFound(match_id))
    }

    fn load_matches(&self, tournament_id: TournamentId) -> Result<Vec<GameMatch>, TournamentError> {
        Ok(self.records(tournament_id)?.matches.clone())
    }

    fn save_matches(&mut self, tournament_id: TournamentId, matches: Vec<GameMatch>) -> Result<(), TournamentError> {
        let records = self.records_mut(tournament_id)?;
        for m in matches {
            if !records.rounds.iter().any(|r| r.id == m.round_id) {
                return Err(TournamentError::RoundNotFound(m.round_id));
            }
            match records.matches.iter_mut().find(|x| x.id == m.id) {
                Some(existing) => *existing = m,
                None => records.matches.push(m),
            }
        }
        Ok(())
    }

    fn update_match(
        &mut self,
        tournament_id: TournamentId,
        match_id: MatchId,
        update: &MatchUpdate,
    ) -> Result<GameMatch, TournamentError> {
        let m = self
            .records_mut(tournament_id)?
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        update.apply(m);
        Ok(m.clone())
    }

    fn delete_matches(&mut self, tournament_id: TournamentId, match_ids: &[MatchId]) -> Result<(), TournamentError> {
        self.records_mut(tournament_id)?
            .matches
            .retain(|m| !match_ids.contains(&m.id));
        Ok(())
    }

    fn mark_tournament_completed(
        &mut self,
        tournament_id: TournamentId,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), TournamentError> {
        let tournament = &mut self.records_mut(tournament_id)?.tournament;
        tournament.status = TournamentStatus::Completed;
        tournament.finalized_at = Some(finalized_at);
        Ok(())
    }

    fn transaction<T, F>(&mut self, tournament_id: TournamentId, f: F) -> Result<T, TournamentError>
    where
        F: FnOnce(&mut Self) -> Result<T, TournamentError>,
    {
        let snapshot = self.tournaments.get(&tournament_id).cloned();
        let result = f(self);
        if result.is_err() {
            match snapshot {
                Some(records) => {
                    self.tournaments.insert(tournament_id, records);
                }
                None => {
                    self.tournaments.remove(&tournament_id);
                }
            }
            log::debug!("Rolled back transaction for tournament {}", tournament_id);
        }
        result
    }
}
