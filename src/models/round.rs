//! Round record: one scheduling unit in either phase.

use crate::models::game::GameMatch;
use crate::models::money::Money;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoundId = Uuid;

/// Which phase a round belongs to. Elimination thresholds and scheduling
/// dispatch on this, never on the display name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    RoundRobin,
    FinalPhase,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Round-robin round never played because the final phase started first.
    Skipped,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub tournament_id: TournamentId,
    pub kind: RoundKind,
    /// Sequence within `kind`, starting at 1. Each phase counts independently.
    pub sequence: u32,
    pub name: String,
    pub prize_pool: Money,
    pub status: RoundStatus,
}

impl Round {
    pub fn new(tournament_id: TournamentId, kind: RoundKind, sequence: u32, prize_pool: Money) -> Self {
        let name = match kind {
            RoundKind::RoundRobin => format!("Round {sequence}"),
            RoundKind::FinalPhase => format!("Cash Climb {sequence}"),
        };
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            kind,
            sequence,
            name,
            prize_pool,
            status: RoundStatus::Pending,
        }
    }
}

/// A round together with its matches, ordered by match number.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundWithMatches {
    pub round: Round,
    pub matches: Vec<GameMatch>,
}

impl RoundWithMatches {
    /// True when the round has matches and every one of them is completed.
    pub fn all_completed(&self) -> bool {
        !self.matches.is_empty() && self.matches.iter().all(|m| m.is_completed())
    }
}
