//! Player and PlayerStat data structures.

use crate::models::money::Money;
use crate::models::tournament::TournamentId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches and lookups).
pub type PlayerId = Uuid;

/// A registered (paid) player, before the bracket exists.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// Durable per-(tournament, player) statistics.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub name: String,
    /// Registration order; breaks every tie in scheduling and standings.
    pub seed: u32,
    pub wins: u32,
    pub losses: u32,
    pub koh_wins: u32,
    pub koh_losses: u32,
    /// Byes received (processed bye matches).
    pub byes: u32,
    pub in_final_phase: bool,
    /// Position in the final-phase seed order, set at transition.
    pub final_seed: Option<u32>,
    pub eliminated: bool,
    pub eliminated_at: Option<DateTime<Utc>>,
    pub total_payout: Money,
}

impl PlayerStat {
    /// Fresh record created at bracket generation.
    pub fn new(tournament_id: TournamentId, player: &Player, seed: u32) -> Self {
        Self {
            tournament_id,
            player_id: player.id,
            name: player.name.clone(),
            seed,
            wins: 0,
            losses: 0,
            koh_wins: 0,
            koh_losses: 0,
            byes: 0,
            in_final_phase: false,
            final_seed: None,
            eliminated: false,
            eliminated_at: None,
            total_payout: Decimal::ZERO,
        }
    }

    /// Loss counter for the phase the player is currently in.
    pub fn phase_losses(&self) -> u32 {
        if self.in_final_phase {
            self.koh_losses
        } else {
            self.losses
        }
    }

    /// Wins used for standings: final-phase players carry their seeded `koh_wins`.
    pub fn standing_wins(&self) -> u32 {
        if self.in_final_phase {
            self.koh_wins
        } else {
            self.wins
        }
    }
}

/// Field changes for one player stat. Counters are increments so a retried
/// write never loses another writer's update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatUpdate {
    pub add_wins: u32,
    pub add_losses: u32,
    pub add_koh_wins: u32,
    pub add_koh_losses: u32,
    pub add_byes: u32,
    pub add_payout: Money,
    /// Final-phase entry: (koh_wins baseline, final seed).
    pub enter_final_phase: Option<(u32, u32)>,
    pub eliminated_at: Option<DateTime<Utc>>,
}

impl StatUpdate {
    /// Apply the update to a stat record in place.
    pub fn apply(&self, stat: &mut PlayerStat) {
        stat.wins += self.add_wins;
        stat.losses += self.add_losses;
        stat.koh_wins += self.add_koh_wins;
        stat.koh_losses += self.add_koh_losses;
        stat.byes += self.add_byes;
        stat.total_payout += self.add_payout;
        if let Some((koh_wins, final_seed)) = self.enter_final_phase {
            stat.koh_wins = koh_wins;
            stat.koh_losses = 0;
            stat.in_final_phase = true;
            stat.final_seed = Some(final_seed);
        }
        // Elimination never reverts.
        if let Some(at) = self.eliminated_at {
            if !stat.eliminated {
                stat.eliminated = true;
                stat.eliminated_at = Some(at);
            }
        }
    }
}
