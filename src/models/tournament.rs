//! Tournament aggregate root, its settings, and the error taxonomy.

use crate::models::game::MatchId;
use crate::models::money::{floor_cents, Money};
use crate::models::player::{Player, PlayerId};
use crate::models::round::{RoundId, RoundKind};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    #[error("Need at least 2 players to generate a bracket (found {found})")]
    InsufficientPlayers { found: usize },
    #[error("Tournament not found")]
    TournamentNotFound(TournamentId),
    #[error("Player not found")]
    PlayerNotFound(PlayerId),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Round not found")]
    RoundNotFound(RoundId),
    /// Tournament is not in a state that allows this action.
    #[error("Invalid state for this action")]
    InvalidState,
    /// Names are unique, case-insensitive.
    #[error("A player with this name already exists")]
    DuplicatePlayerName,
    #[error("Player name must not be empty")]
    EmptyPlayerName,
    #[error("Invalid match result: {0}")]
    InvalidResult(String),
    #[error("Invalid prize settings: {0}")]
    InvalidPrizeSettings(String),
    /// A defensive check failed; the enclosing transaction must be rolled back.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl TournamentError {
    /// True for the unknown-reference family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TournamentError::TournamentNotFound(_)
                | TournamentError::PlayerNotFound(_)
                | TournamentError::MatchNotFound(_)
                | TournamentError::RoundNotFound(_)
        )
    }
}

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Collecting the paid player list; no bracket yet.
    #[default]
    Registration,
    InProgress,
    Completed,
}

/// How many times every pair meets during round robin.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    #[default]
    Single,
    Double,
    Triple,
}

impl Multiplicity {
    pub fn cycles(self) -> usize {
        match self {
            Multiplicity::Single => 1,
            Multiplicity::Double => 2,
            Multiplicity::Triple => 3,
        }
    }
}

fn default_round_robin_share() -> Money {
    Decimal::new(5, 1)
}

/// Prize configuration fixed when the tournament is created.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrizeSettings {
    pub total_prize_pool: Money,
    /// Reserved for the champion; never part of per-match distribution.
    #[serde(default)]
    pub first_place_prize: Money,
    /// Fraction of the distributable pool spent during round robin.
    #[serde(default = "default_round_robin_share")]
    pub round_robin_share: Money,
    /// Whether the champion also receives `first_place_prize` on completion.
    #[serde(default)]
    pub award_first_place_prize: bool,
}

impl PrizeSettings {
    pub fn new(total_prize_pool: Money, first_place_prize: Money) -> Self {
        Self {
            total_prize_pool,
            first_place_prize,
            round_robin_share: default_round_robin_share(),
            award_first_place_prize: false,
        }
    }

    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.total_prize_pool < Decimal::ZERO || self.first_place_prize < Decimal::ZERO {
            return Err(TournamentError::InvalidPrizeSettings(
                "amounts must not be negative".into(),
            ));
        }
        if self.first_place_prize > self.total_prize_pool {
            return Err(TournamentError::InvalidPrizeSettings(
                "first place prize exceeds the pool".into(),
            ));
        }
        if self.round_robin_share < Decimal::ZERO || self.round_robin_share > Decimal::ONE {
            return Err(TournamentError::InvalidPrizeSettings(
                "round robin share must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }

    /// Pool available for per-match payouts.
    pub fn distributable(&self) -> Money {
        self.total_prize_pool - self.first_place_prize
    }

    /// Part of the distributable pool budgeted for round robin.
    pub fn round_robin_budget(&self) -> Money {
        floor_cents(self.distributable() * self.round_robin_share)
    }
}

fn default_round_robin_losses() -> u32 {
    3
}

fn default_final_phase_losses() -> u32 {
    2
}

/// Losses at which a player is eliminated, per phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EliminationRules {
    #[serde(default = "default_round_robin_losses")]
    pub round_robin_losses: u32,
    #[serde(default = "default_final_phase_losses")]
    pub final_phase_losses: u32,
}

impl Default for EliminationRules {
    fn default() -> Self {
        Self {
            round_robin_losses: default_round_robin_losses(),
            final_phase_losses: default_final_phase_losses(),
        }
    }
}

impl EliminationRules {
    pub fn threshold(&self, kind: RoundKind) -> u32 {
        match kind {
            RoundKind::RoundRobin => self.round_robin_losses,
            RoundKind::FinalPhase => self.final_phase_losses,
        }
    }
}

/// Escalating payout schedule, computed once at the phase transition.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FinalPhase {
    pub pool: Money,
    pub schedule: Vec<Money>,
    /// Next unassigned slot; only ever moves forward.
    pub next_slot: usize,
    pub rounds_played: u32,
}

impl FinalPhase {
    pub fn new(pool: Money, schedule: Vec<Money>) -> Self {
        Self {
            pool,
            schedule,
            next_slot: 0,
            rounds_played: 0,
        }
    }

    /// Sum of slots not yet assigned to any match.
    pub fn unassigned(&self) -> Money {
        self.schedule.iter().skip(self.next_slot).copied().sum()
    }
}

/// Full tournament record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub prizes: PrizeSettings,
    pub rules: EliminationRules,
    pub multiplicity: Multiplicity,
    /// Paid players in registration order.
    pub registered: Vec<Player>,
    /// Field size when the bracket was generated.
    pub original_player_count: u32,
    pub final_phase: Option<FinalPhase>,
    pub winner: Option<PlayerId>,
    pub final_award: Option<Money>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a new tournament in Registration with no players.
    pub fn new(
        name: impl Into<String>,
        prizes: PrizeSettings,
        rules: EliminationRules,
        multiplicity: Multiplicity,
    ) -> Result<Self, TournamentError> {
        prizes.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: TournamentStatus::Registration,
            prizes,
            rules,
            multiplicity,
            registered: Vec::new(),
            original_player_count: 0,
            final_phase: None,
            winner: None,
            final_award: None,
            finalized_at: None,
        })
    }

    /// Register a paid player (Registration only). Names must be unique (case-insensitive).
    pub fn register_player(&mut self, name: impl Into<String>) -> Result<PlayerId, TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState);
        }
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(TournamentError::EmptyPlayerName);
        }
        let is_duplicate = self
            .registered
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(TournamentError::DuplicatePlayerName);
        }
        let player = Player::new(name_trimmed);
        let id = player.id;
        self.registered.push(player);
        Ok(id)
    }

    /// Remove a registered player by id (Registration only).
    pub fn remove_player(&mut self, player_id: PlayerId) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Registration {
            return Err(TournamentError::InvalidState);
        }
        let idx = self
            .registered
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(TournamentError::PlayerNotFound(player_id))?;
        self.registered.remove(idx);
        Ok(())
    }

    /// Active-player count at which the final phase starts, derived from the
    /// original field size.
    pub fn final_phase_threshold(&self) -> usize {
        match self.original_player_count {
            0..=6 => 3,
            7..=15 => 4,
            _ => 6,
        }
    }
}
