//! Match (game) record and its status.

use crate::models::money::Money;
use crate::models::player::PlayerId;
use crate::models::round::RoundId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Pending,
    Completed,
}

/// A single scheduled pairing (or a bye, where `player_two` is `None`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub round_id: RoundId,
    /// Order within the round, starting at 1.
    pub match_number: u32,
    pub player_one: PlayerId,
    pub player_two: Option<PlayerId>,
    pub is_bye: bool,
    pub status: MatchStatus,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub score: Option<String>,
    pub payout_amount: Money,
    /// Set once the result has been applied to player stats.
    pub processed: bool,
}

impl GameMatch {
    pub fn new(round_id: RoundId, match_number: u32, player_one: PlayerId, player_two: PlayerId) -> Self {
        Self {
            id: Uuid::new_v4(),
            round_id,
            match_number,
            player_one,
            player_two: Some(player_two),
            is_bye: false,
            status: MatchStatus::Pending,
            winner: None,
            loser: None,
            score: None,
            payout_amount: Decimal::ZERO,
            processed: false,
        }
    }

    pub fn bye(round_id: RoundId, match_number: u32, player: PlayerId) -> Self {
        Self {
            player_two: None,
            is_bye: true,
            ..Self::new(round_id, match_number, player, player)
        }
    }

    /// Both players (one for a bye).
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        std::iter::once(self.player_one).chain(self.player_two)
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.players().any(|p| p == player)
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }
}

/// Field changes for one match.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchUpdate {
    pub status: Option<MatchStatus>,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub score: Option<String>,
    pub payout_amount: Option<Money>,
    pub processed: Option<bool>,
}

impl MatchUpdate {
    pub fn apply(&self, m: &mut GameMatch) {
        if let Some(status) = self.status {
            m.status = status;
        }
        if self.winner.is_some() {
            m.winner = self.winner;
        }
        if self.loser.is_some() {
            m.loser = self.loser;
        }
        if let Some(score) = &self.score {
            m.score = Some(score.clone());
        }
        if let Some(amount) = self.payout_amount {
            m.payout_amount = amount;
        }
        if let Some(processed) = self.processed {
            m.processed = processed;
        }
    }
}
