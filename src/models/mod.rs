//! Records for the ladder tournament engine: players, rounds, matches, tournament.

mod game;
mod money;
mod player;
mod round;
mod tournament;

pub use game::{GameMatch, MatchId, MatchStatus, MatchUpdate};
pub use money::{cents, floor_cents, round_cents, Money};
pub use player::{Player, PlayerId, PlayerStat, StatUpdate};
pub use round::{Round, RoundId, RoundKind, RoundStatus, RoundWithMatches};
pub use tournament::{
    EliminationRules, FinalPhase, Multiplicity, PrizeSettings, Tournament, TournamentError,
    TournamentId, TournamentStatus,
};
