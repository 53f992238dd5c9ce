//! Ladder tournament web app: library with records, the bracket/payout engine, and its store.

pub mod config;
pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    advance_round, generate_bracket, process_match_result, reconcile, standings, submit_result,
    AdvanceOutcome, MatchResult, ProcessOutcome, ReconcileReport, Standing, StandingStatus,
    SubmissionReport,
};
pub use models::{
    EliminationRules, GameMatch, MatchId, Multiplicity, Player, PlayerId, PlayerStat,
    PrizeSettings, Round, RoundId, RoundKind, RoundStatus, RoundWithMatches, Tournament,
    TournamentError, TournamentId, TournamentStatus,
};
pub use store::{MemoryStore, TournamentStore};
