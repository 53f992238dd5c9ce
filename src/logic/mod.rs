//! Tournament engine logic: bracket setup, results, eliminations, advancement, final phase.

mod advancement;
mod elimination;
mod final_phase;
mod prizes;
mod reconcile;
mod results;
mod schedule;
mod setup;
mod standings;
mod submit;

pub use advancement::{advance_round, AdvanceOutcome};
pub use elimination::{apply_eliminations, sweep_eliminations};
pub use final_phase::{enter_final_phase, final_pairings};
pub use prizes::{
    allocate_flat, ensure_within_pool, escalating_schedule, flat_rates, paid_out, FlatRates,
};
pub use reconcile::{reconcile, ReconcileReport};
pub use results::{
    apply_completed_match, process_match_result, MatchResult, ProcessOutcome, ProcessedMatch,
};
pub use schedule::{round_count, round_robin_schedule, ScheduledRound};
pub use setup::{generate_bracket, start_round};
pub use standings::{standings, standings_csv, Standing, StandingStatus};
pub use submit::{submit_result, SubmissionReport};
