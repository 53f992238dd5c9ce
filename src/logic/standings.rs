//! Standings: every player, eliminated ones included, ranked for display.

use crate::models::{Money, PlayerId, PlayerStat};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StandingStatus {
    Active,
    FinalPhase,
    Eliminated,
    Champion,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Standing {
    pub rank: usize,
    pub player_id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub total_payout: Money,
    pub status: StandingStatus,
}

/// Rank by wins desc (final-phase players by their seeded `koh_wins`), then
/// payout desc, then seed.
pub fn standings(stats: &[PlayerStat], champion: Option<PlayerId>) -> Vec<Standing> {
    let mut sorted: Vec<&PlayerStat> = stats.iter().collect();
    sorted.sort_by(|a, b| {
        b.standing_wins()
            .cmp(&a.standing_wins())
            .then_with(|| b.total_payout.cmp(&a.total_payout))
            .then_with(|| a.seed.cmp(&b.seed))
    });
    sorted
        .into_iter()
        .enumerate()
        .map(|(idx, s)| {
            let status = if champion == Some(s.player_id) {
                StandingStatus::Champion
            } else if s.eliminated {
                StandingStatus::Eliminated
            } else if s.in_final_phase {
                StandingStatus::FinalPhase
            } else {
                StandingStatus::Active
            };
            Standing {
                rank: idx + 1,
                player_id: s.player_id,
                name: s.name.clone(),
                wins: s.standing_wins(),
                losses: s.phase_losses(),
                total_payout: s.total_payout,
                status,
            }
        })
        .collect()
}

/// CSV export of standings.
pub fn standings_csv(rows: &[Standing]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["rank", "player", "wins", "losses", "payout", "status"])?;
    for row in rows {
        let status = match row.status {
            StandingStatus::Active => "Active",
            StandingStatus::FinalPhase => "Cash Climb",
            StandingStatus::Eliminated => "Eliminated",
            StandingStatus::Champion => "Champion",
        };
        writer.write_record([
            row.rank.to_string(),
            row.name.clone(),
            row.wins.to_string(),
            row.losses.to_string(),
            row.total_payout.to_string(),
            status.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
