//! Round-robin schedule generation (circle method).

use crate::models::{Multiplicity, PlayerId, TournamentError};

/// Pairings for one round-robin round.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScheduledRound {
    pub pairings: Vec<(PlayerId, PlayerId)>,
    pub bye: Option<PlayerId>,
}

/// Generate every round-robin round for `players` (in seed order).
///
/// One player stays fixed while the rest rotate; an odd field gets a phantom
/// slot in the fixed position, and whoever faces it has the bye. Each cycle
/// yields `N - 1` rounds for even `N` and `N` rounds for odd `N`, every pair
/// meets once per cycle, and byes go out in seed order so each player sits
/// exactly once per cycle. Later cycles swap sides.
pub fn round_robin_schedule(
    players: &[PlayerId],
    multiplicity: Multiplicity,
) -> Result<Vec<ScheduledRound>, TournamentError> {
    let n = players.len();
    if n < 2 {
        return Err(TournamentError::InsufficientPlayers { found: n });
    }

    let (fixed, rest): (Option<PlayerId>, Vec<Option<PlayerId>>) = if n % 2 == 0 {
        (Some(players[0]), players[1..].iter().copied().map(Some).collect())
    } else {
        // Seed 0 sits last so the first bye goes to it, then seeds 1, 2, ...
        let mut rest: Vec<Option<PlayerId>> = players[1..].iter().copied().map(Some).collect();
        rest.push(Some(players[0]));
        (None, rest)
    };

    let len = rest.len();
    let mut rounds = Vec::with_capacity(len * multiplicity.cycles());
    for cycle in 0..multiplicity.cycles() {
        for r in 0..len {
            let at = |k: usize| rest[(k + r) % len];
            let mut slots = Vec::with_capacity(len / 2 + 1);
            slots.push((fixed, at(len - 1)));
            for i in 0..(len - 1) / 2 {
                slots.push((at(i), at(len - 2 - i)));
            }

            let mut round = ScheduledRound::default();
            for slot in slots {
                match slot {
                    (Some(a), Some(b)) if cycle % 2 == 1 => round.pairings.push((b, a)),
                    (Some(a), Some(b)) => round.pairings.push((a, b)),
                    (Some(p), None) | (None, Some(p)) => round.bye = Some(p),
                    (None, None) => {}
                }
            }
            rounds.push(round);
        }
    }
    Ok(rounds)
}

/// Expected number of rounds for a field of `n` players.
pub fn round_count(n: usize, multiplicity: Multiplicity) -> usize {
    let per_cycle = if n % 2 == 0 { n.saturating_sub(1) } else { n };
    per_cycle * multiplicity.cycles()
}
