use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::league::{Player, Role, Team, TeamSlot};

#[derive(Debug, Error, PartialEq)]
pub enum TeamError {
    #[error("cannot split {actual} players across 2x{} role slots", .expected / 2)]
    InvalidParticipantCount { expected: usize, actual: usize },
    #[error("unsupported player count {0}: need 6 (3v3), 8 (4v4) or 10 (5v5)")]
    UnsupportedPlayerCount(usize),
}

/// Split participants into two equal teams and assign every role.
///
/// The shuffle-then-bisect makes every equal-size partition equally likely.
/// Role assignment within each half is preference-weighted with a random
/// tie-break drawn from the same per-invocation RNG.
pub fn split<R: Rng>(
    players: Vec<Player>,
    roles: &[Role],
    rng: &mut R,
) -> Result<(Team, Team), TeamError> {
    let expected = roles.len() * 2;
    if players.len() != expected {
        return Err(TeamError::InvalidParticipantCount {
            expected,
            actual: players.len(),
        });
    }

    let mut shuffled = players;
    shuffled.shuffle(rng);
    let second_half = shuffled.split_off(roles.len());

    Ok((
        assign_roles(shuffled, roles, rng),
        assign_roles(second_half, roles, rng),
    ))
}

/// Cover every role in `roles` with the given half.
///
/// Least-flexible players pick first, each taking the earliest still-open
/// role in their preference list. Whoever ends up without an open preferred
/// role is forced into one of the leftovers, so coverage always succeeds.
pub fn assign_roles<R: Rng>(mut players: Vec<Player>, roles: &[Role], rng: &mut R) -> Team {
    // Shuffle before the stable sort: equally flexible players end up in
    // random order instead of registration order.
    players.shuffle(rng);
    players.sort_by_key(|player| flexibility(player, roles));

    let mut open: Vec<Role> = roles.to_vec();
    let mut slots: Vec<TeamSlot> = Vec::with_capacity(roles.len());
    let mut leftover: Vec<Player> = Vec::new();

    for player in players {
        match preferred_open_role(&player, &open) {
            Some(role) => {
                open.retain(|r| *r != role);
                slots.push(TeamSlot {
                    role,
                    player,
                    champion: None,
                });
            }
            None => leftover.push(player),
        }
    }

    debug_assert_eq!(leftover.len(), open.len());
    open.shuffle(rng);
    for (player, role) in leftover.into_iter().zip(open) {
        slots.push(TeamSlot {
            role,
            player,
            champion: None,
        });
    }

    slots.sort_by_key(|slot| slot.role);
    Team { slots }
}

/// How many of the format's roles this player accepts. A player with no
/// stated preferences is maximally flexible.
fn flexibility(player: &Player, roles: &[Role]) -> usize {
    let accepted = player
        .preferences
        .iter()
        .filter(|role| roles.contains(role))
        .count();
    if accepted == 0 {
        roles.len()
    } else {
        accepted
    }
}

fn preferred_open_role(player: &Player, open: &[Role]) -> Option<Role> {
    player
        .preferences
        .iter()
        .find(|role| open.contains(role))
        .copied()
}
