use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::league::catalog::ChampionCatalog;
use crate::league::{Role, Team, TeamSlot};

#[derive(Debug, Error, PartialEq)]
pub enum ChampionError {
    /// The catalog has zero champions for this role. Load-time validation
    /// makes this unreachable for a fully validated catalog.
    #[error("no champion in the catalog can play {0}")]
    EmptyRolePool(Role),
}

/// Bounded memory of recent assignments, one entry per randomize request.
/// Used to keep the same champion from showing up in the same role session
/// after session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChampionHistory {
    window: usize,
    entries: VecDeque<Vec<(Role, String)>>,
}

impl ChampionHistory {
    pub fn new(window: usize) -> Self {
        ChampionHistory {
            window,
            entries: VecDeque::new(),
        }
    }

    /// Rebuild from persisted entries, oldest first.
    pub fn from_entries(window: usize, entries: Vec<Vec<(Role, String)>>) -> Self {
        let mut history = ChampionHistory::new(window);
        for entry in entries {
            history.record(entry);
        }
        history
    }

    /// Push one assignment's picks, evicting beyond the retention window.
    pub fn record(&mut self, picks: Vec<(Role, String)>) {
        self.entries.push_back(picks);
        while self.entries.len() > self.window {
            self.entries.pop_front();
        }
    }

    /// Champions recorded for `role` in the newest `depth` entries.
    fn excluded_for(&self, role: Role, depth: usize) -> HashSet<&str> {
        self.entries
            .iter()
            .rev()
            .take(depth)
            .flatten()
            .filter(|(r, _)| *r == role)
            .map(|(_, champion)| champion.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Entries oldest first, for persistence.
    pub fn entries(&self) -> impl Iterator<Item = &Vec<(Role, String)>> {
        self.entries.iter()
    }
}

/// Fill every slot of a team with a champion.
///
/// `used` carries the champions already picked in this assignment (the other
/// team included) and is extended with each pick, so no champion appears
/// twice in one session output.
pub fn assign_champions<R: Rng>(
    team: &mut Team,
    catalog: &ChampionCatalog,
    history: &ChampionHistory,
    used: &mut HashSet<String>,
    rng: &mut R,
) -> Result<(), ChampionError> {
    for slot in &mut team.slots {
        let champion = pick_for_slot(slot, catalog, history, used, rng)?;
        used.insert(champion.clone());
        slot.champion = Some(champion);
    }
    Ok(())
}

/// Select a champion for one slot, relaxing exclusions oldest-first until a
/// candidate exists. A slot is never left unfilled as long as the catalog
/// covers the role at all.
fn pick_for_slot<R: Rng>(
    slot: &TeamSlot,
    catalog: &ChampionCatalog,
    history: &ChampionHistory,
    used: &HashSet<String>,
    rng: &mut R,
) -> Result<String, ChampionError> {
    let pool = catalog.eligible_for(slot.role);
    if pool.is_empty() {
        return Err(ChampionError::EmptyRolePool(slot.role));
    }

    // depth = history.len() excludes everything on record; depth = 0 nothing.
    // Walking down drops the oldest entries first.
    for depth in (0..=history.len()).rev() {
        let excluded = history.excluded_for(slot.role, depth);
        let candidates: Vec<&str> = pool
            .iter()
            .filter(|c| !used.contains(**c) && !excluded.contains(**c))
            .copied()
            .collect();
        if candidates.is_empty() {
            continue;
        }
        return Ok(narrow_to_owned(candidates, slot, rng));
    }

    // Even the duplicate exclusion has to give: the whole pool was consumed
    // by this same assignment. Reusing a champion beats an unfilled slot.
    Ok(pool
        .choose(rng)
        .map(|c| c.to_string())
        .unwrap_or_default())
}

/// Restrict to the player's owned pool when that still leaves a choice,
/// otherwise keep the unrestricted candidates.
fn narrow_to_owned<R: Rng>(candidates: Vec<&str>, slot: &TeamSlot, rng: &mut R) -> String {
    if !slot.player.owned_champions.is_empty() {
        let owned: Vec<&str> = candidates
            .iter()
            .filter(|c| slot.player.owned_champions.iter().any(|o| o == **c))
            .copied()
            .collect();
        if let Some(champion) = owned.choose(rng) {
            return champion.to_string();
        }
    }
    candidates
        .choose(rng)
        .map(|c| c.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::{Player, Role};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    fn catalog(entries: &[(&str, &[&str])]) -> ChampionCatalog {
        let raw: BTreeMap<String, Vec<String>> = entries
            .iter()
            .map(|(name, tags)| {
                (
                    name.to_string(),
                    tags.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        let required: Vec<Role> = entries
            .iter()
            .flat_map(|(_, tags)| tags.iter().filter_map(|t| Role::parse(t)))
            .collect();
        ChampionCatalog::from_entries(raw, &required).unwrap()
    }

    fn team(slots: &[(u64, Role)]) -> Team {
        Team {
            slots: slots
                .iter()
                .map(|(id, role)| TeamSlot {
                    role: *role,
                    player: Player::new(*id, format!("player-{id}")),
                    champion: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_every_slot_gets_a_champion_with_no_duplicates() {
        let catalog = catalog(&[
            ("Ahri", &["mid"]),
            ("Darius", &["top"]),
            ("Gnar", &["top"]),
            ("Jinx", &["bot"]),
            ("Kaisa", &["bot"]),
            ("Syndra", &["mid"]),
        ]);
        let history = ChampionHistory::new(3);
        let mut used = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let mut blue = team(&[(1, Role::Top), (2, Role::Mid), (3, Role::Bot)]);
        let mut red = team(&[(4, Role::Top), (5, Role::Mid), (6, Role::Bot)]);
        assign_champions(&mut blue, &catalog, &history, &mut used, &mut rng).unwrap();
        assign_champions(&mut red, &catalog, &history, &mut used, &mut rng).unwrap();

        let picks: Vec<&String> = blue
            .slots
            .iter()
            .chain(red.slots.iter())
            .map(|s| s.champion.as_ref().unwrap())
            .collect();
        assert_eq!(picks.len(), 6);
        let unique: HashSet<&String> = picks.iter().copied().collect();
        assert_eq!(unique.len(), 6, "champion repeated within one assignment");
    }

    #[test]
    fn test_history_avoids_repeats_unless_pool_has_one_champion() {
        let catalog = catalog(&[("Ahri", &["mid"]), ("Syndra", &["mid"]), ("Gnar", &["top"])]);
        let mut history = ChampionHistory::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let mut first = team(&[(1, Role::Mid), (2, Role::Top)]);
        let mut used = HashSet::new();
        assign_champions(&mut first, &catalog, &history, &mut used, &mut rng).unwrap();
        let first_mid = first.slots[0].champion.clone().unwrap();
        history.record(vec![
            (Role::Mid, first_mid.clone()),
            (Role::Top, "Gnar".to_string()),
        ]);

        let mut second = team(&[(1, Role::Mid), (2, Role::Top)]);
        let mut used = HashSet::new();
        assign_champions(&mut second, &catalog, &history, &mut used, &mut rng).unwrap();

        let second_mid = second.slots[0].champion.clone().unwrap();
        let second_top = second.slots[1].champion.clone().unwrap();
        assert_ne!(second_mid, first_mid, "mid pool has two champions, must rotate");
        // Top pool has size 1: exclusion is relaxed and Gnar repeats.
        assert_eq!(second_top, "Gnar");
    }

    #[test]
    fn test_relaxation_drops_oldest_entries_first() {
        let catalog = catalog(&[("Ahri", &["mid"]), ("Syndra", &["mid"])]);
        let mut history = ChampionHistory::new(2);
        history.record(vec![(Role::Mid, "Ahri".to_string())]);
        history.record(vec![(Role::Mid, "Syndra".to_string())]);

        // Full history excludes the whole pool; dropping the oldest entry
        // frees Ahri, the pick recorded the longest ago.
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut slots = team(&[(1, Role::Mid)]);
        let mut used = HashSet::new();
        assign_champions(&mut slots, &catalog, &history, &mut used, &mut rng).unwrap();
        assert_eq!(slots.slots[0].champion.as_deref(), Some("Ahri"));
    }

    #[test]
    fn test_same_call_duplicates_relax_as_last_resort() {
        // One champion covers Mid; both teams need a Mid. The second slot
        // reuses it rather than staying empty.
        let catalog = catalog(&[("Ahri", &["mid"])]);
        let history = ChampionHistory::new(3);
        let mut used = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(6);

        let mut blue = team(&[(1, Role::Mid)]);
        let mut red = team(&[(2, Role::Mid)]);
        assign_champions(&mut blue, &catalog, &history, &mut used, &mut rng).unwrap();
        assign_champions(&mut red, &catalog, &history, &mut used, &mut rng).unwrap();

        assert_eq!(blue.slots[0].champion.as_deref(), Some("Ahri"));
        assert_eq!(red.slots[0].champion.as_deref(), Some("Ahri"));
    }

    #[test]
    fn test_empty_role_pool_is_a_catalog_defect() {
        let catalog = catalog(&[("Ahri", &["mid"])]);
        let history = ChampionHistory::new(3);
        let mut used = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut slots = team(&[(1, Role::Jungle)]);
        let err =
            assign_champions(&mut slots, &catalog, &history, &mut used, &mut rng).unwrap_err();
        assert_eq!(err, ChampionError::EmptyRolePool(Role::Jungle));
    }

    #[test]
    fn test_owned_pool_narrows_the_candidates() {
        let catalog = catalog(&[
            ("Ahri", &["mid"]),
            ("Syndra", &["mid"]),
            ("Veigar", &["mid"]),
        ]);
        let history = ChampionHistory::new(3);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut slots = team(&[(1, Role::Mid)]);
        slots.slots[0].player.owned_champions = vec!["Syndra".to_string()];

        for _ in 0..10 {
            let mut fresh = slots.clone();
            let mut used = HashSet::new();
            assign_champions(&mut fresh, &catalog, &history, &mut used, &mut rng).unwrap();
            assert_eq!(fresh.slots[0].champion.as_deref(), Some("Syndra"));
        }
    }

    #[test]
    fn test_owned_pool_outside_catalog_falls_back_to_full_pool() {
        let catalog = catalog(&[("Ahri", &["mid"])]);
        let history = ChampionHistory::new(3);
        let mut used = HashSet::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut slots = team(&[(1, Role::Mid)]);
        slots.slots[0].player.owned_champions = vec!["Darius".to_string()];
        assign_champions(&mut slots, &catalog, &history, &mut used, &mut rng).unwrap();
        assert_eq!(slots.slots[0].champion.as_deref(), Some("Ahri"));
    }

    #[test]
    fn test_history_window_evicts_oldest() {
        let mut history = ChampionHistory::new(2);
        history.record(vec![(Role::Mid, "Ahri".to_string())]);
        history.record(vec![(Role::Mid, "Syndra".to_string())]);
        history.record(vec![(Role::Mid, "Veigar".to_string())]);

        assert_eq!(history.len(), 2);
        let remembered: Vec<_> = history.entries().flatten().collect();
        assert!(!remembered.contains(&&(Role::Mid, "Ahri".to_string())));
    }
}
