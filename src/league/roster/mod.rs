use std::collections::HashMap;

use thiserror::Error;

use crate::league::{Player, Role};

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    /// Every id that failed to resolve, so the caller can report one
    /// cohesive message instead of the first miss.
    #[error("unknown players: {}", join_ids(.0))]
    UnknownPlayers(Vec<u64>),
}

/// Registry of players eligible to be drawn into a session.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: HashMap<u64, Player>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by id. Last write wins on every field.
    pub fn register(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }

    /// Remove a player. Removing an absent id is a no-op; the return value
    /// only says whether anything was there.
    pub fn unregister(&mut self, id: u64) -> bool {
        self.players.remove(&id).is_some()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.players.contains_key(&id)
    }

    pub fn player(&self, id: u64) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Resolve a participant list. Fails with the complete set of unknown
    /// ids rather than the first one.
    pub fn get(&self, ids: &[u64]) -> Result<Vec<Player>, RosterError> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match self.players.get(&id) {
                Some(player) => found.push(player.clone()),
                None => missing.push(id),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(RosterError::UnknownPlayers(missing))
        }
    }

    /// Snapshot of the whole roster, sorted by name for stable listings.
    pub fn all(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn set_preferences(&mut self, id: u64, preferences: Vec<Role>) -> Result<(), RosterError> {
        let player = self.player_mut(id)?;
        player.preferences = preferences;
        Ok(())
    }

    pub fn set_skill_tier(&mut self, id: u64, skill_tier: Option<u8>) -> Result<(), RosterError> {
        let player = self.player_mut(id)?;
        player.skill_tier = skill_tier;
        Ok(())
    }

    /// Attach a Riot account and everything learned from it.
    pub fn link_riot(
        &mut self,
        id: u64,
        riot_id: String,
        skill_tier: Option<u8>,
        owned_champions: Vec<String>,
    ) -> Result<(), RosterError> {
        let player = self.player_mut(id)?;
        player.riot_id = Some(riot_id);
        player.skill_tier = skill_tier;
        player.owned_champions = owned_champions;
        Ok(())
    }

    fn player_mut(&mut self, id: u64) -> Result<&mut Player, RosterError> {
        self.players
            .get_mut(&id)
            .ok_or(RosterError::UnknownPlayers(vec![id]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent_last_write_wins() {
        let mut roster = PlayerRoster::new();
        roster.register(Player::new(1, "solo").with_preferences(vec![Role::Top]));
        roster.register(Player::new(1, "solo").with_preferences(vec![Role::Mid, Role::Bot]));

        assert_eq!(roster.len(), 1);
        let player = roster.player(1).unwrap();
        assert_eq!(player.preferences, vec![Role::Mid, Role::Bot]);
    }

    #[test]
    fn test_unregister_absent_is_noop() {
        let mut roster = PlayerRoster::new();
        roster.register(Player::new(1, "solo"));

        assert!(roster.unregister(1));
        assert!(!roster.unregister(1));
        assert!(!roster.unregister(42));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_get_lists_every_unknown_id() {
        let mut roster = PlayerRoster::new();
        roster.register(Player::new(1, "a"));
        roster.register(Player::new(2, "b"));

        let err = roster.get(&[1, 7, 2, 9]).unwrap_err();
        assert_eq!(err, RosterError::UnknownPlayers(vec![7, 9]));
        assert_eq!(err.to_string(), "unknown players: 7, 9");

        let players = roster.get(&[2, 1]).unwrap();
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].id, 2);
    }

    #[test]
    fn test_all_is_a_snapshot() {
        let mut roster = PlayerRoster::new();
        roster.register(Player::new(2, "b"));
        roster.register(Player::new(1, "a"));

        let snapshot = roster.all();
        roster.unregister(1);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].name, "a");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_mutators_fail_for_unregistered_id() {
        let mut roster = PlayerRoster::new();
        assert_eq!(
            roster.set_preferences(5, vec![Role::Mid]),
            Err(RosterError::UnknownPlayers(vec![5]))
        );

        roster.register(Player::new(5, "e"));
        roster.set_preferences(5, vec![Role::Mid]).unwrap();
        roster
            .link_riot(5, "E#EUW".into(), Some(4), vec!["Ahri".into()])
            .unwrap();

        let player = roster.player(5).unwrap();
        assert_eq!(player.riot_id.as_deref(), Some("E#EUW"));
        assert_eq!(player.skill_tier, Some(4));
        assert_eq!(player.owned_champions, vec!["Ahri".to_string()]);
    }
}
