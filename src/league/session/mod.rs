use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::league::catalog::ChampionCatalog;
use crate::league::champion::{self, ChampionError, ChampionHistory};
use crate::league::roster::{PlayerRoster, RosterError};
use crate::league::team::{self, TeamError};
use crate::league::{AssignmentResult, GameFormat, Role, Team};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Team(#[from] TeamError),
    #[error(transparent)]
    Champion(#[from] ChampionError),
}

/// Orchestrates one randomize request end to end and owns the per-guild
/// repeat-avoidance history. Synchronous and in-memory; callers inject the
/// RNG and handle persistence around it.
pub struct SessionCoordinator {
    catalog: ChampionCatalog,
    roster: PlayerRoster,
    histories: HashMap<u64, ChampionHistory>,
    history_window: usize,
}

impl SessionCoordinator {
    pub fn new(catalog: ChampionCatalog, history_window: usize) -> Self {
        SessionCoordinator {
            catalog,
            roster: PlayerRoster::new(),
            histories: HashMap::new(),
            history_window,
        }
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut PlayerRoster {
        &mut self.roster
    }

    pub fn catalog(&self) -> &ChampionCatalog {
        &self.catalog
    }

    /// Swap in a freshly loaded catalog. Prior champion-identity assumptions
    /// only break at this boundary.
    pub fn reload_catalog(&mut self, catalog: ChampionCatalog) {
        self.catalog = catalog;
    }

    pub fn history_window(&self) -> usize {
        self.history_window
    }

    pub fn has_history(&self, guild_id: u64) -> bool {
        self.histories.contains_key(&guild_id)
    }

    pub fn history(&self, guild_id: u64) -> Option<&ChampionHistory> {
        self.histories.get(&guild_id)
    }

    /// Install a history loaded by an external persistence collaborator.
    pub fn attach_history(&mut self, guild_id: u64, history: ChampionHistory) {
        self.histories.insert(guild_id, history);
    }

    /// Split the participants into two role-covered teams, champions left
    /// unassigned. Does not consume or record history.
    pub fn randomize_teams<R: Rng>(
        &mut self,
        guild_id: u64,
        player_ids: &[u64],
        rng: &mut R,
    ) -> Result<AssignmentResult, SessionError> {
        self.build_teams(guild_id, player_ids, rng)
    }

    /// Full assignment: teams, roles and champions, with repeat-avoidance
    /// against this guild's recent sessions.
    pub fn randomize<R: Rng>(
        &mut self,
        guild_id: u64,
        player_ids: &[u64],
        rng: &mut R,
    ) -> Result<AssignmentResult, SessionError> {
        let mut result = self.build_teams(guild_id, player_ids, rng)?;

        let window = self.history_window;
        let history = self
            .histories
            .entry(guild_id)
            .or_insert_with(|| ChampionHistory::new(window));

        let mut used: HashSet<String> = HashSet::new();
        champion::assign_champions(&mut result.blue, &self.catalog, history, &mut used, rng)?;
        champion::assign_champions(&mut result.red, &self.catalog, history, &mut used, rng)?;

        history.record(collect_picks(&result.blue, &result.red));
        debug!(guild_id, entries = history.len(), "recorded champion history");

        Ok(result)
    }

    fn build_teams<R: Rng>(
        &self,
        guild_id: u64,
        player_ids: &[u64],
        rng: &mut R,
    ) -> Result<AssignmentResult, SessionError> {
        let players = self.roster.get(player_ids)?;
        let format = GameFormat::for_player_count(players.len())
            .ok_or(TeamError::UnsupportedPlayerCount(players.len()))?;

        let (roles, flex_role) = format.draw_roles(rng);
        let (blue, red) = team::split(players, &roles, rng)?;
        debug!(guild_id, mode = format.name, "teams drawn");

        Ok(AssignmentResult {
            mode: format.name,
            flex_role,
            blue,
            red,
            participants: player_ids.to_vec(),
            created_at: Utc::now(),
        })
    }
}

fn collect_picks(blue: &Team, red: &Team) -> Vec<(Role, String)> {
    blue.slots
        .iter()
        .chain(red.slots.iter())
        .filter_map(|slot| slot.champion.clone().map(|champion| (slot.role, champion)))
        .collect()
}
