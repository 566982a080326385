use std::fmt;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

pub mod catalog;
pub mod champion;
pub mod commands;
pub mod roster;
pub mod session;
pub mod team;

/// The five in-game positions. Declared in map order so sorting slots by
/// role reproduces the conventional Top → Support listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Top, Role::Jungle, Role::Mid, Role::Bot, Role::Support];

    /// Parse a loose role tag as found in config files and user input.
    pub fn parse(tag: &str) -> Option<Role> {
        match tag.trim().to_lowercase().as_str() {
            "top" => Some(Role::Top),
            "jungle" | "jgl" | "jg" => Some(Role::Jungle),
            "mid" | "middle" => Some(Role::Mid),
            "bot" | "bottom" | "adc" => Some(Role::Bot),
            "support" | "sup" | "supp" => Some(Role::Support),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Top => "Top",
            Role::Jungle => "Jungle",
            Role::Mid => "Mid",
            Role::Bot => "Bot",
            Role::Support => "Support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered player. Owned by the roster; the randomizers work on clones.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u64,
    pub name: String,
    /// Most- to least-preferred. Empty means no stated preference.
    pub preferences: Vec<Role>,
    /// 1 = Iron .. 10 = Challenger. None until a ranked lookup succeeds.
    pub skill_tier: Option<u8>,
    pub riot_id: Option<String>,
    pub owned_champions: Vec<String>,
}

impl Player {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Player {
            id,
            name: name.into(),
            preferences: Vec::new(),
            skill_tier: None,
            riot_id: None,
            owned_champions: Vec::new(),
        }
    }

    pub fn with_preferences(mut self, preferences: Vec<Role>) -> Self {
        self.preferences = preferences;
        self
    }
}

/// One role slot on a team. The champion is filled in by the champion
/// randomizer; a teams-only session leaves it empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSlot {
    pub role: Role,
    pub player: Player,
    pub champion: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub slots: Vec<TeamSlot>,
}

/// Combined output of one randomize request.
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub mode: &'static str,
    /// The Jungle/Support role drawn for a 4v4 session, if any.
    pub flex_role: Option<Role>,
    pub blue: Team,
    pub red: Team,
    pub participants: Vec<u64>,
    pub created_at: DateTime<Utc>,
}

/// Supported session formats, keyed by total participant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameFormat {
    pub name: &'static str,
    base_roles: &'static [Role],
    flex_roles: &'static [Role],
}

const THREES: GameFormat = GameFormat {
    name: "3v3",
    base_roles: &[Role::Top, Role::Mid, Role::Bot],
    flex_roles: &[],
};

const FOURS: GameFormat = GameFormat {
    name: "4v4",
    base_roles: &[Role::Top, Role::Mid, Role::Bot],
    flex_roles: &[Role::Jungle, Role::Support],
};

const FIVES: GameFormat = GameFormat {
    name: "5v5",
    base_roles: &[Role::Top, Role::Jungle, Role::Mid, Role::Bot, Role::Support],
    flex_roles: &[],
};

impl GameFormat {
    pub fn for_player_count(count: usize) -> Option<GameFormat> {
        match count {
            6 => Some(THREES),
            8 => Some(FOURS),
            10 => Some(FIVES),
            _ => None,
        }
    }

    /// Resolve the role list for one session. 4v4 draws Jungle or Support;
    /// both teams play the same drawn role.
    pub fn draw_roles<R: Rng>(&self, rng: &mut R) -> (Vec<Role>, Option<Role>) {
        let mut roles: Vec<Role> = self.base_roles.to_vec();
        let flex = self.flex_roles.choose(rng).copied();
        if let Some(role) = flex {
            roles.push(role);
        }
        (roles, flex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_parse_role_tags() {
        assert_eq!(Role::parse("Top"), Some(Role::Top));
        assert_eq!(Role::parse("  ADC "), Some(Role::Bot));
        assert_eq!(Role::parse("supp"), Some(Role::Support));
        assert_eq!(Role::parse("middle"), Some(Role::Mid));
        assert_eq!(Role::parse("feeder"), None);
    }

    #[test]
    fn test_format_for_player_count() {
        assert_eq!(GameFormat::for_player_count(6).unwrap().name, "3v3");
        assert_eq!(GameFormat::for_player_count(8).unwrap().name, "4v4");
        assert_eq!(GameFormat::for_player_count(10).unwrap().name, "5v5");
        assert!(GameFormat::for_player_count(7).is_none());
        assert!(GameFormat::for_player_count(0).is_none());
    }

    #[test]
    fn test_fours_draws_jungle_or_support() {
        let format = GameFormat::for_player_count(8).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let (roles, flex) = format.draw_roles(&mut rng);
            let drawn = flex.expect("4v4 must draw a flex role");
            assert!(drawn == Role::Jungle || drawn == Role::Support);
            assert_eq!(roles.len(), 4);
            assert!(roles.contains(&drawn));
        }
    }

    #[test]
    fn test_fixed_formats_have_no_flex_role() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let (roles, flex) = GameFormat::for_player_count(10).unwrap().draw_roles(&mut rng);
        assert_eq!(flex, None);
        assert_eq!(roles, Role::ALL.to_vec());
    }
}
