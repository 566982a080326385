use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::league::Role;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read champion roles: {0}")]
    Io(#[from] std::io::Error),
    #[error("champion roles file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("champion `{champion}` lists unknown role tag `{tag}`")]
    UnknownRole { champion: String, tag: String },
    #[error("no champion in the catalog can play {0}")]
    MissingCoverage(Role),
}

/// Validated champion → roles mapping. Read-only once constructed; a reload
/// builds a fresh catalog and swaps it at the coordinator.
///
/// A BTreeMap keeps `eligible_for` output in name order, so a seeded RNG
/// produces identical picks across runs.
#[derive(Debug, Clone)]
pub struct ChampionCatalog {
    champions: BTreeMap<String, Vec<Role>>,
}

impl ChampionCatalog {
    /// Load and validate the champion-roles mapping file. The full role
    /// enumeration must be covered, since any of it can show up in a session.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)?;
        Self::from_entries(raw, &Role::ALL)
    }

    /// Validate raw entries against the role enumeration. Every role in
    /// `required_roles` must end up with at least one eligible champion.
    /// A champion with an empty role list is kept but never selectable.
    pub fn from_entries(
        raw: BTreeMap<String, Vec<String>>,
        required_roles: &[Role],
    ) -> Result<Self, CatalogError> {
        let mut champions = BTreeMap::new();
        for (name, tags) in raw {
            let mut roles: Vec<Role> = Vec::with_capacity(tags.len());
            for tag in tags {
                let role = Role::parse(&tag).ok_or_else(|| CatalogError::UnknownRole {
                    champion: name.clone(),
                    tag,
                })?;
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            champions.insert(name, roles);
        }

        let catalog = ChampionCatalog { champions };
        for &role in required_roles {
            if catalog.eligible_for(role).is_empty() {
                return Err(CatalogError::MissingCoverage(role));
            }
        }
        Ok(catalog)
    }

    /// All champions that can play `role`, in name order.
    pub fn eligible_for(&self, role: Role) -> Vec<&str> {
        self.champions
            .iter()
            .filter(|(_, roles)| roles.contains(&role))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn roles_for(&self, champion: &str) -> Option<&[Role]> {
        self.champions.get(champion).map(Vec::as_slice)
    }

    pub fn contains(&self, champion: &str) -> bool {
        self.champions.contains_key(champion)
    }

    pub fn len(&self) -> usize {
        self.champions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(name, tags)| {
                (
                    name.to_string(),
                    tags.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_eligible_for_filters_by_role() {
        let catalog = ChampionCatalog::from_entries(
            raw(&[
                ("Ahri", &["mid"]),
                ("Gnar", &["top"]),
                ("Yasuo", &["mid", "top"]),
            ]),
            &[Role::Top, Role::Mid],
        )
        .unwrap();

        assert_eq!(catalog.eligible_for(Role::Mid), vec!["Ahri", "Yasuo"]);
        assert_eq!(catalog.eligible_for(Role::Top), vec!["Gnar", "Yasuo"]);
        assert_eq!(catalog.roles_for("Yasuo"), Some(&[Role::Mid, Role::Top][..]));
        assert_eq!(catalog.roles_for("Teemo"), None);
    }

    #[test]
    fn test_unknown_role_tag_is_rejected() {
        let err = ChampionCatalog::from_entries(
            raw(&[("Ahri", &["mid"]), ("Teemo", &["shrubbery"])]),
            &[Role::Mid],
        )
        .unwrap_err();

        match err {
            CatalogError::UnknownRole { champion, tag } => {
                assert_eq!(champion, "Teemo");
                assert_eq!(tag, "shrubbery");
            }
            other => panic!("expected UnknownRole, got {other:?}"),
        }
    }

    #[test]
    fn test_uncovered_role_is_rejected() {
        let err = ChampionCatalog::from_entries(
            raw(&[("Ahri", &["mid"])]),
            &[Role::Mid, Role::Top],
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::MissingCoverage(Role::Top)));
    }

    #[test]
    fn test_empty_role_list_is_tolerated_but_unselectable() {
        let catalog = ChampionCatalog::from_entries(
            raw(&[("Ahri", &["mid"]), ("Urf", &[])]),
            &[Role::Mid],
        )
        .unwrap();

        assert!(catalog.contains("Urf"));
        assert_eq!(catalog.eligible_for(Role::Mid), vec!["Ahri"]);
        for role in Role::ALL {
            assert!(!catalog.eligible_for(role).contains(&"Urf"));
        }
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let catalog = ChampionCatalog::from_entries(
            raw(&[("Ahri", &["mid", "Middle", "MID"])]),
            &[Role::Mid],
        )
        .unwrap();
        assert_eq!(catalog.roles_for("Ahri"), Some(&[Role::Mid][..]));
    }
}
