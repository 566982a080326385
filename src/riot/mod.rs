use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

const DATA_DRAGON_BASE: &str = "https://ddragon.leagueoflegends.com";

/// Client for Data Dragon and the Riot API. Every public lookup is
/// tolerant: a missing API key, a rate limit or a network failure degrades
/// to `None`/empty so a command never dies on Riot's side.
pub struct RiotClient {
    http: reqwest::Client,
    api_key: Option<String>,
    cache_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionInfo {
    pub id: String,
    /// Riot's numeric key, kept as a string to match mastery responses.
    pub key: String,
    pub name: String,
    pub image: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChampionCache {
    pub version: String,
    pub champions: HashMap<String, ChampionInfo>,
}

#[derive(Deserialize)]
struct AccountDto {
    puuid: String,
}

#[derive(Deserialize)]
struct LeagueEntryDto {
    #[serde(rename = "queueType")]
    queue_type: String,
    tier: String,
}

#[derive(Deserialize)]
struct MasteryDto {
    #[serde(rename = "championId")]
    champion_id: i64,
}

#[derive(Deserialize)]
struct ChampionListDto {
    data: HashMap<String, ChampionDto>,
}

#[derive(Deserialize)]
struct ChampionDto {
    id: String,
    key: String,
    name: String,
}

impl RiotClient {
    pub fn new(api_key: Option<String>, cache_path: impl AsRef<Path>) -> Self {
        RiotClient {
            http: reqwest::Client::new(),
            api_key,
            cache_path: cache_path.as_ref().to_path_buf(),
        }
    }

    /// Resolve a Riot ID (`Name#TAG`) to a PUUID. `None` when the account
    /// does not exist or the lookup cannot be performed.
    pub async fn get_puuid(&self, game_name: &str, tag_line: &str, region: &str) -> Option<String> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("no RIOT_API_KEY set, skipping account lookup");
            return None;
        };

        let url = format!(
            "https://{}.api.riotgames.com/riot/account/v1/accounts/by-riot-id/{}/{}",
            routing_for(region),
            game_name,
            tag_line
        );
        match self.get_json::<AccountDto>(&url, key).await {
            Ok(Some(account)) => Some(account.puuid),
            Ok(None) => None,
            Err(e) => {
                warn!("account lookup for {game_name}#{tag_line} failed: {e}");
                None
            }
        }
    }

    /// Ranked solo tier mapped onto 1 (Iron) .. 10 (Challenger). `None` for
    /// unranked players and for any lookup failure.
    pub async fn fetch_skill(&self, puuid: &str, region: &str) -> Option<u8> {
        let key = self.api_key.as_deref()?;
        let url = format!(
            "https://{}.api.riotgames.com/lol/league/v4/entries/by-puuid/{}",
            region, puuid
        );
        let entries = match self.get_json::<Vec<LeagueEntryDto>>(&url, key).await {
            Ok(Some(entries)) => entries,
            Ok(None) => return None,
            Err(e) => {
                warn!("ranked lookup failed: {e}");
                return None;
            }
        };

        entries
            .iter()
            .find(|entry| entry.queue_type == "RANKED_SOLO_5x5")
            .or_else(|| entries.first())
            .and_then(|entry| tier_value(&entry.tier))
    }

    /// Champion names the player has mastery points on. Empty on any
    /// failure; the caller treats an empty pool as "no restriction".
    pub async fn owned_champions(&self, puuid: &str, region: &str) -> Vec<String> {
        let Some(key) = self.api_key.as_deref() else {
            return Vec::new();
        };
        let url = format!(
            "https://{}.api.riotgames.com/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            region, puuid
        );
        let masteries = match self.get_json::<Vec<MasteryDto>>(&url, key).await {
            Ok(Some(masteries)) => masteries,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("mastery lookup failed: {e}");
                return Vec::new();
            }
        };

        let cache = match self.champion_cache().await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("champion cache unavailable: {e}");
                return Vec::new();
            }
        };

        let keys: Vec<String> = masteries
            .iter()
            .map(|m| m.champion_id.to_string())
            .collect();
        let mut owned: Vec<String> = cache
            .champions
            .values()
            .filter(|info| keys.contains(&info.key))
            .map(|info| info.name.clone())
            .collect();
        owned.sort();
        owned
    }

    /// All champions from Data Dragon, cached on disk keyed by game version.
    pub async fn champion_cache(&self) -> Result<ChampionCache, Error> {
        if let Ok(content) = fs::read_to_string(&self.cache_path) {
            if let Ok(cache) = serde_json::from_str::<ChampionCache>(&content) {
                if !cache.version.is_empty() {
                    return Ok(cache);
                }
            }
        }

        let version = self.latest_version().await?;
        let url = format!(
            "{DATA_DRAGON_BASE}/cdn/{version}/data/en_US/champion.json"
        );
        let list: ChampionListDto = self.http.get(&url).send().await?.json().await?;

        let champions = list
            .data
            .into_iter()
            .map(|(champ_id, champ)| {
                let image = format!(
                    "{DATA_DRAGON_BASE}/cdn/{version}/img/champion/{}.png",
                    champ.id
                );
                (
                    champ_id,
                    ChampionInfo {
                        id: champ.id,
                        key: champ.key,
                        name: champ.name,
                        image,
                    },
                )
            })
            .collect();

        let cache = ChampionCache { version, champions };
        if let Some(parent) = self.cache_path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.cache_path, serde_json::to_string_pretty(&cache)?) {
            warn!("could not write champion cache: {e}");
        }
        Ok(cache)
    }

    async fn latest_version(&self) -> Result<String, Error> {
        let versions: Vec<String> = self
            .http
            .get(format!("{DATA_DRAGON_BASE}/api/versions.json"))
            .send()
            .await?
            .json()
            .await?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| "Data Dragon returned no versions".into())
    }

    /// GET with the API key header. `Ok(None)` for a 404, `Err` otherwise.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        key: &str,
    ) -> Result<Option<T>, Error> {
        let response = self
            .http
            .get(url)
            .header("X-Riot-Token", key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(format!("riot api returned {}", response.status()).into());
        }
        Ok(Some(response.json().await?))
    }
}

/// Platform region → account-v1 routing host.
fn routing_for(region: &str) -> &'static str {
    match region.to_lowercase().as_str() {
        "euw1" | "eun1" | "tr1" | "ru" => "europe",
        "kr" | "jp1" => "asia",
        "oc1" | "ph2" | "sg2" | "th2" | "tw2" | "vn2" => "sea",
        _ => "americas",
    }
}

fn tier_value(tier: &str) -> Option<u8> {
    match tier.to_uppercase().as_str() {
        "IRON" => Some(1),
        "BRONZE" => Some(2),
        "SILVER" => Some(3),
        "GOLD" => Some(4),
        "PLATINUM" => Some(5),
        "EMERALD" => Some(6),
        "DIAMOND" => Some(7),
        "MASTER" => Some(8),
        "GRANDMASTER" => Some(9),
        "CHALLENGER" => Some(10),
        _ => None,
    }
}

/// Display name for a stored skill tier.
pub fn tier_name(tier: u8) -> &'static str {
    match tier {
        1 => "Iron",
        2 => "Bronze",
        3 => "Silver",
        4 => "Gold",
        5 => "Platinum",
        6 => "Emerald",
        7 => "Diamond",
        8 => "Master",
        9 => "Grandmaster",
        10 => "Challenger",
        _ => "Unranked",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_mapping_round_trip() {
        assert_eq!(tier_value("GOLD"), Some(4));
        assert_eq!(tier_value("gold"), Some(4));
        assert_eq!(tier_value("WOOD"), None);
        assert_eq!(tier_name(4), "Gold");
        assert_eq!(tier_name(0), "Unranked");
    }

    #[test]
    fn test_region_routing() {
        assert_eq!(routing_for("euw1"), "europe");
        assert_eq!(routing_for("KR"), "asia");
        assert_eq!(routing_for("na1"), "americas");
        assert_eq!(routing_for("unknown"), "americas");
    }
}
