use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::league::champion::ChampionHistory;
use crate::league::{Player, Role};

/// Create the tables on first start. Idempotent.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            preferences TEXT NOT NULL DEFAULT '',
            skill_tier INTEGER,
            riot_id TEXT,
            owned_champions TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS champion_history (
            guild_id INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            role TEXT NOT NULL,
            champion TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the whole roster. Rows that fail to decode are skipped with a
/// warning rather than poisoning startup.
pub async fn load_roster(pool: &SqlitePool) -> Result<Vec<Player>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, name, preferences, skill_tier, riot_id, owned_champions
        FROM players
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut players = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.get::<i64, _>("id") as u64;
        let preferences = parse_preferences(&row.get::<String, _>("preferences"));
        let owned: Vec<String> =
            match serde_json::from_str(&row.get::<String, _>("owned_champions")) {
                Ok(list) => list,
                Err(e) => {
                    warn!(id, "discarding unreadable owned_champions column: {e}");
                    Vec::new()
                }
            };

        players.push(Player {
            id,
            name: row.get("name"),
            preferences,
            skill_tier: row.get::<Option<i64>, _>("skill_tier").map(|t| t as u8),
            riot_id: row.get("riot_id"),
            owned_champions: owned,
        });
    }
    Ok(players)
}

pub async fn upsert_player(pool: &SqlitePool, player: &Player) -> Result<(), sqlx::Error> {
    let owned = serde_json::to_string(&player.owned_champions).unwrap_or_else(|_| "[]".into());
    sqlx::query(
        r#"
        INSERT INTO players (id, name, preferences, skill_tier, riot_id, owned_champions)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            preferences = excluded.preferences,
            skill_tier = excluded.skill_tier,
            riot_id = excluded.riot_id,
            owned_champions = excluded.owned_champions
        "#,
    )
    .bind(player.id as i64)
    .bind(&player.name)
    .bind(format_preferences(&player.preferences))
    .bind(player.skill_tier.map(|t| t as i64))
    .bind(&player.riot_id)
    .bind(owned)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn remove_player(pool: &SqlitePool, id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM players WHERE id = $1")
        .bind(id as i64)
        .execute(pool)
        .await?;
    Ok(())
}

/// Rebuild a guild's champion history, oldest entry first.
pub async fn load_history(
    pool: &SqlitePool,
    guild_id: u64,
    window: usize,
) -> Result<ChampionHistory, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT seq, role, champion
        FROM champion_history
        WHERE guild_id = $1
        ORDER BY seq
        "#,
    )
    .bind(guild_id as i64)
    .fetch_all(pool)
    .await?;

    let mut entries: Vec<Vec<(Role, String)>> = Vec::new();
    let mut current_seq: Option<i64> = None;
    for row in rows {
        let seq = row.get::<i64, _>("seq");
        let tag = row.get::<String, _>("role");
        let Some(role) = Role::parse(&tag) else {
            warn!(guild_id, seq, tag, "skipping history row with unknown role");
            continue;
        };
        if current_seq != Some(seq) {
            entries.push(Vec::new());
            current_seq = Some(seq);
        }
        if let Some(entry) = entries.last_mut() {
            entry.push((role, row.get("champion")));
        }
    }

    Ok(ChampionHistory::from_entries(window, entries))
}

/// Replace a guild's stored history with the current snapshot.
pub async fn save_history(
    pool: &SqlitePool,
    guild_id: u64,
    history: &ChampionHistory,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM champion_history WHERE guild_id = $1")
        .bind(guild_id as i64)
        .execute(&mut *tx)
        .await?;

    for (seq, entry) in history.entries().enumerate() {
        for (role, champion) in entry {
            sqlx::query(
                r#"
                INSERT INTO champion_history (guild_id, seq, role, champion)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(guild_id as i64)
            .bind(seq as i64)
            .bind(role.as_str())
            .bind(champion)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await
}

fn format_preferences(preferences: &[Role]) -> String {
    preferences
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_preferences(raw: &str) -> Vec<Role> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .filter_map(Role::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferences_round_trip() {
        let preferences = vec![Role::Mid, Role::Top, Role::Support];
        assert_eq!(format_preferences(&preferences), "Mid,Top,Support");
        assert_eq!(parse_preferences("Mid,Top,Support"), preferences);
        assert_eq!(parse_preferences(""), Vec::<Role>::new());
        assert_eq!(parse_preferences("Mid,,nonsense,Bot"), vec![Role::Mid, Role::Bot]);
    }
}
