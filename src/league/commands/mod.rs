use ::serenity::all::CreateEmbed;
use poise::serenity_prelude as serenity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serenity::model::Timestamp;
use serenity::Color;
use tracing::{info, warn};

use crate::league::catalog::ChampionCatalog;
use crate::league::{AssignmentResult, Player, Role, Team};
use crate::riot;
use crate::storage;
use crate::{Context, Error};

/// What `/reroll` replays, remembered per channel.
#[derive(Debug, Clone)]
pub struct LastSession {
    pub player_ids: Vec<u64>,
    pub with_champions: bool,
}

/// Registers a player for the randomizer
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn register(
    ctx: Context<'_>,
    #[description = "The Discord user to register"] user: serenity::User,
    #[description = "Preferred roles, most preferred first (e.g. mid,top)"] roles: Option<String>,
) -> Result<(), Error> {
    let preferences = match roles.as_deref().map(parse_role_list).transpose() {
        Ok(preferences) => preferences.unwrap_or_default(),
        Err(message) => {
            ctx.say(format!("❌ {message}")).await?;
            return Ok(());
        }
    };

    let name = user.global_name.clone().unwrap_or_else(|| user.name.clone());
    let player = Player::new(user.id.get(), name).with_preferences(preferences);

    {
        let mut engine = ctx.data().engine.lock().await;
        engine.roster_mut().register(player.clone());
    }
    if let Err(e) = storage::upsert_player(&ctx.data().database, &player).await {
        warn!("could not persist player {}: {e}", player.id);
    }

    info!("registered player {} ({})", player.name, player.id);
    ctx.say(format!("✅ Registered **{}**", player.name)).await?;
    Ok(())
}

/// Removes a player from the randomizer
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn unregister(
    ctx: Context<'_>,
    #[description = "The Discord user to unregister"] user: serenity::User,
) -> Result<(), Error> {
    let id = user.id.get();
    let removed = {
        let mut engine = ctx.data().engine.lock().await;
        engine.roster_mut().unregister(id)
    };
    if let Err(e) = storage::remove_player(&ctx.data().database, id).await {
        warn!("could not remove player {id} from storage: {e}");
    }

    if removed {
        ctx.say(format!("✅ Unregistered **{}**", user.name)).await?;
    } else {
        ctx.say(format!("**{}** was not registered", user.name)).await?;
    }
    Ok(())
}

/// Sets your own preferred roles, most preferred first
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn set_roles(
    ctx: Context<'_>,
    #[description = "Roles, most preferred first (e.g. jungle,support)"] roles: String,
) -> Result<(), Error> {
    let preferences = match parse_role_list(&roles) {
        Ok(preferences) => preferences,
        Err(message) => {
            ctx.say(format!("❌ {message}")).await?;
            return Ok(());
        }
    };

    let id = ctx.author().id.get();
    let player = {
        let mut engine = ctx.data().engine.lock().await;
        if engine.roster_mut().set_preferences(id, preferences).is_err() {
            drop(engine);
            ctx.say("❌ You need to be registered first. Ask an admin to use `/register @you`")
                .await?;
            return Ok(());
        }
        engine.roster().player(id).cloned()
    };

    if let Some(player) = &player {
        if let Err(e) = storage::upsert_player(&ctx.data().database, player).await {
            warn!("could not persist player {id}: {e}");
        }
        let listed = player
            .preferences
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        ctx.say(format!("✅ Preferred roles set to: **{listed}**")).await?;
    }
    Ok(())
}

/// Links your Riot account and pulls rank + champion pool
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn link_riot(
    ctx: Context<'_>,
    #[description = "Your Riot ID (e.g. PlayerName#EUW)"] riot_id: String,
    #[description = "Your region (e.g. euw1, na1, kr)"] region: Option<String>,
) -> Result<(), Error> {
    ctx.defer().await?;
    let id = ctx.author().id.get();

    let registered = ctx.data().engine.lock().await.roster().contains(id);
    if !registered {
        ctx.say("❌ You need to be registered first. Ask an admin to use `/register @you`")
            .await?;
        return Ok(());
    }

    let Some((game_name, tag_line)) = riot_id.split_once('#') else {
        ctx.say("❌ Invalid Riot ID format. Use: PlayerName#TAG").await?;
        return Ok(());
    };

    let region = region.unwrap_or_else(|| ctx.data().settings.riot.default_region.clone());
    let Some(puuid) = ctx.data().riot.get_puuid(game_name, tag_line, &region).await else {
        ctx.say(format!("❌ Could not find Riot account: {riot_id}")).await?;
        return Ok(());
    };

    let skill_tier = ctx.data().riot.fetch_skill(&puuid, &region).await;
    let owned = ctx.data().riot.owned_champions(&puuid, &region).await;
    let owned_count = owned.len();

    let player = {
        let mut engine = ctx.data().engine.lock().await;
        engine
            .roster_mut()
            .link_riot(id, riot_id.clone(), skill_tier, owned)?;
        engine.roster().player(id).cloned()
    };
    if let Some(player) = &player {
        if let Err(e) = storage::upsert_player(&ctx.data().database, player).await {
            warn!("could not persist player {id}: {e}");
        }
    }

    let rank = skill_tier.map(riot::tier_name).unwrap_or("Unranked");
    let pool = if owned_count > 0 {
        format!("{owned_count} champions in your pool")
    } else {
        "no champion data, you'll draw from the full roster".to_string()
    };
    ctx.say(format!("✅ Linked **{riot_id}** ({rank}, {pool})")).await?;
    Ok(())
}

/// Shows all registered players
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn list_players(ctx: Context<'_>) -> Result<(), Error> {
    let players = ctx.data().engine.lock().await.roster().all();

    if players.is_empty() {
        ctx.say("❌ No registered players yet.").await?;
        return Ok(());
    }

    let mut embed = CreateEmbed::new()
        .title("🎮 Registered players")
        .color(Color::BLUE);
    for player in &players {
        let roles = if player.preferences.is_empty() {
            "any role".to_string()
        } else {
            player
                .preferences
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(" > ")
        };
        let riot = match (&player.riot_id, player.skill_tier) {
            (Some(riot_id), Some(tier)) => format!("{riot_id} ({})", riot::tier_name(tier)),
            (Some(riot_id), None) => riot_id.clone(),
            (None, _) => "Riot account not linked".to_string(),
        };
        embed = embed.field(&player.name, format!("{roles}\n{riot}"), false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Creates two random teams with role assignments
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn randomize(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let Some(player_ids) = registered_voice_members(&ctx).await else {
        return Ok(());
    };
    run_session(ctx, player_ids, false).await
}

/// Creates two random teams with roles and champions
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn randomize_champions(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let Some(player_ids) = registered_voice_members(&ctx).await else {
        return Ok(());
    };
    run_session(ctx, player_ids, true).await
}

/// Re-randomizes the last session in this channel with the same players
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn reroll(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer().await?;
    let last = {
        let sessions = ctx.data().last_sessions.lock().await;
        sessions.get(&ctx.channel_id().get()).cloned()
    };

    match last {
        Some(session) => run_session(ctx, session.player_ids, session.with_champions).await,
        None => {
            ctx.say("❌ No previous session found! Use `/randomize` or `/randomize_champions` first.")
                .await?;
            Ok(())
        }
    }
}

/// Reloads the champion-roles file without restarting the bot
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn reload_champions(ctx: Context<'_>) -> Result<(), Error> {
    let path = ctx.data().settings.paths.champion_roles.clone();
    match ChampionCatalog::load_from_file(&path) {
        Ok(catalog) => {
            let count = catalog.len();
            ctx.data().engine.lock().await.reload_catalog(catalog);
            info!("champion catalog reloaded from {path}");
            ctx.say(format!("✅ Champion catalog reloaded ({count} champions)")).await?;
        }
        Err(e) => {
            // The old catalog stays in place; a broken file must not take
            // randomize down with it.
            warn!("champion catalog reload failed: {e}");
            ctx.say(format!("❌ Reload failed, keeping the current catalog: {e}")).await?;
        }
    }
    Ok(())
}

/// Everyone in the invoker's voice channel who is registered. Replies with
/// the reason and returns `None` when the session cannot start.
async fn registered_voice_members(ctx: &Context<'_>) -> Option<Vec<u64>> {
    let members = voice_channel_members(ctx);
    let Some(members) = members else {
        let _ = ctx.say("❌ You need to be in a voice channel!").await;
        return None;
    };

    let engine = ctx.data().engine.lock().await;
    let player_ids: Vec<u64> = members
        .into_iter()
        .filter(|id| engine.roster().contains(*id))
        .collect();
    drop(engine);

    if player_ids.is_empty() {
        let _ = ctx.say("❌ No registered players in the voice channel!").await;
        return None;
    }
    Some(player_ids)
}

/// Non-bot members sharing a voice channel with the invoker. None when the
/// invoker is not in one. Collected synchronously so the cache guard never
/// crosses an await point.
fn voice_channel_members(ctx: &Context<'_>) -> Option<Vec<u64>> {
    let guild = ctx.guild()?;
    let channel_id = guild
        .voice_states
        .get(&ctx.author().id)
        .and_then(|state| state.channel_id)?;

    Some(
        guild
            .voice_states
            .iter()
            .filter(|(_, state)| state.channel_id == Some(channel_id))
            .map(|(user_id, _)| *user_id)
            .filter(|user_id| {
                guild
                    .members
                    .get(user_id)
                    .map_or(true, |member| !member.user.bot)
            })
            .map(|user_id| user_id.get())
            .collect(),
    )
}

/// One full session: randomize, persist history, remember for /reroll,
/// render the embed.
async fn run_session(
    ctx: Context<'_>,
    player_ids: Vec<u64>,
    with_champions: bool,
) -> Result<(), Error> {
    let data = ctx.data();
    let Some(guild_id) = ctx.guild_id().map(|g| g.get()) else {
        ctx.say("❌ This only works inside a server").await?;
        return Ok(());
    };

    let mut rng = ChaCha8Rng::from_entropy();
    let mut engine = data.engine.lock().await;

    if with_champions && !engine.has_history(guild_id) {
        match storage::load_history(&data.database, guild_id, engine.history_window()).await {
            Ok(history) => engine.attach_history(guild_id, history),
            // Losing repeat-avoidance is a degradation, not a failure.
            Err(e) => warn!("could not load champion history for guild {guild_id}: {e}"),
        }
    }

    let outcome = if with_champions {
        engine.randomize(guild_id, &player_ids, &mut rng)
    } else {
        engine.randomize_teams(guild_id, &player_ids, &mut rng)
    };
    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            drop(engine);
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };
    let history = engine.history(guild_id).cloned();
    drop(engine);

    if with_champions {
        if let Some(history) = history {
            if let Err(e) = storage::save_history(&data.database, guild_id, &history).await {
                warn!("could not persist champion history for guild {guild_id}: {e}");
            }
        }
    }

    data.last_sessions.lock().await.insert(
        ctx.channel_id().get(),
        LastSession {
            player_ids,
            with_champions,
        },
    );

    let embed = render_assignment(&result, with_champions);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn render_assignment(result: &AssignmentResult, with_champions: bool) -> CreateEmbed {
    let (title, color) = if with_champions {
        (format!("🎮 {} teams with champions!", result.mode), Color::GOLD)
    } else {
        (format!("🎮 {} teams created!", result.mode), Color::DARK_GREEN)
    };

    let mut description = "Use `/reroll` to randomize again with the same players".to_string();
    if let Some(role) = result.flex_role {
        description.push_str(&format!("\nFlex role drawn: **{role}**"));
    }

    CreateEmbed::new()
        .title(title)
        .description(description)
        .field("🔵 Blue Team", format_team(&result.blue), true)
        .field("🔴 Red Team", format_team(&result.red), true)
        .color(color)
        .timestamp(
            Timestamp::from_unix_timestamp(result.created_at.timestamp())
                .unwrap_or_else(|_| Timestamp::now()),
        )
}

fn format_team(team: &Team) -> String {
    team.slots
        .iter()
        .map(|slot| match &slot.champion {
            Some(champion) => format!("**{}** — {} ({champion})", slot.role, slot.player.name),
            None => format!("**{}** — {}", slot.role, slot.player.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a user-supplied role list like "mid, top" or "jungle/support".
fn parse_role_list(input: &str) -> Result<Vec<Role>, String> {
    let mut roles = Vec::new();
    let mut unknown = Vec::new();
    for part in input.split([',', '/']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match Role::parse(part) {
            Some(role) => {
                if !roles.contains(&role) {
                    roles.push(role);
                }
            }
            None => unknown.push(part.to_string()),
        }
    }
    if !unknown.is_empty() {
        return Err(format!("Unknown roles: {}", unknown.join(", ")));
    }
    Ok(roles)
}
