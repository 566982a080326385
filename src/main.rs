mod keep_alive;
mod league;
mod riot;
mod settings;
mod storage;

use std::collections::HashMap;
use std::env::var;

use poise::serenity_prelude as serenity;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use league::catalog::ChampionCatalog;
use league::commands::{self, LastSession};
use league::session::SessionCoordinator;

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state for all command invocations. The coordinator sits behind
/// one async mutex, which serializes randomize calls and history updates.
pub struct Data {
    engine: tokio::sync::Mutex<SessionCoordinator>,
    database: SqlitePool,
    riot: riot::RiotClient,
    settings: settings::Settings,
    last_sessions: tokio::sync::Mutex<HashMap<u64, LastSession>>,
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {:?}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("error in command `{}`: {:?}", ctx.command().name, error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("error while handling error: {}", e);
            }
        }
    }
}

async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    _data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Ready { data_about_bot, .. } = event {
        info!("logged in as {}", data_about_bot.user.name);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let options = poise::FrameworkOptions {
        commands: vec![
            commands::register(),
            commands::unregister(),
            commands::set_roles(),
            commands::link_riot(),
            commands::list_players(),
            commands::randomize(),
            commands::randomize_champions(),
            commands::reroll(),
            commands::reload_champions(),
        ],
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".into()),
            ..Default::default()
        },
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| {
            Box::pin(async move {
                info!("executing command {}", ctx.command().qualified_name);
            })
        },
        event_handler: |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                let settings = settings::load()?;

                // A catalog that fails validation keeps the bot from
                // starting at all; a randomize against it could never work.
                let catalog = ChampionCatalog::load_from_file(&settings.paths.champion_roles)?;
                info!("loaded {} champions from catalog", catalog.len());

                let pool = SqlitePool::connect(&var("DATABASE_URL")?).await?;
                storage::init_schema(&pool).await?;

                let mut coordinator = SessionCoordinator::new(catalog, settings.history.window);
                match storage::load_roster(&pool).await {
                    Ok(players) => {
                        info!("loaded {} registered players", players.len());
                        for player in players {
                            coordinator.roster_mut().register(player);
                        }
                    }
                    Err(e) => warn!("could not load roster, starting empty: {e}"),
                }

                let riot_client =
                    riot::RiotClient::new(var("RIOT_API_KEY").ok(), &settings.paths.champion_cache);

                keep_alive::spawn(settings.keep_alive.port);

                Ok(Data {
                    engine: tokio::sync::Mutex::new(coordinator),
                    database: pool,
                    riot: riot_client,
                    settings,
                    last_sessions: tokio::sync::Mutex::new(HashMap::new()),
                })
            })
        })
        .options(options)
        .build();

    dotenv::dotenv().ok();
    let token = var("DISCORD_TOKEN")
        .expect("Missing `DISCORD_TOKEN` env var, see README for more information.");
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("failed to build client");

    if let Err(e) = client.start().await {
        error!("client stopped: {e}");
    }
}
