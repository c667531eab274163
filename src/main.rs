use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rusty_dj::commands::music::{
    audio_sources::{YtDlpResolver, ytdlp::YtDlp},
    autoplay::*,
    leave::*,
    move_track::*,
    pause::*,
    play::*,
    playlist::playlist,
    queue::*,
    remove::*,
    shuffle::*,
    skip::*,
    stop::*,
    utils::{
        guild_session::{SessionDeps, SessionSettings},
        music_manager::SessionRegistry,
        songbird_transport::SongbirdTransport,
    },
};
use rusty_dj::config::Config;
use rusty_dj::utils::database::SqlitePlaylistStore;
use rusty_dj::{CommandResult, Context, Data, Error};

#[poise::command(slash_command, prefix_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rusty_dj=debug,warn")),
        )
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_target(true)
        .with_ansi(true)
        .pretty()
        .init();

    dotenv().ok();

    let config = Config::from_env()?;

    // Initialize the SQLite database
    let playlists = Arc::new(SqlitePlaylistStore::open(&config.database_path)?);

    let http = reqwest::Client::new();
    let songbird = Songbird::serenity();
    let resolver = YtDlpResolver::new(
        YtDlp::new(config.ytdlp_path.clone(), config.cookies_file.clone()),
        http.clone(),
        config.serp_api_key.clone(),
    );
    let registry = Arc::new(SessionRegistry::new(SessionDeps {
        resolver: Arc::new(resolver),
        transport: Arc::new(SongbirdTransport::new(songbird.clone(), http)),
        settings: SessionSettings::from_config(&config),
    }));

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // Music commands
        play(),
        pause(),
        resume(),
        skip(),
        stop(),
        leave(),
        queue(),
        remove(),
        move_track(),
        shuffle(),
        autoplay(),
        status(),
        playlist(),
    ];

    let token = config.discord_token.clone();
    let data_registry = registry.clone();
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    registry: data_registry,
                    playlists,
                    config,
                })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .register_songbird_with(songbird)
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Shutting down");
        registry.shutdown().await;
        shard_manager.shutdown_all().await;
    });

    client.start().await.map_err(Into::into)
}
