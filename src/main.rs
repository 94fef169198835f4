// Polyglot Announcer
// A Discord bot for multi-language announcements and channel translation

mod api;
mod commands;
mod features;
mod models;
mod registry;
mod utils;

use std::env;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::translate::GoogleTranslator;
use crate::registry::Registry;
use crate::utils::config::{COMMAND_PREFIX, DEFAULT_CONFIG_PATH};

/// Shared state injected into every command and event handler
pub struct Data {
    pub translator: Arc<GoogleTranslator>,
    pub registry: Arc<Registry>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("translator", &"GoogleTranslator")
            .field("registry", &"Registry")
            .finish()
    }
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::announce::announce(),
        commands::announce::announce_everyone(),
        commands::channels::set_lang_channel(),
        commands::channels::remove_lang_channel(),
        commands::channels::add_lang(),
        commands::channels::remove_lang(),
        commands::channels::set_announcement_channel(),
        commands::channels::announcement_info(),
        commands::translate::translate(),
        commands::translate::detect_language(),
        commands::translate::languages(),
        commands::translate::auto_translate(),
        commands::translate::set_confidence(),
        commands::translate::auto_translate_status(),
    ]
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "polyglot_announcer=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let token = match env::var("DISCORD_TOKEN") {
        Ok(token) => token,
        Err(_) => {
            error!("DISCORD_TOKEN must be set");
            std::process::exit(1);
        }
    };

    let config_path =
        env::var("TRANSLATOR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    info!("Starting Polyglot Announcer...");

    // Build HTTP client for the translation backend
    let http_client = reqwest::Client::builder()
        .user_agent("Polyglot-Announcer/1.0")
        .build()
        .expect("Failed to create HTTP client");

    let translator = Arc::new(GoogleTranslator::new(http_client));

    // Load guild configuration; an unreadable file is fatal
    let registry = match Registry::load(&config_path) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to load configuration from {}: {:#}", config_path, e);
            std::process::exit(1);
        }
    };
    let shutdown_registry = registry.clone();

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(COMMAND_PREFIX.into()),
                ..Default::default()
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say(format!("\u{274C} Error: {}", error)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
                            let _ = ctx
                                .say("\u{274C} You don't have permission to use this command")
                                .await;
                        }
                        err => {
                            error!("Framework error: {:?}", err);
                        }
                    }
                })
            },
            event_handler: |ctx, event, _framework, data| {
                Box::pin(async move {
                    if let serenity::FullEvent::Message { new_message } = event {
                        features::auto_translate::handle_message(ctx, new_message, data)
                            .await?;
                    }
                    Ok(())
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(Data {
                    translator,
                    registry,
                })
            })
        })
        .build();

    // MESSAGE_CONTENT is privileged; enable it in the Discord Dev Portal
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Failed to create client");

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to register Ctrl+C handler");
        info!("Shutting down...");
        if let Err(e) = shutdown_registry.flush() {
            error!("Failed to flush configuration on shutdown: {}", e);
        }
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    info!("Goodbye!");
}
