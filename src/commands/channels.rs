use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::registry::RegistryError;
use crate::utils::config::{colors, COMMAND_PREFIX};
use crate::utils::languages;
use crate::{Context, Error};

fn guild_id_of(ctx: &Context<'_>) -> Option<u64> {
    ctx.guild_id().map(|id| id.get())
}

fn available_language_lines(ctx: &Context<'_>, guild_id: u64) -> String {
    let config = ctx.data().registry.snapshot(guild_id);
    config
        .languages
        .iter()
        .map(|(code, name)| format!("`{}` - {}", code, name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Set the destination channel for a language's announcements
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_lang_channel(
    ctx: Context<'_>,
    #[description = "Language code or name"] language_key: String,
    #[description = "Destination channel (defaults to current)"] channel: Option<
        serenity::Channel,
    >,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let channel_id = channel
        .map(|c| c.id())
        .unwrap_or_else(|| ctx.channel_id())
        .to_string();

    let data = ctx.data();
    match data
        .registry
        .set_language_channel(guild_id, &language_key, &channel_id)
    {
        Ok(code) => {
            let name = data.registry.snapshot(guild_id).language_name(&code);
            let embed = serenity::CreateEmbed::new()
                .title("\u{2705} Language Channel Set")
                .description(format!(
                    "**{}** (`{}`) announcements will be sent to <#{}>",
                    name, code, channel_id
                ))
                .color(colors::SUCCESS);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!(
                "Language channel set: {} -> {} by {}",
                code,
                channel_id,
                ctx.author().name
            );
        }
        Err(RegistryError::UnknownLanguage(key)) => {
            let embed = serenity::CreateEmbed::new()
                .title("\u{274C} Invalid Language")
                .description(format!("Language `{}` is not recognized.", key))
                .color(colors::ERROR)
                .field(
                    "Available Languages",
                    available_language_lines(&ctx, guild_id),
                    false,
                );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(RegistryError::LanguageUnavailable(code)) => {
            ctx.say(format!(
                "\u{274C} Language `{}` is not enabled on this server. Use `{}add_lang {} <name>` first.",
                code, COMMAND_PREFIX, code
            ))
            .await?;
        }
        Err(e) => {
            error!("Set language channel error: {}", e);
            ctx.say("\u{274C} Failed to set language channel.").await?;
        }
    }
    Ok(())
}

/// Remove a language's channel configuration
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn remove_lang_channel(
    ctx: Context<'_>,
    #[description = "Language code or name"] language_key: String,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let data = ctx.data();
    match data.registry.remove_language_channel(guild_id, &language_key) {
        Ok(code) => {
            let name = data.registry.snapshot(guild_id).language_name(&code);
            ctx.say(format!(
                "\u{2705} Removed {} (`{}`) announcement channel configuration",
                name, code
            ))
            .await?;
        }
        Err(RegistryError::NotFound(code)) => {
            ctx.say(format!("\u{274C} No channel configured for language `{}`", code))
                .await?;
        }
        Err(RegistryError::UnknownLanguage(key)) => {
            ctx.say(format!("\u{274C} Unknown language: `{}`", key)).await?;
        }
        Err(e) => {
            error!("Remove language channel error: {}", e);
            ctx.say("\u{274C} Failed to remove language channel.").await?;
        }
    }
    Ok(())
}

/// Add a language to this server's announcement set
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn add_lang(
    ctx: Context<'_>,
    #[description = "Language code"] language_key: String,
    #[rest]
    #[description = "Display name"]
    name: String,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let data = ctx.data();
    match data.registry.add_language(guild_id, &language_key, &name) {
        Ok(code) => {
            ctx.say(format!("\u{2705} Added new language: **{}** (`{}`)", name, code))
                .await?;
            info!("New language added: {} ({}) by {}", name, code, ctx.author().name);
        }
        Err(RegistryError::Duplicate(code)) => {
            ctx.say(format!("\u{274C} Language `{}` already exists", code))
                .await?;
        }
        Err(RegistryError::UnknownLanguage(key)) => {
            ctx.say(format!(
                "\u{274C} `{}` is not a language the translation backend supports",
                key
            ))
            .await?;
        }
        Err(e) => {
            error!("Add language error: {}", e);
            ctx.say("\u{274C} Failed to add language.").await?;
        }
    }
    Ok(())
}

/// Remove a language (and its channel mapping) from this server
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn remove_lang(
    ctx: Context<'_>,
    #[description = "Language code"] language_key: String,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let data = ctx.data();
    // Name before removal so the confirmation can still show it
    let name = data
        .registry
        .snapshot(guild_id)
        .language_name(languages::resolve(&language_key).unwrap_or(language_key.as_str()));

    match data.registry.remove_language(guild_id, &language_key) {
        Ok(code) => {
            ctx.say(format!("\u{2705} Removed language: **{}** (`{}`)", name, code))
                .await?;
            info!("Language removed: {} by {}", code, ctx.author().name);
        }
        Err(RegistryError::NotFound(code)) => {
            ctx.say(format!("\u{274C} Language `{}` not found", code)).await?;
        }
        Err(RegistryError::UnknownLanguage(key)) => {
            ctx.say(format!("\u{274C} Unknown language: `{}`", key)).await?;
        }
        Err(e) => {
            error!("Remove language error: {}", e);
            ctx.say("\u{274C} Failed to remove language.").await?;
        }
    }
    Ok(())
}

/// Set the channel for plain announcements
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_announcement_channel(
    ctx: Context<'_>,
    #[description = "Destination channel (defaults to current)"] channel: Option<
        serenity::Channel,
    >,
) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let channel_id = channel
        .map(|c| c.id())
        .unwrap_or_else(|| ctx.channel_id())
        .to_string();

    match ctx
        .data()
        .registry
        .set_announcement_channel(guild_id, &channel_id)
    {
        Ok(()) => {
            ctx.say(format!(
                "\u{2705} Announcement channel set to <#{}>",
                channel_id
            ))
            .await?;
        }
        Err(e) => {
            error!("Set announcement channel error: {}", e);
            ctx.say("\u{274C} Failed to set announcement channel.").await?;
        }
    }
    Ok(())
}

/// Show the announcement system configuration for this server
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn announcement_info(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = guild_id_of(&ctx) else {
        return Ok(());
    };

    let config = ctx.data().registry.snapshot(guild_id);

    let channel_lines = if config.language_channels.is_empty() {
        "None configured".to_string()
    } else {
        config
            .language_channels
            .iter()
            .map(|(code, channel)| {
                format!("**{}** (`{}`) \u{2192} <#{}>", config.language_name(code), code, channel)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let embed = serenity::CreateEmbed::new()
        .title("\u{2139} Announcement System Configuration")
        .description("Multi-language announcement system settings")
        .color(colors::INFO)
        .field("Configured Language Channels", channel_lines, false)
        .field(
            "Available Languages",
            available_language_lines(&ctx, guild_id),
            false,
        )
        .field(
            "Management Commands",
            format!(
                "`{p}set_lang_channel <code> [#channel]` - Set language channel\n\
                 `{p}remove_lang_channel <code>` - Remove language channel\n\
                 `{p}add_lang <code> <name>` - Add new language\n\
                 `{p}remove_lang <code>` - Remove language",
                p = COMMAND_PREFIX
            ),
            false,
        )
        .field(
            "Usage",
            format!(
                "`{}announce <message>` - Send to all configured channels",
                COMMAND_PREFIX
            ),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
