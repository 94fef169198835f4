use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::api::translate::{TranslateError, Translator};
use crate::utils::config::{clip, colors, COMMAND_PREFIX};
use crate::utils::languages;
use crate::{Context, Error};

/// Translate text to a target language
#[poise::command(slash_command, prefix_command)]
pub async fn translate(
    ctx: Context<'_>,
    #[description = "Target language code or name"] target_lang: String,
    #[rest]
    #[description = "Text to translate"]
    text: String,
) -> Result<(), Error> {
    let Some(target_code) = languages::resolve(&target_lang) else {
        ctx.say(format!(
            "\u{274C} Unknown language: `{}`\nUse `{}languages` to see supported languages.",
            target_lang, COMMAND_PREFIX
        ))
        .await?;
        return Ok(());
    };

    ctx.defer().await?;

    match ctx.data().translator.translate(&text, target_code, None).await {
        Ok(result) => {
            let source_name = languages::display_name(&result.detected_source).to_string();
            let embed = serenity::CreateEmbed::new()
                .title("\u{1F310} Translation")
                .color(colors::SUCCESS)
                .field(
                    format!("Original ({})", source_name),
                    clip(&text, 1000),
                    false,
                )
                .field(
                    format!("Translation ({})", languages::display_name(target_code)),
                    clip(&result.translated_text, 1000),
                    false,
                )
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Requested by {}",
                    ctx.author().display_name()
                )));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            info!("Translation -> {} by {}", target_code, ctx.author().name);
        }
        Err(TranslateError::EmptyInput) => {
            ctx.say(format!(
                "\u{274C} Usage: `{}translate <language> <text>`",
                COMMAND_PREFIX
            ))
            .await?;
        }
        Err(TranslateError::UnsupportedLanguage(code)) => {
            ctx.say(format!("\u{274C} Unsupported language: `{}`", code))
                .await?;
        }
        Err(e) => {
            error!("Translation error: {}", e);
            ctx.say("\u{274C} Translation failed. Please try again later.")
                .await?;
        }
    }
    Ok(())
}

/// Detect the language of a piece of text
#[poise::command(slash_command, prefix_command)]
pub async fn detect_language(
    ctx: Context<'_>,
    #[rest]
    #[description = "Text to analyze"]
    text: String,
) -> Result<(), Error> {
    ctx.defer().await?;

    match ctx.data().translator.detect(&text).await {
        Ok(result) => {
            let embed = serenity::CreateEmbed::new()
                .title("\u{1F50D} Language Detection")
                .color(colors::PRIMARY)
                .field("Text", clip(&text, 500), false)
                .field(
                    "Detected Language",
                    format!(
                        "{} (`{}`)",
                        languages::display_name(&result.detected_source),
                        result.detected_source
                    ),
                    true,
                )
                .field(
                    "Confidence",
                    format!("{:.0}%", result.confidence * 100.0),
                    true,
                );
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(TranslateError::EmptyInput) => {
            ctx.say(format!("\u{274C} Usage: `{}detect_language <text>`", COMMAND_PREFIX))
                .await?;
        }
        Err(e) => {
            error!("Language detection error: {}", e);
            ctx.say("\u{274C} Language detection failed. Please try again.")
                .await?;
        }
    }
    Ok(())
}

/// List the languages available for announcements on this server
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn languages(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id().map(|id| id.get()) else {
        return Ok(());
    };

    let config = ctx.data().registry.snapshot(guild_id);
    let lines: Vec<String> = config
        .languages
        .iter()
        .map(|(code, name)| format!("`{}` - {}", code, name))
        .collect();

    let (first, second) = language_columns(&lines);
    let embed = serenity::CreateEmbed::new()
        .title("\u{1F310} Available Languages")
        .color(colors::PRIMARY)
        .field("Languages (1)", first, true)
        .field("Languages (2)", second, true)
        .field(
            "Usage",
            format!("Use `{}translate <language> <text>` to translate", COMMAND_PREFIX),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Split language lines into two embed columns. Discord rejects empty field
/// values, so both columns always carry a placeholder at minimum.
fn language_columns(lines: &[String]) -> (String, String) {
    if lines.is_empty() {
        return ("None configured".to_string(), "-".to_string());
    }
    let mid = lines.len().div_ceil(2);
    let second = if lines.len() > mid {
        lines[mid..].join("\n")
    } else {
        "-".to_string()
    };
    (lines[..mid].join("\n"), second)
}

/// Toggle auto-translation for a channel
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn auto_translate(
    ctx: Context<'_>,
    #[description = "Channel to toggle (defaults to current)"] channel: Option<
        serenity::Channel,
    >,
    #[description = "Source language code, or auto"] source: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id().map(|id| id.get()) else {
        return Ok(());
    };

    let channel_id = channel
        .map(|c| c.id())
        .unwrap_or_else(|| ctx.channel_id())
        .to_string();

    let data = ctx.data();
    let enabled = data
        .registry
        .snapshot(guild_id)
        .auto_translate_channels
        .contains_key(&channel_id);

    if enabled {
        match data.registry.clear_auto_translate(guild_id, &channel_id) {
            Ok(()) => {
                ctx.say(format!(
                    "\u{2705} Auto-translation disabled for <#{}>",
                    channel_id
                ))
                .await?;
                info!("Auto-translate disabled for {} by {}", channel_id, ctx.author().name);
            }
            Err(e) => {
                error!("Error toggling auto-translate: {}", e);
                ctx.say("\u{274C} Failed to toggle auto-translation.").await?;
            }
        }
        return Ok(());
    }

    let source = source.unwrap_or_else(|| "auto".to_string());
    match data
        .registry
        .set_auto_translate(guild_id, &channel_id, &source)
    {
        Ok(()) => {
            ctx.say(format!(
                "\u{2705} Auto-translation enabled for <#{}> (source: `{}`)",
                channel_id, source
            ))
            .await?;
            info!("Auto-translate enabled for {} by {}", channel_id, ctx.author().name);
        }
        Err(crate::registry::RegistryError::UnknownLanguage(key)) => {
            ctx.say(format!("\u{274C} Unknown source language: `{}`", key))
                .await?;
        }
        Err(e) => {
            error!("Error toggling auto-translate: {}", e);
            ctx.say("\u{274C} Failed to toggle auto-translation.").await?;
        }
    }
    Ok(())
}

/// Set the language-detection confidence floor for auto-translation
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn set_confidence(
    ctx: Context<'_>,
    #[description = "Minimum detection confidence, 0.0 to 1.0"] value: f64,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id().map(|id| id.get()) else {
        return Ok(());
    };

    match ctx.data().registry.set_confidence_threshold(guild_id, value) {
        Ok(()) => {
            ctx.say(format!(
                "\u{2705} Auto-translate confidence threshold set to {:.0}%",
                value * 100.0
            ))
            .await?;
        }
        Err(crate::registry::RegistryError::Validation(msg)) => {
            ctx.say(format!("\u{274C} {}", msg)).await?;
        }
        Err(e) => {
            error!("Set confidence threshold error: {}", e);
            ctx.say("\u{274C} Failed to update confidence threshold.").await?;
        }
    }
    Ok(())
}

/// Show auto-translation status for this server
#[poise::command(slash_command, prefix_command, guild_only)]
pub async fn auto_translate_status(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id().map(|id| id.get()) else {
        return Ok(());
    };

    let config = ctx.data().registry.snapshot(guild_id);

    let enabled_lines = if config.auto_translate_channels.is_empty() {
        "None".to_string()
    } else {
        config
            .auto_translate_channels
            .iter()
            .map(|(channel, settings)| {
                format!("<#{}> \u{2014} source `{}`", channel, settings.source_language)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let current = ctx.channel_id().to_string();
    let current_state = if config.auto_translate_channels.contains_key(&current) {
        "\u{2705} Enabled"
    } else {
        "\u{274C} Disabled"
    };

    let embed = serenity::CreateEmbed::new()
        .title("\u{1F504} Auto-Translation Status")
        .color(colors::INFO)
        .field("Enabled Channels", enabled_lines, false)
        .field(
            "Current Channel",
            format!("<#{}> - {}", current, current_state),
            false,
        )
        .field(
            "Confidence Threshold",
            format!("{:.0}%", config.confidence_threshold * 100.0),
            true,
        )
        .field(
            "How it works",
            "Messages in monitored channels are translated into every other configured language channel.",
            false,
        )
        .field(
            "Toggle Command",
            format!(
                "Use `{}auto_translate [#channel] [source]` to enable/disable",
                COMMAND_PREFIX
            ),
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_columns_splits_evenly() {
        let lines: Vec<String> = ["`en` - English", "`ko` - Korean", "`th` - Thai"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (first, second) = language_columns(&lines);
        assert_eq!(first, "`en` - English\n`ko` - Korean");
        assert_eq!(second, "`th` - Thai");
    }

    #[test]
    fn test_language_columns_single_entry() {
        let lines = vec!["`en` - English".to_string()];
        let (first, second) = language_columns(&lines);
        assert_eq!(first, "`en` - English");
        assert_eq!(second, "-");
    }

    #[test]
    fn test_language_columns_never_empty() {
        let (first, second) = language_columns(&[]);
        assert_eq!(first, "None configured");
        assert_eq!(second, "-");
    }
}
