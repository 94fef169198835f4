use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::features::announcer::{
    self, AnnounceRequest, DiscordSink, DispatchError, RelayKind,
};
use crate::utils::config::{colors, COMMAND_PREFIX};
use crate::{Context, Error};

/// Strip the broadcast-mention flags out of an announcement body.
fn parse_everyone_flag(message: &str) -> (String, bool) {
    let lower = message.to_lowercase();
    let wants = lower.contains("--everyone") || lower.contains("@everyone");
    let clean = message
        .replace("--everyone", "")
        .replace("@everyone", "")
        .trim()
        .to_string();
    (clean, wants)
}

async fn can_mention_everyone(ctx: &Context<'_>) -> bool {
    let Some(member) = ctx.author_member().await else {
        return false;
    };
    member
        .permissions(ctx.serenity_context())
        .map(|p| p.mention_everyone() || p.administrator())
        .unwrap_or(false)
}

/// Broadcast an announcement to all configured language channels
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS"
)]
pub async fn announce(
    ctx: Context<'_>,
    #[rest]
    #[description = "Announcement text (add --everyone to ping everyone)"]
    message: String,
) -> Result<(), Error> {
    run_announce(ctx, message, false).await
}

/// Broadcast an announcement with an @everyone mention
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_CHANNELS | MENTION_EVERYONE"
)]
pub async fn announce_everyone(
    ctx: Context<'_>,
    #[rest]
    #[description = "Announcement text"]
    message: String,
) -> Result<(), Error> {
    run_announce(ctx, message, true).await
}

async fn run_announce(
    ctx: Context<'_>,
    message: String,
    force_everyone: bool,
) -> Result<(), Error> {
    let guild_id = match ctx.guild_id() {
        Some(id) => id.get(),
        None => {
            ctx.say("This command can only be used in a server.").await?;
            return Ok(());
        }
    };

    let (clean_message, inline_flag) = parse_everyone_flag(&message);
    if clean_message.is_empty() {
        ctx.say(format!(
            "\u{274C} Usage: `{}announce <message>`",
            COMMAND_PREFIX
        ))
        .await?;
        return Ok(());
    }

    let mut mention_everyone = force_everyone || inline_flag;
    if mention_everyone && !force_everyone && !can_mention_everyone(&ctx).await {
        ctx.say("\u{274C} You need 'Mention Everyone' permission to ping everyone; sending without the mention.")
            .await?;
        mention_everyone = false;
    }
    if mention_everyone {
        info!("@everyone mention requested by {}", ctx.author().name);
    }

    let data = ctx.data();
    let config = data.registry.snapshot(guild_id);
    if config.language_channels.is_empty() {
        ctx.say(format!(
            "\u{274C} No announcement language channels configured for this server.\nUse `{}set_lang_channel` to configure channels first.",
            COMMAND_PREFIX
        ))
        .await?;
        return Ok(());
    }

    ctx.defer().await?;

    let request = AnnounceRequest {
        text: clean_message,
        source_language: "en".to_string(),
        mention_everyone,
        targets: None,
        author_name: ctx.author().display_name().to_string(),
        author_icon: ctx.author().avatar_url(),
        origin: format!("<#{}>", ctx.channel_id().get()),
        kind: RelayKind::Announcement,
    };

    let sink = DiscordSink::new(ctx.serenity_context().http.clone());
    let summary = match announcer::dispatch(
        data.translator.as_ref(),
        &sink,
        &config,
        &request,
    )
    .await
    {
        Ok(summary) => summary,
        Err(DispatchError::NoChannelsConfigured) => {
            ctx.say("\u{274C} No announcement language channels configured.")
                .await?;
            return Ok(());
        }
        Err(e) => {
            error!("Announcement dispatch error: {:?}", e);
            ctx.say("\u{274C} Failed to send announcements. Please try again.")
                .await?;
            return Ok(());
        }
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("\u{2705} Announcement Summary")
        .color(colors::SUCCESS)
        .field(
            "Successfully Sent",
            format!("{} channels", summary.sent_count()),
            true,
        );

    if !summary.failed.is_empty() {
        let failed: Vec<String> = summary
            .failed
            .iter()
            .map(|(code, err)| format!("{} ({})", config.language_name(code), err))
            .collect();
        embed = embed.field("Failed/Skipped", failed.join("\n"), true);
    }

    let configured: Vec<String> = config
        .language_channels
        .keys()
        .map(|code| format!("{} (`{}`)", config.language_name(code), code))
        .collect();
    embed = embed.field("Configured Languages", configured.join("\n"), false);

    if mention_everyone {
        embed = embed.field(
            "Special Mention",
            "@everyone was pinged in all channels",
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!(
        "Multi-language announcement sent by {} in guild {} (everyone: {})",
        ctx.author().name,
        guild_id,
        mention_everyone
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_everyone_flag() {
        assert_eq!(parse_everyone_flag("hello"), ("hello".into(), false));
        assert_eq!(
            parse_everyone_flag("patch day --everyone"),
            ("patch day".into(), true)
        );
        assert_eq!(
            parse_everyone_flag("@everyone patch day"),
            ("patch day".into(), true)
        );
        assert_eq!(parse_everyone_flag("--everyone"), ("".into(), true));
    }
}
