// Auto-translate monitor
// Watches registered channels and relays foreign-language messages into the
// guild's other language channels, attributed to the original author.

use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::api::translate::Translator;
use crate::features::announcer::{
    self, AnnounceRequest, DiscordSink, DispatchError, DispatchSummary, RelayKind, RelaySink,
};
use crate::models::guild::{AutoTranslateChannel, GuildConfig};
use crate::utils::config::COMMAND_PREFIX;
use crate::Data;

/// Whether a message qualifies for monitoring at all. Returns the channel's
/// auto-translate settings when it does.
pub fn monitored_channel<'a>(
    config: &'a GuildConfig,
    channel_id: &str,
    author_is_bot: bool,
    content: &str,
) -> Option<&'a AutoTranslateChannel> {
    if author_is_bot {
        return None;
    }
    let content = content.trim();
    if content.is_empty() || content.starts_with(COMMAND_PREFIX) {
        return None;
    }
    config.auto_translate_channels.get(channel_id)
}

/// The language a channel serves as a destination for, if it is one of the
/// guild's configured language channels.
pub fn channel_language(config: &GuildConfig, channel_id: &str) -> Option<String> {
    config
        .language_channels
        .iter()
        .find(|(_, chan)| chan.as_str() == channel_id)
        .map(|(lang, _)| lang.clone())
}

/// Post-detection filter: act only on confident detections of a language
/// other than the channel's own. A `false` here is a normal no-op.
pub fn worth_relaying(
    config: &GuildConfig,
    channel_lang: Option<&str>,
    detected: &str,
    confidence: f64,
) -> bool {
    if confidence < config.confidence_threshold {
        return false;
    }
    channel_lang != Some(detected)
}

/// The source language to relay with, or `None` when the message should be
/// left alone. `detection` carries the detector's verdict for auto-detect
/// channels; fixed-language channels relay unconditionally, since their
/// source is declared rather than guessed.
pub fn relay_source(
    config: &GuildConfig,
    channel_id: &str,
    monitored: &AutoTranslateChannel,
    detection: Option<(&str, f64)>,
) -> Option<String> {
    match detection {
        Some((detected, confidence)) => {
            let own = channel_language(config, channel_id);
            if !worth_relaying(config, own.as_deref(), detected, confidence) {
                return None;
            }
            Some(detected.to_string())
        }
        None => Some(monitored.source_language.clone()),
    }
}

/// Relay `content` into every configured language channel other than the
/// source language's own. An empty companion set is a quiet no-op.
pub async fn relay_from_channel(
    translator: &dyn Translator,
    sink: &dyn RelaySink,
    config: &GuildConfig,
    source: &str,
    content: &str,
    author_name: String,
    author_icon: Option<String>,
    origin: String,
) -> DispatchSummary {
    let companions = config.companion_languages(source);
    if companions.is_empty() {
        return DispatchSummary::default();
    }

    let request = AnnounceRequest {
        text: content.to_string(),
        source_language: source.to_string(),
        mention_everyone: false,
        targets: Some(companions),
        author_name,
        author_icon,
        origin,
        kind: RelayKind::AutoRelay,
    };

    match announcer::dispatch(translator, sink, config, &request).await {
        Ok(summary) => summary,
        Err(DispatchError::NoChannelsConfigured) | Err(DispatchError::UnknownLanguage(_)) => {
            DispatchSummary::default()
        }
    }
}

/// Gateway entry point, called for every inbound message.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<(), anyhow::Error> {
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    let config = data.registry.snapshot(guild_id.get());
    let channel_key = msg.channel_id.get().to_string();

    let Some(monitored) =
        monitored_channel(&config, &channel_key, msg.author.bot, &msg.content)
    else {
        return Ok(());
    };

    let content = msg.content.trim();

    // Fixed-language channels skip detection entirely
    let detection = if monitored.is_auto_detect() {
        match data.translator.detect(content).await {
            Ok(result) => Some((result.detected_source, result.confidence)),
            Err(e) => {
                warn!("Language detection failed in {}: {}", channel_key, e);
                return Ok(());
            }
        }
    } else {
        None
    };

    let Some(source) = relay_source(
        &config,
        &channel_key,
        monitored,
        detection.as_ref().map(|(lang, conf)| (lang.as_str(), *conf)),
    ) else {
        debug!("Skipping relay from {} (detection below threshold or same language)", channel_key);
        return Ok(());
    };

    info!(
        "Auto-translating message from {} in {} (source {})",
        msg.author.name, channel_key, source
    );

    let sink = DiscordSink::new(ctx.http.clone());
    let summary = relay_from_channel(
        data.translator.as_ref(),
        &sink,
        &config,
        &source,
        content,
        msg.author.display_name().to_string(),
        Some(
            msg.author
                .avatar_url()
                .unwrap_or_else(|| msg.author.default_avatar_url()),
        ),
        format!("<#{}>", msg.channel_id.get()),
    )
    .await;

    for (code, error) in &summary.failed {
        warn!("Auto-relay to {} failed: {}", code, error);
    }
    Ok(())
}
