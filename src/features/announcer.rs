// Announcement dispatcher
// Fans a message out to every configured language channel: translate per
// target (skipping the source language), format an embed, send. Failures
// never cross target boundaries; the caller gets a per-language summary.

use std::sync::Arc;

use futures::future::BoxFuture;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::api::translate::{TranslateError, Translator};
use crate::models::guild::GuildConfig;
use crate::utils::config::{clip, colors};
use crate::utils::languages;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelayKind {
    /// Explicit announcement issued by a command
    Announcement,
    /// Passive relay from an auto-translate channel
    AutoRelay,
}

/// One formatted message bound for a single language channel.
#[derive(Debug, Clone)]
pub struct RelayPayload {
    pub language: String,
    pub language_name: String,
    pub source_language: String,
    pub original: String,
    /// None when the target equals the source language
    pub translated: Option<String>,
    pub author_name: String,
    pub author_icon: Option<String>,
    /// Where the text came from, e.g. "#general"
    pub origin: String,
    pub mention_everyone: bool,
    pub kind: RelayKind,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Translation(#[from] TranslateError),
    #[error("destination channel no longer exists")]
    ChannelMissing,
    #[error("send failed: {0}")]
    Send(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no language channels configured")]
    NoChannelsConfigured,
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
}

/// Seam between the dispatcher and the chat gateway's send primitive.
pub trait RelaySink: Send + Sync {
    fn deliver<'a>(
        &'a self,
        channel_id: &'a str,
        payload: &'a RelayPayload,
    ) -> BoxFuture<'a, Result<(), RelayError>>;
}

/// What to announce and how to attribute it.
#[derive(Debug, Clone)]
pub struct AnnounceRequest {
    pub text: String,
    pub source_language: String,
    pub mention_everyone: bool,
    /// Explicit target subset; None means every configured language
    pub targets: Option<Vec<String>>,
    pub author_name: String,
    pub author_icon: Option<String>,
    pub origin: String,
    pub kind: RelayKind,
}

/// Per-language outcome of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub delivered: Vec<(String, String)>,
    pub failed: Vec<(String, RelayError)>,
}

impl DispatchSummary {
    pub fn sent_count(&self) -> usize {
        self.delivered.len()
    }
}

/// Translate and deliver `request` to every target language, in the
/// configured mapping's order. Each target is independent.
pub async fn dispatch(
    translator: &dyn Translator,
    sink: &dyn RelaySink,
    config: &GuildConfig,
    request: &AnnounceRequest,
) -> Result<DispatchSummary, DispatchError> {
    let targets: Vec<String> = match &request.targets {
        Some(subset) => {
            let mut resolved = Vec::with_capacity(subset.len());
            for key in subset {
                let code = languages::resolve(key)
                    .ok_or_else(|| DispatchError::UnknownLanguage(key.clone()))?;
                resolved.push(code.to_string());
            }
            resolved
        }
        None => config.language_channels.keys().cloned().collect(),
    };

    if targets.is_empty() {
        return Err(DispatchError::NoChannelsConfigured);
    }

    let mut summary = DispatchSummary::default();
    for code in &targets {
        match relay_to_language(translator, sink, config, code, request).await {
            Ok(channel_id) => {
                info!("Relayed to {} channel {}", code, channel_id);
                summary.delivered.push((code.clone(), channel_id));
            }
            Err(e) => {
                warn!("Relay to {} failed: {}", code, e);
                summary.failed.push((code.clone(), e));
            }
        }
    }
    Ok(summary)
}

/// Single-target relay path, shared with the auto-translate monitor.
/// Returns the destination channel id on success.
pub async fn relay_to_language(
    translator: &dyn Translator,
    sink: &dyn RelaySink,
    config: &GuildConfig,
    code: &str,
    request: &AnnounceRequest,
) -> Result<String, RelayError> {
    let channel_id = config
        .language_channels
        .get(code)
        .cloned()
        .ok_or(RelayError::ChannelMissing)?;

    let translated = if code == request.source_language {
        None
    } else {
        let result = translator
            .translate(&request.text, code, Some(&request.source_language))
            .await?;
        Some(result.translated_text)
    };

    let payload = RelayPayload {
        language: code.to_string(),
        language_name: config.language_name(code),
        source_language: request.source_language.clone(),
        original: request.text.clone(),
        translated,
        author_name: request.author_name.clone(),
        author_icon: request.author_icon.clone(),
        origin: request.origin.clone(),
        mention_everyone: request.mention_everyone,
        kind: request.kind,
    };

    sink.deliver(&channel_id, &payload).await?;
    Ok(channel_id)
}

/// Sink that sends real Discord embeds.
pub struct DiscordSink {
    http: Arc<serenity::Http>,
}

impl DiscordSink {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }

    fn build_embed(payload: &RelayPayload) -> serenity::CreateEmbed {
        let source_name = languages::display_name(&payload.source_language).to_string();
        let mut embed = match payload.kind {
            RelayKind::Announcement => serenity::CreateEmbed::new()
                .title("\u{1F4E2} Announcement")
                .color(colors::PRIMARY)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Announced in {}",
                    payload.origin
                ))),
            RelayKind::AutoRelay => serenity::CreateEmbed::new()
                .title("\u{1F504} Auto Translation")
                .color(colors::WARNING)
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "From {} in {}",
                    payload.author_name, payload.origin
                ))),
        };

        let mut author = serenity::CreateEmbedAuthor::new(&payload.author_name);
        if let Some(icon) = &payload.author_icon {
            author = author.icon_url(icon);
        }
        embed = embed.author(author).timestamp(serenity::Timestamp::now());

        match &payload.translated {
            Some(translated) => {
                embed = embed
                    .field(
                        format!("Message ({})", payload.language_name),
                        clip(translated, 1000),
                        false,
                    )
                    .field(
                        format!("Original ({})", source_name),
                        clip(&payload.original, 1000),
                        false,
                    );
            }
            None => {
                embed = embed.field("Message", clip(&payload.original, 1000), false);
            }
        }
        embed
    }
}

impl RelaySink for DiscordSink {
    fn deliver<'a>(
        &'a self,
        channel_id: &'a str,
        payload: &'a RelayPayload,
    ) -> BoxFuture<'a, Result<(), RelayError>> {
        Box::pin(async move {
            let id: u64 = channel_id.parse().map_err(|_| RelayError::ChannelMissing)?;

            let mut message =
                serenity::CreateMessage::new().embed(Self::build_embed(payload));
            if payload.mention_everyone {
                message = message.content("@everyone");
            }

            serenity::ChannelId::new(id)
                .send_message(&self.http, message)
                .await
                .map_err(|e| match &e {
                    serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(resp))
                        if resp.status_code == serenity::StatusCode::NOT_FOUND =>
                    {
                        RelayError::ChannelMissing
                    }
                    _ => RelayError::Send(e.to_string()),
                })?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::api::translate::TranslationResult;

    struct ScriptedTranslator {
        fail_for: HashSet<String>,
        calls: AtomicUsize,
    }

    impl ScriptedTranslator {
        fn new(fail_for: &[&str]) -> Self {
            Self {
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Translator for ScriptedTranslator {
        fn translate<'a>(
            &'a self,
            text: &'a str,
            target: &'a str,
            source: Option<&'a str>,
        ) -> BoxFuture<'a, Result<TranslationResult, TranslateError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if self.fail_for.contains(target) {
                    return Err(TranslateError::Unavailable("scripted failure".into()));
                }
                Ok(TranslationResult {
                    translated_text: format!("[{}] {}", target, text),
                    detected_source: source.unwrap_or("en").to_string(),
                    confidence: 0.99,
                })
            })
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        missing: HashSet<String>,
        sent: Mutex<Vec<(String, String, Option<String>)>>,
    }

    impl RelaySink for RecordingSink {
        fn deliver<'a>(
            &'a self,
            channel_id: &'a str,
            payload: &'a RelayPayload,
        ) -> BoxFuture<'a, Result<(), RelayError>> {
            Box::pin(async move {
                if self.missing.contains(channel_id) {
                    return Err(RelayError::ChannelMissing);
                }
                self.sent.lock().unwrap().push((
                    channel_id.to_string(),
                    payload.language.clone(),
                    payload.translated.clone(),
                ));
                Ok(())
            })
        }
    }

    fn request(text: &str) -> AnnounceRequest {
        AnnounceRequest {
            text: text.to_string(),
            source_language: "en".to_string(),
            mention_everyone: false,
            targets: None,
            author_name: "tester".to_string(),
            author_icon: None,
            origin: "#general".to_string(),
            kind: RelayKind::Announcement,
        }
    }

    fn config_with(channels: &[(&str, &str)]) -> GuildConfig {
        let mut config = GuildConfig::default();
        for (code, channel) in channels {
            config
                .language_channels
                .insert(code.to_string(), channel.to_string());
        }
        config
    }

    #[tokio::test]
    async fn test_batch_isolation_on_translation_failure() {
        let config = config_with(&[("en", "C1"), ("ko", "C2"), ("th", "C3")]);
        let translator = ScriptedTranslator::new(&["ko"]);
        let sink = RecordingSink::default();

        let summary = dispatch(&translator, &sink, &config, &request("Hello"))
            .await
            .unwrap();

        assert_eq!(summary.sent_count(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "ko");
        assert!(matches!(
            summary.failed[0].1,
            RelayError::Translation(TranslateError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_source_language_sent_verbatim() {
        let config = config_with(&[("en", "C1"), ("ko", "C2")]);
        let translator = ScriptedTranslator::new(&[]);
        let sink = RecordingSink::default();

        let summary = dispatch(&translator, &sink, &config, &request("Hello"))
            .await
            .unwrap();

        assert_eq!(summary.sent_count(), 2);
        // one translation call: only the Korean target
        assert_eq!(translator.calls.load(Ordering::SeqCst), 1);

        let sent = sink.sent.lock().unwrap();
        let english = sent.iter().find(|(c, _, _)| c == "C1").unwrap();
        assert_eq!(english.2, None);
        let korean = sent.iter().find(|(c, _, _)| c == "C2").unwrap();
        assert_eq!(korean.2.as_deref(), Some("[ko] Hello"));
    }

    #[tokio::test]
    async fn test_empty_target_set() {
        let config = config_with(&[]);
        let translator = ScriptedTranslator::new(&[]);
        let sink = RecordingSink::default();

        assert!(matches!(
            dispatch(&translator, &sink, &config, &request("Hello")).await,
            Err(DispatchError::NoChannelsConfigured)
        ));
        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_channel_does_not_abort_batch() {
        let config = config_with(&[("en", "C1"), ("ko", "C2")]);
        let translator = ScriptedTranslator::new(&[]);
        let sink = RecordingSink {
            missing: HashSet::from(["C2".to_string()]),
            ..Default::default()
        };

        let summary = dispatch(&translator, &sink, &config, &request("Hello"))
            .await
            .unwrap();

        assert_eq!(summary.sent_count(), 1);
        assert_eq!(summary.delivered[0].0, "en");
        assert!(matches!(summary.failed[0].1, RelayError::ChannelMissing));
    }

    #[tokio::test]
    async fn test_explicit_subset_resolves_aliases() {
        let config = config_with(&[("en", "C1"), ("ko", "C2"), ("th", "C3")]);
        let translator = ScriptedTranslator::new(&[]);
        let sink = RecordingSink::default();

        let mut req = request("Hello");
        req.targets = Some(vec!["korean".to_string()]);
        let summary = dispatch(&translator, &sink, &config, &req).await.unwrap();
        assert_eq!(summary.sent_count(), 1);
        assert_eq!(summary.delivered[0].0, "ko");

        req.targets = Some(vec!["klingon".to_string()]);
        assert!(matches!(
            dispatch(&translator, &sink, &config, &req).await,
            Err(DispatchError::UnknownLanguage(_))
        ));
    }
}
