use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::config::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::utils::languages;

/// A channel under passive auto-translate monitoring.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoTranslateChannel {
    /// Configured source language code, or "auto" to run detection
    pub source_language: String,
}

impl AutoTranslateChannel {
    pub fn is_auto_detect(&self) -> bool {
        self.source_language == "auto"
    }
}

/// Guild (Server) specific configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct GuildConfig {
    /// Channel ID for plain announcements
    pub announcement_channel_id: Option<String>,
    /// Languages available for announcements in this guild (code -> name)
    pub languages: BTreeMap<String, String>,
    /// Language code -> destination channel ID
    pub language_channels: BTreeMap<String, String>,
    /// Channel ID -> auto-translate settings
    pub auto_translate_channels: BTreeMap<String, AutoTranslateChannel>,
    /// Detection confidence floor below which auto-translate skips a message
    pub confidence_threshold: f64,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            announcement_channel_id: None,
            languages: languages::default_languages(),
            language_channels: BTreeMap::new(),
            auto_translate_channels: BTreeMap::new(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl GuildConfig {
    /// Display name for a language code, preferring the guild's own table.
    pub fn language_name(&self, code: &str) -> String {
        self.languages
            .get(code)
            .cloned()
            .unwrap_or_else(|| languages::display_name(code).to_string())
    }

    /// Language codes other than `code` that have a destination channel.
    pub fn companion_languages(&self, code: &str) -> Vec<String> {
        self.language_channels
            .keys()
            .filter(|lang| lang.as_str() != code)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = GuildConfig::default();
        assert_eq!(cfg.languages.len(), 8);
        assert!(cfg.language_channels.is_empty());
        assert_eq!(cfg.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_companion_languages() {
        let mut cfg = GuildConfig::default();
        cfg.language_channels.insert("en".into(), "1".into());
        cfg.language_channels.insert("ko".into(), "2".into());
        cfg.language_channels.insert("th".into(), "3".into());
        assert_eq!(cfg.companion_languages("ko"), vec!["en", "th"]);
    }

    #[test]
    fn test_disk_shape_round_trip() {
        let mut cfg = GuildConfig::default();
        cfg.announcement_channel_id = Some("42".into());
        cfg.auto_translate_channels.insert(
            "99".into(),
            AutoTranslateChannel {
                source_language: "auto".into(),
            },
        );
        let json = serde_json::to_value(&cfg).unwrap();
        assert!(json.get("announcementChannelId").is_some());
        assert!(json.get("languageChannels").is_some());
        assert_eq!(
            json["autoTranslateChannels"]["99"]["sourceLanguage"],
            "auto"
        );
        let back: GuildConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.announcement_channel_id.as_deref(), Some("42"));
    }
}
