// Guild configuration registry
// In-memory guild map backed by a JSON file; every mutation validates first,
// then flushes atomically (write temp, rename) with rollback on failure.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::{info, warn};

use crate::models::guild::{AutoTranslateChannel, GuildConfig};
use crate::utils::languages;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
    #[error("language `{0}` is not available on this server")]
    LanguageUnavailable(String),
    #[error("language `{0}` already exists")]
    Duplicate(String),
    #[error("no channel configured for `{0}`")]
    NotConfigured(String),
    #[error("`{0}` not found")]
    NotFound(String),
    #[error("invalid value: {0}")]
    Validation(String),
    #[error("failed to persist configuration")]
    Persistence(#[source] std::io::Error),
}

/// Process-wide registry of per-guild configuration.
pub struct Registry {
    path: PathBuf,
    guilds: DashMap<u64, GuildConfig>,
}

impl Registry {
    /// Load the registry from `path`, or start empty when the file is absent.
    /// A malformed file is an error; startup should treat it as fatal.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let guilds = DashMap::new();

        if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let parsed: BTreeMap<String, GuildConfig> = serde_json::from_str(&raw)?;
            for (guild_id, config) in parsed {
                let id: u64 = guild_id
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid guild id `{}` in config", guild_id))?;
                guilds.insert(id, config);
            }
            info!("Loaded configuration for {} guilds from {}", guilds.len(), path.display());
        } else {
            info!("Config file {} not found, starting with defaults", path.display());
        }

        // Leftover temp file from an interrupted flush; the main file is authoritative
        let tmp = tmp_path(&path);
        if tmp.exists() {
            warn!("Removing stale temp config file {}", tmp.display());
            let _ = fs::remove_file(&tmp);
        }

        Ok(Self { path, guilds })
    }

    /// Consistent copy of a guild's configuration, created on first reference.
    pub fn snapshot(&self, guild_id: u64) -> GuildConfig {
        self.guilds
            .entry(guild_id)
            .or_default()
            .clone()
    }

    pub fn get_language_channel(
        &self,
        guild_id: u64,
        language_key: &str,
    ) -> Result<String, RegistryError> {
        let code = resolve_key(language_key)?;
        let config = self.snapshot(guild_id);
        config
            .language_channels
            .get(code)
            .cloned()
            .ok_or_else(|| RegistryError::NotConfigured(code.to_string()))
    }

    pub fn set_language_channel(
        &self,
        guild_id: u64,
        language_key: &str,
        channel_id: &str,
    ) -> Result<String, RegistryError> {
        let code = resolve_key(language_key)?.to_string();
        self.mutate(guild_id, |config| {
            if !config.languages.contains_key(&code) {
                return Err(RegistryError::LanguageUnavailable(code.clone()));
            }
            let duplicate = config
                .language_channels
                .iter()
                .find(|(lang, chan)| lang.as_str() != code && chan.as_str() == channel_id);
            if let Some((lang, _)) = duplicate {
                warn!(
                    "Channel {} already mapped to language {}; now also {}",
                    channel_id, lang, code
                );
            }
            config
                .language_channels
                .insert(code.clone(), channel_id.to_string());
            Ok(code.clone())
        })
    }

    pub fn remove_language_channel(
        &self,
        guild_id: u64,
        language_key: &str,
    ) -> Result<String, RegistryError> {
        let code = resolve_key(language_key)?.to_string();
        self.mutate(guild_id, |config| {
            config
                .language_channels
                .remove(&code)
                .ok_or_else(|| RegistryError::NotFound(code.clone()))
        })
    }

    /// Add a language to the guild's available set.
    pub fn add_language(
        &self,
        guild_id: u64,
        language_key: &str,
        name: &str,
    ) -> Result<String, RegistryError> {
        let code = resolve_key(language_key)?.to_string();
        self.mutate(guild_id, |config| {
            if config.languages.contains_key(&code) {
                return Err(RegistryError::Duplicate(code.clone()));
            }
            config.languages.insert(code.clone(), name.to_string());
            Ok(code.clone())
        })
    }

    /// Remove a language from the available set, along with its channel mapping.
    pub fn remove_language(
        &self,
        guild_id: u64,
        language_key: &str,
    ) -> Result<String, RegistryError> {
        let code = resolve_key(language_key)?.to_string();
        self.mutate(guild_id, |config| {
            if config.languages.remove(&code).is_none() {
                return Err(RegistryError::NotFound(code.clone()));
            }
            config.language_channels.remove(&code);
            Ok(code.clone())
        })
    }

    pub fn set_announcement_channel(
        &self,
        guild_id: u64,
        channel_id: &str,
    ) -> Result<(), RegistryError> {
        self.mutate(guild_id, |config| {
            config.announcement_channel_id = Some(channel_id.to_string());
            Ok(())
        })
    }

    /// Enable auto-translate monitoring for a channel. `source_language` is a
    /// canonical code, or "auto" to detect per message.
    pub fn set_auto_translate(
        &self,
        guild_id: u64,
        channel_id: &str,
        source_language: &str,
    ) -> Result<(), RegistryError> {
        let source = if source_language == "auto" {
            "auto".to_string()
        } else {
            resolve_key(source_language)?.to_string()
        };
        self.mutate(guild_id, |config| {
            config.auto_translate_channels.insert(
                channel_id.to_string(),
                AutoTranslateChannel {
                    source_language: source.clone(),
                },
            );
            Ok(())
        })
    }

    pub fn clear_auto_translate(
        &self,
        guild_id: u64,
        channel_id: &str,
    ) -> Result<(), RegistryError> {
        self.mutate(guild_id, |config| {
            config
                .auto_translate_channels
                .remove(channel_id)
                .map(|_| ())
                .ok_or_else(|| RegistryError::NotFound(channel_id.to_string()))
        })
    }

    pub fn set_confidence_threshold(
        &self,
        guild_id: u64,
        value: f64,
    ) -> Result<(), RegistryError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(RegistryError::Validation(format!(
                "confidence threshold must be between 0 and 1, got {}",
                value
            )));
        }
        self.mutate(guild_id, |config| {
            config.confidence_threshold = value;
            Ok(())
        })
    }

    /// Apply a validated mutation to one guild and flush. The closure works on
    /// a clone; stored state is untouched unless it succeeds, and a failed
    /// flush restores the pre-mutation snapshot.
    fn mutate<R>(
        &self,
        guild_id: u64,
        f: impl FnOnce(&mut GuildConfig) -> Result<R, RegistryError>,
    ) -> Result<R, RegistryError> {
        let before = self.snapshot(guild_id);
        let mut updated = before.clone();
        let out = f(&mut updated)?;
        self.guilds.insert(guild_id, updated);
        if let Err(e) = self.flush() {
            self.guilds.insert(guild_id, before);
            return Err(RegistryError::Persistence(e));
        }
        Ok(out)
    }

    /// Write all guild configs to disk atomically.
    pub fn flush(&self) -> std::io::Result<()> {
        let mut snapshot: BTreeMap<String, GuildConfig> = BTreeMap::new();
        for entry in self.guilds.iter() {
            snapshot.insert(entry.key().to_string(), entry.value().clone());
        }
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn resolve_key(key: &str) -> Result<&'static str, RegistryError> {
    languages::resolve(key).ok_or_else(|| RegistryError::UnknownLanguage(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_registry() -> (tempfile::TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(dir.path().join("config.json")).unwrap();
        (dir, registry)
    }

    #[test]
    fn test_unconfigured_language_not_configured() {
        let (_dir, registry) = scratch_registry();
        match registry.get_language_channel(1, "ko") {
            Err(RegistryError::NotConfigured(code)) => assert_eq!(code, "ko"),
            other => panic!("expected NotConfigured, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_set_get_round_trip() {
        let (_dir, registry) = scratch_registry();
        registry.set_language_channel(1, "korean", "200").unwrap();
        assert_eq!(registry.get_language_channel(1, "ko").unwrap(), "200");
    }

    #[test]
    fn test_unknown_language_rejected() {
        let (_dir, registry) = scratch_registry();
        assert!(matches!(
            registry.set_language_channel(1, "klingon", "200"),
            Err(RegistryError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_unavailable_language_rejected() {
        let (_dir, registry) = scratch_registry();
        // resolvable code, but not in the guild's default set
        assert!(matches!(
            registry.set_language_channel(1, "fr", "200"),
            Err(RegistryError::LanguageUnavailable(_))
        ));
        registry.add_language(1, "fr", "French").unwrap();
        registry.set_language_channel(1, "fr", "200").unwrap();
    }

    #[test]
    fn test_remove_is_idempotent_failure() {
        let (_dir, registry) = scratch_registry();
        registry.set_language_channel(1, "en", "100").unwrap();
        registry.remove_language_channel(1, "en").unwrap();
        let before = registry.snapshot(1);
        assert!(matches!(
            registry.remove_language_channel(1, "en"),
            Err(RegistryError::NotFound(_))
        ));
        assert_eq!(
            before.language_channels,
            registry.snapshot(1).language_channels
        );
    }

    #[test]
    fn test_remove_language_drops_channel_mapping() {
        let (_dir, registry) = scratch_registry();
        registry.set_language_channel(1, "ko", "200").unwrap();
        registry.remove_language(1, "ko").unwrap();
        let config = registry.snapshot(1);
        assert!(!config.languages.contains_key("ko"));
        assert!(!config.language_channels.contains_key("ko"));
    }

    #[test]
    fn test_duplicate_language_rejected() {
        let (_dir, registry) = scratch_registry();
        assert!(matches!(
            registry.add_language(1, "en", "English"),
            Err(RegistryError::Duplicate(_))
        ));
    }

    #[test]
    fn test_threshold_validation() {
        let (_dir, registry) = scratch_registry();
        assert!(matches!(
            registry.set_confidence_threshold(1, 1.5),
            Err(RegistryError::Validation(_))
        ));
        registry.set_confidence_threshold(1, 0.4).unwrap();
        assert_eq!(registry.snapshot(1).confidence_threshold, 0.4);
    }

    #[test]
    fn test_flush_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        {
            let registry = Registry::load(&path).unwrap();
            registry.set_language_channel(7, "en", "100").unwrap();
            registry.set_auto_translate(7, "55", "auto").unwrap();
        }
        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(reloaded.get_language_channel(7, "en").unwrap(), "100");
        let config = reloaded.snapshot(7);
        assert!(config.auto_translate_channels["55"].is_auto_detect());
    }

    #[test]
    fn test_stale_tmp_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        {
            let registry = Registry::load(&path).unwrap();
            registry.set_language_channel(7, "en", "100").unwrap();
        }
        // Simulate an interrupted flush: truncated temp file next to a good one
        fs::write(tmp_path(&path), "{\"7\": {\"languageChan").unwrap();
        let reloaded = Registry::load(&path).unwrap();
        assert_eq!(reloaded.get_language_channel(7, "en").unwrap(), "100");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_flush_failure_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let registry = Registry::load(&path).unwrap();
        registry.set_language_channel(7, "en", "100").unwrap();

        // Make the rename target un-writable by replacing the file with a directory
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            registry.set_language_channel(7, "ko", "200"),
            Err(RegistryError::Persistence(_))
        ));
        let config = registry.snapshot(7);
        assert_eq!(config.language_channels.get("en").map(String::as_str), Some("100"));
        assert!(!config.language_channels.contains_key("ko"));
    }
}
