// Language tables: canonical codes, user-facing aliases, per-guild defaults

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

/// Canonical language codes recognized by the translation backend,
/// paired with their display names.
pub static SUPPORTED: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("en", "English"),
        ("es", "Spanish"),
        ("fr", "French"),
        ("de", "German"),
        ("it", "Italian"),
        ("pt", "Portuguese"),
        ("ru", "Russian"),
        ("ja", "Japanese"),
        ("ko", "Korean"),
        ("zh", "Chinese"),
        ("hi", "Hindi"),
        ("ar", "Arabic"),
        ("nl", "Dutch"),
        ("pl", "Polish"),
        ("tr", "Turkish"),
        ("id", "Indonesian"),
        ("tl", "Tagalog"),
        ("ms", "Malaysian"),
        ("th", "Thai"),
        ("vi", "Vietnamese"),
    ])
});

/// Full-name aliases accepted wherever a language key is expected.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("english", "en"),
        ("spanish", "es"),
        ("french", "fr"),
        ("german", "de"),
        ("italian", "it"),
        ("portuguese", "pt"),
        ("russian", "ru"),
        ("japanese", "ja"),
        ("korean", "ko"),
        ("chinese", "zh"),
        ("mandarin", "zh"),
        ("hindi", "hi"),
        ("arabic", "ar"),
        ("dutch", "nl"),
        ("polish", "pl"),
        ("turkish", "tr"),
        ("indonesian", "id"),
        ("tagalog", "tl"),
        ("filipino", "tl"),
        ("malaysian", "ms"),
        ("malay", "ms"),
        ("thai", "th"),
        ("vietnamese", "vi"),
    ])
});

/// Resolve a user-facing language key (code or name) to a canonical code.
pub fn resolve(key: &str) -> Option<&'static str> {
    let key = key.trim().to_lowercase();
    if let Some((code, _)) = SUPPORTED.get_key_value(key.as_str()) {
        return Some(*code);
    }
    ALIASES.get(key.as_str()).copied()
}

/// Display name for a canonical code; falls back to the code itself.
pub fn display_name(code: &str) -> &str {
    SUPPORTED.get(code).copied().unwrap_or(code)
}

/// The default announcement language set every new guild starts with.
pub fn default_languages() -> BTreeMap<String, String> {
    [
        ("en", "English"),
        ("ko", "Korean"),
        ("pt", "Portuguese"),
        ("id", "Indonesian"),
        ("tl", "Tagalog"),
        ("zh", "Chinese"),
        ("ms", "Malaysian"),
        ("th", "Thai"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}
