// Centralized constants for the announcer bot

/// Command prefix for text commands
pub const COMMAND_PREFIX: &str = "!";

/// Default language-detection confidence floor for new guilds
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Default path of the persisted guild configuration file
pub const DEFAULT_CONFIG_PATH: &str = "guild_config.json";

/// Discord embed colors
pub mod colors {
    pub const PRIMARY: u32 = 0x3498db;
    pub const SUCCESS: u32 = 0x2ecc71;
    pub const ERROR: u32 = 0xff0000;
    pub const WARNING: u32 = 0xffa500;
    pub const INFO: u32 = 0x00bfff;
}

/// Truncate embed field text to Discord's limits, with ellipsis
pub fn clip(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 8), "abcde...");
    }
}
