//! Startup configuration: one YAML snapshot, read once and never reloaded.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Display name; also the default mention token (lowercased, "@" added).
    pub bot_name: String,
    /// The bot's own platform user id, for the self-message guard.
    pub bot_id: String,
    pub owner_ids: Vec<String>,
    /// Checked in declaration order; longest match wins.
    pub prefixes: Vec<String>,
    /// Case-sensitive markers that flag a token as a command attempt.
    pub sub_prefixes: Vec<String>,
    /// Explicit mention token; overrides the bot_name-derived default.
    pub mention: Option<String>,
    /// Authorize everything. Debug switch, also reachable via --permit-all.
    pub permit_all: bool,
    pub fallback_replies: Vec<String>,
    pub playback: PlaybackConfig,
    pub attract: AttractConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub lines: Vec<String>,
    pub step_delay_secs: u64,
    /// 0 disables the cooldown.
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AttractConfig {
    pub lines: Vec<String>,
    pub period_secs: u64,
    pub rounds: u32,
    pub cooldown_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: "Switchboard".to_owned(),
            bot_id: "switchboard".to_owned(),
            owner_ids: vec!["operator".to_owned()],
            prefixes: vec!["!".to_owned()],
            sub_prefixes: vec!["#".to_owned()],
            mention: None,
            permit_all: false,
            fallback_replies: vec![
                "Hm, go on.".to_owned(),
                "Tell me more.".to_owned(),
                "If you want a command, try !help.".to_owned(),
            ],
            playback: PlaybackConfig::default(),
            attract: AttractConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            lines: vec![
                "Never gonna give you up".to_owned(),
                "Never gonna let you down".to_owned(),
                "Never gonna run around and desert you".to_owned(),
            ],
            step_delay_secs: 3,
            cooldown_secs: 0,
        }
    }
}

impl Default for AttractConfig {
    fn default() -> Self {
        Self {
            lines: vec![
                "Quiet in here today, isn't it?".to_owned(),
                "Anyone up for a game? Try !help.".to_owned(),
            ],
            period_secs: 300,
            rounds: 4,
            cooldown_secs: 1800,
        }
    }
}

impl BotConfig {
    #[must_use]
    pub fn mention_token(&self) -> String {
        self.mention
            .clone()
            .unwrap_or_else(|| format!("@{}", self.bot_name.to_lowercase()))
    }
}

pub fn load(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "config file not found at {}. Create one or set --config",
            path.display()
        ));
    }
    let yaml = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {}", path.display()))?;
    serde_yaml::from_str(&yaml).context("parsing YAML config")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: BotConfig = serde_yaml::from_str("bot_name: Herald\nprefixes: [\"?\"]\n").unwrap();
        assert_eq!(cfg.bot_name, "Herald");
        assert_eq!(cfg.prefixes, vec!["?".to_owned()]);
        assert_eq!(cfg.sub_prefixes, vec!["#".to_owned()]);
        assert_eq!(cfg.mention_token(), "@herald");
        assert!(!cfg.playback.lines.is_empty());
    }

    #[test]
    fn explicit_mention_wins() {
        let cfg: BotConfig = serde_yaml::from_str("mention: \"@sb\"\n").unwrap();
        assert_eq!(cfg.mention_token(), "@sb");
    }

    #[test]
    fn load_reads_a_file_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "owner_ids: [boss]").unwrap();
        let cfg = load(file.path()).unwrap();
        assert_eq!(cfg.owner_ids, vec!["boss".to_owned()]);

        let missing = Path::new("./no-such-config.yaml");
        assert!(load(missing).is_err());
    }
}
