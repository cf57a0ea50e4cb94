use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::engine::throttle::{INITIAL_COUNTDOWN, PLATFORM_LIMIT, RESET_BASE, RESET_JITTER};

const ENV_FILE: &str = ".env";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub response: ResponseConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub learner: LearnerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: u64,
    /// Log ready replies instead of publishing them.
    #[serde(default)]
    pub dry_run: bool,
    /// Failed cycles tolerated in a row before the error surfaces. 0 = fail fast.
    #[serde(default)]
    pub max_consecutive_failures: u32,
}

fn default_poll_interval() -> u64 { 60 }

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            poll_interval_s: default_poll_interval(),
            dry_run: false,
            max_consecutive_failures: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_result_type")]
    pub result_type: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_api_base() -> String { "https://api.twitter.com".to_string() }
fn default_query() -> String { "#svpol -rt".to_string() }
fn default_lang() -> String { "sv".to_string() }
fn default_result_type() -> String { "recent".to_string() }
fn default_count() -> u32 { 20 }
fn default_request_timeout() -> u64 { 10_000 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            query: default_query(),
            lang: default_lang(),
            result_type: default_result_type(),
            count: default_count(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResponseConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub secondary_topic: Option<String>,
}

fn default_topic() -> String { "svpol".to_string() }

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            secondary_topic: Some("migpol".to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleConfig {
    #[serde(default = "default_initial_countdown")]
    pub initial_countdown: i64,
    #[serde(default = "default_reset_base")]
    pub reset_base: i64,
    #[serde(default = "default_reset_jitter")]
    pub reset_jitter: i64,
    #[serde(default = "default_max_reply_len")]
    pub max_reply_len: usize,
}

fn default_initial_countdown() -> i64 { INITIAL_COUNTDOWN }
fn default_reset_base() -> i64 { RESET_BASE }
fn default_reset_jitter() -> i64 { RESET_JITTER }
fn default_max_reply_len() -> usize { PLATFORM_LIMIT }

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            initial_countdown: INITIAL_COUNTDOWN,
            reset_base: RESET_BASE,
            reset_jitter: RESET_JITTER,
            max_reply_len: PLATFORM_LIMIT,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LearnerConfig {
    #[serde(default = "default_max_reply_words")]
    pub max_reply_words: usize,
    /// Where the learned chain is kept between runs. Empty path disables saving.
    #[serde(default = "default_brain_path")]
    pub brain_path: Option<PathBuf>,
}

fn default_max_reply_words() -> usize { 30 }
fn default_brain_path() -> Option<PathBuf> { Some(PathBuf::from("feedhal-brain.json")) }

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            max_reply_words: default_max_reply_words(),
            brain_path: default_brain_path(),
        }
    }
}

/// OAuth 1.0a user-context credentials for the feed account.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the environment. Any missing or empty value is an error.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            consumer_key: required_env("TWITTER_CONSUMER_KEY")?,
            consumer_secret: required_env("TWITTER_CONSUMER_SECRET")?,
            access_token: required_env("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: required_env("TWITTER_ACCESS_TOKEN_SECRET")?,
        })
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the bot cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.response.topic.trim().is_empty() {
            anyhow::bail!("response.topic cannot be empty");
        }
        if self.feed.query.trim().is_empty() {
            anyhow::bail!("feed.query cannot be empty");
        }
        if self.feed.count == 0 {
            anyhow::bail!("feed.count must be > 0");
        }
        if self.bot.poll_interval_s == 0 {
            anyhow::bail!("bot.poll_interval_s must be > 0");
        }
        if self.throttle.reset_jitter <= 0 {
            anyhow::bail!("throttle.reset_jitter must be > 0, got {}", self.throttle.reset_jitter);
        }
        if self.throttle.reset_base < 0 {
            anyhow::bail!("throttle.reset_base must be >= 0, got {}", self.throttle.reset_base);
        }
        Ok(())
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let content = match std::fs::read_to_string(Path::new(ENV_FILE)) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env_lines(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

/// Parse KEY=VALUE lines, skipping blanks and `#` comments.
fn parse_env_lines(content: &str) -> Vec<(String, String)> {
    // Strip BOM if present (common on Windows-created files)
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), sanitize_key(value))
        })
        .collect()
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !sanitize_key(&value).is_empty() => Ok(sanitize_key(&value)),
        _ => anyhow::bail!("{} is not set (environment or {})", key, ENV_FILE),
    }
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert_eq!(config.bot.poll_interval_s, 60);
        assert_eq!(config.response.topic, "svpol");
        assert_eq!(config.response.secondary_topic.as_deref(), Some("migpol"));
        assert_eq!(config.throttle.initial_countdown, 1000);
        assert_eq!(config.feed.count, 20);
        assert_eq!(config.learner.brain_path, Some(PathBuf::from("feedhal-brain.json")));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.feed.query, "#svpol -rt");
        assert_eq!(config.feed.lang, "sv");
        assert_eq!(config.throttle.reset_base, 25);
        assert_eq!(config.throttle.reset_jitter, 10);
        assert_eq!(config.throttle.max_reply_len, 140);
        assert!(!config.bot.dry_run);
        assert_eq!(config.bot.max_consecutive_failures, 0);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::parse("[throttle]\ninitial_countdown = 5\n").unwrap();
        assert_eq!(config.throttle.initial_countdown, 5);
        assert_eq!(config.throttle.reset_base, 25);
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(Config::parse("[bot\npoll_interval_s = ").is_err());
        assert!(Config::parse("[bot]\npoll_interval_s = \"soon\"").is_err());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(Config::parse("[response]\ntopic = \"\"").is_err());
        assert!(Config::parse("[throttle]\nreset_jitter = 0").is_err());
        assert!(Config::parse("[bot]\npoll_interval_s = 0").is_err());
        assert!(Config::parse("[feed]\ncount = 0").is_err());
    }

    #[test]
    fn test_parse_env_lines() {
        let parsed = parse_env_lines(
            "\u{feff}# comment\nTWITTER_CONSUMER_KEY=\"abc\"\r\n\nBROKEN\nTWITTER_ACCESS_TOKEN = 'x-y' \n",
        );
        assert_eq!(
            parsed,
            vec![
                ("TWITTER_CONSUMER_KEY".to_string(), "abc".to_string()),
                ("TWITTER_ACCESS_TOKEN".to_string(), "x-y".to_string()),
            ]
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let creds = Credentials {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs-secret".to_string(),
            access_token: "at".to_string(),
            access_token_secret: "ats-secret".to_string(),
        };
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("cs-secret"));
        assert!(!shown.contains("ats-secret"));
    }
}
