//! Configuration file support and startup resolution

use ocean_reply::ReplyMode;
use ocean_session::controller::MESSAGES_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable holding the backend base URL
pub const API_BASE_ENV: &str = "OCEAN_API_BASE";

/// Environment variable forcing simulated mode
pub const MOCK_MODE_ENV: &str = "OCEAN_MOCK_MODE";

/// Configuration for ocean
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend
    pub api_base: Option<String>,
    /// Force simulated replies even when a base URL is set
    pub mock: Option<bool>,
    /// Directory the conversation is persisted in
    pub storage_dir: Option<String>,
    /// Store key for the conversation
    pub storage_key: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ocean-chat")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("OCEAN_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Create the example config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, example_config())?;
        Ok(path)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_base: Option<String>,
    pub mock: bool,
    pub storage_dir: Option<PathBuf>,
}

/// Settings resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: ReplyMode,
    pub storage_dir: Option<PathBuf>,
    pub storage_key: String,
}

/// Resolve settings from CLI overrides, then the environment, then the file.
///
/// Simulated mode is used when forced or when no base URL is configured.
pub fn resolve(
    config: &Config,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let non_blank = |s: String| {
        let s = s.trim().to_string();
        (!s.is_empty()).then_some(s)
    };

    let api_base = overrides
        .api_base
        .clone()
        .and_then(non_blank)
        .or_else(|| env(API_BASE_ENV).and_then(non_blank))
        .or_else(|| config.api_base.clone().and_then(non_blank));

    let forced_mock = if overrides.mock {
        true
    } else {
        env(MOCK_MODE_ENV)
            .and_then(|v| parse_bool(&v))
            .or(config.mock)
            .unwrap_or(false)
    };

    let mode = match api_base {
        Some(base_url) if !forced_mock => ReplyMode::Remote { base_url },
        _ => ReplyMode::Simulated,
    };

    Settings {
        mode,
        storage_dir: overrides
            .storage_dir
            .clone()
            .or_else(|| config.storage_dir.as_ref().map(PathBuf::from)),
        storage_key: config
            .storage_key
            .clone()
            .unwrap_or_else(|| MESSAGES_KEY.to_string()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# ocean configuration file
# Place at ~/.config/ocean-chat/config.toml (Linux) or set OCEAN_CONFIG_PATH

# Base URL of the chat backend; replies come from POST <api_base>/chat.
# Leave unset to use simulated replies.
# api_base = "http://localhost:3001"

# Force simulated replies even when api_base is set
# mock = true

# Where the conversation is persisted (defaults to the local data directory)
# storage_dir = "~/.local/share/ocean-chat"

# Store key for the conversation
# storage_key = "ocean_chat_messages_v1"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_simulated() {
        let settings = resolve(&Config::default(), &Overrides::default(), env_of(&[]));
        assert_eq!(settings.mode, ReplyMode::Simulated);
        assert_eq!(settings.storage_key, MESSAGES_KEY);
        assert!(settings.storage_dir.is_none());
    }

    #[test]
    fn test_env_base_url_selects_remote() {
        let settings = resolve(
            &Config::default(),
            &Overrides::default(),
            env_of(&[(API_BASE_ENV, "http://localhost:3001")]),
        );
        assert_eq!(
            settings.mode,
            ReplyMode::Remote {
                base_url: "http://localhost:3001".into()
            }
        );
    }

    #[test]
    fn test_blank_base_url_is_ignored() {
        let settings = resolve(
            &Config::default(),
            &Overrides::default(),
            env_of(&[(API_BASE_ENV, "   ")]),
        );
        assert_eq!(settings.mode, ReplyMode::Simulated);
    }

    #[test]
    fn test_precedence_cli_env_file() {
        let config = Config {
            api_base: Some("http://file".into()),
            ..Config::default()
        };
        let env = env_of(&[(API_BASE_ENV, "http://env")]);

        let from_env = resolve(&config, &Overrides::default(), &env);
        assert_eq!(from_env.mode, ReplyMode::Remote { base_url: "http://env".into() });

        let overrides = Overrides {
            api_base: Some("http://cli".into()),
            ..Overrides::default()
        };
        let from_cli = resolve(&config, &overrides, &env);
        assert_eq!(from_cli.mode, ReplyMode::Remote { base_url: "http://cli".into() });

        let from_file = resolve(&config, &Overrides::default(), env_of(&[]));
        assert_eq!(from_file.mode, ReplyMode::Remote { base_url: "http://file".into() });
    }

    #[test]
    fn test_mock_forces_simulated() {
        let config = Config {
            api_base: Some("http://file".into()),
            mock: Some(true),
            ..Config::default()
        };
        let settings = resolve(&config, &Overrides::default(), env_of(&[]));
        assert_eq!(settings.mode, ReplyMode::Simulated);

        // The environment can switch the file's mock flag back off.
        let settings = resolve(&config, &Overrides::default(), env_of(&[(MOCK_MODE_ENV, "false")]));
        assert!(!settings.mode.is_simulated());

        let overrides = Overrides {
            mock: true,
            ..Overrides::default()
        };
        let settings = resolve(
            &Config::default(),
            &overrides,
            env_of(&[(API_BASE_ENV, "http://env")]),
        );
        assert_eq!(settings.mode, ReplyMode::Simulated);
    }

    #[test]
    fn test_parse_config_file() {
        let config = Config::parse(
            r#"
api_base = "http://localhost:3001"
mock = false
storage_dir = "/tmp/ocean"
storage_key = "custom_key"
"#,
        )
        .unwrap();
        let settings = resolve(&config, &Overrides::default(), env_of(&[]));
        assert!(!settings.mode.is_simulated());
        assert_eq!(settings.storage_dir, Some(PathBuf::from("/tmp/ocean")));
        assert_eq!(settings.storage_key, "custom_key");
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(example_config()).unwrap();
        assert!(config.api_base.is_none());
        assert!(config.mock.is_none());
    }

    #[test]
    fn test_parse_bool_values() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
