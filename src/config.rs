//! Configuration file parser for ~/.config/linkfeed/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Posts considered when no count is requested
    pub default_num_posts: usize,

    /// Upper bound on a requested post count
    pub max_num_posts: usize,

    /// Builds in flight when no limit is requested
    pub default_concurrency: usize,

    /// Upper bound on a requested concurrency limit
    pub max_concurrency: usize,

    /// Budget for one fetch, request and body together
    pub fetch_timeout_secs: u64,

    /// SQLite link cache; when unset an in-memory cache is used
    pub cache_path: Option<PathBuf>,

    /// Entry limit of the in-memory cache
    pub memory_cache_capacity: usize,

    /// Allow fetching loopback and private-network URLs
    pub allow_private_hosts: bool,

    /// Prefix for profile links; the screen name is appended
    pub profile_base_url: String,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_num_posts: 20,
            max_num_posts: 100,
            default_concurrency: 20,
            max_concurrency: 100,
            fetch_timeout_secs: 20,
            cache_path: None,
            memory_cache_capacity: 1024,
            allow_private_hosts: false,
            profile_base_url: "https://twitter.com/".to_string(),
            user_agent: concat!("linkfeed/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 10] = [
        "default_num_posts",
        "max_num_posts",
        "default_concurrency",
        "max_concurrency",
        "fetch_timeout_secs",
        "cache_path",
        "memory_cache_capacity",
        "allow_private_hosts",
        "profile_base_url",
        "user_agent",
    ];

    /// Default location: `$HOME/.config/linkfeed/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("linkfeed")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Inconsistent values → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            max_concurrency = config.max_concurrency,
            cache = ?config.cache_path,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Checks that defaults fit within their maximums and limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_num_posts == 0 {
            return Err(ConfigError::Invalid(
                "max_num_posts must be at least 1".to_string(),
            ));
        }
        if self.default_num_posts > self.max_num_posts {
            return Err(ConfigError::Invalid(format!(
                "default_num_posts ({}) exceeds max_num_posts ({})",
                self.default_num_posts, self.max_num_posts
            )));
        }
        if self.default_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "default_concurrency must be at least 1".to_string(),
            ));
        }
        if self.default_concurrency > self.max_concurrency {
            return Err(ConfigError::Invalid(format!(
                "default_concurrency ({}) exceeds max_concurrency ({})",
                self.default_concurrency, self.max_concurrency
            )));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("linkfeed_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_num_posts, 20);
        assert_eq!(config.max_num_posts, 100);
        assert_eq!(config.default_concurrency, 20);
        assert_eq!(config.max_concurrency, 100);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(20));
        assert!(config.cache_path.is_none());
        assert_eq!(config.memory_cache_capacity, 1024);
        assert!(!config.allow_private_hosts);
        assert_eq!(config.profile_base_url, "https://twitter.com/");
        assert!(config.user_agent.starts_with("linkfeed/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/linkfeed_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let (dir, path) = write_config("empty", "");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("whitespace", "   \n  \n  ");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("partial", "default_concurrency = 4\n");

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_concurrency, 4);
        assert_eq!(config.max_concurrency, 100); // default
        assert_eq!(config.default_num_posts, 20); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let content = r#"
default_num_posts = 10
max_num_posts = 50
default_concurrency = 8
max_concurrency = 16
fetch_timeout_secs = 5
cache_path = "/var/cache/linkfeed/links.db"
memory_cache_capacity = 64
allow_private_hosts = true
profile_base_url = "https://social.example/@"
user_agent = "custom-agent/1.0"
"#;
        let (dir, path) = write_config("full", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_num_posts, 10);
        assert_eq!(config.max_num_posts, 50);
        assert_eq!(config.default_concurrency, 8);
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.cache_path.as_deref(),
            Some(Path::new("/var/cache/linkfeed/links.db"))
        );
        assert_eq!(config.memory_cache_capacity, 64);
        assert!(config.allow_private_hosts);
        assert_eq!(config.profile_base_url, "https://social.example/@");
        assert_eq!(config.user_agent, "custom-agent/1.0");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("invalid", "this is not [valid toml");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
max_concurrency = 50
totally_fake_key = "should not fail"
"#;
        let (dir, path) = write_config("unknown", content);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_concurrency, 50);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) = write_config("wrongtype", "max_concurrency = \"lots\"\n");
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_above_max_rejected() {
        let (dir, path) = write_config("above_max", "default_concurrency = 30\nmax_concurrency = 10\n");

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("default_concurrency"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            default_concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            fetch_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_num_posts: 0,
            max_num_posts: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            default_num_posts: 101,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("too_large", &"a".repeat(1_048_577));

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
