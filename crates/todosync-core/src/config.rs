//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/todosync/config.toml)
//! 3. Environment variables (TODOSYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::OwnerId;

/// Environment variable prefix
const ENV_PREFIX: &str = "TODOSYNC";

/// Default remote store endpoint
pub const DEFAULT_API_URL: &str = "https://mate.academy/students-api";

/// Default lifetime of an error notice
pub const DEFAULT_NOTICE_TIMEOUT_MS: u64 = 3000;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the remote todo store
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Owner whose todos are shown (unset = not configured)
    #[serde(default)]
    pub owner_id: Option<u64>,

    /// How long an error notice stays visible
    #[serde(default = "default_notice_timeout_ms")]
    pub notice_timeout_ms: u64,

    /// Client-side request timeout (none by default)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Log file used when TODOSYNC_LOG is set
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner_id: None,
            notice_timeout_ms: DEFAULT_NOTICE_TIMEOUT_MS,
            request_timeout_secs: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (TODOSYNC_API_URL, TODOSYNC_OWNER_ID, TODOSYNC_NOTICE_TIMEOUT_MS)
    /// 2. Config file (~/.config/todosync/config.toml or TODOSYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        // TODOSYNC_API_URL
        if let Ok(val) = std::env::var(format!("{}_API_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.api_url = val;
            }
        }

        // TODOSYNC_OWNER_ID
        if let Ok(val) = std::env::var(format!("{}_OWNER_ID", ENV_PREFIX)) {
            self.owner_id = if val.is_empty() {
                None
            } else {
                Some(
                    val.trim()
                        .parse()
                        .with_context(|| format!("Invalid {}_OWNER_ID: {}", ENV_PREFIX, val))?,
                )
            };
        }

        // TODOSYNC_NOTICE_TIMEOUT_MS
        if let Ok(val) = std::env::var(format!("{}_NOTICE_TIMEOUT_MS", ENV_PREFIX)) {
            self.notice_timeout_ms = val.trim().parse().with_context(|| {
                format!("Invalid {}_NOTICE_TIMEOUT_MS: {}", ENV_PREFIX, val)
            })?;
        }

        Ok(())
    }

    /// The configured owner
    ///
    /// Fails with a setup hint when no valid owner is configured.
    pub fn owner(&self) -> Result<OwnerId> {
        match self.owner_id {
            Some(id) if id > 0 => Ok(OwnerId(id)),
            Some(id) => Err(anyhow!("Invalid owner_id: {}", id)),
            None => Err(anyhow!(
                "No owner configured. Set one with:\n  todosync config set owner_id <your-user-id>"
            )),
        }
    }

    /// Notice lifetime as a duration
    pub fn notice_timeout(&self) -> Duration {
        Duration::from_millis(self.notice_timeout_ms)
    }

    /// Request timeout as a duration, if configured
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration, preferring a path given on the command line
    pub fn save_with_cli_override(&self, path: Option<&PathBuf>) -> Result<()> {
        match path {
            Some(path) => self.save_to_path(path),
            None => self.save(),
        }
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with TODOSYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("todosync")
            .join("config.toml")
    }

    /// Get the log file path (configured or default)
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("todosync")
                .join("debug.log")
        })
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_notice_timeout_ms() -> u64 {
    DEFAULT_NOTICE_TIMEOUT_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "TODOSYNC_API_URL",
        "TODOSYNC_OWNER_ID",
        "TODOSYNC_NOTICE_TIMEOUT_MS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.owner_id.is_none());
        assert_eq!(config.notice_timeout(), Duration::from_secs(3));
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn test_owner_requires_configuration() {
        let mut config = Config::default();
        let err = config.owner().unwrap_err();
        assert!(err.to_string().contains("config set owner_id"));

        config.owner_id = Some(0);
        assert!(config.owner().is_err());

        config.owner_id = Some(1870);
        assert_eq!(config.owner().unwrap(), OwnerId(1870));
    }

    #[test]
    fn test_env_override_owner() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("TODOSYNC_OWNER_ID", "42");
        config.apply_env_overrides().unwrap();
        assert_eq!(config.owner_id, Some(42));

        // Empty string clears it
        env::set_var("TODOSYNC_OWNER_ID", "");
        config.apply_env_overrides().unwrap();
        assert!(config.owner_id.is_none());

        env::set_var("TODOSYNC_OWNER_ID", "not-a-number");
        assert!(config.apply_env_overrides().is_err());
    }

    #[test]
    fn test_env_override_api_url_and_timeout() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("TODOSYNC_API_URL", "http://localhost:8080");
        env::set_var("TODOSYNC_NOTICE_TIMEOUT_MS", "500");
        config.apply_env_overrides().unwrap();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.notice_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            api_url = "http://example.com/api"
            owner_id = 1870
            request_timeout_secs = 10
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.api_url, "http://example.com/api");
        assert_eq!(config.owner_id, Some(1870));
        assert_eq!(config.notice_timeout_ms, DEFAULT_NOTICE_TIMEOUT_MS);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/todosync/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            owner_id: Some(7),
            log_file: Some(PathBuf::from("/tmp/todosync.log")),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_path(), PathBuf::from("/tmp/todosync.log"));
    }

    #[test]
    fn test_save_without_override_uses_default_path() {
        let _guard = EnvGuard::new(&[
            "TODOSYNC_API_URL",
            "TODOSYNC_OWNER_ID",
            "TODOSYNC_NOTICE_TIMEOUT_MS",
            "TODOSYNC_CONFIG",
        ]);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        env::set_var("TODOSYNC_CONFIG", &path);

        let config = Config {
            owner_id: Some(11),
            ..Config::default()
        };
        config.save_with_cli_override(None).unwrap();

        assert!(path.exists());
        assert_eq!(Config::load_with_cli_override(None).unwrap(), config);
    }
}
