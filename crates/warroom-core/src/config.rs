use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// BoardConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Probability given to a new deal that does not state one.
    #[serde(default = "default_probability")]
    pub default_probability: u8,
    #[serde(default = "default_xp_per_deal")]
    pub xp_per_deal: u64,
    /// XP for each scored practice session.
    #[serde(default = "default_xp_per_session")]
    pub xp_per_session: u64,
    /// Delay before the "Revenue Captured" toast after a drop on Closed.
    #[serde(default = "default_closed_celebration_ms")]
    pub closed_celebration_ms: u64,
}

fn default_probability() -> u8 {
    10
}

fn default_xp_per_deal() -> u64 {
    50
}

fn default_xp_per_session() -> u64 {
    500
}

fn default_closed_celebration_ms() -> u64 {
    500
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_probability: default_probability(),
            xp_per_deal: default_xp_per_deal(),
            xp_per_session: default_xp_per_session(),
            closed_celebration_ms: default_closed_celebration_ms(),
        }
    }
}

impl BoardConfig {
    pub fn closed_celebration(&self) -> Duration {
        Duration::from_millis(self.closed_celebration_ms)
    }
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_capacity() -> usize {
    5
}

fn default_ttl_seconds() -> u64 {
    5
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl NotificationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

// ---------------------------------------------------------------------------
// OracleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// is never written to config.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_timeout_seconds(),
            endpoint: default_endpoint(),
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Read the key from the configured environment variable. Blank values
    /// count as absent.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            board: BoardConfig::default(),
            notifications: NotificationConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

impl Config {
    /// Load `<data_dir>/config.yaml`, or defaults when the file is absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = paths::config_path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        crate::migrations::migrate_config(cfg)
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let path = paths::config_path(data_dir);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.board.default_probability > 100 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "board.default_probability={} is outside 0..=100",
                    self.board.default_probability
                ),
            });
        }

        if self.board.closed_celebration_ms > 10_000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "board.closed_celebration_ms={} outlives the notification ttl",
                    self.board.closed_celebration_ms
                ),
            });
        }

        if self.notifications.capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "notifications.capacity must be at least 1".to_string(),
            });
        }

        if self.notifications.ttl_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "notifications.ttl_seconds=0 hides every notification".to_string(),
            });
        }

        if self.oracle.model.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "oracle.model is empty".to_string(),
            });
        }

        if self.oracle.timeout_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "oracle.timeout_seconds must be at least 1".to_string(),
            });
        }

        if !self.oracle.endpoint.starts_with("http://")
            && !self.oracle.endpoint.starts_with("https://")
        {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("oracle.endpoint '{}' is not an http(s) URL", self.oracle.endpoint),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.board.default_probability, 10);
        assert_eq!(cfg.board.xp_per_deal, 50);
        assert_eq!(cfg.board.xp_per_session, 500);
        assert_eq!(cfg.notifications.capacity, 5);
        assert_eq!(cfg.oracle.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.board.xp_per_deal = 75;
        cfg.oracle.timeout_seconds = 5;
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.board.xp_per_deal, 75);
        assert_eq!(loaded.oracle.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "board:\n  default_probability: 25\n",
        )
        .unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg.board.default_probability, 25);
        assert_eq!(cfg.board.closed_celebration_ms, 500);
        assert_eq!(cfg.notifications.ttl_seconds, 5);
    }

    #[test]
    fn validate_valid_config_no_warnings() {
        assert!(Config::default().validate().is_empty());
    }

    #[test]
    fn validate_flags_bad_values() {
        let mut cfg = Config::default();
        cfg.board.default_probability = 150;
        cfg.notifications.capacity = 0;
        cfg.oracle.endpoint = "ftp://nope".into();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Error));
    }
}
