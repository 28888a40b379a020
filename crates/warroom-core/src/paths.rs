use crate::error::{Result, WarRoomError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DATA_DIR_NAME: &str = ".warroom";
pub const CONFIG_FILE: &str = "config.yaml";

/// Storage key the user document lives under.
pub const STATE_KEY: &str = "warroom_state";

pub const BACKUP_PREFIX: &str = "warroom_backup_";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$HOME/.warroom`
pub fn default_data_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(DATA_DIR_NAME))
        .ok_or(WarRoomError::HomeNotFound)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

pub fn key_path(data_dir: &Path, key: &str) -> PathBuf {
    data_dir.join(format!("{key}.json"))
}

// ---------------------------------------------------------------------------
// Key validation
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").expect("static key regex")
    })
}

/// Storage keys become file names, so they are restricted to a safe alphabet.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 64 || !key_re().is_match(key) {
        return Err(WarRoomError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_keys() {
        for key in [STATE_KEY, "a", "backup-2", "x1"] {
            validate_key(key).unwrap_or_else(|_| panic!("expected valid: {key}"));
        }
    }

    #[test]
    fn invalid_keys() {
        for key in ["", "../escape", "_leading", "trailing-", "has space", "UPPER"] {
            assert!(validate_key(key).is_err(), "expected invalid: {key}");
        }
    }

    #[test]
    fn path_helpers() {
        let dir = Path::new("/tmp/wr");
        assert_eq!(config_path(dir), PathBuf::from("/tmp/wr/config.yaml"));
        assert_eq!(
            key_path(dir, STATE_KEY),
            PathBuf::from("/tmp/wr/warroom_state.json")
        );
    }
}
