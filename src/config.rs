//! User preferences and data directory resolution.
//!
//! The only persisted state is the chat endpoint the user last selected. It
//! lives in `<data-dir>/preferences.json`, where the data directory defaults
//! to `~/.triage` and can be overridden with `--data-dir` or
//! `TRIAGE_DATA_DIR`.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:7777";
pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_endpoint")]
    pub selected_endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            selected_endpoint: default_endpoint(),
        }
    }
}

impl Preferences {
    /// Load preferences, falling back to defaults when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no preferences file, using defaults");
            return Ok(Preferences::default());
        }
        let buf = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&buf)?)
    }

    /// Save preferences using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// `~/.triage`, or `./.triage` when no home directory is set.
pub fn default_data_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".triage")
}

pub fn preferences_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PREFERENCES_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&preferences_path(dir.path())).unwrap();
        assert_eq!(prefs.selected_endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = preferences_path(&dir.path().join("nested"));
        let prefs = Preferences {
            selected_endpoint: "http://agents.internal:8080".into(),
        };
        prefs.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(Preferences::load(&path).unwrap(), prefs);
    }

    #[test]
    fn test_unknown_keys_and_missing_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = preferences_path(dir.path());
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();
        assert_eq!(Preferences::load(&path).unwrap(), Preferences::default());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = preferences_path(dir.path());
        fs::write(&path, "not json").unwrap();
        assert!(Preferences::load(&path).is_err());
    }
}
