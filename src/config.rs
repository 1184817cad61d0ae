use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::input::{ReleaseDetection, DEFAULT_RELEASE_TIMEOUT, HOLD_THRESHOLD};
use crate::scramble::DEFAULT_SCRAMBLE_LENGTH;
use crate::session::SessionConfig;

/// Where solves are kept
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StoreKind {
    Sqlite,
    Json,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scramble_length: usize,
    pub hold_threshold_ms: u64,
    /// Only used when the terminal cannot report key releases
    pub release_timeout_ms: u64,
    pub store: StoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scramble_length: DEFAULT_SCRAMBLE_LENGTH,
            hold_threshold_ms: HOLD_THRESHOLD.as_millis() as u64,
            release_timeout_ms: DEFAULT_RELEASE_TIMEOUT.as_millis() as u64,
            store: StoreKind::Sqlite,
        }
    }
}

impl Config {
    pub fn session_config(&self, releases_reported: bool) -> SessionConfig {
        let release = if releases_reported {
            ReleaseDetection::Reported
        } else {
            ReleaseDetection::Inferred {
                timeout: Duration::from_millis(self.release_timeout_ms),
            }
        };
        SessionConfig {
            scramble_length: self.scramble_length,
            hold_threshold: Duration::from_millis(self.hold_threshold_ms),
            release,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "cubik") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("cubik_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "ignoring bad config"),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            scramble_length: 25,
            hold_threshold_ms: 300,
            release_timeout_ms: 900,
            store: StoreKind::Json,
        };
        store.save(&cfg).unwrap();
        assert_eq!(store.load(), cfg);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "store": "memory" }"#).unwrap();

        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.store, StoreKind::Memory);
        assert_eq!(loaded.scramble_length, 20);
        assert_eq!(loaded.hold_threshold_ms, 550);
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{{{").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }

    #[test]
    fn session_config_release_mode() {
        let cfg = Config::default();
        assert_eq!(cfg.session_config(true).release, ReleaseDetection::Reported);
        assert_eq!(
            cfg.session_config(false).release,
            ReleaseDetection::Inferred {
                timeout: Duration::from_millis(700)
            }
        );
        assert_eq!(cfg.session_config(true).hold_threshold, Duration::from_millis(550));
    }

    #[test]
    fn store_kind_display() {
        assert_eq!(StoreKind::Sqlite.to_string(), "sqlite");
        assert_eq!(StoreKind::Memory.to_string(), "memory");
    }
}
