//! Runtime configuration.
//!
//! The data directory is `--db`'s parent when given, else `$TASKIFY_HOME`, else
//! `$HOME/.taskify`. It holds `tasks.json`, `taskify.log` and an optional
//! `config.toml`:
//!
//! ```toml
//! category_matching = "case-insensitive"   # or "exact"
//! conflict_policy = "replace"              # or "abort"
//! date_format = "%d %b"
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::db::{is_valid_date_format, JsonFile, DEFAULT_DATE_FORMAT};
use crate::error::{Error, Result};
use crate::fields::{CategoryMatching, ConflictPolicy};
use crate::store::TaskStore;

pub const DB_FILE: &str = "tasks.json";
pub const CONFIG_FILE: &str = "config.toml";
pub const LOG_FILE: &str = "taskify.log";

/// Tunables read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub category_matching: CategoryMatching,
    pub conflict_policy: ConflictPolicy,
    /// chrono format string for due dates.
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            category_matching: CategoryMatching::default(),
            conflict_policy: ConflictPolicy::default(),
            date_format: DEFAULT_DATE_FORMAT.into(),
        }
    }
}

impl Settings {
    pub fn from_toml(data: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(data)?;
        if !is_valid_date_format(&settings.date_format) {
            return Err(Error::Setting {
                key: "date_format",
                value: settings.date_format,
            });
        }
        Ok(settings)
    }

    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Settings::default());
        }
        Settings::from_toml(&fs::read_to_string(path)?)
    }
}

/// Resolved locations plus settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub settings: Settings,
}

impl Config {
    /// Resolve from CLI overrides and the process environment.
    pub fn load(db: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let home = resolve_data_dir(std::env::var_os("TASKIFY_HOME"), std::env::var_os("HOME"));
        Config::resolve(home, db, config)
    }

    pub fn resolve(default_dir: PathBuf, db: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let data_dir = match db.as_deref().and_then(Path::parent) {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => default_dir,
        };
        let db_path = db.unwrap_or_else(|| data_dir.join(DB_FILE));
        let config_path = config.unwrap_or_else(|| data_dir.join(CONFIG_FILE));
        let settings = Settings::load(&config_path)?;
        Ok(Config { data_dir, db_path, settings })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Open the task store this configuration points at.
    pub fn open_store(&self) -> Result<TaskStore> {
        fs::create_dir_all(&self.data_dir)?;
        TaskStore::open(
            Box::new(JsonFile::new(&self.db_path)),
            self.settings.conflict_policy,
        )
    }
}

/// `$TASKIFY_HOME`, else `$HOME/.taskify`, else `./.taskify`.
pub fn resolve_data_dir(taskify_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    if let Some(dir) = taskify_home.filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    home.filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskify")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_resolution() {
        assert_eq!(
            resolve_data_dir(Some("/data/tasks".into()), Some("/home/u".into())),
            PathBuf::from("/data/tasks")
        );
        assert_eq!(
            resolve_data_dir(None, Some("/home/u".into())),
            PathBuf::from("/home/u/.taskify")
        );
        assert_eq!(resolve_data_dir(Some("".into()), None), PathBuf::from("./.taskify"));
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let s = Settings::from_toml("category_matching = \"case-insensitive\"").unwrap();
        assert_eq!(s.category_matching, CategoryMatching::CaseInsensitive);
        assert_eq!(s.conflict_policy, ConflictPolicy::Replace);
        assert_eq!(s.date_format, "%d %b");
        assert_eq!(Settings::from_toml("").unwrap(), Settings::default());
    }

    #[test]
    fn test_bad_settings_are_reported() {
        let err = Settings::from_toml("conflict_policy = \"explode\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_date_specifier_is_rejected() {
        let err = Settings::from_toml("date_format = \"%Q\"").unwrap_err();
        assert!(matches!(err, Error::Setting { key: "date_format", .. }));

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "date_format = \"%d %Q\"\n").unwrap();
        assert!(Config::resolve(dir.path().to_path_buf(), None, None).is_err());

        let ok = Settings::from_toml("date_format = \"%Y-%m-%d\"").unwrap();
        assert_eq!(ok.date_format, "%Y-%m-%d");
    }

    #[test]
    fn test_resolve_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "conflict_policy = \"abort\"\n").unwrap();

        let cfg = Config::resolve(dir.path().to_path_buf(), None, None).unwrap();
        assert_eq!(cfg.db_path, dir.path().join(DB_FILE));
        assert_eq!(cfg.settings.conflict_policy, ConflictPolicy::Abort);
        assert_eq!(cfg.log_path(), dir.path().join(LOG_FILE));

        let custom = dir.path().join("other").join("mine.json");
        let cfg = Config::resolve(PathBuf::from("/unused"), Some(custom.clone()), None).unwrap();
        assert_eq!(cfg.db_path, custom);
        assert_eq!(cfg.data_dir, dir.path().join("other"));
        assert_eq!(cfg.settings, Settings::default());

        let store = cfg.open_store().unwrap();
        assert_eq!(store.conflict_policy(), ConflictPolicy::Replace);
    }
}
