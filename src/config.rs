//! Bridge configuration.
//!
//! Built-in defaults, then the global file, then the project file, then an
//! explicit `--config` file, then `RIGBRIDGE_*` environment variables.
//! Files are merged key by key, so a file only has to name what it changes.

use std::path::{Path, PathBuf};

use rigbridge_build::{BuildConfig, EngineLayout};
use rigbridge_core::{Error, Result};
use rigbridge_transceiver::{BackoffConfig, RigConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Folder inside a project that holds its bridge settings.
pub const PROJECT_CONFIG_DIR: &str = ".rigbridge";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub engine: EngineLayout,
    pub build: BuildConfig,
    pub rig: RigConfig,
    pub backoff: BackoffConfig,
}

/// Config files consulted by [`load_config_from`], lowest priority first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPaths {
    pub global: Option<PathBuf>,
    pub project: Option<PathBuf>,
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Standard locations for `project_root`, plus an explicit file.
    #[must_use]
    pub fn discover(project_root: Option<&Path>, explicit: Option<&Path>) -> Self {
        Self {
            global: global_config_path(),
            project: project_root.map(project_config_path),
            explicit: explicit.map(Path::to_path_buf),
        }
    }
}

/// Load configuration from all sources with hierarchy.
///
/// # Errors
///
/// Returns error if:
/// - A config file is unreadable or malformed TOML
/// - An environment override does not parse
/// - Config values fail validation
pub fn load_config(project_root: Option<&Path>, explicit: Option<&Path>) -> Result<BridgeConfig> {
    load_config_from(&ConfigPaths::discover(project_root, explicit), |key| {
        std::env::var(key).ok()
    })
}

/// [`load_config`] with explicit file locations and environment lookup.
///
/// # Errors
///
/// Same as [`load_config`]. An explicit file that does not exist is an
/// error; missing global and project files are skipped.
pub fn load_config_from(
    paths: &ConfigPaths,
    env: impl Fn(&str) -> Option<String>,
) -> Result<BridgeConfig> {
    let mut merged = toml::Table::new();

    for path in [&paths.global, &paths.project].into_iter().flatten() {
        if path.exists() {
            merge_tables(&mut merged, load_toml_table(path)?);
        }
    }
    if let Some(path) = &paths.explicit {
        merge_tables(&mut merged, load_toml_table(path)?);
    }

    let mut config: BridgeConfig = toml::Value::Table(merged)
        .try_into()
        .map_err(|e| Error::invalid_config(format!("{e}")))?;

    config.apply_env_vars(env)?;
    config.validate()?;
    Ok(config)
}

fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "rigbridge")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn project_config_path(root: &Path) -> PathBuf {
    root.join(PROJECT_CONFIG_DIR).join("config.toml")
}

fn load_toml_table(path: &Path) -> Result<toml::Table> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_read_failed(path, e.to_string()))?;
    debug!(path = %path.display(), "Loading config file");
    toml::from_str(&content).map_err(|e| {
        Error::invalid_config(format!("Failed to parse {}: {e}", path.display()))
    })
}

/// Overlay `other` onto `base`; nested tables merge, everything else is
/// replaced.
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::invalid_config(format!("Invalid {key} value: {e}")))
}

impl BridgeConfig {
    fn apply_env_vars(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = env("RIGBRIDGE_ENGINE_ROOT") {
            self.engine.root = PathBuf::from(value);
        }
        if let Some(value) = env("RIGBRIDGE_SDK") {
            self.engine.sdk = PathBuf::from(value);
        }
        if let Some(value) = env("RIGBRIDGE_RIG_EXE") {
            self.engine.rig_exe = PathBuf::from(value);
        }
        if let Some(value) = env("RIGBRIDGE_COMPILE_TIMEOUT_SECS") {
            self.build.compile_timeout_secs = parse_env("RIGBRIDGE_COMPILE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = env("RIGBRIDGE_LOG_CAPACITY") {
            self.build.log_capacity = parse_env("RIGBRIDGE_LOG_CAPACITY", &value)?;
        }
        if let Some(value) = env("RIGBRIDGE_KEEP_CONSOLE") {
            self.rig.keep_console = parse_env("RIGBRIDGE_KEEP_CONSOLE", &value)?;
        }
        if let Some(value) = env("RIGBRIDGE_LOG_PREFIX") {
            self.rig.log_prefix = value;
        }
        if let Some(value) = env("RIGBRIDGE_ADD_LOG_PREFIX") {
            self.rig.add_log_prefix = parse_env("RIGBRIDGE_ADD_LOG_PREFIX", &value)?;
        }
        if let Some(value) = env("RIGBRIDGE_EXCHANGE_TIMEOUT_MS") {
            self.rig.exchange_timeout_ms = parse_env("RIGBRIDGE_EXCHANGE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = env("RIGBRIDGE_MAX_UNRESPONSIVE_FRAMES") {
            self.rig.max_unresponsive_frames =
                parse_env("RIGBRIDGE_MAX_UNRESPONSIVE_FRAMES", &value)?;
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.build.log_capacity == 0 {
            return Err(Error::invalid_config("build.log_capacity must be at least 1"));
        }
        if self.build.compile_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "build.compile_timeout_secs must be at least 1",
            ));
        }
        if self.rig.exchange_timeout_ms == 0 {
            return Err(Error::invalid_config(
                "rig.exchange_timeout_ms must be at least 1",
            ));
        }
        if self.rig.max_unresponsive_frames == 0 {
            return Err(Error::invalid_config(
                "rig.max_unresponsive_frames must be at least 1",
            ));
        }
        if self.backoff.slow_retry_frames < self.backoff.retry_delay_frames {
            return Err(Error::invalid_config(
                "backoff.slow_retry_frames must not be shorter than backoff.retry_delay_frames",
            ));
        }
        Ok(())
    }

    /// Effective configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::invalid_config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_no_config_files_returns_defaults() {
        let config = load_config_from(&ConfigPaths::default(), no_env).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.backoff.retry_delay_frames, 30);
        assert_eq!(config.backoff.fail_threshold, 16);
        assert_eq!(config.backoff.slow_retry_frames, 6000);
    }

    #[test]
    fn test_missing_optional_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths {
            global: Some(dir.path().join("nope.toml")),
            project: Some(dir.path().join("also-nope.toml")),
            explicit: None,
        };
        assert!(load_config_from(&paths, no_env).is_ok());
    }

    #[test]
    fn test_project_overrides_global_key_by_key() {
        let dir = TempDir::new().unwrap();
        let global = write(
            &dir,
            "global.toml",
            "[rig]\nexchange_timeout_ms = 500\nkeep_console = true\n",
        );
        let project = write(&dir, "project.toml", "[rig]\nexchange_timeout_ms = 50\n");
        let paths = ConfigPaths {
            global: Some(global),
            project: Some(project),
            explicit: None,
        };

        let config = load_config_from(&paths, no_env).unwrap();
        assert_eq!(config.rig.exchange_timeout_ms, 50);
        assert!(config.rig.keep_console);
        assert_eq!(config.rig.log_prefix, "[Rig] ");
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths {
            explicit: Some(dir.path().join("missing.toml")),
            ..ConfigPaths::default()
        };
        assert!(matches!(
            load_config_from(&paths, no_env),
            Err(Error::FileReadFailed { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths {
            explicit: Some(write(&dir, "bad.toml", "[rig\n")),
            ..ConfigPaths::default()
        };
        assert!(matches!(
            load_config_from(&paths, no_env),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_env_overrides_files() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths {
            explicit: Some(write(&dir, "c.toml", "[build]\nlog_capacity = 8\n")),
            ..ConfigPaths::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            ("RIGBRIDGE_LOG_CAPACITY", "64"),
            ("RIGBRIDGE_KEEP_CONSOLE", "true"),
            ("RIGBRIDGE_RIG_EXE", "/opt/rig"),
        ]);

        let config = load_config_from(&paths, |key| env.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(config.build.log_capacity, 64);
        assert!(config.rig.keep_console);
        assert_eq!(config.engine.rig_exe, PathBuf::from("/opt/rig"));
    }

    #[test]
    fn test_env_can_drop_rig_log_prefix() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RIGBRIDGE_ADD_LOG_PREFIX", "false"),
            ("RIGBRIDGE_LOG_PREFIX", "[game] "),
        ]);

        let config = load_config_from(&ConfigPaths::default(), |key| {
            env.get(key).map(ToString::to_string)
        })
        .unwrap();
        assert!(!config.rig.add_log_prefix);
        assert_eq!(config.rig.effective_prefix(), "");
    }

    #[test]
    fn test_bad_env_value_names_the_variable() {
        let err = load_config_from(&ConfigPaths::default(), |key| {
            (key == "RIGBRIDGE_EXCHANGE_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("RIGBRIDGE_EXCHANGE_TIMEOUT_MS"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = BridgeConfig::default();
        config.build.log_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.rig.exchange_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = BridgeConfig::default();
        config.rig.max_unresponsive_frames = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_backoff() {
        let mut config = BridgeConfig::default();
        config.backoff.slow_retry_frames = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_effective_config_round_trips_through_toml() {
        let config = BridgeConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[backoff]"));
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
