use std::env;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::curseforge::CURSEFORGE_API_BASE;
use crate::filesystem::{self, FilesystemError};

/// Preferred variable holding the CurseForge API key.
pub const API_KEY_VAR: &str = "CURSEFORGE_API_KEY";
/// Older name for the API key, still honoured.
pub const LEGACY_API_KEY_VAR: &str = "API_KEY";
pub const API_URL_VAR: &str = "CURSEFORGE_API_URL";
pub const SCRATCH_DIR_VAR: &str = "MODPACK_CHANGELOG_SCRATCH_DIR";

/// Default scratch folder name, created in the working directory.
pub const DEFAULT_SCRATCH_DIR: &str = "cached_files";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
    #[error("Cannot determine the working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
    #[error("Invalid {SCRATCH_DIR_VAR}: {0}")]
    ScratchDir(#[from] FilesystemError),
    #[error("Scratch directory {0} contains the working directory")]
    ScratchDirContainsWorkingDir(PathBuf),
}

/// Runtime settings, read from the environment and an optional `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// CurseForge API key; only needed for packwiz packs with CurseForge mods.
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// Where jars are downloaded to while resolving packwiz manifests.
    pub scratch_dir: PathBuf,
}

impl Config {
    /// Loads `.env` (if present) into the process environment, then reads the
    /// configuration from it.
    ///
    /// # Errors
    ///
    /// Returns an error if a `.env` file exists but cannot be parsed, or the
    /// working directory is unavailable, or the scratch directory is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }
        let cwd = env::current_dir()?;
        Self::from_lookup(|key| env::var(key).ok(), cwd)
    }

    /// Builds the configuration from an arbitrary variable lookup, resolving a
    /// relative scratch directory against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch directory cannot be expanded, or if it
    /// is `cwd` itself or one of its ancestors.
    pub fn from_lookup<F>(lookup: F, cwd: PathBuf) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).or_else(|| non_empty(LEGACY_API_KEY_VAR));
        let api_base_url = non_empty(API_URL_VAR).unwrap_or_else(|| CURSEFORGE_API_BASE.to_string());
        let scratch_dir = match non_empty(SCRATCH_DIR_VAR) {
            Some(dir) => normalize(&cwd.join(filesystem::expand_home(dir.trim())?)),
            None => cwd.join(DEFAULT_SCRATCH_DIR),
        };
        if normalize(&cwd).starts_with(&scratch_dir) {
            return Err(ConfigError::ScratchDirContainsWorkingDir(scratch_dir));
        }

        Ok(Self {
            api_key,
            api_base_url,
            scratch_dir,
        })
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn uses_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[]), PathBuf::from("/work")).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.api_base_url, CURSEFORGE_API_BASE);
        assert_eq!(config.scratch_dir, PathBuf::from("/work/cached_files"));
    }

    #[test]
    fn prefers_new_api_key_variable() {
        let config = Config::from_lookup(
            lookup(&[(API_KEY_VAR, "new"), (LEGACY_API_KEY_VAR, "old")]),
            PathBuf::from("/work"),
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("new"));
    }

    #[test]
    fn falls_back_to_legacy_api_key() {
        let config = Config::from_lookup(
            lookup(&[(API_KEY_VAR, "  "), (LEGACY_API_KEY_VAR, "old")]),
            PathBuf::from("/work"),
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("old"));
    }

    #[test]
    fn reads_url_and_absolute_scratch_dir() {
        let config = Config::from_lookup(
            lookup(&[(API_URL_VAR, "http://localhost:8080"), (SCRATCH_DIR_VAR, "/tmp/scratch")]),
            PathBuf::from("/work"),
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.scratch_dir, PathBuf::from("/tmp/scratch"));
    }

    #[test]
    fn rejects_other_users_home() {
        let result = Config::from_lookup(lookup(&[(SCRATCH_DIR_VAR, "~other/cache")]), PathBuf::from("/work"));
        assert!(matches!(result, Err(ConfigError::ScratchDir(_))));
    }

    #[test]
    fn rejects_working_dir_and_its_parents() {
        for dir in [".", "/work", "/", ".."] {
            let result = Config::from_lookup(lookup(&[(SCRATCH_DIR_VAR, dir)]), PathBuf::from("/work"));
            assert!(
                matches!(result, Err(ConfigError::ScratchDirContainsWorkingDir(_))),
                "{dir} was accepted"
            );
        }
    }

    #[test]
    fn accepts_existing_folder_below_working_dir() {
        let config = Config::from_lookup(lookup(&[(SCRATCH_DIR_VAR, "downloads")]), PathBuf::from("/work")).unwrap();
        assert_eq!(config.scratch_dir, PathBuf::from("/work/downloads"));
    }
}
