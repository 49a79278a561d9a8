//! Locations of the config file and the payload cache.
//!
//! One root wins for both, in this order: the global `--dir` flag, the
//! `GRIDGUIDE_HOME` variable, then the XDG base directories
//! (`$XDG_CONFIG_HOME/gridguide/config.toml` and `$XDG_CACHE_HOME/gridguide`,
//! falling back to `~/.config` and `~/.cache`).

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Variable naming a single root for config and cache.
const HOME_ENV: &str = "GRIDGUIDE_HOME";

const APP_DIR: &str = "gridguide";
const CONFIG_FILE: &str = "config.toml";
const CACHE_DIR: &str = "cache";

/// Resolved config file and cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// TOML config file.
    pub config_file: PathBuf,
    /// Default payload cache directory.
    pub cache_dir: PathBuf,
}

impl AppPaths {
    /// Resolves paths from `dir` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is given and `HOME` is unset.
    pub fn resolve(dir: Option<&Path>) -> Result<Self> {
        Self::resolve_with(dir, |key| std::env::var(key).ok())
    }

    /// Resolves paths reading variables through `env`.
    fn resolve_with(dir: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| env(key).filter(|value| !value.is_empty()).map(PathBuf::from);

        if let Some(root) = dir.map(Path::to_path_buf).or_else(|| var(HOME_ENV)) {
            return Ok(Self::under(&root));
        }

        let home = var("HOME");
        let under_home = |sub: &str| home.as_ref().map(|h| h.join(sub));
        let config_base = var("XDG_CONFIG_HOME").or_else(|| under_home(".config"));
        let cache_base = var("XDG_CACHE_HOME").or_else(|| under_home(".cache"));
        let (Some(config_base), Some(cache_base)) = (config_base, cache_base) else {
            bail!("HOME is not set and no XDG base directory is given");
        };

        Ok(Self {
            config_file: config_base.join(APP_DIR).join(CONFIG_FILE),
            cache_dir: cache_base.join(APP_DIR),
        })
    }

    /// Config and cache side by side under one root.
    fn under(root: &Path) -> Self {
        Self {
            config_file: root.join(CONFIG_FILE),
            cache_dir: root.join(CACHE_DIR),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (String::from(*k), String::from(*v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_dir_flag_roots_config_and_cache() {
        // Arrange
        let env = env_of(&[(HOME_ENV, "/srv/guide"), ("HOME", "/home/ann")]);

        // Act
        let paths = AppPaths::resolve_with(Some(Path::new("/tmp/run")), env).unwrap();

        // Assert
        assert_eq!(paths.config_file, PathBuf::from("/tmp/run/config.toml"));
        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/run/cache"));
    }

    #[test]
    fn test_home_variable_roots_both() {
        // Arrange
        let env = env_of(&[(HOME_ENV, "/srv/guide"), ("XDG_CACHE_HOME", "/var/cache")]);

        // Act
        let paths = AppPaths::resolve_with(None, env).unwrap();

        // Assert
        assert_eq!(paths.config_file, PathBuf::from("/srv/guide/config.toml"));
        assert_eq!(paths.cache_dir, PathBuf::from("/srv/guide/cache"));
    }

    #[test]
    fn test_xdg_directories_split_config_and_cache() {
        // Arrange
        let env = env_of(&[
            ("HOME", "/home/ann"),
            ("XDG_CONFIG_HOME", "/etc/xdg-ann"),
            ("XDG_CACHE_HOME", ""),
        ]);

        // Act
        let paths = AppPaths::resolve_with(None, env).unwrap();

        // Assert
        assert_eq!(
            paths.config_file,
            PathBuf::from("/etc/xdg-ann/gridguide/config.toml")
        );
        assert_eq!(paths.cache_dir, PathBuf::from("/home/ann/.cache/gridguide"));
    }

    #[test]
    fn test_no_home_is_an_error() {
        // Arrange & Act
        let result = AppPaths::resolve_with(None, env_of(&[]));

        // Assert
        assert!(result.is_err());
    }
}
