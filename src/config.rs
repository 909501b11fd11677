//! Where settings and logs live.
//!
//! Resolution order for both the config and the data directory:
//! 1. `--config-dir` on the command line
//! 2. `LIGHTWALL_CONFIG_DIR`
//! 3. The current directory, if it already holds `lightwall.json` or `lightwall.log`
//! 4. The platform directory from `dirs-next` (`~/.config/lightwall`, `~/.local/share/lightwall`, ...)
//! 5. `.`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const APP_DIR: &str = "lightwall";
pub const CONFIG_ENV: &str = "LIGHTWALL_CONFIG_DIR";
pub const LOG_FILE: &str = "lightwall.log";

/// Files whose presence makes the current directory the config home.
const LOCAL_MARKERS: [&str; 2] = [crate::settings::SETTINGS_FILE, LOG_FILE];

#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Explicit directory from the CLI or the environment.
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// CLI wins over the environment.
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        Self { config_dir }
    }

    pub fn config_dir(&self) -> PathBuf {
        resolve_dir(self, std::env::current_dir().ok().as_deref(), dirs_next::config_dir())
    }

    pub fn data_dir(&self) -> PathBuf {
        resolve_dir(self, std::env::current_dir().ok().as_deref(), dirs_next::data_dir())
    }

    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir().join(name)
    }

    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir().join(name)
    }

    /// Create both directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        let config_dir = self.config_dir();
        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

        let data_dir = self.data_dir();
        if data_dir != config_dir {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        }
        Ok(())
    }
}

fn has_local_markers(dir: &Path) -> bool {
    LOCAL_MARKERS.iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, cwd: Option<&Path>, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Some(cwd) = cwd
        && has_local_markers(cwd)
    {
        return cwd.to_path_buf();
    }
    if let Some(dir) = platform {
        return dir.join(APP_DIR);
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lightwall_{}_{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cli_dir_wins() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/custom")));
        assert_eq!(config.config_file("lightwall.json"), PathBuf::from("/custom/lightwall.json"));
        assert_eq!(config.data_file(LOG_FILE), PathBuf::from("/custom/lightwall.log"));
    }

    #[test]
    fn test_local_markers_then_platform() {
        let config = PathConfig::default();
        let cwd = temp_dir("markers");
        let platform = Some(PathBuf::from("/platform"));

        assert_eq!(resolve_dir(&config, Some(&cwd), platform.clone()), PathBuf::from("/platform/lightwall"));

        std::fs::write(cwd.join(LOG_FILE), "").unwrap();
        assert_eq!(resolve_dir(&config, Some(&cwd), platform), cwd);

        let _ = std::fs::remove_dir_all(&cwd);
    }

    #[test]
    fn test_fallback_is_current_dir() {
        let config = PathConfig::default();
        assert_eq!(resolve_dir(&config, None, None), PathBuf::from("."));
    }

    #[test]
    fn test_ensure_dirs_creates_custom_dir() {
        let base = temp_dir("ensure");
        let target = base.join("nested").join("cfg");
        let config = PathConfig {
            config_dir: Some(target.clone()),
        };
        config.ensure_dirs().unwrap();
        assert!(target.is_dir());
        let _ = std::fs::remove_dir_all(&base);
    }
}
