//! Runtime configuration
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Files are JSON:
//!
//! ```json
//! { "manifest": "/opt/neokat/tools/list-tools.txt", "fallback": null }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_MARKER;
use crate::error::ConfigError;
use crate::selector::DEFAULT_WILDCARD;
use crate::types::{ColorChoice, FallbackChannel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Categorized tool list
    pub manifest: PathBuf,
    /// First character of a category header line
    pub category_marker: char,
    /// Selection token meaning "every item"
    pub wildcard: String,
    /// Directory holding the bundled installer scripts
    pub tools_dir: PathBuf,
    /// Base directory for menu scripts such as `core/kali/theme.sh`
    pub scripts_root: PathBuf,
    pub sources_list: PathBuf,
    pub repo_entry: String,
    pub repo_key_url: String,
    pub repo_keyring: PathBuf,
    /// Tried after apt-get fails; `null` disables it
    pub fallback: Option<FallbackChannel>,
    /// Hide apt-get/snap output during batch installs
    pub quiet_installs: bool,
    pub color: ColorChoice,
    /// Installed packages containing this are offered for uninstall
    pub tool_filter: String,
    /// Desktop applications offered for uninstall
    pub tracked_apps: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("tools/list-tools.txt"),
            category_marker: DEFAULT_MARKER,
            wildcard: DEFAULT_WILDCARD.to_string(),
            tools_dir: PathBuf::from("tools"),
            scripts_root: PathBuf::from("."),
            sources_list: PathBuf::from("/etc/apt/sources.list"),
            repo_entry: "deb http://http.kali.org/kali kali-rolling main non-free contrib".to_string(),
            repo_key_url: "https://archive.kali.org/archive-key.asc".to_string(),
            repo_keyring: PathBuf::from("/etc/apt/trusted.gpg.d/kali-archive-key.asc"),
            fallback: Some(FallbackChannel::Snap),
            quiet_installs: true,
            color: ColorChoice::Auto,
            tool_filter: "kali".to_string(),
            tracked_apps: vec![
                "brave-browser".to_string(),
                "telegram-desktop".to_string(),
                "code".to_string(),
            ],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults when `path` is `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Resolve a menu script path against `scripts_root`
    pub fn script_path(&self, relative: &str) -> PathBuf {
        self.scripts_root.join(relative)
    }

    /// Directories whose scripts must stay executable
    pub fn script_dirs(&self) -> [PathBuf; 2] {
        [self.tools_dir.clone(), self.script_path("core")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neokat.json");
        fs::write(&path, r#"{ "manifest": "/srv/tools.txt", "fallback": null, "wildcard": "*" }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.manifest, PathBuf::from("/srv/tools.txt"));
        assert_eq!(config.fallback, None);
        assert_eq!(config.wildcard, "*");
        assert_eq!(config.category_marker, '#');
        assert_eq!(config.tracked_apps.len(), 3);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neokat.json");
        fs::write(&path, r#"{ "manifests": "typo" }"#).unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::load(Path::new("/nonexistent/neokat.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
