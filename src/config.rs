//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/deftree/deftree.toml`
//! 3. Local config: `<project_dir>/.deftree.toml`
//! 4. Environment variables: `DEFTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Defold resource extensions checked by `deftree validate` out of the box.
const DEFAULT_EXTENSIONS: &[&str] = &[
    "atlas",
    "camera",
    "collection",
    "collectionfactory",
    "collectionproxy",
    "collisionobject",
    "display_profiles",
    "factory",
    "font",
    "go",
    "gui",
    "input_binding",
    "label",
    "material",
    "model",
    "particlefx",
    "render",
    "sound",
    "sprite",
    "texture_profiles",
    "tilemap",
    "tilesource",
];

const DEFAULT_EXCLUDE_DIRS: &[&str] = &["build", ".git", ".internal"];

/// Raw settings for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub extensions: Option<Vec<String>>,
    pub exclude_dirs: Option<Vec<String>>,
}

/// Unified configuration for deftree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// File extensions (without dot) the validator walks
    pub extensions: Vec<String>,
    /// Directory names skipped while walking
    pub exclude_dirs: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Get the XDG config directory for deftree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "deftree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("deftree.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".deftree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are added to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are de-duplicated
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let mut result: HashSet<String> = base.iter().cloned().collect();

        for pattern in overlay {
            if let Some(negated) = pattern.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(pattern.clone());
            }
        }

        // Convert to sorted Vec for deterministic output
        let mut vec: Vec<String> = result.into_iter().collect();
        vec.sort();
        vec
    }

    /// Merge overlay config onto self (base) with union semantics for arrays.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            extensions: overlay
                .extensions
                .as_ref()
                .map(|o| Self::merge_array(&self.extensions, o))
                .unwrap_or_else(|| self.extensions.clone()),
            exclude_dirs: overlay
                .exclude_dirs
                .as_ref()
                .map(|o| Self::merge_array(&self.exclude_dirs, o))
                .unwrap_or_else(|| self.exclude_dirs.clone()),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Arrays specified by the global config replace the defaults entirely.
    pub fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            extensions: global
                .extensions
                .clone()
                .unwrap_or_else(|| self.extensions.clone()),
            exclude_dirs: global
                .exclude_dirs
                .clone()
                .unwrap_or_else(|| self.exclude_dirs.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), project_dir)
    }

    /// Load settings from an explicit global config path.
    pub fn load_from(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!(path = %global_path.display(), "loading global config");
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!(path = %local_path.display(), "loading local config");
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Apply DEFTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("DEFTREE")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("extensions")
                .with_list_parse_key("exclude_dirs")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get::<Vec<String>>("extensions") {
            settings.extensions = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("exclude_dirs") {
            settings.exclude_dirs = val;
        }

        Ok(settings)
    }

    /// Whether `path` has one of the configured extensions.
    pub fn wants_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Whether a directory with this name is skipped.
    pub fn skips_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|d| d == name)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# deftree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/deftree/deftree.toml  (defines your baseline)
#   Local:  <project_dir>/.deftree.toml     (project-specific additions)
#   Env:    DEFTREE_* environment variables  (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local config UNIONS with global.
#   Use "!item" in local config to REMOVE an inherited item:
#     extensions = ["script_api", "!sound"]

# File extensions checked by `deftree validate <dir>`
# extensions = ["collection", "go", "gui", "atlas", "particlefx"]

# Directory names skipped while walking a project
# exclude_dirs = ["build", ".git", ".internal"]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert!(settings.extensions.contains(&"collection".to_string()));
        assert!(settings.exclude_dirs.contains(&"build".to_string()));
    }

    #[test]
    fn test_merge_array_union() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_merge_array_negation() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["!a", "c"]));
        assert_eq!(result, strings(&["b", "c"]));
    }

    #[test]
    fn test_merge_array_negation_nonexistent() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["!x"]));
        assert_eq!(result, strings(&["a", "b"]));
    }

    #[test]
    fn test_merge_array_duplicates() {
        let result = Settings::merge_array(&strings(&["a", "b"]), &strings(&["a", "c"]));
        assert_eq!(result, strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_apply_global_replaces_arrays() {
        let base = Settings::default();
        let global = RawSettings {
            extensions: Some(strings(&["go", "gui"])),
            exclude_dirs: None,
        };

        let result = base.apply_global(&global);

        assert_eq!(result.extensions, strings(&["go", "gui"]));
        assert_eq!(result.exclude_dirs, base.exclude_dirs);
    }

    #[test]
    fn test_wants_file_matches_extension() {
        let settings = Settings::default();
        assert!(settings.wants_file(Path::new("main/main.collection")));
        assert!(!settings.wants_file(Path::new("main/main.lua")));
        assert!(!settings.wants_file(Path::new("README")));
        assert!(settings.skips_dir(".git"));
    }
}
