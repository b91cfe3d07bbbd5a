//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/patsfmt/patsfmt.toml`
//! 3. Local config: `<project_dir>/.patsfmt.toml`
//! 4. Environment variables: `PATSFMT_*` prefix

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{DEFAULT_CLEAN_PATTERN, DEFAULT_MAX_LINES, DEFAULT_SUBSTITUTIONS};

/// Phrases that introduce an expression in patsopt's notation.
pub const DEFAULT_EXPRESSION_MARKERS: &[&str] = &[
    "unsolved constraint: ",
    "The actual term is: ",
    "The needed term is: ",
];

/// One name substitution: regex pattern and its literal replacement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleConfig {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl RuleConfig {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

fn default_substitutions() -> Vec<RuleConfig> {
    DEFAULT_SUBSTITUTIONS
        .iter()
        .map(|(pattern, replacement)| RuleConfig::new(*pattern, *replacement))
        .collect()
}

/// Raw settings for intermediate parsing (all optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub hide_types: Option<bool>,
    pub colored: Option<bool>,
    pub max_excerpt_lines: Option<usize>,
    pub clean_pattern: Option<String>,
    pub expression_markers: Option<Vec<String>>,
    pub substitutions: Option<Vec<RuleConfig>>,
}

/// Unified configuration for patsfmt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Print single-child type wrappers as just their child
    pub hide_types: bool,
    /// Emit ANSI colors
    pub colored: bool,
    /// Excerpt lines kept before truncation
    pub max_excerpt_lines: usize,
    /// Regex whose first group is the user-facing part of a compiler name
    pub clean_pattern: String,
    /// Phrases after which the rest of a line is expression notation
    pub expression_markers: Vec<String>,
    /// Ordered name substitutions applied after cleanup
    pub substitutions: Vec<RuleConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_types: true,
            colored: true,
            max_excerpt_lines: DEFAULT_MAX_LINES,
            clean_pattern: DEFAULT_CLEAN_PATTERN.to_string(),
            expression_markers: DEFAULT_EXPRESSION_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            substitutions: default_substitutions(),
        }
    }
}

/// Get the XDG config directory for patsfmt.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "patsfmt").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("patsfmt.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".patsfmt.toml")
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
        let mut result: BTreeSet<String> = base.iter().cloned().collect();

        for item in overlay {
            if let Some(negated) = item.strip_prefix('!') {
                result.remove(negated);
            } else {
                result.insert(item.clone());
            }
        }

        result.into_iter().collect()
    }

    /// Merge a local overlay onto self (base).
    ///
    /// - Scalar options: overlay wins if Some, otherwise keep base
    /// - Substitutions: overlay rules run after the inherited ones
    /// - Markers: union merge with negation support
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let mut substitutions = self.substitutions.clone();
        if let Some(extra) = &overlay.substitutions {
            substitutions.extend(extra.iter().cloned());
        }

        Self {
            hide_types: overlay.hide_types.unwrap_or(self.hide_types),
            colored: overlay.colored.unwrap_or(self.colored),
            max_excerpt_lines: overlay.max_excerpt_lines.unwrap_or(self.max_excerpt_lines),
            clean_pattern: overlay
                .clean_pattern
                .clone()
                .unwrap_or_else(|| self.clean_pattern.clone()),
            expression_markers: overlay
                .expression_markers
                .as_ref()
                .map(|o| Self::merge_array(&self.expression_markers, o))
                .unwrap_or_else(|| self.expression_markers.clone()),
            substitutions,
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    ///
    /// The global file defines the real baseline: a substitution table given
    /// there replaces the compiled one entirely.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            hide_types: global.hide_types.unwrap_or(self.hide_types),
            colored: global.colored.unwrap_or(self.colored),
            max_excerpt_lines: global.max_excerpt_lines.unwrap_or(self.max_excerpt_lines),
            clean_pattern: global
                .clean_pattern
                .clone()
                .unwrap_or_else(|| self.clean_pattern.clone()),
            expression_markers: global
                .expression_markers
                .clone()
                .unwrap_or_else(|| self.expression_markers.clone()),
            substitutions: global
                .substitutions
                .clone()
                .unwrap_or_else(|| self.substitutions.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `.patsfmt.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config (arrays REPLACE defaults)
    /// 3. Local config (substitutions APPEND, markers UNION)
    /// 4. Environment variables: `PATSFMT_*` (scalars only, REPLACE)
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        Self::apply_env_overrides(current)
    }

    /// Load a single explicit config file on top of the defaults.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        Self::apply_env_overrides(Self::default().apply_global(&raw))
    }

    /// Apply PATSFMT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("PATSFMT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_bool("hide_types") {
            settings.hide_types = val;
        }
        if let Ok(val) = config.get_bool("colored") {
            settings.colored = val;
        }
        if let Ok(val) = config.get_int("max_excerpt_lines") {
            settings.max_excerpt_lines = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_excerpt_lines must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_string("clean_pattern") {
            settings.clean_pattern = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# patsfmt configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/patsfmt/patsfmt.toml  (defines your baseline)
#   Local:  <project_dir>/.patsfmt.toml     (project-specific additions)
#   Env:    PATSFMT_* environment variables (explicit overrides)
#
# Array Merge Semantics:
#   Global config REPLACES compiled defaults.
#   Local substitutions run AFTER inherited ones.
#   Local expression_markers UNION with inherited ones; "!marker" removes one.

# Show `x` instead of `int(x)` for single-child type wrappers
# hide_types = true

# ANSI colors (also disabled by NO_COLOR or --no-color)
# colored = true

# Source excerpt lines before "..."
# max_excerpt_lines = 10

# First capture group is kept from compiler-prefixed names
# clean_pattern = "(?:C3NSTR|S2E)(.+)"

# expression_markers = ["unsolved constraint: ", "The actual term is: ", "The needed term is: "]

# Ordered name substitutions, each fed the previous one's output.
# Replacements are literal text, no $1 group references.
# [[substitutions]]
# pattern = "intinf"
# replacement = "int"
#
# [[substitutions]]
# pattern = "lte_.+"
# replacement = "<="
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
    fn given_defaults_when_created_then_match_builtin_tables() {
        let settings = Settings::default();
        assert!(settings.hide_types);
        assert_eq!(settings.max_excerpt_lines, 10);
        assert_eq!(settings.substitutions.len(), DEFAULT_SUBSTITUTIONS.len());
        assert_eq!(settings.substitutions[0], RuleConfig::new("intinf", "int"));
        assert_eq!(settings.expression_markers.len(), 3);
    }

    #[test]
    fn test_merge_array_union_and_negation() {
        let base = strings(&["a", "b"]);
        let result = Settings::merge_array(&base, &strings(&["!a", "c", "b"]));
        assert_eq!(result, strings(&["b", "c"]));
    }

    #[test]
    fn test_merge_with_appends_substitutions() {
        let base = Settings::default();
        let overlay = RawSettings {
            hide_types: Some(false),
            substitutions: Some(vec![RuleConfig::new("lte_.+", "<=")]),
            ..RawSettings::default()
        };

        let result = base.merge_with(&overlay);

        assert!(!result.hide_types);
        assert_eq!(result.substitutions.len(), DEFAULT_SUBSTITUTIONS.len() + 1);
        assert_eq!(
            result.substitutions.last(),
            Some(&RuleConfig::new("lte_.+", "<="))
        );
        assert_eq!(result.max_excerpt_lines, base.max_excerpt_lines);
    }

    #[test]
    fn test_apply_global_replaces_substitutions() {
        let base = Settings::default();
        let global = RawSettings {
            substitutions: Some(vec![RuleConfig::new("eqeq", "==")]),
            expression_markers: Some(strings(&["constraint: "])),
            ..RawSettings::default()
        };

        let result = base.apply_global(&global);

        assert_eq!(result.substitutions, vec![RuleConfig::new("eqeq", "==")]);
        assert_eq!(result.expression_markers, strings(&["constraint: "]));
        assert_eq!(result.clean_pattern, DEFAULT_CLEAN_PATTERN);
    }

    #[test]
    fn test_to_toml_parses_back() {
        let settings = Settings::default();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_template_is_valid_toml() {
        let parsed: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(parsed.substitutions.is_none());
    }
}
