//! Configuration management.
//!
//! This module handles loading configuration from `designgen.toml` files
//! and merging with command-line arguments.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration filename.
pub const CONFIG_FILENAME: &str = "designgen.toml";

/// Main configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input documents.
    pub input: InputConfig,

    /// Output locations.
    pub output: OutputConfig,

    /// Naming rules.
    pub naming: NamingConfig,

    /// Preview scaffolding.
    pub preview: PreviewConfig,

    /// Post-generation hooks, run in order.
    pub hooks: Vec<HookConfig>,
}

/// Input document locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Component catalog document.
    pub catalog: PathBuf,

    /// Design token document.
    pub tokens: PathBuf,
}

/// Output configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving token modules and component stubs.
    pub dir: PathBuf,

    /// Directory holding the naming registry and generation state.
    pub state_dir: PathBuf,
}

/// Naming rules for external design names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Leading `/`-separated segments removed before casing (exact match).
    pub strip_prefixes: Vec<String>,

    /// Name prefixes identifying components from external libraries.
    pub external_libraries: Vec<ExternalLibrary>,
}

/// A component library that is imported rather than generated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalLibrary {
    /// External name prefix, e.g. `Material/`.
    pub prefix: String,

    /// Module specifier imported by stubs that use these components.
    pub module: String,
}

/// Preview scaffolding configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Emit a `<Component>.stories.tsx` next to each stub.
    pub stories: bool,
}

/// An external command run after generation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HookConfig {
    /// Name used in logs and reports.
    pub name: String,

    /// Program to execute.
    pub command: String,

    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("design/catalog.json"),
            tokens: PathBuf::from("design/tokens.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./src/design"),
            state_dir: PathBuf::from(".designgen"),
        }
    }
}

impl Config {
    /// Check values that TOML parsing alone cannot reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, library) in self.naming.external_libraries.iter().enumerate() {
            if library.prefix.is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("naming.external_libraries[{i}].prefix"),
                    "prefix must not be empty",
                ));
            }
        }
        for (i, hook) in self.hooks.iter().enumerate() {
            if hook.name.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("hooks[{i}].name"),
                    "hook name must not be empty",
                ));
            }
            if hook.command.trim().is_empty() {
                return Err(ConfigError::invalid_value(
                    format!("hooks[{i}].command"),
                    "hook command must not be empty",
                ));
            }
        }
        Ok(())
    }
}

/// Configuration manager for loading and merging configs.
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a file path.
    ///
    /// Without an explicit path the default location is tried and a missing
    /// file yields the default configuration. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let config_path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => {
                let default = PathBuf::from(CONFIG_FILENAME);
                if !default.exists() {
                    return Ok(Config::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config = Self::parse(&config_path, &content)?;
        tracing::debug!(path = %config_path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::invalid_toml(path.to_path_buf(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Merge CLI arguments into configuration.
    ///
    /// CLI arguments take precedence over config file values.
    pub fn merge_cli_args(mut config: Config, args: &CliArgs) -> Config {
        if let Some(ref catalog) = args.catalog {
            config.input.catalog = catalog.clone();
        }

        if let Some(ref tokens) = args.tokens {
            config.input.tokens = tokens.clone();
        }

        if let Some(ref output) = args.output {
            config.output.dir = output.clone();
        }

        if let Some(ref state_dir) = args.state_dir {
            config.output.state_dir = state_dir.clone();
        }

        if let Some(stories) = args.stories {
            config.preview.stories = stories;
        }

        config
    }

    /// Generate default configuration file content with comments.
    pub fn default_config_content() -> &'static str {
        r#"# designgen configuration file

[input]
# Component catalog exported from the design tool
catalog = "design/catalog.json"

# Design token document (colors, typography, spacing, effects)
tokens = "design/tokens.json"

[output]
# Directory receiving token modules and component stubs
dir = "./src/design"

# Naming registry and generation state; commit this directory
state_dir = ".designgen"

[naming]
# Leading name segments removed before casing, e.g. "Components/Button" -> "Button"
strip_prefixes = []

# Components matching these prefixes are imported, never scaffolded
# external_libraries = [{ prefix = "Material/", module = "@mui/material" }]
external_libraries = []

[preview]
# Emit a <Component>.stories.tsx next to each stub
stories = false

# Post-generation hooks run in order; the first failure stops the sequence
# [[hooks]]
# name = "format"
# command = "npx"
# args = ["prettier", "--write", "src/design"]
"#
    }
}

/// CLI arguments that can override configuration.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Catalog document override.
    pub catalog: Option<PathBuf>,

    /// Token document override.
    pub tokens: Option<PathBuf>,

    /// Output directory override.
    pub output: Option<PathBuf>,

    /// State directory override.
    pub state_dir: Option<PathBuf>,

    /// Story emission override.
    pub stories: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.catalog, PathBuf::from("design/catalog.json"));
        assert_eq!(config.output.dir, PathBuf::from("./src/design"));
        assert_eq!(config.output.state_dir, PathBuf::from(".designgen"));
        assert!(config.naming.strip_prefixes.is_empty());
        assert!(!config.preview.stories);
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn test_default_content_parses_to_defaults() {
        let config =
            ConfigManager::parse(Path::new(CONFIG_FILENAME), ConfigManager::default_config_content())
                .unwrap();
        assert_eq!(config.output.dir, Config::default().output.dir);
        assert!(config.hooks.is_empty());
    }

    #[test]
    fn test_merge_cli_args_output() {
        let args = CliArgs {
            output: Some(PathBuf::from("./custom")),
            stories: Some(true),
            ..Default::default()
        };

        let merged = ConfigManager::merge_cli_args(Config::default(), &args);
        assert_eq!(merged.output.dir, PathBuf::from("./custom"));
        assert!(merged.preview.stories);
    }

    #[test]
    fn test_merge_cli_args_preserves_unset() {
        let config = Config::default();
        let merged = ConfigManager::merge_cli_args(config.clone(), &CliArgs::default());
        assert_eq!(merged.output.dir, config.output.dir);
        assert_eq!(merged.input.tokens, config.input.tokens);
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[output]
dir = "./ui"

[naming]
strip_prefixes = ["Components", "DS"]
external_libraries = [{ prefix = "Material/", module = "@mui/material" }]

[preview]
stories = true

[[hooks]]
name = "format"
command = "prettier"
args = ["--write", "ui"]

[[hooks]]
name = "lint"
command = "eslint"
"#;

        let config = ConfigManager::parse(Path::new("designgen.toml"), toml).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("./ui"));
        assert_eq!(config.output.state_dir, PathBuf::from(".designgen"));
        assert_eq!(config.naming.strip_prefixes, vec!["Components", "DS"]);
        assert_eq!(
            config.naming.external_libraries,
            vec![ExternalLibrary {
                prefix: "Material/".into(),
                module: "@mui/material".into(),
            }]
        );
        assert!(config.preview.stories);
        assert_eq!(config.hooks.len(), 2);
        assert_eq!(config.hooks[0].args, vec!["--write", "ui"]);
        assert!(config.hooks[1].args.is_empty());
    }

    #[test]
    fn test_empty_hook_command_is_rejected() {
        let toml = r#"
[[hooks]]
name = "format"
command = ""
"#;
        let err = ConfigManager::parse(Path::new("designgen.toml"), toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "hooks[0].command"));
    }

    #[test]
    fn test_explicit_missing_path_is_not_found() {
        let err = ConfigManager::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
