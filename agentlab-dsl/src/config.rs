//! Compiler configuration
//!
//! ```toml
//! [definitions]
//! conditions = { path = "defs/conditions.txt" }
//! actions = { text = "action Wait();" }
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a definition catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionSource {
    Path(PathBuf),
    Text(String),
}

impl Default for DefinitionSource {
    fn default() -> Self {
        DefinitionSource::Text(String::new())
    }
}

impl DefinitionSource {
    /// Reads the catalog text. Paths are read in full once per call.
    pub fn load(&self) -> Result<String, ConfigError> {
        match self {
            DefinitionSource::Text(text) => Ok(text.clone()),
            DefinitionSource::Path(path) => fs::read_to_string(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn relative_to(self, base: &Path) -> Self {
        match self {
            DefinitionSource::Path(path) if path.is_relative() => DefinitionSource::Path(base.join(path)),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionsConfig {
    #[serde(default)]
    pub conditions: DefinitionSource,
    #[serde(default)]
    pub actions: DefinitionSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    #[serde(default)]
    pub definitions: DefinitionsConfig,
}

/// Catalog texts loaded from a [`CompilerConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogs {
    pub conditions: String,
    pub actions: String,
}

impl Catalogs {
    pub fn new(conditions: impl Into<String>, actions: impl Into<String>) -> Self {
        Self {
            conditions: conditions.into(),
            actions: actions.into(),
        }
    }
}

impl CompilerConfig {
    /// Config with both catalogs given inline.
    pub fn with_definitions(conditions: impl Into<String>, actions: impl Into<String>) -> Self {
        Self {
            definitions: DefinitionsConfig {
                conditions: DefinitionSource::Text(conditions.into()),
                actions: DefinitionSource::Text(actions.into()),
            },
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Toml { reason: e.to_string() })
    }

    /// Loads a config file. Relative catalog paths are taken from the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&source)?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let definitions = std::mem::take(&mut config.definitions);
        config.definitions = DefinitionsConfig {
            conditions: definitions.conditions.relative_to(base),
            actions: definitions.actions.relative_to(base),
        };
        Ok(config)
    }

    pub fn load_catalogs(&self) -> Result<Catalogs, ConfigError> {
        Ok(Catalogs {
            conditions: self.definitions.conditions.load()?,
            actions: self.definitions.actions.load()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_definitions() -> Result<(), ConfigError> {
        let config = CompilerConfig::from_toml_str(
            r#"
            [definitions]
            conditions = { text = "condition Else();" }
            actions = { text = "action Wait();" }
            "#,
        )?;
        let catalogs = config.load_catalogs()?;
        assert_eq!(catalogs, Catalogs::new("condition Else();", "action Wait();"));
        Ok(())
    }

    #[test]
    fn test_missing_definitions_default_to_empty() -> Result<(), ConfigError> {
        let config = CompilerConfig::from_toml_str("")?;
        assert_eq!(config.load_catalogs()?, Catalogs::default());
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = CompilerConfig::from_toml_str("[definitions]\nevents = { text = \"\" }").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_relative_paths_follow_config_file() -> Result<(), ConfigError> {
        let dir = std::env::temp_dir().join(format!("agentlab-config-{}", std::process::id()));
        fs::create_dir_all(&dir).map_err(|e| ConfigError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let write = |name: &str, text: &str| {
            fs::write(dir.join(name), text).map_err(|e| ConfigError::Io {
                path: name.to_string(),
                reason: e.to_string(),
            })
        };
        write("conditions.txt", "condition Near(int range);")?;
        write(
            "agentlab.toml",
            "[definitions]\nconditions = { path = \"conditions.txt\" }\nactions = { text = \"action Wait();\" }\n",
        )?;

        let config = CompilerConfig::from_file(dir.join("agentlab.toml"))?;
        let catalogs = config.load_catalogs()?;
        assert_eq!(catalogs.conditions, "condition Near(int range);");
        assert_eq!(catalogs.actions, "action Wait();");

        let _ = fs::remove_dir_all(&dir);
        Ok(())
    }

    #[test]
    fn test_missing_catalog_file() {
        let source = DefinitionSource::Path(PathBuf::from("/nonexistent/agentlab/actions.txt"));
        assert!(matches!(source.load(), Err(ConfigError::Io { .. })));
    }
}
