//! Configuration for reshape.
//!
//! Loads config from:
//! 1. Global: ~/.config/reshape/config.toml
//! 2. Per-project: .reshape/config.toml (overrides global)
//!
//! Example config.toml:
//! ```toml
//! [transform]
//! helper_prefix = "transform"
//!
//! [output]
//! package = "convert"
//! ```

use anyhow::Context;
use reshape_transform::scope::DEFAULT_HELPER_PREFIX;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Package written when neither the config nor the command line names one.
pub const DEFAULT_PACKAGE: &str = "convert";

/// Transform synthesis settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TransformConfig {
    /// Prefix of generated helper function names.
    pub helper_prefix: Option<String>,
}

impl TransformConfig {
    pub fn helper_prefix(&self) -> &str {
        self.helper_prefix.as_deref().unwrap_or(DEFAULT_HELPER_PREFIX)
    }
}

/// Generated file settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Go package clause of generated files.
    pub package: Option<String>,
}

impl OutputConfig {
    pub fn package(&self) -> &str {
        self.package.as_deref().unwrap_or(DEFAULT_PACKAGE)
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReshapeConfig {
    pub transform: TransformConfig,
    pub output: OutputConfig,
}

impl ReshapeConfig {
    /// Load configuration for a project.
    ///
    /// Missing files are skipped. A file that exists but does not parse is
    /// an error.
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::load_file(&global_path)? {
                config = config.merge(global);
            }
        }

        let project_path = root.join(".reshape").join("config.toml");
        if let Some(project) = Self::load_file(&project_path)? {
            config = config.merge(project);
        }

        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("reshape").join("config.toml"))
    }

    fn load_file(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(Some(config))
    }

    /// Values set in `other` win.
    fn merge(self, other: Self) -> Self {
        Self {
            transform: TransformConfig {
                helper_prefix: other.transform.helper_prefix.or(self.transform.helper_prefix),
            },
            output: OutputConfig {
                package: other.output.package.or(self.output.package),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_project_config(dir: &TempDir, content: &str) {
        let reshape_dir = dir.path().join(".reshape");
        std::fs::create_dir_all(&reshape_dir).unwrap();
        let mut file = std::fs::File::create(reshape_dir.join("config.toml")).unwrap();
        writeln!(file, "{content}").unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = ReshapeConfig::default();
        assert_eq!(config.transform.helper_prefix(), "transform");
        assert_eq!(config.output.package(), "convert");
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        write_project_config(
            &dir,
            r#"
[output]
package = "adapters"
"#,
        );
        let config = ReshapeConfig::load_file(&dir.path().join(".reshape/config.toml"))
            .unwrap()
            .unwrap();
        assert_eq!(config.output.package(), "adapters");
        assert_eq!(config.transform.helper_prefix(), "transform");
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(
            ReshapeConfig::load_file(&dir.path().join("nope.toml"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        write_project_config(&dir, "[transform\nhelper_prefix = 1");
        let err = ReshapeConfig::load_file(&dir.path().join(".reshape/config.toml")).unwrap_err();
        assert!(err.to_string().starts_with("invalid config file"));
    }

    #[test]
    fn test_merge_prefers_set_values() {
        let global = ReshapeConfig {
            transform: TransformConfig {
                helper_prefix: Some("conv".into()),
            },
            output: OutputConfig {
                package: Some("global".into()),
            },
        };
        let project = ReshapeConfig {
            output: OutputConfig {
                package: Some("local".into()),
            },
            ..Default::default()
        };
        let merged = ReshapeConfig::default().merge(global).merge(project);
        assert_eq!(merged.transform.helper_prefix(), "conv");
        assert_eq!(merged.output.package(), "local");
    }
}
