//! Configuration loading.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use readiness_core::model::InstitutionType;

/// Top-level readiness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Catalog file or directory.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    /// JSON snapshot of progress and attempt records.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    /// Institution type assumed for institutions missing from `institutions`.
    #[serde(default)]
    pub default_institution_type: InstitutionType,
    /// Institution directory: id to type.
    #[serde(default)]
    pub institutions: HashMap<String, InstitutionType>,
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("catalog")
}

fn default_state_path() -> PathBuf {
    PathBuf::from("readiness-state.json")
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            state_path: default_state_path(),
            default_institution_type: InstitutionType::default(),
            institutions: HashMap::new(),
        }
    }
}

impl ReadinessConfig {
    /// Look up an institution's type, falling back to the configured default.
    pub fn institution_type(&self, institution_id: &str) -> InstitutionType {
        self.institutions
            .get(institution_id)
            .copied()
            .unwrap_or(self.default_institution_type)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Substituted values are inserted verbatim and never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `readiness.toml` in the current directory
/// 2. `~/.config/readiness/config.toml`
///
/// Environment variable overrides: `READINESS_CATALOG`, `READINESS_STATE`.
pub fn load_config() -> Result<ReadinessConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ReadinessConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("readiness.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ReadinessConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ReadinessConfig::default(),
    };

    if let Ok(catalog) = std::env::var("READINESS_CATALOG") {
        config.catalog_path = PathBuf::from(catalog);
    }
    if let Ok(state) = std::env::var("READINESS_STATE") {
        config.state_path = PathBuf::from(state);
    }

    config.catalog_path = resolve_path(&config.catalog_path);
    config.state_path = resolve_path(&config.state_path);

    tracing::debug!(
        source = ?config_path,
        catalog = %config.catalog_path.display(),
        state = %config.state_path.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("readiness"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_READINESS_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_READINESS_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_READINESS_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("unterminated ${VAR"), "unterminated ${VAR");
        std::env::remove_var("_READINESS_TEST_VAR");
    }

    #[test]
    fn resolved_values_are_not_expanded_again() {
        std::env::set_var("_READINESS_SELF_REF", "${_READINESS_SELF_REF}");
        std::env::set_var("_READINESS_NESTED", "${_READINESS_SELF_REF}/x");
        assert_eq!(
            resolve_env_vars("${_READINESS_SELF_REF}"),
            "${_READINESS_SELF_REF}"
        );
        assert_eq!(
            resolve_env_vars("a/${_READINESS_NESTED}/${_READINESS_SELF_REF}"),
            "a/${_READINESS_SELF_REF}/x/${_READINESS_SELF_REF}"
        );
        std::env::remove_var("_READINESS_SELF_REF");
        std::env::remove_var("_READINESS_NESTED");
    }

    #[test]
    fn default_config() {
        let config = ReadinessConfig::default();
        assert_eq!(config.catalog_path, PathBuf::from("catalog"));
        assert_eq!(config.default_institution_type, InstitutionType::School);
        assert_eq!(config.institution_type("unknown"), InstitutionType::School);
    }

    #[test]
    fn parse_config_with_institutions() {
        let toml_str = r#"
catalog_path = "content/catalog.toml"
state_path = "data/state.json"
default_institution_type = "college"

[institutions]
"pgc-chandigarh" = "college"
"dps-7" = "school"
"#;
        let config: ReadinessConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.institution_type("dps-7"), InstitutionType::School);
        assert_eq!(config.institution_type("elsewhere"), InstitutionType::College);
        assert_eq!(config.state_path, PathBuf::from("data/state.json"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }
}
