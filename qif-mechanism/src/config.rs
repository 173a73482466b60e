use std::{
    fs,
    path::{Path, PathBuf},
};

use qif_core::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::synthesis::Formulation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse synthesis config: {details}")]
    Parse { details: String },
    #[error("configuration invalid: {0}")]
    Validation(String),
}

/// Parameters of a synthesis run, loadable from TOML.
///
/// ```toml
/// epsilon = 0.5
/// formulation = "bucketed"
/// tolerance = 1e-6
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SynthesisConfig {
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub formulation: Formulation,
    /// Overrides the element type's default comparison tolerance.
    #[serde(default)]
    pub tolerance: Option<f64>,
}

const fn default_epsilon() -> f64 {
    1.0
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            formulation: Formulation::default(),
            tolerance: None,
        }
    }
}

impl SynthesisConfig {
    pub fn new(epsilon: f64, formulation: Formulation) -> Self {
        Self {
            epsilon,
            formulation,
            tolerance: None,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::Validation(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        if let Some(tolerance) = self.tolerance {
            if !(tolerance > 0.0 && tolerance < 1.0) {
                return Err(ConfigError::Validation(format!(
                    "tolerance must lie in (0, 1), got {tolerance}"
                )));
            }
        }
        Ok(())
    }

    pub fn tolerance_for<T: Scalar>(&self) -> T {
        self.tolerance.map(T::of).unwrap_or(T::DEFAULT_TOLERANCE)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|err| ConfigError::Parse {
            details: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

pub fn load_config(path: &Path) -> Result<SynthesisConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SynthesisConfig::from_toml_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_config() {
        let contents = r#"
            epsilon = 0.25
            formulation = "strict"
            tolerance = 1e-6
        "#;
        let config = SynthesisConfig::from_toml_str(contents).unwrap();
        assert_eq!(config.epsilon, 0.25);
        assert_eq!(config.formulation, Formulation::Strict);
        assert_eq!(config.tolerance_for::<f64>(), 1e-6);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = SynthesisConfig::from_toml_str("").unwrap();
        assert_eq!(config, SynthesisConfig::default());
        assert_eq!(config.tolerance_for::<f32>(), f32::DEFAULT_TOLERANCE);
    }

    #[test]
    fn detects_non_positive_epsilon() {
        let err = SynthesisConfig::from_toml_str("epsilon = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        let config = SynthesisConfig::new(f64::INFINITY, Formulation::Pairwise);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_unknown_formulation() {
        let err = SynthesisConfig::from_toml_str(r#"formulation = "dense""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/synthesis.toml")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent/synthesis.toml"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
