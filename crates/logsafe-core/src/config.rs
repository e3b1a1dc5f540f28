//! Engine configuration

use crate::error::ConfigError;
use crate::hir::Symbol;
use crate::safety::Safety;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SAFE_ANNOTATION: &str = "com.palantir.logsafe.Safe";
pub const UNSAFE_ANNOTATION: &str = "com.palantir.logsafe.Unsafe";
pub const DO_NOT_LOG_ANNOTATION: &str = "com.palantir.logsafe.DoNotLog";

/// Fully-qualified names of the three safety annotations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationNames {
    pub safe: String,
    #[serde(rename = "unsafe")]
    pub unsafe_: String,
    pub do_not_log: String,
}

impl Default for AnnotationNames {
    fn default() -> Self {
        Self {
            safe: SAFE_ANNOTATION.to_string(),
            unsafe_: UNSAFE_ANNOTATION.to_string(),
            do_not_log: DO_NOT_LOG_ANNOTATION.to_string(),
        }
    }
}

impl AnnotationNames {
    /// Safety declared directly on `symbol`.
    ///
    /// Checked in priority order `DoNotLog`, `Unsafe`, `Safe`.
    pub fn declared_on(&self, symbol: &Symbol) -> Option<Safety> {
        if symbol.has_annotation(&self.do_not_log) {
            Some(Safety::DoNotLog)
        } else if symbol.has_annotation(&self.unsafe_) {
            Some(Safety::Unsafe)
        } else if symbol.has_annotation(&self.safe) {
            Some(Safety::Safe)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (role, name) in [("safe", &self.safe), ("unsafe", &self.unsafe_), ("do_not_log", &self.do_not_log)] {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyAnnotationName { role });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub annotations: AnnotationNames,
    /// Upper bound on block visits before the solver gives up
    pub max_iterations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            annotations: AnnotationNames::default(),
            max_iterations: 10_000,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.annotations.validate()?;
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationBound);
        }
        Ok(())
    }
}
