//! Configuration for the `ehub` binary.
//!
//! Stored in `~/.ehub/config.toml`. Partial files are allowed; missing keys
//! fall back to the defaults below, and command-line flags override both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ehub_algo::{ModelConfig, ObjectiveKind, SolverKind, DEFAULT_BIG_M};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EhubConfig {
    pub model: ModelSection,
    pub solver: SolverSection,
    pub output: OutputSection,
}

/// Model construction options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Objective selector: cost, emissions or pareto.
    pub objective: String,

    /// Fallback big-M for disjunction rows without finite bounds.
    pub big_m: f64,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            objective: ObjectiveKind::Cost.as_str().to_string(),
            big_m: DEFAULT_BIG_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSection {
    /// Backend name: clarabel or highs.
    pub kind: String,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            kind: SolverKind::default().as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Default directory for result tables.
    pub directory: Option<PathBuf>,

    /// Decimal places written to CSV tables.
    pub decimal_places: usize,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: None,
            decimal_places: 4,
        }
    }
}

impl EhubConfig {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ehub"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load `path` if given (it must exist), else the default location.
    ///
    /// Returns the default config when no file is found at the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Model options, with `objective` and `big_m` taking precedence.
    pub fn model_config(&self, objective: Option<&str>, big_m: Option<f64>) -> Result<ModelConfig> {
        let objective = objective.unwrap_or(&self.model.objective);
        Ok(ModelConfig {
            objective: objective.parse()?,
            big_m: big_m.unwrap_or(self.model.big_m),
        })
    }

    pub fn solver(&self, flag: Option<&str>) -> Result<SolverKind> {
        Ok(flag.unwrap_or(&self.solver.kind).parse()?)
    }
}
