use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::diagnostics::CompileError;

pub const CONFIG_FILE: &str = "quack.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    /// Hard bound on fixed-point passes before giving up.
    pub max_passes: usize,
    pub type_error: TypeErrorPolicy,
    /// Seed instance variables from assignments inside nested constructor
    /// blocks too, not only its direct statements.
    pub seed_nested_fields: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            max_passes: 100,
            type_error: TypeErrorPolicy::Sticky,
            seed_nested_fields: false,
        }
    }
}

/// How `TypeError` behaves under least-common-ancestor joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeErrorPolicy {
    /// `LCA(TypeError, X) = TypeError`: a diagnosed binding stays broken.
    #[default]
    Sticky,
    /// `LCA(TypeError, X) = X`: later passes may overwrite the error.
    Heal,
}

impl Config {
    pub fn parse(content: &str, path: &Path) -> Result<Self, CompileError> {
        let config: Config = toml::from_str(content).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: invalid syntax: {e}"), path.to_path_buf())
        })?;
        if config.inference.max_passes == 0 {
            return Err(CompileError::config(
                format!("{CONFIG_FILE}: 'max_passes' must be at least 1"),
                path.to_path_buf(),
            ));
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, CompileError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CompileError::config(format!("{CONFIG_FILE}: could not read file: {e}"), path.to_path_buf())
        })?;
        Self::parse(&content, path)
    }

    /// Explicit path if given, otherwise `quack.toml` beside the input file,
    /// otherwise defaults.
    pub fn resolve(explicit: Option<&Path>, input: &Path) -> Result<Self, CompileError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match discover(input) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

fn discover(input: &Path) -> Option<PathBuf> {
    let dir = input.parent().unwrap_or(Path::new("."));
    let candidate = dir.join(CONFIG_FILE);
    candidate.is_file().then_some(candidate)
}
