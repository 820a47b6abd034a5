use crate::error::{OrchError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ANTHROPIC_MODEL_ENV: &str = "ANTHROPIC_MODEL";
pub const OPENAI_MODEL_ENV: &str = "OPENAI_MODEL";
pub const ANTHROPIC_BASE_URL_ENV: &str = "ANTHROPIC_BASE_URL";
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

// ---------------------------------------------------------------------------
// BuilderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_builder_model")]
    pub model: String,
    #[serde(default = "default_builder_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_builder_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_builder_max_tokens() -> u32 {
    16000
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            model: default_builder_model(),
            max_tokens: default_builder_max_tokens(),
            base_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ReviewerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerConfig {
    #[serde(default = "default_reviewer_model")]
    pub model: String,
    #[serde(default = "default_reviewer_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_reviewer_model() -> String {
    "gpt-4o".to_string()
}

fn default_reviewer_max_tokens() -> u32 {
    4000
}

impl Default for ReviewerConfig {
    fn default() -> Self {
        Self {
            model: default_reviewer_model(),
            max_tokens: default_reviewer_max_tokens(),
            temperature: 0.0,
            base_url: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Optional YAML settings for the two providers and the runs root.
///
/// ```yaml
/// runs_root: audit/runs
/// builder:
///   model: claude-sonnet-4-20250514
///   max_tokens: 16000
/// reviewer:
///   model: gpt-4o
///   temperature: 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runs_root: Option<PathBuf>,
    #[serde(default)]
    pub builder: BuilderConfig,
    #[serde(default)]
    pub reviewer: ReviewerConfig,
}

impl Config {
    /// Load `path` if given; no path means all defaults. A path that is given
    /// but missing is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        if !path.is_file() {
            return Err(OrchError::InvalidConfig(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply model and base-url overrides from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(model) = non_empty(ANTHROPIC_MODEL_ENV) {
            self.builder.model = model;
        }
        if let Some(model) = non_empty(OPENAI_MODEL_ENV) {
            self.reviewer.model = model;
        }
        if let Some(url) = non_empty(ANTHROPIC_BASE_URL_ENV) {
            self.builder.base_url = Some(url);
        }
        if let Some(url) = non_empty(OPENAI_BASE_URL_ENV) {
            self.reviewer.base_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.builder.model.trim().is_empty() || self.reviewer.model.trim().is_empty() {
            return Err(OrchError::InvalidConfig("model id must not be empty".into()));
        }
        if self.builder.max_tokens == 0 || self.reviewer.max_tokens == 0 {
            return Err(OrchError::InvalidConfig("max_tokens must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.reviewer.temperature) {
            return Err(OrchError::InvalidConfig(format!(
                "reviewer.temperature {} outside 0..=2",
                self.reviewer.temperature
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
