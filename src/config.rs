//! Configuration file schema for docsmith.
//!
//! Every field has a default, so an absent file or an empty one is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::Extractor;
use crate::generate::DocStyle;

/// File names searched in the working directory, in order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["docsmith.yaml", ".docsmith.yaml"];

/// Commented template written by `docsmith init`.
pub const TEMPLATE: &str = include_str!("templates/docsmith.yaml");

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Docstring style for generation and completeness checks.
    #[serde(default)]
    pub style: DocStyle,
    /// Directory names skipped in addition to the built-in list.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Glob patterns for paths to skip (e.g. "**/migrations/**").
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Coverage percentage `scan` requires (default: 0).
    #[serde(default)]
    pub min_coverage: f64,
    /// Cyclomatic complexity above which a function lowers the quality score.
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: usize,
    /// Write `<file>.bak` before rewriting a file.
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            style: DocStyle::default(),
            exclude_dirs: Vec::new(),
            excluded_paths: Vec::new(),
            min_coverage: 0.0,
            complexity_threshold: default_complexity_threshold(),
            backup: false,
            llm: LlmConfig::default(),
        }
    }
}

/// Remote generation service settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_complexity_threshold() -> usize {
    10
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Empty text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load the explicit file, or the first discovered one in `dir`, or the
    /// defaults. The result is validated.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => discover(dir),
        };

        let config = match &path {
            Some(path) => Self::parse_file(path)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {}", path.display(), e))?,
            None => Self::default(),
        };
        validate(&config)?;
        Ok((config, path))
    }

    /// An extractor honoring the built-in and configured exclusions.
    pub fn extractor(&self) -> anyhow::Result<Extractor> {
        let extractor = Extractor::new()?
            .exclude_dirs(self.exclude_dirs.iter().cloned())
            .exclude_globs(&self.excluded_paths)?;
        Ok(extractor)
    }
}

/// First configuration file present in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if !(0.0..=100.0).contains(&config.min_coverage) {
        anyhow::bail!(
            "min_coverage must be between 0 and 100, got {}",
            config.min_coverage
        );
    }

    if config.complexity_threshold == 0 {
        anyhow::bail!("complexity_threshold must be at least 1");
    }

    for pattern in &config.excluded_paths {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid excluded_paths pattern {:?}: {}", pattern, e))?;
    }

    let llm = &config.llm;
    if !(llm.base_url.starts_with("http://") || llm.base_url.starts_with("https://")) {
        anyhow::bail!("llm.base_url must start with http:// or https://, got {:?}", llm.base_url);
    }
    if llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must not be empty");
    }
    if llm.api_key_env.trim().is_empty() {
        anyhow::bail!("llm.api_key_env must not be empty");
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        anyhow::bail!("llm.temperature must be between 0 and 2, got {}", llm.temperature);
    }
    if llm.max_tokens == 0 {
        anyhow::bail!("llm.max_tokens must be at least 1");
    }
    if llm.timeout_seconds == 0 {
        anyhow::bail!("llm.timeout_seconds must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
style: numpy
min_coverage: 80
excluded_paths:
  - "**/migrations/**"
llm:
  model: "gpt-4o-mini"
  timeout_seconds: 10
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.style, DocStyle::Numpy);
        assert_eq!(config.min_coverage, 80.0);
        assert_eq!(config.excluded_paths, ["**/migrations/**"]);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_seconds, 10);
        assert_eq!(config.llm.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.complexity_threshold, 10);
        assert!(config.exclude_dirs.is_empty());
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_template_parses_and_validates() {
        let config = Config::parse_str(TEMPLATE).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.llm, LlmConfig::default());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = Config {
            min_coverage: 120.0,
            ..Config::default()
        };
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.excluded_paths.push("[".to_string());
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.llm.base_url = "ftp://example.com".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_style_is_rejected() {
        assert!(Config::parse_str("style: javadoc\n").is_err());
    }

    #[test]
    fn test_load_discovers_hidden_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".docsmith.yaml"), "style: rest\n").unwrap();
        let (config, path) = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.style, DocStyle::Rest);
        assert_eq!(path.unwrap(), dir.path().join(".docsmith.yaml"));
    }

    #[test]
    fn test_load_defaults_and_missing_explicit() {
        let dir = TempDir::new().unwrap();
        let (config, path) = Config::load(None, dir.path()).unwrap();
        assert!(path.is_none());
        assert_eq!(config, Config::default());
        assert!(Config::load(Some(&dir.path().join("nope.yaml")), dir.path()).is_err());
    }
}
