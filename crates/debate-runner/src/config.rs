//! Runner configuration.
//!
//! Precedence, highest first: CLI flags, `DEBATE_LLM_*` environment variables,
//! the optional TOML file, built-in defaults. Debate content (question,
//! answers, rounds) comes from CLI or file only.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arena::DebateConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default OpenAI-compatible endpoint (a local llama.cpp / vLLM server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";
pub const DEFAULT_MODEL: &str = "local-model";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Model endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Base URL up to and including the API version, e.g. `http://host:8080/v1`.
    pub base_url: String,
    pub model: String,
    /// Sent as a bearer token when present.
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Retries for transient failures (0 = none).
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            temperature: 0.7,
            max_tokens: 256,
        }
    }
}

/// Fully resolved runner configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunnerConfig {
    pub debate: DebateConfig,
    pub llm: LlmSettings,
}

/// `[llm]` table of the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmFileSection {
    pub url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// On-disk configuration; every field is optional.
///
/// ```toml
/// question = "Should AI be regulated?"
/// answer_a = "Yes, it should"
/// answer_b = "No, no need for regulation"
/// rounds = 3
///
/// [llm]
/// url = "http://localhost:8080/v1"
/// model = "local-model"
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub question: Option<String>,
    pub answer_a: Option<String>,
    pub answer_b: Option<String>,
    pub rounds: Option<u32>,
    pub llm: LlmFileSection,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub question: Option<String>,
    pub answer_a: Option<String>,
    pub answer_b: Option<String>,
    pub rounds: Option<u32>,
    pub config_path: Option<PathBuf>,
}

impl RunnerConfig {
    /// Resolve from the process environment and the file named by `--config`.
    pub fn load(cli: &CliOverrides) -> Result<Self, ConfigError> {
        let file = match &cli.config_path {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, |var| std::env::var(var).ok(), file)
    }

    /// Merge every layer. `env` looks up a variable by name.
    pub fn resolve<E>(cli: &CliOverrides, env: E, file: FileConfig) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let debate = DebateConfig {
            question: pick(cli.question.clone(), None, file.question, defaults.debate.question),
            answer_a: pick(cli.answer_a.clone(), None, file.answer_a, defaults.debate.answer_a),
            answer_b: pick(cli.answer_b.clone(), None, file.answer_b, defaults.debate.answer_b),
            round_count: pick(cli.rounds, None, file.rounds, defaults.debate.round_count),
        };

        let llm_file = file.llm;
        let timeout_secs = pick(
            None,
            parse_env(&env, "DEBATE_LLM_TIMEOUT_SECS")?,
            llm_file.timeout_secs,
            defaults.llm.timeout.as_secs(),
        );
        let llm = LlmSettings {
            base_url: pick(None, env("DEBATE_LLM_URL"), llm_file.url, defaults.llm.base_url)
                .trim_end_matches('/')
                .to_string(),
            model: pick(None, env("DEBATE_LLM_MODEL"), llm_file.model, defaults.llm.model),
            api_key: env("DEBATE_LLM_API_KEY")
                .or(llm_file.api_key)
                .filter(|key| !key.is_empty()),
            timeout: Duration::from_secs(timeout_secs),
            max_retries: pick(
                None,
                parse_env(&env, "DEBATE_LLM_MAX_RETRIES")?,
                llm_file.max_retries,
                defaults.llm.max_retries,
            ),
            temperature: llm_file.temperature.unwrap_or(defaults.llm.temperature),
            max_tokens: llm_file.max_tokens.unwrap_or(defaults.llm.max_tokens),
        };

        Ok(Self { debate, llm })
    }
}

fn pick<T>(cli: Option<T>, env: Option<T>, file: Option<T>, default: T) -> T {
    cli.or(env).or(file).unwrap_or(default)
}

fn parse_env<E, T>(env: &E, var: &'static str) -> Result<Option<T>, ConfigError>
where
    E: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match env(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
    }
}
