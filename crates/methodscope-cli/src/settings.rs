//! Resolution of run settings: CLI flags > env vars > config file > defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::Args;
use methodscope_core::config_file::ConfigFile;
use methodscope_core::ModelSettings;

pub const DEFAULT_OUTPUT: &str = "results.json";
pub const DEFAULT_LOG_FILE: &str = "evaluation.log";

/// Model endpoint flags shared by every command that talks to the model.
#[derive(Args, Debug, Default, Clone)]
pub struct ModelArgs {
    /// Base URL of the Ollama-compatible endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Context window size in tokens
    #[arg(long)]
    pub num_ctx: Option<u32>,

    /// Decoding seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Resolved settings for an `evaluate` run, apart from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub output: PathBuf,
    pub log_file: PathBuf,
    pub max_concurrent_documents: usize,
    pub criteria: Vec<String>,
}

/// Env value parsed as `T`; unparseable or out-of-range values count as unset.
fn env_parsed<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    env(key).and_then(|v| v.trim().parse().ok())
}

pub fn resolve_model_settings(
    args: &ModelArgs,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> ModelSettings {
    let defaults = ModelSettings::default();
    let file = file.model.clone().unwrap_or_default();

    ModelSettings {
        endpoint: args
            .endpoint
            .clone()
            .or_else(|| env("METHODSCOPE_ENDPOINT"))
            .or(file.endpoint)
            .unwrap_or(defaults.endpoint),
        model: args
            .model
            .clone()
            .or_else(|| env("METHODSCOPE_MODEL"))
            .or(file.name)
            .unwrap_or(defaults.model),
        num_ctx: args
            .num_ctx
            .or_else(|| env_parsed(&env, "METHODSCOPE_NUM_CTX"))
            .or(file.num_ctx)
            .unwrap_or(defaults.num_ctx),
        seed: args
            .seed
            .or_else(|| env_parsed(&env, "METHODSCOPE_SEED"))
            .or(file.seed)
            .unwrap_or(defaults.seed),
        temperature: defaults.temperature,
        timeout: args
            .timeout
            .or_else(|| env_parsed(&env, "METHODSCOPE_TIMEOUT"))
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
    }
}

pub fn resolve_run_settings(
    output: Option<PathBuf>,
    log_file: Option<PathBuf>,
    max_concurrent_documents: Option<usize>,
    criteria: Vec<String>,
    file: &ConfigFile,
) -> RunSettings {
    let file = file.run.clone().unwrap_or_default();
    RunSettings {
        output: output
            .or_else(|| file.output.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
        log_file: log_file
            .or_else(|| file.log_file.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        max_concurrent_documents: max_concurrent_documents
            .or(file.max_concurrent_documents)
            .unwrap_or(1)
            .max(1),
        criteria: if criteria.is_empty() {
            file.criteria.unwrap_or_default()
        } else {
            criteria
        },
    }
}
