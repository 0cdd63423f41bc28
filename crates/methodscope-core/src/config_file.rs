use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub model: Option<ModelConfig>,
    pub run: Option<RunConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: Option<String>,
    pub name: Option<String>,
    pub num_ctx: Option<u32>,
    pub seed: Option<u64>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub output: Option<String>,
    pub log_file: Option<String>,
    pub max_concurrent_documents: Option<usize>,
    pub criteria: Option<Vec<String>>,
}

/// Platform config directory path: `<config_dir>/methodscope/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("methodscope").join("config.toml"))
}

/// Load config by cascading CWD `.methodscope.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".methodscope.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bm = base.model.unwrap_or_default();
    let om = overlay.model.unwrap_or_default();
    let br = base.run.unwrap_or_default();
    let or = overlay.run.unwrap_or_default();

    ConfigFile {
        model: Some(ModelConfig {
            endpoint: om.endpoint.or(bm.endpoint),
            name: om.name.or(bm.name),
            num_ctx: om.num_ctx.or(bm.num_ctx),
            seed: om.seed.or(bm.seed),
            timeout_secs: om.timeout_secs.or(bm.timeout_secs),
        }),
        run: Some(RunConfig {
            output: or.output.or(br.output),
            log_file: or.log_file.or(br.log_file),
            max_concurrent_documents: or.max_concurrent_documents.or(br.max_concurrent_documents),
            criteria: or.criteria.or(br.criteria),
        }),
    }
}
