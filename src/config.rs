use crate::ai::ModelConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_VAR: &str = "LEARNING_MODES_MODEL";
pub const TIMEOUT_VAR: &str = "LEARNING_MODES_TIMEOUT_SECS";
pub const DOCUMENTS_DIR_VAR: &str = "LEARNING_MODES_DOCUMENTS_DIR";
pub const RESULTS_DIR_VAR: &str = "LEARNING_MODES_RESULTS_DIR";

/// Upper bound on one generation call, matching the hosted route's duration ceiling.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_DOCUMENTS_DIR: &str = "documents";
pub const DEFAULT_RESULTS_DIR: &str = "results";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: ModelConfig,
    pub generation_timeout: Duration,
    pub documents_dir: PathBuf,
    pub results_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: ModelConfig::default(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            documents_dir: PathBuf::from(DEFAULT_DOCUMENTS_DIR),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Unset, blank or unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        config.api_key = read(API_KEY_VAR);
        if let Some(model) = read(MODEL_VAR) {
            config.model.model = model;
        }
        if let Some(secs) = read(TIMEOUT_VAR).and_then(|v| v.parse::<u64>().ok())
            && secs > 0
        {
            config.generation_timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = read(DOCUMENTS_DIR_VAR) {
            config.documents_dir = PathBuf::from(dir);
        }
        if let Some(dir) = read(RESULTS_DIR_VAR) {
            config.results_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn ai_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
