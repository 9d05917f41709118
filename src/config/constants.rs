// Project-wide constants
//
// Centralised here so defaults have one source of truth.
// Import via `use crate::config::constants::*;`.

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Timeout for generate / embed / show requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Timeout for model downloads.
pub const DEFAULT_PULL_TIMEOUT_SECS: u64 = 3600;

/// Default sampling temperature for every role.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default nucleus sampling cutoff.
pub const DEFAULT_TOP_P: f32 = 0.9;

/// Default output token cap.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Default iteration budget for one refinement run.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Default convergence tolerance. Zero means a run only stops early on an
/// exact similarity of 1.0.
pub const DEFAULT_CONVERGENCE_EPSILON: f64 = 0.0;

/// Default forward-translation model.
pub const DEFAULT_FORWARD_MODEL: &str = "gemma3:4b";

/// Default back-translation model.
pub const DEFAULT_BACKWARD_MODEL: &str = "phi3.5:3.8b";

/// Default critique-and-score model.
pub const DEFAULT_JUDGE_MODEL: &str = "deepseek-r1:1.5b";

pub const DEFAULT_SOURCE_LANG: &str = "English";
pub const DEFAULT_TARGET_LANG: &str = "Dutch";

/// Markers some models use to wrap inline deliberation.
pub const DEFAULT_REASONING_OPEN: &str = "<think>";
pub const DEFAULT_REASONING_CLOSE: &str = "</think>";

/// Config directory under the user's home.
pub const CONFIG_DIR_NAME: &str = ".backtranslate";

/// Config file name inside [`CONFIG_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "BACKTRANSLATE_CONFIG";

/// Environment variable overriding the Ollama endpoint.
pub const OLLAMA_HOST_ENV_VAR: &str = "OLLAMA_HOST";
