// Configuration module
// Public interface for configuration loading

pub mod constants;
mod loader;
mod settings;

pub use loader::{
    apply_ollama_host, default_config_path, load_config, load_config_from_path,
    write_default_config,
};
pub use settings::{BackendSettings, Config, RunSettings};
