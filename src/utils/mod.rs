/// TOML configuration for DeepSearch (`deepsearch.toml`).
pub mod toml_config;
