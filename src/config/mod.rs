//! Project configuration for hipify.
//!
//! This module handles:
//! - `.hipify.toml` parsing
//! - Directory cascade discovery
//! - Config merging

pub mod cascade;
pub mod parser;
pub mod types;

pub use cascade::{
	CONFIG_FILE_NAME, NO_USER_CONFIG_ENV_VAR, discover_configs, discover_project_configs,
	load_merged_config, merge_configs, user_config_path,
};
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, LoadedConfig, MergedConfig};
