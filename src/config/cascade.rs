use crate::config::parser::parse_config_file;
use crate::config::types::{LoadedConfig, MergedConfig};
use crate::error::{HipifyError, Result};
use std::path::{Path, PathBuf};

/// File name looked up in every directory of the cascade.
pub const CONFIG_FILE_NAME: &str = ".hipify.toml";

/// If truthy, ~/.hipify.toml is not read. Useful for CI environments.
pub const NO_USER_CONFIG_ENV_VAR: &str = "HIPIFY_NO_USER_CONFIG";

/// Discover and load all config files in the cascade.
///
/// The cascade order is:
/// 1. Start from `start_dir` and look for `.hipify.toml`
/// 2. If found and `root = true`, skip to user config only
/// 3. Otherwise, continue up the directory tree
/// 4. Finally, check ~/.hipify.toml (unless disabled)
///
/// Returns configs in cascade order (most specific first).
pub fn discover_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = discover_project_configs(start_dir)?;

	if !is_env_truthy(NO_USER_CONFIG_ENV_VAR)
		&& let Some(user_config) = load_user_config(&configs)?
	{
		configs.push(user_config);
	}

	Ok(configs)
}

/// Walk from `start_dir` upward, stopping after a `root = true` config.
pub fn discover_project_configs(start_dir: &Path) -> Result<Vec<LoadedConfig>> {
	let mut configs = Vec::new();
	let mut current_dir = Some(start_dir);

	while let Some(dir) = current_dir {
		let config_path = dir.join(CONFIG_FILE_NAME);

		if config_path.is_file() {
			let config = parse_config_file(&config_path)?;
			let is_root = config.root;
			tracing::debug!(path = %config_path.display(), root = is_root, "loaded config");

			configs.push(LoadedConfig {
				config,
				path: config_path,
			});

			if is_root {
				break;
			}
		}

		current_dir = dir.parent();
	}

	Ok(configs)
}

/// Load the user's ~/.hipify.toml if it exists and wasn't already found.
fn load_user_config(existing_configs: &[LoadedConfig]) -> Result<Option<LoadedConfig>> {
	let user_config_path = user_config_path()?;

	if existing_configs.iter().any(|c| c.path == user_config_path) {
		return Ok(None);
	}

	if user_config_path.is_file() {
		let config = parse_config_file(&user_config_path)?;
		Ok(Some(LoadedConfig {
			config,
			path: user_config_path,
		}))
	} else {
		Ok(None)
	}
}

/// Check if an environment variable is set to a truthy value.
fn is_env_truthy(var_name: &str) -> bool {
	match std::env::var(var_name) {
		Ok(value) => {
			let lower = value.to_lowercase();
			!value.is_empty() && lower != "0" && lower != "false" && lower != "no"
		}
		Err(_) => false,
	}
}

/// Merge multiple configs into a single effective config.
///
/// Lists are concatenated in cascade order, with paths resolved against the
/// directory of the file that names them. The most specific config that
/// names a mapping table wins.
pub fn merge_configs(configs: &[LoadedConfig]) -> MergedConfig {
	let mut merged = MergedConfig::default();

	for loaded in configs {
		if merged.mappings.is_none() {
			merged.mappings = loaded.mappings_path();
		}

		merged
			.whitelist
			.extend(loaded.config.whitelist.iter().cloned());
		merged.exclude_dirs.extend(loaded.exclude_dirs());
		merged.exclude_files.extend(loaded.exclude_files());
		merged.sources.push(loaded.path.clone());
	}

	merged
}

/// Convenience function to discover, load, and merge configs from a directory.
pub fn load_merged_config(start_dir: &Path) -> Result<MergedConfig> {
	let configs = discover_configs(start_dir)?;
	Ok(merge_configs(&configs))
}

/// Get the path to the user's config file.
pub fn user_config_path() -> Result<PathBuf> {
	let home_dir = dirs::home_dir().ok_or(HipifyError::HomeDirectoryNotFound)?;
	Ok(home_dir.join(CONFIG_FILE_NAME))
}
