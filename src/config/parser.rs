use crate::config::types::Config;
use crate::error::{HipifyError, Result};
use std::path::Path;

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<Config> {
	let content = std::fs::read_to_string(path).map_err(|source| HipifyError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<Config> {
	let config: Config = toml::from_str(content).map_err(|source| HipifyError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})?;

	config.validate(path)?;

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_config() {
		let path = PathBuf::from("test.toml");
		let config = parse_config_str("", &path).unwrap();

		assert!(!config.root);
		assert!(config.mappings.is_none());
		assert!(config.whitelist.is_empty());
		assert!(config.exclude_dirs.is_empty());
		assert!(config.exclude_files.is_empty());
	}

	#[test]
	fn test_parse_full_config() {
		let content = r#"
root = true
mappings = "tables/cuda.toml"
whitelist = ["cudaMyHelper", "cudaLegacyShim"]
exclude-dirs = ["third_party", "build"]
exclude-files = ["src/generated.cu"]
"#;
		let path = PathBuf::from("test.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert!(config.root);
		assert_eq!(config.mappings, Some(PathBuf::from("tables/cuda.toml")));
		assert_eq!(config.whitelist, vec!["cudaMyHelper", "cudaLegacyShim"]);
		assert_eq!(
			config.exclude_dirs,
			vec![PathBuf::from("third_party"), PathBuf::from("build")]
		);
		assert_eq!(config.exclude_files, vec![PathBuf::from("src/generated.cu")]);
	}

	#[test]
	fn test_unknown_key_is_rejected() {
		let path = PathBuf::from("test.toml");
		let result = parse_config_str("exclude_dirs = [\"x\"]\n", &path);
		assert!(matches!(result, Err(HipifyError::ConfigParse { .. })));
	}

	#[test]
	fn test_invalid_whitelist_entry() {
		let path = PathBuf::from("test.toml");
		let result = parse_config_str("whitelist = [\"cuda Helper\"]\n", &path);

		match result.unwrap_err() {
			HipifyError::InvalidConfig { path, reason } => {
				assert_eq!(path, PathBuf::from("test.toml"));
				assert!(reason.contains("cuda Helper"));
			}
			other => panic!("Expected InvalidConfig error, got {other:?}"),
		}
	}
}
