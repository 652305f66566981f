use crate::error::HipifyError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration from a `.hipify.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
	/// If true, stop directory cascade and jump directly to ~/.hipify.toml.
	#[serde(default)]
	pub root: bool,

	/// Mapping table to compile instead of the built-in one.
	/// Relative paths resolve against the directory holding this file.
	#[serde(default)]
	pub mappings: Option<PathBuf>,

	/// Extra identifiers exempt from unconverted-identifier warnings.
	#[serde(default)]
	pub whitelist: Vec<String>,

	/// Directories whose files are skipped, relative to this file.
	#[serde(default)]
	pub exclude_dirs: Vec<PathBuf>,

	/// Individual files that are skipped, relative to this file.
	#[serde(default)]
	pub exclude_files: Vec<PathBuf>,
}

/// A loaded configuration with its source path for debugging/display.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	/// The parsed configuration.
	pub config: Config,

	/// The path this config was loaded from.
	pub path: PathBuf,
}

impl LoadedConfig {
	/// `path` resolved against this file's directory.
	pub fn resolve(&self, path: &Path) -> PathBuf {
		match self.path.parent() {
			Some(dir) if path.is_relative() => dir.join(path),
			_ => path.to_path_buf(),
		}
	}

	/// The mapping table path, resolved against this file's directory.
	pub fn mappings_path(&self) -> Option<PathBuf> {
		self.config.mappings.as_deref().map(|m| self.resolve(m))
	}

	pub fn exclude_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
		self.config.exclude_dirs.iter().map(|d| self.resolve(d))
	}

	pub fn exclude_files(&self) -> impl Iterator<Item = PathBuf> + '_ {
		self.config.exclude_files.iter().map(|f| self.resolve(f))
	}
}

/// Merged configuration from multiple config files in the cascade.
#[derive(Debug, Clone, Default)]
pub struct MergedConfig {
	/// Most specific mapping table, already resolved.
	pub mappings: Option<PathBuf>,

	pub whitelist: Vec<String>,
	pub exclude_dirs: Vec<PathBuf>,
	pub exclude_files: Vec<PathBuf>,

	/// Config files that contributed, most specific first.
	pub sources: Vec<PathBuf>,
}

fn is_identifier(word: &str) -> bool {
	let mut chars = word.chars();
	chars
		.next()
		.is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
	/// Validate whitelist entries and path lists.
	pub fn validate(&self, path: &Path) -> Result<(), HipifyError> {
		if let Some(word) = self.whitelist.iter().find(|w| !is_identifier(w)) {
			return Err(HipifyError::InvalidConfig {
				path: path.to_path_buf(),
				reason: format!("whitelist entry \"{word}\" is not an identifier"),
			});
		}

		let empty_path = self
			.exclude_dirs
			.iter()
			.chain(&self.exclude_files)
			.any(|p| p.as_os_str().is_empty());
		if empty_path {
			return Err(HipifyError::InvalidConfig {
				path: path.to_path_buf(),
				reason: "exclusion paths must not be empty".to_string(),
			});
		}

		Ok(())
	}
}
