use std::path::PathBuf;

/// Library-level structured errors for hipify.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum HipifyError {
	#[error("Failed to read mapping table: {path}")]
	MappingRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse mapping table: {path}")]
	MappingParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid mapping entry \"{source_name}\": {reason}")]
	InvalidMapping { source_name: String, reason: String },

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to read config file: {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid config file {path}: {reason}")]
	InvalidConfig { path: PathBuf, reason: String },

	#[error("could not open {path}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("could not write {path}")]
	FileWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to create backup {backup} for {path}")]
	BackupFailed {
		path: PathBuf,
		backup: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to write converted output")]
	Output {
		#[source]
		source: std::io::Error,
	},

	#[error("Cannot resolve output directory: {path}")]
	OutputDir {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to install rule program at {path}")]
	ProgramWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse rule program: {path}")]
	ProgramParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Failed to serialize rule program")]
	ProgramSerialize {
		#[source]
		source: toml::ser::Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using HipifyError.
pub type Result<T> = std::result::Result<T, HipifyError>;
