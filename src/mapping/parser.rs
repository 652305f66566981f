use crate::error::{HipifyError, Result};
use crate::mapping::types::MappingTable;
use std::path::Path;

const DEFAULT_TABLE: &str = include_str!("default_mappings.toml");

/// Parse a mapping table from the given path.
pub fn parse_mapping_file(path: &Path) -> Result<MappingTable> {
	let content = std::fs::read_to_string(path).map_err(|source| HipifyError::MappingRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_mapping_str(&content, path)
}

/// Parse a mapping table from a string (useful for testing).
pub fn parse_mapping_str(content: &str, path: &Path) -> Result<MappingTable> {
	let table: MappingTable =
		toml::from_str(content).map_err(|source| HipifyError::MappingParse {
			path: path.to_path_buf(),
			source,
		})?;

	table.validate()?;

	Ok(table)
}

/// The mapping table compiled into the binary.
pub fn default_mapping_table() -> Result<MappingTable> {
	parse_mapping_str(DEFAULT_TABLE, Path::new("<built-in>"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapping::types::{Counter, SupportStatus};
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_table() {
		let table = parse_mapping_str("", &PathBuf::from("test.toml")).unwrap();
		assert!(table.includes.is_empty());
		assert!(table.renames().next().is_none());
		assert!(table.device_functions.is_empty());
	}

	#[test]
	fn test_parse_sections() {
		let content = r#"
[[include]]
source = "cuda_runtime.h"
target = "hip/hip_runtime.h"
category = "include_cuda_main_header"

[[runtime-function]]
source = "cudaMemcpyToSymbol"
target = "hipMemcpyToSymbol"
category = "memory"

[[rename]]
source = "cudaThreadExit"
target = "hipDeviceReset"
category = "thread"
status = "deprecated"

[[device-function]]
name = "__prof_trigger"
status = "unsupported"

[host-functions]
device-symbol-0 = ["cudaMemcpyToSymbol"]
"#;
		let table = parse_mapping_str(content, &PathBuf::from("test.toml")).unwrap();

		assert_eq!(table.includes.len(), 1);
		assert_eq!(table.includes[0].category, Counter::IncludeCudaMainHeader);
		assert_eq!(table.runtime_functions[0].status, SupportStatus::Supported);
		assert_eq!(table.renames[0].status, SupportStatus::Deprecated);
		assert_eq!(table.device_functions[0].status, SupportStatus::Unsupported);
		assert_eq!(
			table.host_functions.device_symbol_0,
			vec!["cudaMemcpyToSymbol".to_string()]
		);
		assert!(table.host_functions.reinterpret_1.is_empty());
	}

	#[test]
	fn test_include_entry_with_rename_category_is_rejected() {
		let content = r#"
[[include]]
source = "curand.h"
target = "hiprand/hiprand.h"
category = "memory"
"#;
		let result = parse_mapping_str(content, &PathBuf::from("test.toml"));
		match result.unwrap_err() {
			HipifyError::InvalidMapping { source_name, .. } => {
				assert_eq!(source_name, "curand.h");
			}
			other => panic!("Expected InvalidMapping error, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_category_is_a_parse_error() {
		let content = r#"
[[rename]]
source = "cudaFoo"
target = "hipFoo"
category = "no_such_category"
"#;
		let result = parse_mapping_str(content, &PathBuf::from("test.toml"));
		assert!(matches!(result, Err(HipifyError::MappingParse { .. })));
	}

	#[test]
	fn test_default_table_is_valid() {
		let table = default_mapping_table().unwrap();
		assert!(!table.includes.is_empty());
		assert!(table.runtime_function("cudaMalloc").is_some());
		assert!(table.renames().any(|e| e.is_unsupported()));
		assert!(table.renames().any(|e| e.is_deprecated()));
	}
}
